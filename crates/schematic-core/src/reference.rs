//! Connection references between ports.
//!
//! A [`Reference`] is the parsed form of a connection string found in a
//! diagram description. Two spellings exist:
//!
//! - `source.port` names an output port of a sibling component.
//! - `$.input` or `$.input[index]` names an input of the enclosing module
//!   definition; the index selects one element of a bus input.

use std::{fmt, str::FromStr};

use serde::Deserialize;
use thiserror::Error;

/// Prefix marking a reference to an input of the enclosing module definition.
pub const MODULE_INPUT_PREFIX: &str = "$.";

/// Error produced when a connection string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("connection is empty")]
    Empty,

    #[error("connection `{0}` must be of the form `source.port` or `$.input`")]
    Unqualified(String),

    #[error("connection `{0}` has an empty source or port name")]
    EmptySegment(String),

    #[error("connection `{0}` has a malformed bus index")]
    MalformedIndex(String),
}

/// A parsed connection reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Reference {
    /// An output port of a sibling component: `source.port`.
    Component { source: String, port: String },

    /// An input of the enclosing module definition: `$.name` or `$.name[index]`.
    ModuleInput { name: String, index: Option<usize> },
}

impl Reference {
    /// Creates a component-qualified reference.
    pub fn component(source: impl Into<String>, port: impl Into<String>) -> Self {
        Self::Component {
            source: source.into(),
            port: port.into(),
        }
    }

    /// Creates a module-input reference.
    pub fn module_input(name: impl Into<String>, index: Option<usize>) -> Self {
        Self::ModuleInput {
            name: name.into(),
            index,
        }
    }

    /// Returns `true` for `$.`-prefixed references.
    pub fn is_module_input(&self) -> bool {
        matches!(self, Self::ModuleInput { .. })
    }

    fn parse_module_input(raw: &str, rest: &str) -> Result<Self, ReferenceError> {
        let Some(open) = rest.find('[') else {
            if rest.is_empty() || rest.contains(']') {
                return Err(ReferenceError::EmptySegment(raw.to_string()));
            }
            return Ok(Self::module_input(rest, None));
        };

        let name = &rest[..open];
        let index = rest[open + 1..]
            .strip_suffix(']')
            .and_then(|digits| digits.parse::<usize>().ok())
            .ok_or_else(|| ReferenceError::MalformedIndex(raw.to_string()))?;

        if name.is_empty() {
            return Err(ReferenceError::EmptySegment(raw.to_string()));
        }
        Ok(Self::module_input(name, Some(index)))
    }
}

impl FromStr for Reference {
    type Err = ReferenceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() {
            return Err(ReferenceError::Empty);
        }

        if let Some(rest) = raw.strip_prefix(MODULE_INPUT_PREFIX) {
            return Self::parse_module_input(raw, rest);
        }

        let (source, port) = raw
            .split_once('.')
            .ok_or_else(|| ReferenceError::Unqualified(raw.to_string()))?;
        if source.is_empty() || port.is_empty() {
            return Err(ReferenceError::EmptySegment(raw.to_string()));
        }
        Ok(Self::component(source, port))
    }
}

impl TryFrom<String> for Reference {
    type Error = ReferenceError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component { source, port } => write!(f, "{source}.{port}"),
            Self::ModuleInput { name, index: None } => write!(f, "{MODULE_INPUT_PREFIX}{name}"),
            Self::ModuleInput {
                name,
                index: Some(index),
            } => write!(f, "{MODULE_INPUT_PREFIX}{name}[{index}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_component_reference() {
        let reference: Reference = "mul1.out".parse().unwrap();
        assert_eq!(reference, Reference::component("mul1", "out"));
        assert!(!reference.is_module_input());
    }

    #[test]
    fn test_parse_nested_source_keeps_path() {
        let reference: Reference = "blk/inner/add.out".parse().unwrap();
        assert_eq!(reference, Reference::component("blk/inner/add", "out"));
    }

    #[test]
    fn test_parse_module_input() {
        assert_eq!(
            "$.x".parse::<Reference>().unwrap(),
            Reference::module_input("x", None)
        );
        assert_eq!(
            "$.weights[3]".parse::<Reference>().unwrap(),
            Reference::module_input("weights", Some(3))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Reference>(), Err(ReferenceError::Empty));
        assert!(matches!(
            "mul1".parse::<Reference>(),
            Err(ReferenceError::Unqualified(_))
        ));
        assert!(matches!(
            ".out".parse::<Reference>(),
            Err(ReferenceError::EmptySegment(_))
        ));
        assert!(matches!(
            "$.".parse::<Reference>(),
            Err(ReferenceError::EmptySegment(_))
        ));
        assert!(matches!(
            "$.w[x]".parse::<Reference>(),
            Err(ReferenceError::MalformedIndex(_))
        ));
        assert!(matches!(
            "$.w[-1]".parse::<Reference>(),
            Err(ReferenceError::MalformedIndex(_))
        ));
        assert!(matches!(
            "$.[2]".parse::<Reference>(),
            Err(ReferenceError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_display_matches_source_form() {
        for raw in ["a.out", "$.bias", "$.w[0]", "blk/x.y"] {
            let reference: Reference = raw.parse().unwrap();
            assert_eq!(reference.to_string(), raw);
        }
    }

    proptest::proptest! {
        #[test]
        fn parse_never_panics(raw in ".*") {
            let _ = raw.parse::<Reference>();
        }

        #[test]
        fn component_splits_at_first_dot(source in "[a-z0-9_/]{1,12}", port in "[a-z0-9_.]{1,8}") {
            let reference: Reference = format!("{source}.{port}").parse().unwrap();
            proptest::prop_assert_eq!(reference, Reference::component(source, port));
        }
    }
}
