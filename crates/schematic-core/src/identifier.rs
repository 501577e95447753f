//! Identifier management using string interning for efficient string storage and comparison
//!
//! This module provides the [`Id`] type used for every flattened primitive.
//! Flattening produces many path-qualified names (`block/inner/mul1`) that are
//! compared and hashed repeatedly during layout, so they are interned once.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Separator placed between the segments of a nested identifier.
pub const PATH_SEPARATOR: char = '/';

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Efficient identifier type using string interning
///
/// # Examples
///
/// ```
/// use schematic_core::identifier::Id;
///
/// let block = Id::new("block");
/// let mul = Id::new("mul1");
///
/// let nested = block.create_nested(mul);
/// assert_eq!(nested, "block/mul1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Examples
    ///
    /// ```
    /// use schematic_core::identifier::Id;
    ///
    /// let input_id = Id::new("x0");
    /// assert_eq!(input_id, "x0");
    /// ```
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Creates a nested ID by combining this ID and a child ID with the
    /// [`PATH_SEPARATOR`].
    ///
    /// # Examples
    ///
    /// ```
    /// use schematic_core::identifier::Id;
    ///
    /// let parent = Id::new("layer0");
    /// let child = Id::new("neuron1");
    /// assert_eq!(parent.create_nested(child), "layer0/neuron1");
    /// ```
    pub fn create_nested(&self, child_id: Id) -> Self {
        let mut interner = interner();
        let nested_name = match (interner.resolve(self.0), interner.resolve(child_id.0)) {
            (Some(parent), Some(child)) => format!("{parent}{PATH_SEPARATOR}{child}"),
            _ => unreachable!("interned symbols are never removed"),
        };
        Self(interner.get_or_intern(nested_name))
    }

    /// Creates the ID of `child` inside an optional instantiation path.
    ///
    /// The root of a diagram has no path, in which case the child name is
    /// used unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use schematic_core::identifier::Id;
    ///
    /// assert_eq!(Id::within(None, "add1"), "add1");
    /// assert_eq!(Id::within(Some(Id::new("blk")), "add1"), "blk/add1");
    /// ```
    pub fn within(path: Option<Id>, child: &str) -> Self {
        match path {
            Some(parent) => parent.create_nested(Id::new(child)),
            None => Id::new(child),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interner = interner();
        let str_value = interner.resolve(self.0).unwrap_or_default();
        f.write_str(str_value)
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        let interner = interner();
        interner.resolve(self.0) == Some(other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("mul1");
        let id2 = Id::new("mul1");
        let id3 = Id::new("add1");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "mul1");
    }

    #[test]
    fn test_create_nested() {
        let parent = Id::new("dense");
        let nested1 = parent.create_nested(Id::new("mul"));
        let nested2 = parent.create_nested(Id::new("add"));

        assert_ne!(nested1, nested2);
        assert_eq!(nested1, "dense/mul");
        assert_eq!(nested2, "dense/add");
    }

    #[test]
    fn test_deep_nesting() {
        let level1 = Id::new("net").create_nested(Id::new("layer1"));
        let level2 = level1.create_nested(Id::new("neuron0"));
        let level3 = level2.create_nested(Id::new("relu"));

        assert_eq!(level3, "net/layer1/neuron0/relu");
    }

    #[test]
    fn test_within() {
        assert_eq!(Id::within(None, "x0"), "x0");
        assert_eq!(Id::within(Some(Id::new("a/b")), "x0"), "a/b/x0");
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("display_test");
        assert_eq!(format!("{id}"), "display_test");
    }

    #[test]
    fn test_serialize_as_string() {
        let id = Id::new("blk/reg0");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"blk/reg0\"");
    }

    #[test]
    fn test_hash_and_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(Id::new("key1"), "value1");
        map.insert(Id::new("key2"), "value2");

        assert_eq!(map.get(&Id::new("key1")), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_partial_eq_str() {
        let id = Id::new("relu1");
        assert!(id == "relu1");
        assert!(id != "relu");

        let nested = Id::new("parent/child");
        assert!(nested == "parent/child");
        assert!(nested != "child");
    }
}
