//! Typed model of a diagram description.
//!
//! A description arrives in one of two shapes, both represented by
//! [`Diagram`]:
//!
//! - [`Diagram::Flat`]: a plain array of components with no module
//!   definitions.
//! - [`Diagram::Hierarchical`]: an entry-point module name plus a map of
//!   [`ModuleDefinition`]s.
//!
//! Every map keeps declaration order; later stages depend on it for
//! deterministic ids and row assignment.

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::reference::Reference;

/// Component `type` tag that marks a module instance.
pub const MODULE_TYPE_TAG: &str = "module";

/// Error raised while converting a raw component into its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("module instance `{0}` has no `moduleType`")]
    MissingModuleType(String),

    #[error("primitive `{id}` connects a bus to input `{port}`; only module instances accept buses")]
    BusOnPrimitive { id: String, port: String },
}

/// A complete diagram description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Diagram {
    /// A flat sequence of components; no module definitions exist.
    Flat(Vec<Component>),

    /// A module hierarchy instantiated from its entry point.
    Hierarchical(HierarchicalDiagram),
}

impl Diagram {
    /// Returns a short name for the shape of this diagram, used in logs.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Flat(_) => "flat",
            Self::Hierarchical(_) => "hierarchical",
        }
    }
}

/// The `{entryPointModule, moduleDefinitions}` shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalDiagram {
    entry_point_module: String,
    module_definitions: IndexMap<String, ModuleDefinition>,
}

impl HierarchicalDiagram {
    pub fn new(
        entry_point_module: impl Into<String>,
        module_definitions: IndexMap<String, ModuleDefinition>,
    ) -> Self {
        Self {
            entry_point_module: entry_point_module.into(),
            module_definitions,
        }
    }

    /// Name of the definition instantiated as the root of the diagram.
    pub fn entry_point_module(&self) -> &str {
        &self.entry_point_module
    }

    pub fn module_definitions(&self) -> &IndexMap<String, ModuleDefinition> {
        &self.module_definitions
    }

    /// Looks up a module definition by type name.
    pub fn module_definition(&self, name: &str) -> Option<&ModuleDefinition> {
        self.module_definitions.get(name)
    }
}

/// A reusable module template with declared ports and an internal graph.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDefinition {
    #[serde(default)]
    inputs: Vec<InputSpec>,
    #[serde(default)]
    outputs: Vec<String>,
    #[serde(default)]
    components: Vec<Component>,
    #[serde(default)]
    output_mappings: IndexMap<String, Reference>,
}

impl ModuleDefinition {
    pub fn new(
        inputs: Vec<InputSpec>,
        outputs: Vec<String>,
        components: Vec<Component>,
        output_mappings: IndexMap<String, Reference>,
    ) -> Self {
        Self {
            inputs,
            outputs,
            components,
            output_mappings,
        }
    }

    pub fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn output_mappings(&self) -> &IndexMap<String, Reference> {
        &self.output_mappings
    }

    /// Iterates over the module types instantiated directly by this definition.
    pub fn instantiated_types(&self) -> impl Iterator<Item = &str> {
        self.components
            .iter()
            .filter_map(|component| match component {
                Component::Module(instance) => Some(instance.module_type()),
                Component::Primitive(_) => None,
            })
    }
}

/// Declaration of one module input: a scalar name or a sized bus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    Scalar(String),
    Sized {
        name: String,
        #[serde(default = "default_input_size")]
        size: usize,
    },
}

fn default_input_size() -> usize {
    1
}

impl InputSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(name) | Self::Sized { name, .. } => name,
        }
    }

    /// Number of scalar elements carried by this input.
    pub fn size(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Sized { size, .. } => *size,
        }
    }

    /// Returns `true` when the input is a bus, which must be indexed.
    pub fn is_bus(&self) -> bool {
        self.size() > 1
    }
}

/// Operation tag of a primitive.
///
/// The engine treats operations as opaque symbols; only [`PrimitiveKind::Input`],
/// [`PrimitiveKind::Output`] and [`PrimitiveKind::Reg`] influence layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Input,
    Output,
    Add,
    Mul,
    Relu2,
    Clamp,
    Reg,
    Custom(String),
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Add => "add",
            Self::Mul => "mul",
            Self::Relu2 => "relu2",
            Self::Clamp => "clamp",
            Self::Reg => "reg",
            Self::Custom(name) => name,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output)
    }

    pub fn is_reg(&self) -> bool {
        matches!(self, Self::Reg)
    }
}

impl From<&str> for PrimitiveKind {
    fn from(tag: &str) -> Self {
        match tag {
            "input" => Self::Input,
            "output" => Self::Output,
            "add" => Self::Add,
            "mul" => Self::Mul,
            "relu2" => Self::Relu2,
            "clamp" => Self::Clamp,
            "reg" => Self::Reg,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A connection supplied to a module instance input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Connection {
    Single(Reference),
    Bus(Vec<Reference>),
}

/// An atomic operation node.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    id: String,
    kind: PrimitiveKind,
    label: Option<String>,
    inputs: IndexMap<String, Reference>,
}

impl Primitive {
    pub fn new(
        id: impl Into<String>,
        kind: PrimitiveKind,
        label: Option<String>,
        inputs: IndexMap<String, Reference>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label,
            inputs,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &PrimitiveKind {
        &self.kind
    }

    /// Display label; defaults to the operation tag.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.kind.as_str())
    }

    pub fn inputs(&self) -> &IndexMap<String, Reference> {
        &self.inputs
    }
}

/// A use of a module definition inside another graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInstance {
    id: String,
    module_type: String,
    inputs: IndexMap<String, Connection>,
}

impl ModuleInstance {
    pub fn new(
        id: impl Into<String>,
        module_type: impl Into<String>,
        inputs: IndexMap<String, Connection>,
    ) -> Self {
        Self {
            id: id.into(),
            module_type: module_type.into(),
            inputs,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn module_type(&self) -> &str {
        &self.module_type
    }

    pub fn inputs(&self) -> &IndexMap<String, Connection> {
        &self.inputs
    }
}

/// An entry of a `components` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawComponent")]
pub enum Component {
    Primitive(Primitive),
    Module(ModuleInstance),
}

impl Component {
    pub fn id(&self) -> &str {
        match self {
            Self::Primitive(primitive) => primitive.id(),
            Self::Module(instance) => instance.id(),
        }
    }
}

/// Wire form of a component before the `type` tag is interpreted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawComponent {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    module_type: Option<String>,
    #[serde(default)]
    inputs: IndexMap<String, Connection>,
}

impl TryFrom<RawComponent> for Component {
    type Error = ModelError;

    fn try_from(raw: RawComponent) -> Result<Self, Self::Error> {
        if raw.kind == MODULE_TYPE_TAG {
            let module_type = raw
                .module_type
                .ok_or_else(|| ModelError::MissingModuleType(raw.id.clone()))?;
            return Ok(Self::Module(ModuleInstance {
                id: raw.id,
                module_type,
                inputs: raw.inputs,
            }));
        }

        let kind = PrimitiveKind::from(raw.kind.as_str());
        let mut inputs = IndexMap::with_capacity(raw.inputs.len());
        if !kind.is_input() {
            for (port, connection) in raw.inputs {
                match connection {
                    Connection::Single(reference) => {
                        inputs.insert(port, reference);
                    }
                    Connection::Bus(_) => {
                        return Err(ModelError::BusOnPrimitive { id: raw.id, port });
                    }
                }
            }
        }

        Ok(Self::Primitive(Primitive {
            id: raw.id,
            kind,
            label: raw.label,
            inputs,
        }))
    }
}
