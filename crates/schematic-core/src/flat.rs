//! The flattened, primitive-only dependency graph.
//!
//! A [`FlatGraph`] is what module flattening produces and what layout
//! consumes: an ordered list of primitives whose every input names a
//! globally unique primitive id.

use std::fmt;

use indexmap::IndexMap;

use crate::{
    identifier::Id,
    model::{Component, Diagram, Primitive, PrimitiveKind},
    reference::Reference,
};

/// A resolved output port of a flattened primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    source: Id,
    port: String,
}

impl PortRef {
    pub fn new(source: Id, port: impl Into<String>) -> Self {
        Self {
            source,
            port: port.into(),
        }
    }

    /// Id of the primitive producing the value.
    pub fn source(&self) -> Id {
        self.source
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.source, self.port)
    }
}

/// A primitive after flattening, with a path-qualified id.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatPrimitive {
    id: Id,
    kind: PrimitiveKind,
    label: String,
    inputs: IndexMap<String, PortRef>,
}

impl FlatPrimitive {
    pub fn new(
        id: Id,
        kind: PrimitiveKind,
        label: impl Into<String>,
        inputs: IndexMap<String, PortRef>,
    ) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            inputs,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> &PrimitiveKind {
        &self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Input ports in declaration order.
    pub fn inputs(&self) -> &IndexMap<String, PortRef> {
        &self.inputs
    }
}

/// An ordered sequence of flattened primitives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatGraph {
    primitives: Vec<FlatPrimitive>,
}

impl FlatGraph {
    pub fn new(primitives: Vec<FlatPrimitive>) -> Self {
        Self { primitives }
    }

    pub fn primitives(&self) -> &[FlatPrimitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Finds a primitive by id.
    pub fn primitive(&self, id: Id) -> Option<&FlatPrimitive> {
        self.primitives.iter().find(|primitive| primitive.id == id)
    }

    /// Iterates over primitive ids in flattened order.
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.primitives.iter().map(FlatPrimitive::id)
    }
}

impl<'a> IntoIterator for &'a FlatGraph {
    type Item = &'a FlatPrimitive;
    type IntoIter = std::slice::Iter<'a, FlatPrimitive>;

    fn into_iter(self) -> Self::IntoIter {
        self.primitives.iter()
    }
}

impl From<&FlatGraph> for Diagram {
    /// Re-expresses a flat graph in the flat diagram shape.
    ///
    /// Flattening the result yields the same graph again.
    fn from(graph: &FlatGraph) -> Self {
        let components = graph
            .primitives
            .iter()
            .map(|primitive| {
                let inputs = primitive
                    .inputs
                    .iter()
                    .map(|(port, port_ref)| {
                        let reference =
                            Reference::component(port_ref.source.to_string(), port_ref.port.clone());
                        (port.clone(), reference)
                    })
                    .collect();
                Component::Primitive(Primitive::new(
                    primitive.id.to_string(),
                    primitive.kind.clone(),
                    Some(primitive.label.clone()),
                    inputs,
                ))
            })
            .collect();
        Diagram::Flat(components)
    }
}
