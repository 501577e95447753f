//! Module resolution: expands a [`Diagram`] into a [`FlatGraph`].
//!
//! Instantiating a module definition at path `P` produces one flattened
//! primitive per primitive component, with id `P/originalId`. Nested module
//! instances are expanded in place with path `P/instanceId`, so the
//! declaration order of the description is preserved exactly. The entry point
//! is instantiated with an empty path and keeps bare ids.
//!
//! Connections are rewritten while expanding:
//!
//! - `x.port` names a sibling of the current scope. A primitive sibling
//!   resolves to `P/x.port`; a module instance sibling resolves through the
//!   `outputMappings` of its definition, down to the primitive behind it.
//! - `$.name` and `$.name[i]` resolve to the connection bound at the
//!   instantiation site, already rewritten for the enclosing scope. Bus
//!   bindings are expanded to the indexed element.
//!
//! Flat diagrams have no definitions and no module inputs; their primitives
//! are returned with ids unchanged.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use log::{debug, info, trace};
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};
use thiserror::Error;

use schematic_core::{
    flat::{FlatGraph, FlatPrimitive, PortRef},
    identifier::Id,
    model::{Component, Connection, Diagram, HierarchicalDiagram, ModuleDefinition, ModuleInstance},
    reference::Reference,
};

/// Errors raised while flattening a diagram.
///
/// A validated description never produces these, except for `$.` references
/// inside the entry point, which has no instantiation site to bind them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("cyclic module instantiation: {}", chain.join(" -> "))]
    CyclicModule { chain: Vec<String> },

    #[error("undefined module type `{0}`")]
    UnknownModule(String),

    #[error("unresolved reference `{reference}` in {scope}")]
    UnresolvedReference { scope: String, reference: String },

    #[error("module `{module}` has no output `{output}`")]
    UnknownOutput { module: String, output: String },

    #[error("module instance `{instance}` does not connect input `{input}`")]
    MissingInput { instance: String, input: String },

    #[error("bus reference `{reference}` in {scope}: {reason}")]
    BusIndex {
        scope: String,
        reference: String,
        reason: String,
    },

    #[error("flattened id `{0}` is used more than once")]
    DuplicateId(String),
}

/// Flattens a diagram into its primitive-level graph.
///
/// # Errors
///
/// Returns a [`ResolveError`] when a module type is undefined or instantiates
/// itself, or when a connection cannot be resolved to a primitive.
///
/// # Examples
///
/// ```
/// # use schematic::resolve::flatten;
/// let diagram = schematic_parser::parse(r#"{
///     "entryPointModule": "Top",
///     "moduleDefinitions": {
///         "Double": {
///             "inputs": ["a"],
///             "outputs": ["y"],
///             "components": [
///                 {"id": "sum", "type": "add", "inputs": {"a": "$.a", "b": "$.a"}}
///             ],
///             "outputMappings": {"y": "sum.out"}
///         },
///         "Top": {
///             "inputs": [],
///             "outputs": [],
///             "components": [
///                 {"id": "x", "type": "input"},
///                 {"id": "d", "type": "module", "moduleType": "Double", "inputs": {"a": "x.out"}},
///                 {"id": "o", "type": "output", "inputs": {"a": "d.y"}}
///             ],
///             "outputMappings": {}
///         }
///     }
/// }"#).unwrap();
///
/// let graph = flatten(&diagram).unwrap();
/// let ids: Vec<String> = graph.ids().map(|id| id.to_string()).collect();
/// assert_eq!(ids, ["x", "d/sum", "o"]);
/// ```
pub fn flatten(diagram: &Diagram) -> Result<FlatGraph, ResolveError> {
    let primitives = match diagram {
        Diagram::Flat(components) => {
            let mut resolver = Resolver::new(None);
            let bindings = Bindings::new();
            let scope = Scope {
                module: None,
                components,
                path: None,
                bindings: &bindings,
            };
            resolver.expand(&scope)?;
            resolver.primitives
        }
        Diagram::Hierarchical(hierarchy) => flatten_hierarchy(hierarchy)?,
    };

    check_unique_ids(&primitives)?;

    info!(
        shape = diagram.shape(),
        primitives = primitives.len();
        "Flattened diagram",
    );
    Ok(FlatGraph::new(primitives))
}

fn flatten_hierarchy(hierarchy: &HierarchicalDiagram) -> Result<Vec<FlatPrimitive>, ResolveError> {
    check_module_cycles(hierarchy)?;

    let entry_point = hierarchy.entry_point_module();
    let mut resolver = Resolver::new(Some(hierarchy.module_definitions()));
    let definition = resolver.definition(entry_point)?;

    let bindings = Bindings::new();
    let scope = Scope {
        module: Some(entry_point),
        components: definition.components(),
        path: None,
        bindings: &bindings,
    };
    resolver.ancestors.push(entry_point);
    resolver.expand(&scope)?;
    resolver.ancestors.pop();

    Ok(resolver.primitives)
}

/// Connection bound to one declared input of an instantiated definition.
#[derive(Debug, Clone)]
enum Binding {
    Scalar(PortRef),
    Bus(Vec<PortRef>),
}

type Bindings<'d> = HashMap<&'d str, Binding>;

/// The component list being expanded, with its instantiation path and the
/// connections bound to its module inputs.
struct Scope<'d, 'b> {
    /// Module type of the scope; `None` for a flat diagram.
    module: Option<&'d str>,
    components: &'d [Component],
    path: Option<Id>,
    bindings: &'b Bindings<'d>,
}

fn scope_name(module: Option<&str>) -> String {
    match module {
        Some(module) => format!("module `{module}`"),
        None => "the flat diagram".to_string(),
    }
}

struct Resolver<'d> {
    definitions: Option<&'d IndexMap<String, ModuleDefinition>>,
    /// Module types currently being expanded, outermost first.
    ancestors: Vec<&'d str>,
    primitives: Vec<FlatPrimitive>,
}

impl<'d> Resolver<'d> {
    fn new(definitions: Option<&'d IndexMap<String, ModuleDefinition>>) -> Self {
        Self {
            definitions,
            ancestors: Vec::new(),
            primitives: Vec::new(),
        }
    }

    fn definition(&self, module_type: &str) -> Result<&'d ModuleDefinition, ResolveError> {
        self.definitions
            .and_then(|definitions| definitions.get(module_type))
            .ok_or_else(|| ResolveError::UnknownModule(module_type.to_string()))
    }

    fn expand(&mut self, scope: &Scope<'d, '_>) -> Result<(), ResolveError> {
        for component in scope.components {
            match component {
                Component::Primitive(primitive) => {
                    let inputs = primitive
                        .inputs()
                        .iter()
                        .map(|(port, reference)| {
                            Ok((port.clone(), self.resolve_reference(scope, reference)?))
                        })
                        .collect::<Result<IndexMap<_, _>, ResolveError>>()?;
                    let id = Id::within(scope.path, primitive.id());
                    trace!(id:%, kind:% = primitive.kind(); "Flattened primitive");
                    self.primitives.push(FlatPrimitive::new(
                        id,
                        primitive.kind().clone(),
                        primitive.label(),
                        inputs,
                    ));
                }
                Component::Module(instance) => self.expand_instance(scope, instance)?,
            }
        }
        Ok(())
    }

    fn expand_instance(
        &mut self,
        scope: &Scope<'d, '_>,
        instance: &'d ModuleInstance,
    ) -> Result<(), ResolveError> {
        let module_type = instance.module_type();
        let definition = self.definition(module_type)?;

        if self.ancestors.contains(&module_type) {
            let chain = self
                .ancestors
                .iter()
                .chain(std::iter::once(&module_type))
                .map(|name| name.to_string())
                .collect();
            return Err(ResolveError::CyclicModule { chain });
        }

        let bindings = self.bind_inputs(scope, instance, definition)?;
        let path = Id::within(scope.path, instance.id());
        debug!(path:%, module_type; "Expanding module instance");

        let inner = Scope {
            module: Some(module_type),
            components: definition.components(),
            path: Some(path),
            bindings: &bindings,
        };
        self.ancestors.push(module_type);
        self.expand(&inner)?;
        self.ancestors.pop();
        Ok(())
    }

    /// Resolves the connections of an instance in the enclosing scope.
    fn bind_inputs(
        &self,
        scope: &Scope<'d, '_>,
        instance: &'d ModuleInstance,
        definition: &'d ModuleDefinition,
    ) -> Result<Bindings<'d>, ResolveError> {
        let mut bindings = Bindings::with_capacity(definition.inputs().len());
        for spec in definition.inputs() {
            let connection = instance.inputs().get(spec.name()).ok_or_else(|| {
                ResolveError::MissingInput {
                    instance: Id::within(scope.path, instance.id()).to_string(),
                    input: spec.name().to_string(),
                }
            })?;
            let binding = match connection {
                Connection::Single(reference) => {
                    Binding::Scalar(self.resolve_reference(scope, reference)?)
                }
                Connection::Bus(references) => Binding::Bus(
                    references
                        .iter()
                        .map(|reference| self.resolve_reference(scope, reference))
                        .collect::<Result<_, _>>()?,
                ),
            };
            bindings.insert(spec.name(), binding);
        }
        Ok(bindings)
    }

    fn resolve_reference(
        &self,
        scope: &Scope<'d, '_>,
        reference: &'d Reference,
    ) -> Result<PortRef, ResolveError> {
        match reference {
            Reference::Component { source, port } => {
                self.resolve_component(scope.module, scope.components, scope.path, source, port)
            }
            Reference::ModuleInput { name, index } => {
                let binding = scope.bindings.get(name.as_str()).ok_or_else(|| {
                    ResolveError::UnresolvedReference {
                        scope: scope_name(scope.module),
                        reference: reference.to_string(),
                    }
                })?;
                let bus_error = |reason: String| ResolveError::BusIndex {
                    scope: scope_name(scope.module),
                    reference: reference.to_string(),
                    reason,
                };
                match (binding, index) {
                    (Binding::Scalar(port_ref), None) => Ok(port_ref.clone()),
                    (Binding::Bus(elements), Some(index)) => {
                        elements.get(*index).cloned().ok_or_else(|| {
                            bus_error(format!(
                                "index {index} is out of bounds for a bus of size {}",
                                elements.len()
                            ))
                        })
                    }
                    (Binding::Bus(_), None) => Err(bus_error("a bus input must be indexed".into())),
                    (Binding::Scalar(_), Some(_)) => {
                        Err(bus_error("a scalar input cannot be indexed".into()))
                    }
                }
            }
        }
    }

    /// Resolves `source.port` among `components`, following module instance
    /// outputs through their definitions until a primitive is reached.
    fn resolve_component(
        &self,
        mut module: Option<&'d str>,
        mut components: &'d [Component],
        mut path: Option<Id>,
        mut source: &'d str,
        mut port: &'d str,
    ) -> Result<PortRef, ResolveError> {
        loop {
            let component = components
                .iter()
                .find(|component| component.id() == source)
                .ok_or_else(|| ResolveError::UnresolvedReference {
                    scope: scope_name(module),
                    reference: format!("{source}.{port}"),
                })?;

            let instance = match component {
                Component::Primitive(_) => return Ok(PortRef::new(Id::within(path, source), port)),
                Component::Module(instance) => instance,
            };

            let module_type = instance.module_type();
            let definition = self.definition(module_type)?;
            let mapping = definition.output_mappings().get(port).ok_or_else(|| {
                ResolveError::UnknownOutput {
                    module: module_type.to_string(),
                    output: port.to_string(),
                }
            })?;
            let Reference::Component {
                source: inner_source,
                port: inner_port,
            } = mapping
            else {
                return Err(ResolveError::UnresolvedReference {
                    scope: scope_name(Some(module_type)),
                    reference: mapping.to_string(),
                });
            };

            module = Some(module_type);
            components = definition.components();
            path = Some(Id::within(path, instance.id()));
            source = inner_source.as_str();
            port = inner_port.as_str();
        }
    }
}

/// Rejects module types that instantiate themselves, directly or through
/// other types, before any expansion happens.
///
/// Only types reachable from the entry point are considered. Undefined types
/// are left for expansion to report.
fn check_module_cycles(hierarchy: &HierarchicalDiagram) -> Result<(), ResolveError> {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();

    let entry_point = hierarchy.entry_point_module();
    nodes.insert(entry_point, graph.add_node(entry_point));
    let mut queue = VecDeque::from([entry_point]);

    while let Some(name) = queue.pop_front() {
        let Some(definition) = hierarchy.module_definition(name) else {
            continue;
        };
        let from = nodes[name];
        for child in definition.instantiated_types() {
            let to = match nodes.get(child) {
                Some(&index) => index,
                None => {
                    let index = graph.add_node(child);
                    nodes.insert(child, index);
                    queue.push_back(child);
                    index
                }
            };
            graph.update_edge(from, to, ());
        }
    }

    // Report the cycle closest to the entry point: node indices follow
    // breadth-first discovery order.
    let start = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| {
            scc.len() > 1 || scc.first().is_some_and(|&node| graph.contains_edge(node, node))
        })
        .filter_map(|scc| scc.into_iter().min())
        .min();

    match start {
        Some(start) => {
            let chain = shortest_cycle(&graph, start);
            debug!(chain:?; "Cyclic module instantiation");
            Err(ResolveError::CyclicModule { chain })
        }
        None => Ok(()),
    }
}

/// Finds the shortest chain of module types leading from `start` back to
/// itself, both ends included.
fn shortest_cycle(graph: &DiGraph<&str, ()>, start: NodeIndex) -> Vec<String> {
    let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
        for next in graph.neighbors(node) {
            if next == start {
                let mut chain = vec![node];
                let mut current = node;
                while let Some(&parent) = parents.get(&current) {
                    chain.push(parent);
                    current = parent;
                }
                chain.reverse();
                chain.push(start);
                return chain.into_iter().map(|index| graph[index].to_string()).collect();
            }
            if !parents.contains_key(&next) {
                parents.insert(next, node);
                queue.push_back(next);
            }
        }
    }

    vec![graph[start].to_string()]
}

fn check_unique_ids(primitives: &[FlatPrimitive]) -> Result<(), ResolveError> {
    let mut seen = HashSet::with_capacity(primitives.len());
    for primitive in primitives {
        if !seen.insert(primitive.id()) {
            return Err(ResolveError::DuplicateId(primitive.id().to_string()));
        }
    }
    Ok(())
}
