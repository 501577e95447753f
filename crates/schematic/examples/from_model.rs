//! Example: Building a diagram from the typed model
//!
//! This example assembles a small module hierarchy with the model types
//! directly, without parsing a JSON description, then flattens and lays it
//! out.

use indexmap::IndexMap;

use schematic::{
    DiagramBuilder,
    model::{
        Component, Connection, Diagram, HierarchicalDiagram, InputSpec, ModuleDefinition,
        ModuleInstance, Primitive, PrimitiveKind,
    },
    reference::Reference,
};

fn primitive(id: &str, kind: PrimitiveKind, inputs: &[(&str, Reference)]) -> Component {
    let inputs = inputs
        .iter()
        .map(|(port, reference)| (port.to_string(), reference.clone()))
        .collect();
    Component::Primitive(Primitive::new(id, kind, None, inputs))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Building diagram from the typed model...\n");

    // A multiply-accumulate cell: the register feeds its own sum back.
    let mac = ModuleDefinition::new(
        vec![
            InputSpec::Scalar("x".to_string()),
            InputSpec::Sized {
                name: "w".to_string(),
                size: 2,
            },
        ],
        vec!["acc".to_string()],
        vec![
            primitive(
                "mul",
                PrimitiveKind::Mul,
                &[
                    ("a", Reference::module_input("x", None)),
                    ("b", Reference::module_input("w", Some(0))),
                ],
            ),
            primitive(
                "sum",
                PrimitiveKind::Add,
                &[
                    ("a", Reference::component("mul", "out")),
                    ("b", Reference::component("reg", "out")),
                ],
            ),
            primitive(
                "reg",
                PrimitiveKind::Reg,
                &[("d", Reference::component("sum", "out"))],
            ),
        ],
        IndexMap::from([("acc".to_string(), Reference::component("reg", "out"))]),
    );

    let mut instance_inputs = IndexMap::new();
    instance_inputs.insert(
        "x".to_string(),
        Connection::Single(Reference::component("x", "out")),
    );
    instance_inputs.insert(
        "w".to_string(),
        Connection::Bus(vec![
            Reference::component("w0", "out"),
            Reference::component("w1", "out"),
        ]),
    );

    let top = ModuleDefinition::new(
        Vec::new(),
        Vec::new(),
        vec![
            primitive("x", PrimitiveKind::Input, &[]),
            primitive("w0", PrimitiveKind::Input, &[]),
            primitive("w1", PrimitiveKind::Input, &[]),
            Component::Module(ModuleInstance::new("cell", "Mac", instance_inputs)),
            primitive(
                "y",
                PrimitiveKind::Output,
                &[("a", Reference::component("cell", "acc"))],
            ),
        ],
        IndexMap::new(),
    );

    let diagram = Diagram::Hierarchical(HierarchicalDiagram::new(
        "Top",
        IndexMap::from([("Mac".to_string(), mac), ("Top".to_string(), top)]),
    ));

    let builder = DiagramBuilder::default();
    let graph = builder.flatten(&diagram)?;
    let layout = builder.layout(&graph)?;

    println!("Flattened {} primitives:", graph.len());
    for (id, position) in layout.iter() {
        println!(
            "  {:<10} cycle {} row {:.2}",
            id.to_string(),
            position.cycle(),
            position.row()
        );
    }
    for edge in layout.feedback_edges() {
        println!("  feedback: {} -> {}.{}", edge.source(), edge.target(), edge.port());
    }

    println!("\n{}", builder.export_json(&graph, &layout)?);
    Ok(())
}
