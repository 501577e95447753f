//! Integration tests for the DiagramBuilder API
//!
//! These tests drive descriptions through validation, flattening and layout
//! the way a caller of the public API does.

use float_cmp::assert_approx_eq;

use schematic::{
    DiagramBuilder, SchematicError,
    config::{AppConfig, LayoutConfig},
    identifier::Id,
    layout::{Layout, LayoutError},
    resolve::ResolveError,
};

const CANONICAL: &str = r#"[
    {"id": "x0", "type": "input"},
    {"id": "w0", "type": "input"},
    {"id": "bias", "type": "input"},
    {"id": "mul1", "type": "mul", "inputs": {"a": "x0.out", "b": "w0.out"}},
    {"id": "reg_bias", "type": "reg", "inputs": {"d": "bias.out"}},
    {"id": "add1", "type": "add", "inputs": {"a": "mul1.out", "b": "reg_bias.out"}},
    {"id": "relu1", "type": "relu2", "inputs": {"a": "add1.out"}},
    {"id": "output", "type": "output", "inputs": {"a": "relu1.out"}}
]"#;

const NEURON: &str = r#"{
    "entryPointModule": "Top",
    "moduleDefinitions": {
        "Neuron": {
            "inputs": ["x", {"name": "w", "size": 2}, "bias"],
            "outputs": ["y"],
            "components": [
                {"id": "mul0", "type": "mul", "inputs": {"a": "$.x", "b": "$.w[0]"}},
                {"id": "mul1", "type": "mul", "inputs": {"a": "$.x", "b": "$.w[1]"}},
                {"id": "add", "type": "add", "inputs": {"a": "mul0.out", "b": "mul1.out"}},
                {"id": "sum", "type": "add", "inputs": {"a": "add.out", "b": "$.bias"}},
                {"id": "relu", "type": "relu2", "inputs": {"a": "sum.out"}}
            ],
            "outputMappings": {"y": "relu.out"}
        },
        "Top": {
            "inputs": [],
            "outputs": [],
            "components": [
                {"id": "x", "type": "input"},
                {"id": "w0", "type": "input"},
                {"id": "w1", "type": "input"},
                {"id": "b", "type": "input"},
                {
                    "id": "n1",
                    "type": "module",
                    "moduleType": "Neuron",
                    "inputs": {"x": "x.out", "w": ["w0.out", "w1.out"], "bias": "b.out"}
                },
                {
                    "id": "n2",
                    "type": "module",
                    "moduleType": "Neuron",
                    "inputs": {"x": "n1.y", "w": ["w1.out", "w0.out"], "bias": "b.out"}
                },
                {"id": "out", "type": "output", "inputs": {"a": "n2.y"}}
            ],
            "outputMappings": {}
        }
    }
}"#;

fn cycles(layout: &Layout) -> Vec<u32> {
    layout.iter().map(|(_, position)| position.cycle()).collect()
}

fn row(layout: &Layout, id: &str) -> f64 {
    layout.position(Id::new(id)).expect("position exists").row()
}

#[test]
fn test_canonical_flat_diagram() {
    let builder = DiagramBuilder::default();
    let (graph, layout) = builder.build(CANONICAL).expect("Failed to build diagram");

    assert_eq!(graph.len(), 8);
    assert_eq!(cycles(&layout), [0, 0, 0, 1, 1, 2, 3, 4]);
    assert_approx_eq!(f64, row(&layout, "x0"), 0.0);
    assert_approx_eq!(f64, row(&layout, "w0"), 1.0);
    assert_approx_eq!(f64, row(&layout, "bias"), 2.0);
    assert_approx_eq!(f64, row(&layout, "mul1"), 0.5);
    assert_approx_eq!(f64, row(&layout, "add1"), 1.25);
    assert!(layout.feedback_edges().is_empty());
}

#[test]
fn test_validate_reports_valid_description() {
    let report = DiagramBuilder::default().validate(CANONICAL);
    assert!(report.is_valid(), "{:?}", report.messages());
    assert!(report.diagnostics().is_empty());
}

#[test]
fn test_parse_error_carries_source() {
    let source = r#"[{"id": "o", "type": "output", "inputs": {"a": "ghost.out"}}]"#;
    let err = DiagramBuilder::default().parse(source).unwrap_err();

    match err {
        SchematicError::Parse { err, src } => {
            assert_eq!(src, source);
            assert_eq!(err.diagnostics().len(), 1);
            assert!(err.to_string().contains("undefined component `ghost`"));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_hierarchy_flattens_and_lays_out() {
    let builder = DiagramBuilder::default();
    let diagram = builder.parse(NEURON).expect("Failed to parse");
    let graph = builder.flatten(&diagram).expect("Failed to flatten");

    let ids: Vec<String> = graph.ids().map(|id| id.to_string()).collect();
    assert_eq!(
        ids,
        [
            "x", "w0", "w1", "b", "n1/mul0", "n1/mul1", "n1/add", "n1/sum", "n1/relu", "n2/mul0",
            "n2/mul1", "n2/add", "n2/sum", "n2/relu", "out"
        ]
    );

    let layout = builder.layout(&graph).expect("Failed to lay out");
    let cycle = |id: &str| layout.position(Id::new(id)).unwrap().cycle();
    assert_eq!(cycle("n1/mul0"), 1);
    assert_eq!(cycle("n1/relu"), 4);
    assert_eq!(cycle("n2/mul0"), 5);
    assert_eq!(cycle("out"), 9);
}

#[test]
fn test_instances_share_no_primitives() {
    let builder = DiagramBuilder::default();
    let graph = builder.flatten(&builder.parse(NEURON).unwrap()).unwrap();

    let first = graph.primitive(Id::new("n1/mul0")).unwrap();
    let second = graph.primitive(Id::new("n2/mul0")).unwrap();
    assert_eq!(first.inputs()["b"].to_string(), "w0.out");
    assert_eq!(second.inputs()["b"].to_string(), "w1.out");
    assert_eq!(second.inputs()["a"].to_string(), "n1/relu.out");
}

#[test]
fn test_flatten_is_idempotent() {
    let builder = DiagramBuilder::default();
    let graph = builder.flatten(&builder.parse(NEURON).unwrap()).unwrap();

    let again = builder
        .flatten(&schematic::model::Diagram::from(&graph))
        .unwrap();
    assert_eq!(again, graph);
}

#[test]
fn test_wrong_bus_length_fails_validation() {
    let source = NEURON.replace(r#"["w1.out", "w0.out"]"#, r#"["w1.out"]"#);
    let report = DiagramBuilder::default().validate(&source);

    assert!(!report.is_valid());
    assert!(
        report
            .messages()
            .iter()
            .any(|message| message.contains("expects an array of 2 connections"))
    );
}

#[test]
fn test_bus_index_out_of_bounds_fails_validation() {
    let source = NEURON.replace("$.w[1]", "$.w[2]");
    let report = DiagramBuilder::default().validate(&source);
    assert!(
        report
            .messages()
            .iter()
            .any(|message| message.contains("index 2 is out of bounds"))
    );
}

#[test]
fn test_self_instantiation_fails() {
    let source = r#"{
        "entryPointModule": "Top",
        "moduleDefinitions": {
            "Loop": {
                "inputs": [],
                "outputs": [],
                "components": [{"id": "again", "type": "module", "moduleType": "Loop", "inputs": {}}],
                "outputMappings": {}
            },
            "Top": {
                "inputs": [],
                "outputs": [],
                "components": [{"id": "l", "type": "module", "moduleType": "Loop", "inputs": {}}],
                "outputMappings": {}
            }
        }
    }"#;

    let builder = DiagramBuilder::default();
    let diagram = builder.parse(source).expect("cycles pass schema validation");
    let err = builder.flatten(&diagram).unwrap_err();
    assert!(matches!(
        err,
        SchematicError::Resolve(ResolveError::CyclicModule { ref chain }) if chain == &["Loop", "Loop"]
    ));
}

#[test]
fn test_combinational_loop_fails_layout() {
    let source = r#"[
        {"id": "x", "type": "input"},
        {"id": "a", "type": "add", "inputs": {"a": "x.out", "b": "b.out"}},
        {"id": "b", "type": "relu2", "inputs": {"a": "a.out"}}
    ]"#;

    let err = DiagramBuilder::default().build(source).unwrap_err();
    match err {
        SchematicError::Layout(LayoutError::CombinationalCycle(ids)) => {
            assert_eq!(ids, [Id::new("a"), Id::new("b")]);
        }
        other => panic!("expected a combinational cycle, got {other:?}"),
    }
}

#[test]
fn test_row_mean_is_exact() {
    let source = r#"[
        {"id": "i0", "type": "input"},
        {"id": "i1", "type": "input"},
        {"id": "i2", "type": "input"},
        {"id": "i3", "type": "input"},
        {"id": "m", "type": "add", "inputs": {"a": "i1.out", "b": "i3.out"}}
    ]"#;
    let (_, layout) = DiagramBuilder::default().build(source).unwrap();
    assert_eq!(row(&layout, "m"), 2.0);
}

fn two_adders(p: (&str, &str), q: (&str, &str)) -> String {
    format!(
        r#"[
            {{"id": "i0", "type": "input"}},
            {{"id": "i1", "type": "input"}},
            {{"id": "i2", "type": "input"}},
            {{"id": "i3", "type": "input"}},
            {{"id": "p", "type": "add", "inputs": {{"a": "{}.out", "b": "{}.out"}}}},
            {{"id": "q", "type": "add", "inputs": {{"a": "{}.out", "b": "{}.out"}}}}
        ]"#,
        p.0, p.1, q.0, q.1
    )
}

#[test]
fn test_swapping_equal_average_inputs_keeps_rows() {
    let builder = DiagramBuilder::default();
    let (_, before) = builder.build(&two_adders(("i0", "i3"), ("i1", "i2"))).unwrap();
    let (_, after) = builder.build(&two_adders(("i1", "i2"), ("i0", "i3"))).unwrap();

    for id in ["p", "q"] {
        assert_approx_eq!(f64, row(&before, id), 1.5);
        assert_approx_eq!(f64, row(&after, id), 1.5);
    }
}

#[test]
fn test_output_cycle_offset_from_config() {
    let config = AppConfig::new(LayoutConfig::new(2, 100.0, 100.0));
    let builder = DiagramBuilder::new(config);
    let (_, layout) = builder.build(CANONICAL).unwrap();

    assert_eq!(cycles(&layout), [0, 0, 0, 1, 1, 2, 3, 6]);
}

#[test]
fn test_export_json_positions() {
    let config = AppConfig::new(LayoutConfig::new(0, 120.0, 60.0));
    let builder = DiagramBuilder::new(config);
    let (graph, layout) = builder.build(CANONICAL).unwrap();

    let json = builder.export_json(&graph, &layout).unwrap();
    let document: serde_json::Value = serde_json::from_str(&json).unwrap();

    let output = &document["nodes"][7];
    assert_eq!(output["id"], "output");
    assert_eq!(output["cycle"], 4);
    assert_approx_eq!(f64, output["x"].as_f64().unwrap(), 480.0);
    assert_approx_eq!(f64, output["y"].as_f64().unwrap(), 75.0);
    assert_eq!(document["cycles"], 5);
}

#[test]
fn test_unmapped_output_is_caught_before_flattening() {
    let source = NEURON.replace(r#""outputMappings": {"y": "relu.out"}"#, r#""outputMappings": {}"#);
    let builder = DiagramBuilder::default();

    assert!(!builder.validate(&source).is_valid());
    match builder.build(&source).unwrap_err() {
        SchematicError::Parse { err, .. } => {
            assert!(err.to_string().contains("output `y` is never mapped"));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_valid_descriptions_with_ignored_inputs_build() {
    let source = NEURON.replace(
        r#""inputs": {"x": "x.out","#,
        r#""inputs": {"gain": ["x.out", "b.out"], "x": "x.out","#,
    );
    assert_ne!(source, NEURON);

    let builder = DiagramBuilder::default();
    let report = builder.validate(&source);
    assert!(report.is_valid());
    assert_eq!(report.warnings().count(), 1);
    builder.build(&source).expect("warnings do not stop the pipeline");
}
