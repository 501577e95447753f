//! End-to-end tests of the CLI on files in a temporary directory.

use std::{fs, path::Path};

use schematic::SchematicError;
use schematic_cli::{Args, run_with_output};

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

fn args(input: &Path, output: Option<&Path>, config: Option<&Path>) -> Args {
    Args {
        input: input.to_path_buf(),
        output: output.map(Path::to_path_buf),
        config: config.map(Path::to_path_buf),
        check: false,
        log_level: "off".to_string(),
    }
}

fn run_to_string(args: &Args) -> (Result<(), SchematicError>, String) {
    let mut out = Vec::new();
    let result = run_with_output(args, &mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
fn test_valid_description_writes_positions() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("canonical.json");
    let output = dir.path().join("positions.json");
    let config = dir.path().join("config.toml");
    fs::write(&input, CANONICAL).unwrap();
    fs::write(&config, "[layout]\ncolumn_spacing = 50.0\n").unwrap();

    let (result, printed) = run_to_string(&args(&input, Some(&output), Some(&config)));
    result.unwrap();

    let mut lines = printed.lines();
    assert_eq!(lines.next(), Some("VALID"));
    assert_eq!(lines.next(), Some("8 primitives over 5 cycles, 0 feedback edges"));

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(document["columnSpacing"], 50.0);
    assert_eq!(document["nodes"][7]["x"], 200.0);
}

#[test]
fn test_invalid_description_prints_every_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.json");
    fs::write(
        &input,
        r#"[
            {"id": "a", "type": "add", "inputs": {"a": "ghost.out"}},
            {"id": "b", "type": "add", "inputs": {"a": "phantom.out"}}
        ]"#,
    )
    .unwrap();

    let (result, printed) = run_to_string(&args(&input, None, None));

    let lines: Vec<_> = printed.lines().collect();
    assert_eq!(lines[0], "INVALID");
    assert_eq!(lines.len(), 3);
    assert!(lines[1].contains("undefined component `ghost`"));
    assert!(lines[2].contains("undefined component `phantom`"));

    match result {
        Err(SchematicError::Parse { err, .. }) => assert_eq!(err.diagnostics().len(), 2),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_layout_failure_is_reported_after_valid() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("loop.json");
    fs::write(
        &input,
        r#"[
            {"id": "a", "type": "add", "inputs": {"a": "b.out"}},
            {"id": "b", "type": "relu2", "inputs": {"a": "a.out"}}
        ]"#,
    )
    .unwrap();

    let (result, printed) = run_to_string(&args(&input, None, None));
    assert_eq!(printed.lines().next(), Some("VALID"));
    assert!(matches!(result, Err(SchematicError::Layout(_))));
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let (result, printed) = run_to_string(&args(&dir.path().join("absent.json"), None, None));

    assert!(printed.is_empty());
    assert!(matches!(result, Err(SchematicError::Io(_))));
}

#[test]
fn test_check_stops_after_validation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("loop.json");
    fs::write(
        &input,
        r#"[
            {"id": "a", "type": "add", "inputs": {"a": "b.out"}},
            {"id": "b", "type": "relu2", "inputs": {"a": "a.out"}}
        ]"#,
    )
    .unwrap();

    let args = Args {
        check: true,
        ..args(&input, None, None)
    };
    let (result, printed) = run_to_string(&args);

    result.unwrap();
    assert_eq!(printed, "VALID\n");
}
