//! CLI logic for the Schematic diagram tool.
//!
//! The tool validates a JSON description, then flattens and lays it out
//! unless `--check` asks for validation only.
//! The validation verdict (`VALID` or `INVALID`) and every diagnostic are
//! printed to standard output; failures are returned as [`SchematicError`]
//! for rich rendering by the binary.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write},
};

use log::info;

use schematic::{DiagramBuilder, SchematicError};

/// Run the Schematic CLI application
///
/// Output goes to standard output; see [`run_with_output`].
///
/// # Errors
///
/// See [`run_with_output`].
pub fn run(args: &Args) -> Result<(), SchematicError> {
    let stdout = io::stdout();
    run_with_output(args, &mut stdout.lock())
}

/// Run the Schematic CLI application, printing the report to `out`
///
/// # Arguments
///
/// * `args` - Command-line arguments
/// * `out` - Sink for the validation verdict and the summary
///
/// # Errors
///
/// Returns `SchematicError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Validation errors
/// - Module resolution errors
/// - Layout errors
/// - Export errors
pub fn run_with_output(args: &Args, out: &mut impl Write) -> Result<(), SchematicError> {
    info!(
        input_path:? = args.input,
        output_path:? = args.output,
        check = args.check;
        "Processing diagram"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;
    let builder = DiagramBuilder::new(app_config);

    let report = builder.validate(&source);
    writeln!(out, "{}", if report.is_valid() { "VALID" } else { "INVALID" })?;
    for message in report.messages() {
        writeln!(out, "{message}")?;
    }
    if let Err(err) = report.into_result() {
        return Err(SchematicError::new_parse_error(err, source));
    }
    if args.check {
        return Ok(());
    }

    let (graph, layout) = builder.build(&source)?;
    writeln!(
        out,
        "{} primitives over {} cycles, {} feedback edges",
        graph.len(),
        layout.cycle_count(),
        layout.feedback_edges().len()
    )?;

    if let Some(output) = &args.output {
        let json = builder.export_json(&graph, &layout)?;
        fs::write(output, json)?;
        info!(output_file:? = output; "Position document exported successfully");
    }

    Ok(())
}
