//! Dataflow CLI library
//!
//! This module contains the core CLI logic: reading a definition, running
//! the requested subcommand through [`DefinitionService`] and writing the
//! result to stdout or the output file.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, CheckArgs, Command, DefinitionKind, StreamArgs, TaskArgs};

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use log::{info, warn};

use dataflow::{DataflowError, DefinitionService};

/// Run the Dataflow CLI application
///
/// # Errors
///
/// Returns `DataflowError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing and validation errors
/// - Graph errors
pub fn run(args: &Args) -> Result<(), DataflowError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let service = DefinitionService::new(app_config);

    let rendered = match &args.command {
        Command::Stream(stream) => run_stream(&service, stream)?,
        Command::Task(task) => run_task(&service, task)?,
        Command::Check(check) => run_check(&service, check)?,
    };

    write_output(args.output.as_deref(), &rendered)
}

fn run_stream(service: &DefinitionService, args: &StreamArgs) -> Result<String, DataflowError> {
    let source = read_input(&args.input)?;
    let name = definition_name(args.name.as_deref(), &args.input).unwrap_or("stream");
    info!(stream = name, input = args.input; "Processing stream definition");

    match (args.dsl, args.sanitize) {
        (true, true) => service.sanitize_stream_dsl(name, &source),
        (true, false) => service.stream_dsl(name, &source),
        (false, true) => service.to_json(&service.sanitized_app_definitions(name, &source)?),
        (false, false) => service.to_json(&service.app_definitions(name, &source)?),
    }
}

fn run_task(service: &DefinitionService, args: &TaskArgs) -> Result<String, DataflowError> {
    let source = read_input(&args.input)?;
    let name = definition_name(args.name.as_deref(), &args.input);
    info!(task = name.unwrap_or_default(), input = args.input; "Processing task definition");

    if args.executable {
        return Ok(service.parse_task(name, &source)?.to_executable_dsl());
    }
    if args.dsl && args.sanitize {
        return service.sanitize_task_dsl(name, &source);
    }

    let graph = service.task_graph(name, &source)?;
    if args.graph {
        Ok(graph.to_verbose_string())
    } else if args.dsl {
        Ok(graph.to_dsl_text()?)
    } else {
        service.to_json(&graph)
    }
}

fn run_check(service: &DefinitionService, args: &CheckArgs) -> Result<String, DataflowError> {
    let source = read_input(&args.input)?;
    let name = definition_name(args.name.as_deref(), &args.input);
    let kind = args.kind.unwrap_or_else(|| guess_kind(&args.input));
    info!(input = args.input, kind:?; "Checking definition");

    match kind {
        DefinitionKind::Stream => {
            let stream = service.parse_stream(name.unwrap_or("stream"), &source)?;
            Ok(format!("stream ok: {} app(s)", stream.apps().len()))
        }
        DefinitionKind::Task => {
            let warnings = service.check_task(name, &source)?;
            for reportable in error_adapter::warning_reportables(&warnings, &source) {
                warn!("{}", error_adapter::render(&reportable));
            }
            Ok(format!("task ok: {} warning(s)", warnings.len()))
        }
    }
}

/// Definitions stored in `.task` files are composed tasks, anything else is
/// read as a stream.
fn guess_kind(input: &str) -> DefinitionKind {
    match Path::new(input).extension().and_then(|ext| ext.to_str()) {
        Some("task") => DefinitionKind::Task,
        _ => DefinitionKind::Stream,
    }
}

/// The explicit name, else the input file stem. Stdin has no name.
fn definition_name<'a>(explicit: Option<&'a str>, input: &'a str) -> Option<&'a str> {
    if explicit.is_some() {
        return explicit;
    }
    if input == "-" {
        return None;
    }
    Path::new(input).file_stem().and_then(|stem| stem.to_str())
}

fn read_input(input: &str) -> Result<String, DataflowError> {
    let source = if input == "-" {
        io::read_to_string(io::stdin())?
    } else {
        fs::read_to_string(input)?
    };
    Ok(source.trim_end().to_string())
}

fn write_output(output: Option<&str>, rendered: &str) -> Result<(), DataflowError> {
    match output {
        Some(path) => {
            fs::write(path, format!("{rendered}\n"))?;
            info!(output_file = path; "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{rendered}")?;
        }
    }
    Ok(())
}
