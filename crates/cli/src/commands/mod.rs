mod check;
mod convert;
mod edit;
mod prompt;

pub(crate) use check::cmd_check;
pub(crate) use convert::cmd_convert;
pub(crate) use edit::cmd_edit;
pub(crate) use prompt::cmd_prompt;

use std::path::Path;
use std::process;
use std::sync::Arc;

use recform_core::{Context, RecordSchema};
use recform_interchange::{decode, expand_home, Format};
use recform_prompt::ReadlineTerminal;

use crate::{report_error, OutputFormat};

/// Read a record schema from a JSON or YAML descriptor file, exiting on
/// failure.
pub(crate) fn load_schema(path: &Path, output: OutputFormat, quiet: bool) -> Arc<RecordSchema> {
    let path = expand_home(path);
    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            let msg = format!("error reading schema {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let parsed = decode(&text, Format::from_path(&path))
        .map_err(|e| e.to_string())
        .and_then(|tree| RecordSchema::from_json(&tree).map_err(|e| e.to_string()));
    match parsed {
        Ok(schema) => Arc::new(schema),
        Err(e) => {
            let msg = format!("schema error in {}: {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Open the console terminal, exiting on failure.
pub(crate) fn open_terminal(output: OutputFormat, quiet: bool) -> ReadlineTerminal {
    match ReadlineTerminal::new() {
        Ok(t) => t,
        Err(e) => {
            let msg = format!("terminal error: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

/// Warnings recorded on `ctx` as JSON objects.
pub(crate) fn warnings_json(ctx: &Context) -> Vec<serde_json::Value> {
    ctx.warnings()
        .snapshot()
        .into_iter()
        .map(|w| serde_json::json!({ "kind": format!("{:?}", w.kind), "message": w.message }))
        .collect()
}

/// Print the result summary of a command that wrote `count` records.
pub(crate) fn report_written(
    verb: &str,
    file: &Path,
    count: usize,
    ctx: &Context,
    output: OutputFormat,
    quiet: bool,
) {
    match output {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "file": file.display().to_string(),
                "records": count,
                "warnings": warnings_json(ctx),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).unwrap_or_else(|_| summary.to_string())
            );
        }
        OutputFormat::Text => {
            if !quiet {
                println!("{} {} ({} records)", verb, file.display(), count);
            }
        }
    }
}
