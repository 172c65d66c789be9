use std::path::Path;
use std::process;

use recform_core::{Codec, Context};
use recform_interchange::load_from;

use super::{load_schema, warnings_json};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_check(schema_path: &Path, file: &Path, ctx: &Context, output: OutputFormat, quiet: bool) {
    let schema = load_schema(schema_path, output, quiet);

    let records = match load_from(file, &schema, &Codec::new(), ctx) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("load error: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "file": file.display().to_string(),
                "schema": schema.name(),
                "records": records.len(),
                "warnings": warnings_json(ctx),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
            );
        }
        OutputFormat::Text => {
            if !quiet {
                let warnings = ctx.warnings().snapshot();
                println!(
                    "{}: {} {} records, {} warnings",
                    file.display(),
                    records.len(),
                    schema.name(),
                    warnings.len()
                );
                for w in warnings {
                    println!("  warning: {}", w.message);
                }
            }
        }
    }
}
