use std::path::Path;
use std::process;

use recform_core::{Codec, Context};
use recform_interchange::{expand_home, load_from, to_string, Encoding, Format, JsonStyle};

use super::{load_schema, report_written};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_convert(
    schema_path: &Path,
    input: &Path,
    output_file: &Path,
    compact: bool,
    ctx: &Context,
    output: OutputFormat,
    quiet: bool,
) {
    let schema = load_schema(schema_path, output, quiet);
    let codec = Codec::new();

    let records = match load_from(input, &schema, &codec, ctx) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("load error: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let target = expand_home(output_file);
    let encoding = match Format::from_path(&target) {
        Format::Json if compact => Encoding::json(JsonStyle::Compact),
        Format::Json => Encoding::json(JsonStyle::Pretty),
        Format::Yaml => {
            if compact {
                tracing::warn!("--compact only applies to JSON output, ignoring");
            }
            Encoding::yaml()
        }
    };

    let text = match to_string(&records, &codec, encoding, ctx) {
        Ok(t) => t,
        Err(e) => {
            let msg = format!("encode error: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    if let Err(e) = std::fs::write(&target, text) {
        let msg = format!("error writing {}: {}", target.display(), e);
        report_error(&msg, output, quiet);
        process::exit(1);
    }

    report_written("wrote", &target, records.len(), ctx, output, quiet);
}
