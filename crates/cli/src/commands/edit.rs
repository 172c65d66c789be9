use std::path::Path;
use std::process;

use recform_core::{Codec, Context};
use recform_interchange::load_from;
use recform_prompt::{edit_and_writeback, EditOptions, PromptConfig};

use super::{load_schema, open_terminal, report_written};
use crate::{report_error, OutputFormat};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_edit(
    schema_path: &Path,
    file: &Path,
    index: Option<usize>,
    repeat: bool,
    show_record: bool,
    ctx: &Context,
    output: OutputFormat,
    quiet: bool,
) {
    let schema = load_schema(schema_path, output, quiet);
    let codec = Codec::new();

    let index = match index {
        Some(i) => i,
        None => {
            // Count against a silent context; the edit itself reloads and warns.
            let counting = Context::new();
            counting.warnings().suppress(true);
            match load_from(file, &schema, &codec, &counting) {
                Ok(items) if !items.is_empty() => items.len() - 1,
                Ok(_) => {
                    let msg = format!("{} holds no records to edit", file.display());
                    report_error(&msg, output, quiet);
                    process::exit(1);
                }
                Err(e) => {
                    let msg = format!("load error: {}", e);
                    report_error(&msg, output, quiet);
                    process::exit(1);
                }
            }
        }
    };

    let options = EditOptions {
        repeat,
        show_record,
    };
    let mut terminal = open_terminal(output, quiet);
    let items = match edit_and_writeback(
        file,
        &schema,
        index,
        &codec,
        &PromptConfig::new(),
        options,
        &mut terminal,
        ctx,
    ) {
        Ok(items) => items,
        Err(e) => {
            let msg = format!("edit error: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    report_written("updated", file, items.len(), ctx, output, quiet);
}
