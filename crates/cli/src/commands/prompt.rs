use std::path::Path;
use std::process;

use recform_core::{Codec, Context};
use recform_prompt::{load_prompt_and_writeback, PromptConfig};

use super::{load_schema, open_terminal, report_written};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_prompt(
    schema_path: &Path,
    file: &Path,
    create_file: bool,
    ctx: &Context,
    output: OutputFormat,
    quiet: bool,
) {
    let schema = load_schema(schema_path, output, quiet);
    let mut terminal = open_terminal(output, quiet);

    let items = match load_prompt_and_writeback(
        file,
        &schema,
        &Codec::new(),
        &PromptConfig::new(),
        create_file,
        &mut terminal,
        ctx,
    ) {
        Ok(items) => items,
        Err(e) => {
            let msg = format!("prompt error: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    report_written("wrote", file, items.len(), ctx, output, quiet);
}
