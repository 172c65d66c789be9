//! Whole-file workflows: load a list, prompt, write it back.

use std::path::Path;
use std::sync::Arc;

use recform_core::{Codec, Context, Record, RecordSchema, RecordValue, WarningKind};
use recform_interchange::{dump_to, expand_home, load_from};

use crate::edit::{edit_record, EditOptions};
use crate::elicit::{prompt_record, PromptConfig};
use crate::terminal::Terminal;
use crate::PromptError;

/// Load the records in `path` (or start empty when it does not exist and
/// `create_file` is set), prompt for one more, append it and write the
/// whole list back.
#[allow(clippy::too_many_arguments)]
pub fn load_prompt_and_writeback(
    path: impl AsRef<Path>,
    schema: &Arc<RecordSchema>,
    codec: &Codec,
    config: &PromptConfig,
    create_file: bool,
    terminal: &mut dyn Terminal,
    ctx: &Context,
) -> Result<Vec<RecordValue>, PromptError> {
    let path = expand_home(path.as_ref());
    let mut items = load_or_empty(&path, schema, codec, create_file, ctx)?;
    let item = prompt_record(schema, config, terminal, ctx)?;
    items.push(item);
    dump_to(&items, &path, codec, ctx)?;
    Ok(items)
}

pub fn load_prompt_and_writeback_as<T: Record>(
    path: impl AsRef<Path>,
    codec: &Codec,
    config: &PromptConfig,
    terminal: &mut dyn Terminal,
    ctx: &Context,
) -> Result<Vec<T>, PromptError> {
    load_prompt_and_writeback(path, &T::schema(), codec, config, true, terminal, ctx)?
        .into_iter()
        .map(|r| T::from_record(r).map_err(PromptError::from))
        .collect()
}

/// Edit the record at `index` in `path` and write the list back.
#[allow(clippy::too_many_arguments)]
pub fn edit_and_writeback(
    path: impl AsRef<Path>,
    schema: &Arc<RecordSchema>,
    index: usize,
    codec: &Codec,
    config: &PromptConfig,
    options: EditOptions,
    terminal: &mut dyn Terminal,
    ctx: &Context,
) -> Result<Vec<RecordValue>, PromptError> {
    let path = expand_home(path.as_ref());
    let mut items = load_from(&path, schema, codec, ctx)?;
    let Some(target) = items.get(index) else {
        return Err(PromptError::NoSuchRecord {
            path,
            len: items.len(),
            index,
        });
    };
    let edited = edit_record(target, config, options, terminal, ctx)?;
    items[index] = edited;
    dump_to(&items, &path, codec, ctx)?;
    Ok(items)
}

fn load_or_empty(
    path: &Path,
    schema: &Arc<RecordSchema>,
    codec: &Codec,
    create_file: bool,
    ctx: &Context,
) -> Result<Vec<RecordValue>, PromptError> {
    match load_from(path, schema, codec, ctx) {
        Ok(items) => Ok(items),
        Err(e) if create_file && e.is_not_found() => {
            ctx.warn(
                WarningKind::MissingFile,
                format!("File at {} didn't exist, using empty list", path.display()),
            );
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}
