//! Lists of records to and from whole documents.
//!
//! Writers encode the full list into a string before touching their
//! destination, so an encoding failure leaves the destination as it was.
//! Readers require the top-level value to be a list.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use recform_core::{Codec, Context, Record, RecordSchema, RecordValue, Value};

use crate::format::{decode, Encoding, Format};
use crate::InterchangeError;

// ──────────────────────────────────────────────
// Encode
// ──────────────────────────────────────────────

/// Serialize `records` through `codec` into one document.
pub fn to_string(
    records: &[RecordValue],
    codec: &Codec,
    encoding: Encoding,
    ctx: &Context,
) -> Result<String, InterchangeError> {
    let serialized = records
        .iter()
        .map(|r| codec.serialize(r, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    encoding.encode(&Value::List(serialized))
}

/// Like [`to_string`], then write the whole document to `writer`.
pub fn write<W: Write>(
    records: &[RecordValue],
    writer: &mut W,
    codec: &Codec,
    encoding: Encoding,
    ctx: &Context,
) -> Result<(), InterchangeError> {
    let text = to_string(records, codec, encoding, ctx)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Overwrite the file at `path`, choosing the format from its extension.
pub fn dump_to(
    records: &[RecordValue],
    path: impl AsRef<Path>,
    codec: &Codec,
    ctx: &Context,
) -> Result<(), InterchangeError> {
    let path = expand_home(path.as_ref());
    let text = to_string(records, codec, Encoding::for_path(&path), ctx)?;
    std::fs::write(&path, text).map_err(|e| InterchangeError::file(&path, e))?;
    tracing::debug!(path = %path.display(), count = records.len(), "wrote records");
    Ok(())
}

// ──────────────────────────────────────────────
// Decode
// ──────────────────────────────────────────────

/// Parse a document and deserialize each item against `schema`.
pub fn from_str(
    text: &str,
    schema: &Arc<RecordSchema>,
    codec: &Codec,
    format: Format,
    ctx: &Context,
) -> Result<Vec<RecordValue>, InterchangeError> {
    let items = match Value::from(decode(text, format)?) {
        Value::List(items) => items,
        other => {
            return Err(InterchangeError::NotAList {
                shape: other.shape_name().to_string(),
            })
        }
    };
    items
        .iter()
        .map(|item| codec.deserialize(item, schema, ctx).map_err(InterchangeError::from))
        .collect()
}

/// Read `reader` to the end, then [`from_str`].
pub fn read<R: Read>(
    reader: &mut R,
    schema: &Arc<RecordSchema>,
    codec: &Codec,
    format: Format,
    ctx: &Context,
) -> Result<Vec<RecordValue>, InterchangeError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    from_str(&text, schema, codec, format, ctx)
}

/// Load the file at `path`, choosing the format from its extension.
pub fn load_from(
    path: impl AsRef<Path>,
    schema: &Arc<RecordSchema>,
    codec: &Codec,
    ctx: &Context,
) -> Result<Vec<RecordValue>, InterchangeError> {
    let path = expand_home(path.as_ref());
    let text = std::fs::read_to_string(&path).map_err(|e| InterchangeError::file(&path, e))?;
    let records = from_str(&text, schema, codec, Format::from_path(&path), ctx)?;
    tracing::debug!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

// ──────────────────────────────────────────────
// Typed variants
// ──────────────────────────────────────────────

pub fn to_string_as<T: Record>(
    items: &[T],
    codec: &Codec,
    encoding: Encoding,
    ctx: &Context,
) -> Result<String, InterchangeError> {
    let records: Vec<RecordValue> = items.iter().map(Record::to_record).collect();
    to_string(&records, codec, encoding, ctx)
}

pub fn from_str_as<T: Record>(
    text: &str,
    codec: &Codec,
    format: Format,
    ctx: &Context,
) -> Result<Vec<T>, InterchangeError> {
    typed(from_str(text, &T::schema(), codec, format, ctx)?)
}

pub fn dump_as<T: Record>(
    items: &[T],
    path: impl AsRef<Path>,
    codec: &Codec,
    ctx: &Context,
) -> Result<(), InterchangeError> {
    let records: Vec<RecordValue> = items.iter().map(Record::to_record).collect();
    dump_to(&records, path, codec, ctx)
}

pub fn load_as<T: Record>(
    path: impl AsRef<Path>,
    codec: &Codec,
    ctx: &Context,
) -> Result<Vec<T>, InterchangeError> {
    typed(load_from(path, &T::schema(), codec, ctx)?)
}

fn typed<T: Record>(records: Vec<RecordValue>) -> Result<Vec<T>, InterchangeError> {
    records
        .into_iter()
        .map(|r| T::from_record(r).map_err(InterchangeError::from))
        .collect()
}

/// Expand a leading `~` against `HOME`. Other paths are returned as given.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
