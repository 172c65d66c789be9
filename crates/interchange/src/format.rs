//! Text encodings for record documents.

use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};

use crate::InterchangeError;

/// Document syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

impl Format {
    /// YAML for `.yaml` / `.yml` files, JSON for everything else.
    pub fn from_path(path: &Path) -> Format {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

/// JSON layout. YAML output ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// One line, `", "` between items and `": "` after keys.
    Compact,
    /// Four-space indentation.
    #[default]
    Pretty,
}

/// Format plus layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Encoding {
    pub format: Format,
    pub style: JsonStyle,
}

impl Encoding {
    pub fn json(style: JsonStyle) -> Self {
        Encoding {
            format: Format::Json,
            style,
        }
    }

    pub fn yaml() -> Self {
        Encoding {
            format: Format::Yaml,
            style: JsonStyle::default(),
        }
    }

    /// Encoding chosen by file extension, pretty-printed.
    pub fn for_path(path: &Path) -> Self {
        Encoding {
            format: Format::from_path(path),
            style: JsonStyle::Pretty,
        }
    }

    /// Encode `value` into a complete document string.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, InterchangeError> {
        match self.format {
            Format::Yaml => Ok(serde_yaml::to_string(value)?),
            Format::Json => {
                let mut buf = Vec::new();
                match self.style {
                    JsonStyle::Compact => {
                        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
                        value.serialize(&mut ser)?;
                    }
                    JsonStyle::Pretty => {
                        let formatter = PrettyFormatter::with_indent(b"    ");
                        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                        value.serialize(&mut ser)?;
                    }
                }
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
        }
    }
}

/// Decode a document into a JSON value tree, keeping key order.
pub fn decode(text: &str, format: Format) -> Result<serde_json::Value, InterchangeError> {
    match format {
        Format::Json => Ok(serde_json::from_str(text)?),
        Format::Yaml => Ok(serde_yaml::from_str(text)?),
    }
}

/// Single-line JSON with a space after each separator.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}
