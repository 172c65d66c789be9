#![allow(clippy::result_large_err)]
//! recform-core: record schemas, dynamic values and the value codec.
//!
//! Record types are described by explicit field descriptor lists, either
//! generated with the [`record!`] macro or parsed from a JSON schema file.
//! The [`Codec`] converts record values to and from a JSON-safe
//! [`Value`] tree; the prompt and interchange crates build on it.
//!
//! # Public API
//!
//! - [`RecordSchema`], [`FieldType`], [`EnumSchema`] -- field descriptors
//! - [`Value`], [`RecordValue`] -- dynamic values
//! - [`Record`], [`FieldValue`], [`EnumType`] -- typed bridge for Rust structs
//! - [`Codec`] -- serialize / deserialize with attribute and type overrides
//! - [`Context`] -- enabled options and collected warnings, passed explicitly
//! - [`Error`] -- fatal errors

pub mod codec;
pub mod context;
pub mod error;
pub mod options;
pub mod record;
pub mod schema;
pub mod value;
pub mod warn;

// ── Convenience re-exports ───────────────────────────────────────────

pub use codec::{Codec, Converter};
pub use context::{Context, DISABLE_WARNINGS_VAR};
pub use error::Error;
pub use options::{AppOption, OptionScope, OptionSet, ENV_PREFIX};
pub use record::{EnumType, FieldValue, Mismatch, Record};
pub use schema::{
    ContainerKind, EnumSchema, FieldSignature, FieldSpec, FieldType, Primitive, RecordSchema,
    TypeClass,
};
pub use value::{CustomValue, RecordValue, Value};
pub use warn::{Warning, WarningKind, Warnings};

// Re-exported for the declaration macros and for callers building fields.
pub use rust_decimal::Decimal;
pub use time::OffsetDateTime;
