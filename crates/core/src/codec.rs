//! Value codec: record values to and from their JSON-safe form.
//!
//! Per field, an attribute-keyed override wins outright. Otherwise the
//! declared type is classified: containers map their elements through the
//! scalar converter, scalars go through a type-keyed override if one is
//! registered and then through the built-in conversion for their class.
//! Anything the codec does not know how to handle is warned about and passed
//! through unchanged, so the text encoder is the one that fails on it.
//!
//! Attribute overrides apply to the top-level record only. Type overrides are
//! shared with nested records.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::context::Context;
use crate::options::AppOption;
use crate::record::{FieldValue, Record};
use crate::schema::{ContainerKind, EnumSchema, FieldType, Primitive, RecordSchema, TypeClass};
use crate::value::{RecordValue, Value};
use crate::warn::WarningKind;
use crate::Error;

/// A user-supplied conversion for one direction.
pub type Converter = Box<dyn Fn(&Value) -> Result<Value, Error>>;

/// Override registries plus the built-in conversions.
#[derive(Default)]
pub struct Codec {
    attr_serializers: HashMap<String, Converter>,
    attr_deserializers: HashMap<String, Converter>,
    type_serializers: HashMap<String, Converter>,
    type_deserializers: HashMap<String, Converter>,
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn keys(map: &HashMap<String, Converter>) -> Vec<&str> {
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            keys
        }
        f.debug_struct("Codec")
            .field("attr_serializers", &keys(&self.attr_serializers))
            .field("attr_deserializers", &keys(&self.attr_deserializers))
            .field("type_serializers", &keys(&self.type_serializers))
            .field("type_deserializers", &keys(&self.type_deserializers))
            .finish()
    }
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the field `name` with `f`, bypassing all type handling.
    pub fn with_attr_serializer(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.attr_serializers.insert(name.into(), Box::new(f));
        self
    }

    /// Deserialize the field `name` with `f`. It receives the raw loaded
    /// value, `Null` when the key is missing.
    pub fn with_attr_deserializer(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.attr_deserializers.insert(name.into(), Box::new(f));
        self
    }

    /// Serialize every scalar of type `ty` with `f`.
    pub fn with_type_serializer(
        mut self,
        ty: &FieldType,
        f: impl Fn(&Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.type_serializers.insert(ty.key(), Box::new(f));
        self
    }

    pub fn with_type_deserializer(
        mut self,
        ty: &FieldType,
        f: impl Fn(&Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.type_deserializers.insert(ty.key(), Box::new(f));
        self
    }

    /// [`with_type_serializer`](Self::with_type_serializer) keyed by a Rust
    /// field type.
    pub fn with_serializer_for<T: FieldValue>(
        self,
        f: impl Fn(&Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.with_type_serializer(&T::field_type(), f)
    }

    pub fn with_deserializer_for<T: FieldValue>(
        self,
        f: impl Fn(&Value) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.with_type_deserializer(&T::field_type(), f)
    }

    // ──────────────────────────────────────────────
    // Serialize
    // ──────────────────────────────────────────────

    /// Serialize a record into an ordered `Value::Map` keyed by field name.
    pub fn serialize(&self, record: &RecordValue, ctx: &Context) -> Result<Value, Error> {
        self.serialize_record(record, true, ctx)
    }

    pub fn serialize_as<T: Record>(&self, item: &T, ctx: &Context) -> Result<Value, Error> {
        self.serialize(&item.to_record(), ctx)
    }

    fn serialize_record(&self, record: &RecordValue, top: bool, ctx: &Context) -> Result<Value, Error> {
        let schema = Arc::clone(record.schema());
        let mut out = Vec::with_capacity(schema.fields().len());
        for (field, value) in schema.signature().into_iter().zip(record.values()) {
            if top {
                if let Some(f) = self.attr_serializers.get(field.name) {
                    out.push((field.name.to_string(), f(value)?));
                    continue;
                }
            }
            let serialized = match field.ty.classify() {
                TypeClass::Container(_, element) => {
                    self.serialize_container(field.name, value, element, field.optional, ctx)?
                }
                _ => self.serialize_scalar(value, field.ty, field.optional, ctx)?,
            };
            out.push((field.name.to_string(), serialized));
        }
        Ok(Value::Map(out))
    }

    fn serialize_container(
        &self,
        name: &str,
        value: &Value,
        element: &FieldType,
        optional: bool,
        ctx: &Context,
    ) -> Result<Value, Error> {
        match value {
            Value::Null if optional => Ok(Value::Null),
            Value::Null => {
                ctx.warn(
                    WarningKind::EmptyContainer,
                    format!(
                        "No value found for non-optional type {}, defaulting to empty container",
                        name
                    ),
                );
                Ok(Value::List(Vec::new()))
            }
            Value::List(items) | Value::Set(items) => {
                let (element, element_optional) = element.strip_optional();
                let out = items
                    .iter()
                    .map(|item| self.serialize_scalar(item, element, element_optional, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(out))
            }
            other => {
                ctx.warn(
                    WarningKind::TypeMismatch,
                    format!("For value {}, expected a container, found {}", other, other.shape_name()),
                );
                Ok(other.clone())
            }
        }
    }

    fn serialize_scalar(
        &self,
        value: &Value,
        ty: &FieldType,
        optional: bool,
        ctx: &Context,
    ) -> Result<Value, Error> {
        if let Some(f) = self.type_serializers.get(&ty.key()) {
            return f(value);
        }
        if let (FieldType::Primitive(Primitive::Timestamp), Value::Timestamp(ts)) = (ty, value) {
            return Ok(Value::Int(ts.unix_timestamp()));
        }
        if value.is_null() {
            if !optional {
                ctx.warn(
                    WarningKind::NullNonOptional,
                    format!(
                        "No value for non-optional type null, attempting to be serialized to {}",
                        ty
                    ),
                );
            }
            return Ok(Value::Null);
        }
        match (ty.classify(), value) {
            (TypeClass::Primitive(Primitive::Decimal), Value::Decimal(d)) => {
                return Ok(Value::Text(d.to_string()))
            }
            (TypeClass::Primitive(_), Value::Custom(_)) => {}
            (TypeClass::Primitive(_), _) => return Ok(value.clone()),
            (TypeClass::Enum(_), Value::Enum(member)) => return Ok(Value::Text(member.clone())),
            (TypeClass::Record(_), Value::Record(nested)) => {
                return self.serialize_record(nested, false, ctx)
            }
            _ => {}
        }
        ctx.warn(
            WarningKind::NoSerializer,
            format!("No known way to serialize {}", ty),
        );
        Ok(value.clone())
    }

    // ──────────────────────────────────────────────
    // Deserialize
    // ──────────────────────────────────────────────

    /// Build a record of `schema` from a loaded mapping.
    pub fn deserialize(
        &self,
        data: &Value,
        schema: &Arc<RecordSchema>,
        ctx: &Context,
    ) -> Result<RecordValue, Error> {
        self.deserialize_record(data, schema, true, ctx)
    }

    pub fn deserialize_as<T: Record>(&self, data: &Value, ctx: &Context) -> Result<T, Error> {
        T::from_record(self.deserialize(data, &T::schema(), ctx)?)
    }

    fn deserialize_record(
        &self,
        data: &Value,
        schema: &Arc<RecordSchema>,
        top: bool,
        ctx: &Context,
    ) -> Result<RecordValue, Error> {
        let entries = match data {
            Value::Map(entries) => entries,
            other => {
                return Err(Error::NotARecord {
                    record: schema.name().to_string(),
                    found: other.shape_name().to_string(),
                })
            }
        };
        if schema.is_empty() {
            ctx.warn(
                WarningKind::NoFields,
                format!("No fields declared on {}, may not be a record type?", schema.name()),
            );
        }

        let mut values = Vec::with_capacity(schema.fields().len());
        for field in schema.signature() {
            let loaded = entries
                .iter()
                .find(|(k, _)| k == field.name)
                .map(|(_, v)| v)
                .unwrap_or(&Value::Null);

            if top {
                if let Some(f) = self.attr_deserializers.get(field.name) {
                    values.push(f(loaded)?);
                    continue;
                }
            }

            if loaded.is_null() && !field.optional {
                ctx.warn(
                    WarningKind::MissingKey,
                    format!(
                        "Expected key {} on non-optional field, no such key existed in loaded data",
                        field.name
                    ),
                );
            }

            let value = match field.ty.classify() {
                TypeClass::Container(kind, element) => {
                    self.deserialize_container(field.name, loaded, kind, element, field.optional, ctx)?
                }
                _ => self.deserialize_scalar(loaded, field.ty, field.optional, ctx)?,
            };
            values.push(value);
        }
        tracing::debug!(record = schema.name(), "deserialized record");
        Ok(RecordValue::from_parts(Arc::clone(schema), values))
    }

    fn deserialize_container(
        &self,
        name: &str,
        loaded: &Value,
        kind: ContainerKind,
        element: &FieldType,
        optional: bool,
        ctx: &Context,
    ) -> Result<Value, Error> {
        let items = match loaded {
            Value::Null if optional => return Ok(Value::Null),
            Value::Null => {
                ctx.warn(
                    WarningKind::EmptyContainer,
                    format!(
                        "No value loaded for non-optional type {}, defaulting to empty container",
                        name
                    ),
                );
                Vec::new()
            }
            Value::List(items) | Value::Set(items) => {
                let (element, element_optional) = element.strip_optional();
                items
                    .iter()
                    .map(|item| self.deserialize_scalar(item, element, element_optional, ctx))
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => {
                ctx.warn(
                    WarningKind::TypeMismatch,
                    format!("For value {}, expected a container, found {}", other, other.shape_name()),
                );
                return Ok(other.clone());
            }
        };
        Ok(match kind {
            ContainerKind::List => Value::List(items),
            ContainerKind::Set => Value::set(items),
        })
    }

    fn deserialize_scalar(
        &self,
        value: &Value,
        ty: &FieldType,
        optional: bool,
        ctx: &Context,
    ) -> Result<Value, Error> {
        if let Some(f) = self.type_deserializers.get(&ty.key()) {
            return f(value);
        }
        if optional && value.is_null() {
            return Ok(Value::Null);
        }
        match ty.classify() {
            TypeClass::Primitive(Primitive::Timestamp) => Ok(load_timestamp(value, ctx)?),
            TypeClass::Primitive(Primitive::Decimal) => Ok(load_decimal(value, ctx)?),
            TypeClass::Primitive(p) => Ok(coerce_primitive(value, p, ctx)),
            TypeClass::Enum(e) => load_enum(value, e, ctx),
            TypeClass::Record(_) if value.is_null() => Ok(Value::Null),
            TypeClass::Record(schema) => self
                .deserialize_record(value, schema, false, ctx)
                .map(Value::Record),
            _ => {
                ctx.warn(
                    WarningKind::NoDeserializer,
                    format!("No known way to deserialize {}", ty),
                );
                Ok(value.clone())
            }
        }
    }
}

// ──────────────────────────────────────────────
// Scalar conversions
// ──────────────────────────────────────────────

fn mismatch(value: &Value, expected: &str, ctx: &Context) {
    ctx.warn(
        WarningKind::TypeMismatch,
        format!(
            "For value {}, expected type {}, found {}",
            value,
            expected,
            value.shape_name()
        ),
    );
}

/// Coerce a loaded value to a text, int, float or bool primitive. Integer to
/// float is silent; every other shape change warns, and a value that cannot
/// be coerced is passed through.
fn coerce_primitive(value: &Value, p: Primitive, ctx: &Context) -> Value {
    match (p, value) {
        (Primitive::Text, Value::Text(_))
        | (Primitive::Int, Value::Int(_))
        | (Primitive::Float, Value::Float(_))
        | (Primitive::Bool, Value::Bool(_)) => return value.clone(),
        (Primitive::Float, Value::Int(i)) => return Value::Float(*i as f64),
        _ => {}
    }
    mismatch(value, p.name(), ctx);
    let coerced = match (p, value) {
        (Primitive::Int, Value::Float(x)) if x.fract() == 0.0 => Some(Value::Int(*x as i64)),
        (Primitive::Int, Value::Text(s)) => s.trim().parse().ok().map(Value::Int),
        (Primitive::Float, Value::Text(s)) => s.trim().parse().ok().map(Value::Float),
        (Primitive::Text, Value::Int(i)) => Some(Value::Text(i.to_string())),
        (Primitive::Text, Value::Float(x)) => Some(Value::Text(x.to_string())),
        (Primitive::Text, Value::Bool(b)) => Some(Value::Text(b.to_string())),
        (Primitive::Bool, Value::Int(i)) => Some(Value::Bool(*i != 0)),
        _ => None,
    };
    coerced.unwrap_or_else(|| value.clone())
}

/// Epoch seconds (integer or fractional) to a UTC timestamp. RFC 3339 text is
/// accepted as well.
fn load_timestamp(value: &Value, ctx: &Context) -> Result<Value, Error> {
    match value {
        Value::Int(secs) => OffsetDateTime::from_unix_timestamp(*secs)
            .map(Value::Timestamp)
            .map_err(|e| Error::InvalidTimestamp {
                value: secs.to_string(),
                message: e.to_string(),
            }),
        Value::Float(secs) => OffsetDateTime::from_unix_timestamp_nanos((*secs * 1e9) as i128)
            .map(Value::Timestamp)
            .map_err(|e| Error::InvalidTimestamp {
                value: secs.to_string(),
                message: e.to_string(),
            }),
        Value::Text(s) => OffsetDateTime::parse(s.trim(), &Rfc3339)
            .map(Value::Timestamp)
            .map_err(|e| Error::InvalidTimestamp {
                value: s.clone(),
                message: e.to_string(),
            }),
        Value::Timestamp(_) => Ok(value.clone()),
        other => {
            mismatch(other, Primitive::Timestamp.name(), ctx);
            Ok(other.clone())
        }
    }
}

fn load_decimal(value: &Value, ctx: &Context) -> Result<Value, Error> {
    match value {
        Value::Text(s) => Decimal::from_str(s.trim())
            .map(Value::Decimal)
            .map_err(|e| Error::InvalidDecimal {
                value: s.clone(),
                message: e.to_string(),
            }),
        Value::Decimal(_) => Ok(value.clone()),
        Value::Int(i) => {
            mismatch(value, Primitive::Decimal.name(), ctx);
            Ok(Value::Decimal(Decimal::from(*i)))
        }
        Value::Float(x) => {
            mismatch(value, Primitive::Decimal.name(), ctx);
            Decimal::try_from(*x)
                .map(Value::Decimal)
                .map_err(|e| Error::InvalidDecimal {
                    value: x.to_string(),
                    message: e.to_string(),
                })
        }
        other => {
            mismatch(other, Primitive::Decimal.name(), ctx);
            Ok(other.clone())
        }
    }
}

/// Members are matched by declared name only.
fn load_enum(value: &Value, schema: &EnumSchema, ctx: &Context) -> Result<Value, Error> {
    let token = match value {
        Value::Null => return Ok(Value::Null),
        Value::Text(s) | Value::Enum(s) => s.clone(),
        other => other.to_string(),
    };
    if let Some(member) = schema.member(&token) {
        return Ok(Value::Enum(member.to_string()));
    }
    if ctx.is_enabled(AppOption::ConvertUnknownEnumToNone) {
        tracing::debug!(token = %token, enum_name = schema.name(), "unknown enum member loaded as null");
        return Ok(Value::Null);
    }
    Err(Error::UnknownEnumMember {
        token,
        enum_name: schema.name().to_string(),
        members: schema.members().to_vec(),
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
