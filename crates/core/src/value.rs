//! Dynamic values and record instances.
//!
//! [`Value`] is both the in-memory field value handled by the codec and the
//! JSON-safe serialized form it produces (`Null`, `Bool`, `Int`, `Float`,
//! `Text`, `List`, `Map`). It implements [`serde::Serialize`] so the text
//! encoders in `recform-interchange` can write it directly.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::schema::RecordSchema;
use crate::Error;

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(OffsetDateTime),
    Decimal(Decimal),
    /// An enumeration member, by declared name.
    Enum(String),
    Record(RecordValue),
    List(Vec<Value>),
    /// Distinct values; equality ignores order.
    Set(Vec<Value>),
    /// Ordered string-keyed mapping, the serialized form of a record.
    Map(Vec<(String, Value)>),
    Custom(CustomValue),
}

impl Value {
    /// Build a set, dropping values equal to one already present.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Value {
        let mut distinct: Vec<Value> = Vec::new();
        for item in items {
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
        Value::Set(distinct)
    }

    pub fn text(s: impl Into<String>) -> Value {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the runtime shape, used in warnings and errors.
    pub fn shape_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "str",
            Value::Timestamp(_) => "timestamp",
            Value::Decimal(_) => "decimal",
            Value::Enum(_) => "enum",
            Value::Record(r) => r.schema().name(),
            Value::List(_) => "list",
            Value::Set(_) => "set",
            Value::Map(_) => "dict",
            Value::Custom(c) => c.type_name(),
        }
    }

    /// Entry of a `Map` by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Value::Record(r) => r.get(key),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Borrow the payload of a `Custom` value of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(c) => c.downcast_ref(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a.len() == b.len() && a.iter().all(|x| b.contains(x)),
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Timestamp(ts) => match ts.format(&Rfc3339) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "{}", ts.unix_timestamp()),
            },
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Enum(name) => write!(f, "{}", name),
            Value::Record(r) => write!(f, "{}", r),
            Value::List(items) => {
                write!(f, "[")?;
                join(f, items)?;
                write!(f, "]")
            }
            Value::Set(items) => {
                write!(f, "{{")?;
                join(f, items)?;
                write!(f, "}}")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Custom(c) => write!(f, "{:?}", c),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.serialize_i64(ts.unix_timestamp()),
            Value::Decimal(d) => serializer.serialize_str(&d.to_string()),
            Value::Enum(name) => serializer.serialize_str(name),
            Value::List(items) | Value::Set(items) => serializer.collect_seq(items),
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Record(record) => {
                let mut map = serializer.serialize_map(Some(record.values.len()))?;
                for (name, v) in record.fields() {
                    map.serialize_entry(name, v)?;
                }
                map.end()
            }
            Value::Custom(c) => Err(S::Error::custom(format!(
                "Object of type {} is not serializable",
                c.type_name()
            ))),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

// ──────────────────────────────────────────────
// Custom values
// ──────────────────────────────────────────────

trait DynValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn eq_dyn(&self, other: &dyn Any) -> bool;
}

impl<T: Any + fmt::Debug + PartialEq + Send + Sync> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|o| self == o)
    }
}

/// A value of a user type the engine only knows by name.
///
/// It round-trips through the codec only when a converter is registered for
/// its type name; otherwise it is passed through and refuses to serialize.
#[derive(Clone)]
pub struct CustomValue {
    type_name: Arc<str>,
    inner: Arc<dyn DynValue>,
}

impl CustomValue {
    pub fn new<T: Any + fmt::Debug + PartialEq + Send + Sync>(type_name: &str, value: T) -> Self {
        CustomValue {
            type_name: Arc::from(type_name),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.inner.eq_dyn(other.inner.as_any())
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.type_name, self.inner)
    }
}

// ──────────────────────────────────────────────
// Record instances
// ──────────────────────────────────────────────

/// An immutable record instance: one value per schema field, in order.
#[derive(Debug, Clone)]
pub struct RecordValue {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl RecordValue {
    /// Build from positional values; the count must match the schema.
    pub fn new(schema: Arc<RecordSchema>, values: Vec<Value>) -> Result<Self, Error> {
        if values.len() != schema.fields().len() {
            return Err(Error::Schema(format!(
                "{} has {} fields, got {} values",
                schema.name(),
                schema.fields().len(),
                values.len()
            )));
        }
        Ok(RecordValue { schema, values })
    }

    /// Positional constructor for generated code, whose value list always
    /// matches the schema it built.
    #[doc(hidden)]
    pub fn from_parts(schema: Arc<RecordSchema>, values: Vec<Value>) -> Self {
        debug_assert_eq!(values.len(), schema.fields().len());
        RecordValue { schema, values }
    }

    /// Build from field names. Fields not named hold `Null`.
    pub fn from_named(
        schema: Arc<RecordSchema>,
        named: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<Self, Error> {
        let mut values = vec![Value::Null; schema.fields().len()];
        for (name, value) in named {
            let idx = schema.position(&name).ok_or_else(|| {
                Error::Schema(format!("{} has no field '{}'", schema.name(), name))
            })?;
            values[idx] = value;
        }
        Ok(RecordValue { schema, values })
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).map(|idx| &self.values[idx])
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// `(field name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }

    /// A new instance with one field replaced.
    pub fn with(&self, name: &str, value: Value) -> Result<RecordValue, Error> {
        let idx = self.schema.position(name).ok_or_else(|| {
            Error::Schema(format!("{} has no field '{}'", self.schema.name(), name))
        })?;
        let mut values = self.values.clone();
        values[idx] = value;
        Ok(RecordValue {
            schema: Arc::clone(&self.schema),
            values,
        })
    }
}

impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.schema.name())?;
        for (i, (name, value)) in self.fields().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
