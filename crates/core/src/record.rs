//! Typed bridge between Rust structs and dynamic record values.
//!
//! [`FieldValue`] maps a Rust field type to its [`FieldType`] descriptor and
//! converts values both ways. The [`record!`](crate::record) macro declares a
//! struct and implements [`Record`] for it, building the field descriptor
//! list once per type. [`enumeration!`](crate::enumeration) and
//! [`custom_field!`](crate::custom_field) do the same for enums and
//! user-handled types.

use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::schema::{EnumSchema, FieldType, RecordSchema};
use crate::value::{RecordValue, Value};
use crate::Error;

/// A Rust type with a fixed, named field list.
pub trait Record: Sized {
    /// The field descriptor list. Implementations return the same schema on
    /// every call.
    fn schema() -> Arc<RecordSchema>;

    fn to_record(&self) -> RecordValue;

    fn from_record(record: RecordValue) -> Result<Self, Error>;
}

/// A closed set of named members.
pub trait EnumType: Sized {
    fn enum_schema() -> Arc<EnumSchema>;

    fn member_name(&self) -> &'static str;

    fn from_member_name(name: &str) -> Option<Self>;
}

/// Why a dynamic value did not fit a typed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: String,
    pub found: String,
}

impl Mismatch {
    pub fn new(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Mismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Mismatch describing the shape of `found`.
    pub fn of(expected: impl Into<String>, found: &Value) -> Self {
        Mismatch::new(expected, found.shape_name())
    }
}

/// A Rust type usable as a record field.
pub trait FieldValue: Sized {
    fn field_type() -> FieldType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, Mismatch>;
}

// ──────────────────────────────────────────────
// Primitive impls
// ──────────────────────────────────────────────

impl FieldValue for String {
    fn field_type() -> FieldType {
        FieldType::text()
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(Mismatch::of("text", &other)),
        }
    }
}

impl FieldValue for i64 {
    fn field_type() -> FieldType {
        FieldType::int()
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Int(i) => Ok(i),
            other => Err(Mismatch::of("int", &other)),
        }
    }
}

impl FieldValue for i32 {
    fn field_type() -> FieldType {
        FieldType::int()
    }

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| Mismatch::new("int", i.to_string())),
            other => Err(Mismatch::of("int", &other)),
        }
    }
}

impl FieldValue for f64 {
    fn field_type() -> FieldType {
        FieldType::float()
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(Mismatch::of("float", &other)),
        }
    }
}

impl FieldValue for bool {
    fn field_type() -> FieldType {
        FieldType::boolean()
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(Mismatch::of("bool", &other)),
        }
    }
}

impl FieldValue for OffsetDateTime {
    fn field_type() -> FieldType {
        FieldType::timestamp()
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(Mismatch::of("timestamp", &other)),
        }
    }
}

impl FieldValue for Decimal {
    fn field_type() -> FieldType {
        FieldType::decimal()
    }

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Decimal(d) => Ok(d),
            other => Err(Mismatch::of("decimal", &other)),
        }
    }
}

// ──────────────────────────────────────────────
// Wrapper impls
// ──────────────────────────────────────────────

impl<T: FieldValue> FieldValue for Option<T> {
    fn field_type() -> FieldType {
        FieldType::optional(T::field_type())
    }

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

fn container_items(value: Value, expected: &str) -> Result<Vec<Value>, Mismatch> {
    match value {
        Value::List(items) | Value::Set(items) => Ok(items),
        other => Err(Mismatch::of(expected, &other)),
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        container_items(value, "list")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: FieldValue + Ord> FieldValue for BTreeSet<T> {
    fn field_type() -> FieldType {
        FieldType::set(T::field_type())
    }

    fn to_value(&self) -> Value {
        Value::set(self.iter().map(FieldValue::to_value))
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        container_items(value, "set")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: FieldValue + Eq + Hash> FieldValue for HashSet<T> {
    fn field_type() -> FieldType {
        FieldType::set(T::field_type())
    }

    fn to_value(&self) -> Value {
        Value::set(self.iter().map(FieldValue::to_value))
    }

    fn from_value(value: Value) -> Result<Self, Mismatch> {
        container_items(value, "set")?
            .into_iter()
            .map(T::from_value)
            .collect()
    }
}

// ──────────────────────────────────────────────
// Macro support
// ──────────────────────────────────────────────

#[doc(hidden)]
pub fn field_from_value<T: FieldValue>(record: &str, field: &str, value: Value) -> Result<T, Error> {
    T::from_value(value).map_err(|m| Error::Conversion {
        record: record.to_string(),
        field: field.to_string(),
        expected: m.expected,
        found: m.found,
    })
}

#[doc(hidden)]
pub fn check_schema(record: &RecordValue, expected: &str) -> Result<(), Error> {
    if record.schema().name() == expected {
        Ok(())
    } else {
        Err(Error::SchemaMismatch {
            expected: expected.to_string(),
            found: record.schema().name().to_string(),
        })
    }
}

/// Declare a struct and implement [`Record`](crate::Record) and
/// [`FieldValue`](crate::FieldValue) for it.
///
/// ```
/// recform_core::record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Water {
///         pub at: recform_core::OffsetDateTime,
///         pub glass_count: f64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        impl $crate::Record for $name {
            fn schema() -> ::std::sync::Arc<$crate::RecordSchema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<$crate::RecordSchema>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(SCHEMA.get_or_init(|| {
                    ::std::sync::Arc::new($crate::RecordSchema::new(
                        stringify!($name),
                        vec![ $( $crate::FieldSpec::new(
                            stringify!($field),
                            <$ty as $crate::FieldValue>::field_type(),
                        ) ),* ],
                    ))
                }))
            }

            fn to_record(&self) -> $crate::RecordValue {
                $crate::RecordValue::from_parts(
                    <Self as $crate::Record>::schema(),
                    vec![ $( $crate::FieldValue::to_value(&self.$field) ),* ],
                )
            }

            fn from_record(record: $crate::RecordValue) -> ::std::result::Result<Self, $crate::Error> {
                $crate::record::check_schema(&record, stringify!($name))?;
                #[allow(unused_mut, unused_variables)]
                let mut values = record.into_values().into_iter();
                Ok($name {
                    $( $field: $crate::record::field_from_value(
                        stringify!($name),
                        stringify!($field),
                        values.next().unwrap_or($crate::Value::Null),
                    )?, )*
                })
            }
        }

        impl $crate::FieldValue for $name {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::Record(<Self as $crate::Record>::schema())
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Record(<Self as $crate::Record>::to_record(self))
            }

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::record::Mismatch> {
                match value {
                    $crate::Value::Record(r) => <Self as $crate::Record>::from_record(r)
                        .map_err(|e| $crate::record::Mismatch::new(stringify!($name), e.to_string())),
                    other => Err($crate::record::Mismatch::of(stringify!($name), &other)),
                }
            }
        }
    };
}

/// Declare a fieldless enum and implement [`EnumType`](crate::EnumType)
/// and [`FieldValue`](crate::FieldValue) for it. Members serialize by name.
#[macro_export]
macro_rules! enumeration {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident $(= $disc:expr)? ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant $(= $disc)?, )+
        }

        impl $crate::EnumType for $name {
            fn enum_schema() -> ::std::sync::Arc<$crate::EnumSchema> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<$crate::EnumSchema>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(SCHEMA.get_or_init(|| {
                    ::std::sync::Arc::new($crate::EnumSchema::new(
                        stringify!($name),
                        [ $( stringify!($variant) ),+ ],
                    ))
                }))
            }

            fn member_name(&self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )+
                }
            }

            fn from_member_name(name: &str) -> Option<Self> {
                match name {
                    $( stringify!($variant) => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl $crate::FieldValue for $name {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::Enum(<Self as $crate::EnumType>::enum_schema())
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Enum(<Self as $crate::EnumType>::member_name(self).to_string())
            }

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::record::Mismatch> {
                match value {
                    $crate::Value::Enum(ref member) => <Self as $crate::EnumType>::from_member_name(member)
                        .ok_or_else(|| $crate::record::Mismatch::new(stringify!($name), member.clone())),
                    other => Err($crate::record::Mismatch::of(stringify!($name), &other)),
                }
            }
        }
    };
}

/// Implement [`FieldValue`](crate::FieldValue) for a user type that the
/// engine handles only through registered converters and validators.
///
/// The type must be `Clone + Debug + PartialEq + Send + Sync + 'static`.
#[macro_export]
macro_rules! custom_field {
    ($ty:ty, $type_name:expr) => {
        impl $crate::FieldValue for $ty {
            fn field_type() -> $crate::FieldType {
                $crate::FieldType::custom($type_name)
            }

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Custom($crate::CustomValue::new($type_name, self.clone()))
            }

            fn from_value(value: $crate::Value) -> ::std::result::Result<Self, $crate::record::Mismatch> {
                match value.downcast_ref::<$ty>() {
                    Some(v) => Ok(v.clone()),
                    None => Err($crate::record::Mismatch::of($type_name, &value)),
                }
            }
        }
    };
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ContainerKind;

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        struct L {
            a: Option<Vec<i64>>,
            b: BTreeSet<bool>,
        }
    }

    crate::enumeration! {
        #[derive(Debug, Clone, Copy, PartialEq)]
        enum Status {
            Started = 1,
            Completed = 2,
        }
    }

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Task {
            status: Status,
            note: String,
        }
    }

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Empty {}
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Weight(f64);

    crate::custom_field!(Weight, "Weight");

    #[test]
    fn schema_is_memoized_per_type() {
        let first = L::schema();
        let second = L::schema();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "L");
    }

    #[test]
    fn derived_field_types() {
        let schema = L::schema();
        let sig = schema.signature();
        assert_eq!(sig[0].name, "a");
        assert!(sig[0].optional);
        assert_eq!(sig[0].ty.container().unwrap().unwrap().0, ContainerKind::List);
        assert!(!sig[1].optional);
        assert_eq!(sig[1].ty, &FieldType::set(FieldType::boolean()));
    }

    #[test]
    fn typed_round_trip_through_record_value() {
        let l = L {
            a: Some(vec![1, 2, 3]),
            b: [true].into_iter().collect(),
        };
        let rv = l.to_record();
        assert_eq!(rv.get("a"), Some(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])));
        assert_eq!(L::from_record(rv).unwrap(), l);
    }

    #[test]
    fn enum_members_by_name() {
        assert_eq!(Status::Completed.member_name(), "Completed");
        assert_eq!(Status::from_member_name("Started"), Some(Status::Started));
        assert_eq!(Status::from_member_name("Paused"), None);
        assert_eq!(Status::enum_schema().members(), ["Started", "Completed"]);

        let task = Task {
            status: Status::Started,
            note: "x".to_string(),
        };
        assert_eq!(task.to_record().get("status"), Some(&Value::Enum("Started".to_string())));
    }

    #[test]
    fn null_in_non_optional_field_fails_conversion() {
        let rv = RecordValue::from_named(Task::schema(), [("note".to_string(), Value::text("n"))]).unwrap();
        match Task::from_record(rv) {
            Err(Error::Conversion { field, expected, found, .. }) => {
                assert_eq!(field, "status");
                assert_eq!(expected, "Status");
                assert_eq!(found, "null");
            }
            other => panic!("expected Conversion, got {:?}", other),
        }
    }

    #[test]
    fn from_record_checks_schema_name() {
        let rv = Task {
            status: Status::Completed,
            note: String::new(),
        }
        .to_record();
        assert!(matches!(L::from_record(rv), Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn empty_record_has_no_fields() {
        assert!(Empty::schema().is_empty());
        assert_eq!(Empty::from_record(Empty {}.to_record()).unwrap(), Empty {});
    }

    #[test]
    fn custom_field_round_trips_through_value() {
        assert_eq!(Weight::field_type(), FieldType::custom("Weight"));
        let v = Weight(20.0).to_value();
        assert_eq!(Weight::from_value(v).unwrap(), Weight(20.0));
        assert!(Weight::from_value(Value::Float(20.0)).is_err());
    }
}
