//! Record schemas and the type classifier.
//!
//! A [`RecordSchema`] is the explicit field descriptor list of a record type:
//! field names in declaration order, each with a [`FieldType`]. Schemas come
//! from the [`record!`](crate::record) macro or from a JSON descriptor file
//! ([`RecordSchema::from_json`]). The classifier methods on [`FieldType`]
//! drive every per-field dispatch in the codec and the prompt builder.

use std::fmt;
use std::sync::Arc;

use crate::Error;

// ──────────────────────────────────────────────
// Field types
// ──────────────────────────────────────────────

/// The closed set of scalar types handled without any override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Text,
    Int,
    Float,
    Bool,
    Timestamp,
    Decimal,
}

impl Primitive {
    pub const ALL: [Primitive; 6] = [
        Primitive::Text,
        Primitive::Int,
        Primitive::Float,
        Primitive::Bool,
        Primitive::Timestamp,
        Primitive::Decimal,
    ];

    /// Stable lowercase name, also used as the override registry key.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Text => "text",
            Primitive::Int => "int",
            Primitive::Float => "float",
            Primitive::Bool => "bool",
            Primitive::Timestamp => "timestamp",
            Primitive::Decimal => "decimal",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        match name {
            "text" | "str" | "string" => Some(Primitive::Text),
            "int" | "integer" => Some(Primitive::Int),
            "float" => Some(Primitive::Float),
            "bool" | "boolean" => Some(Primitive::Bool),
            "timestamp" | "datetime" => Some(Primitive::Timestamp),
            "decimal" => Some(Primitive::Decimal),
            _ => None,
        }
    }
}

/// Which single-element container a field is declared as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Ordered, keeps duplicates.
    List,
    /// Unordered, de-duplicated by value equality.
    Set,
}

/// A closed set of named members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    name: String,
    members: Vec<String>,
}

impl EnumSchema {
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = impl Into<String>>) -> Self {
        EnumSchema {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Look a member up by its declared name.
    pub fn member(&self, name: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.as_str() == name)
            .map(String::as_str)
    }
}

/// A declared field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Primitive(Primitive),
    Enum(Arc<EnumSchema>),
    Record(Arc<RecordSchema>),
    Optional(Box<FieldType>),
    List(Box<FieldType>),
    Set(Box<FieldType>),
    /// Two-argument container. Declarable, but never handled as a container.
    Map(Box<FieldType>, Box<FieldType>),
    /// A user type known only by name; handled through override registries.
    Custom(String),
}

/// Result of [`FieldType::classify`].
#[derive(Debug, Clone, Copy)]
pub enum TypeClass<'a> {
    Primitive(Primitive),
    Enum(&'a Arc<EnumSchema>),
    Record(&'a Arc<RecordSchema>),
    Container(ContainerKind, &'a FieldType),
    Optional(&'a FieldType),
    /// No built-in way to handle this type.
    Unknown,
}

impl FieldType {
    pub fn text() -> Self {
        FieldType::Primitive(Primitive::Text)
    }

    pub fn int() -> Self {
        FieldType::Primitive(Primitive::Int)
    }

    pub fn float() -> Self {
        FieldType::Primitive(Primitive::Float)
    }

    pub fn boolean() -> Self {
        FieldType::Primitive(Primitive::Bool)
    }

    pub fn timestamp() -> Self {
        FieldType::Primitive(Primitive::Timestamp)
    }

    pub fn decimal() -> Self {
        FieldType::Primitive(Primitive::Decimal)
    }

    /// Wrap as optional. An already optional type is returned as is, so
    /// there is only ever one level of optional wrapping.
    pub fn optional(inner: FieldType) -> Self {
        match inner {
            FieldType::Optional(_) => inner,
            other => FieldType::Optional(Box::new(other)),
        }
    }

    pub fn list(element: FieldType) -> Self {
        FieldType::List(Box::new(element))
    }

    pub fn set(element: FieldType) -> Self {
        FieldType::Set(Box::new(element))
    }

    pub fn map(key: FieldType, value: FieldType) -> Self {
        FieldType::Map(Box::new(key), Box::new(value))
    }

    pub fn custom(name: impl Into<String>) -> Self {
        FieldType::Custom(name.into())
    }

    /// Unwrap one level of optional: `(inner, true)` or `(self, false)`.
    pub fn strip_optional(&self) -> (&FieldType, bool) {
        match self {
            FieldType::Optional(inner) => (inner, true),
            other => (other, false),
        }
    }

    /// The container kind and element type of a list or set.
    ///
    /// Returns `Ok(None)` for non-container types and an error for mapping
    /// types, which take two type arguments.
    pub fn container(&self) -> Result<Option<(ContainerKind, &FieldType)>, Error> {
        match self {
            FieldType::List(element) => Ok(Some((ContainerKind::List, element))),
            FieldType::Set(element) => Ok(Some((ContainerKind::Set, element))),
            FieldType::Map(..) => Err(Error::UnsupportedContainer {
                type_name: self.key(),
            }),
            _ => Ok(None),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldType::Primitive(_))
    }

    pub fn classify(&self) -> TypeClass<'_> {
        match self {
            FieldType::Primitive(p) => TypeClass::Primitive(*p),
            FieldType::Enum(e) => TypeClass::Enum(e),
            FieldType::Record(r) => TypeClass::Record(r),
            FieldType::Optional(inner) => TypeClass::Optional(inner),
            FieldType::List(element) => TypeClass::Container(ContainerKind::List, element),
            FieldType::Set(element) => TypeClass::Container(ContainerKind::Set, element),
            FieldType::Map(..) | FieldType::Custom(_) => TypeClass::Unknown,
        }
    }

    /// Stable identifier used to key type overrides.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Parse a type descriptor from schema-file JSON.
    ///
    /// Primitives are plain strings (`"int"`); wrappers are single-key
    /// objects (`{"list": "int"}`, `{"optional": "text"}`,
    /// `{"dict": ["text", "int"]}`, `{"enum": "Status", "members": [..]}`,
    /// `{"record": {..}}`, `{"custom": "Weight"}`).
    pub fn from_json(v: &serde_json::Value) -> Result<FieldType, Error> {
        if let Some(name) = v.as_str() {
            return Primitive::from_name(name)
                .map(FieldType::Primitive)
                .ok_or_else(|| Error::Schema(format!("unknown type '{}'", name)));
        }
        let obj = v
            .as_object()
            .ok_or_else(|| Error::Schema(format!("type must be a string or object, got {}", v)))?;

        if let Some(inner) = obj.get("optional") {
            return Ok(FieldType::optional(FieldType::from_json(inner)?));
        }
        if let Some(inner) = obj.get("list") {
            return Ok(FieldType::list(FieldType::from_json(inner)?));
        }
        if let Some(inner) = obj.get("set") {
            return Ok(FieldType::set(FieldType::from_json(inner)?));
        }
        if let Some(args) = obj.get("dict") {
            let pair = args
                .as_array()
                .filter(|a| a.len() == 2)
                .ok_or_else(|| Error::Schema("'dict' takes [key, value] types".to_string()))?;
            return Ok(FieldType::map(
                FieldType::from_json(&pair[0])?,
                FieldType::from_json(&pair[1])?,
            ));
        }
        if let Some(name) = obj.get("enum").and_then(|n| n.as_str()) {
            let members: Vec<String> = obj
                .get("members")
                .and_then(|m| m.as_array())
                .ok_or_else(|| Error::Schema(format!("enum '{}' missing 'members'", name)))?
                .iter()
                .filter_map(|m| m.as_str().map(str::to_string))
                .collect();
            return Ok(FieldType::Enum(Arc::new(EnumSchema::new(name, members))));
        }
        if let Some(record) = obj.get("record") {
            return Ok(FieldType::Record(Arc::new(RecordSchema::from_json(record)?)));
        }
        if let Some(name) = obj.get("custom").and_then(|n| n.as_str()) {
            return Ok(FieldType::custom(name));
        }
        Err(Error::Schema(format!("unrecognized type descriptor {}", v)))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Primitive(p) => write!(f, "{}", p.name()),
            FieldType::Enum(e) => write!(f, "{}", e.name()),
            FieldType::Record(r) => write!(f, "{}", r.name()),
            FieldType::Optional(inner) => write!(f, "optional[{}]", inner),
            FieldType::List(element) => write!(f, "list[{}]", element),
            FieldType::Set(element) => write!(f, "set[{}]", element),
            FieldType::Map(k, v) => write!(f, "dict[{}, {}]", k, v),
            FieldType::Custom(name) => write!(f, "{}", name),
        }
    }
}

// ──────────────────────────────────────────────
// Record schemas
// ──────────────────────────────────────────────

/// One declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub ty: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        FieldSpec {
            name: name.into(),
            ty,
        }
    }
}

/// A field as seen by the walker: unwrapped type plus optionality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSignature<'a> {
    pub name: &'a str,
    pub ty: &'a FieldType,
    pub optional: bool,
}

/// The ordered field descriptor list of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        RecordSchema {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in declaration order with one level of optional stripped.
    pub fn signature(&self) -> Vec<FieldSignature<'_>> {
        self.fields
            .iter()
            .map(|f| {
                let (ty, optional) = f.ty.strip_optional();
                FieldSignature {
                    name: &f.name,
                    ty,
                    optional,
                }
            })
            .collect()
    }

    /// Parse a schema descriptor:
    /// `{"name": "X", "fields": [{"name": "a", "type": "int", "optional": false}]}`.
    pub fn from_json(v: &serde_json::Value) -> Result<RecordSchema, Error> {
        let name = v
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| Error::Schema("record schema missing 'name'".to_string()))?;
        let fields_arr = v
            .get("fields")
            .and_then(|f| f.as_array())
            .ok_or_else(|| Error::Schema(format!("record '{}' missing 'fields' array", name)))?;

        let mut fields = Vec::with_capacity(fields_arr.len());
        for field in fields_arr {
            let field_name = field
                .get("name")
                .and_then(|n| n.as_str())
                .ok_or_else(|| Error::Schema(format!("field of '{}' missing 'name'", name)))?;
            let ty_json = field.get("type").ok_or_else(|| {
                Error::Schema(format!("field '{}' of '{}' missing 'type'", field_name, name))
            })?;
            let mut ty = FieldType::from_json(ty_json)?;
            if field.get("optional").and_then(|o| o.as_bool()) == Some(true) {
                ty = FieldType::optional(ty);
            }
            if fields.iter().any(|f: &FieldSpec| f.name == field_name) {
                return Err(Error::Schema(format!(
                    "duplicate field '{}' in '{}'",
                    field_name, name
                )));
            }
            fields.push(FieldSpec::new(field_name, ty));
        }
        Ok(RecordSchema::new(name, fields))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strip_optional_unwraps_one_level() {
        let ty = FieldType::optional(FieldType::int());
        assert_eq!(ty.strip_optional(), (&FieldType::int(), true));
        assert_eq!(FieldType::int().strip_optional(), (&FieldType::int(), false));

        let opt_list = FieldType::optional(FieldType::list(FieldType::int()));
        let (inner, optional) = opt_list.strip_optional();
        assert!(optional);
        assert_eq!(inner, &FieldType::list(FieldType::int()));
    }

    #[test]
    fn double_optional_collapses() {
        let ty = FieldType::optional(FieldType::optional(FieldType::text()));
        assert_eq!(ty, FieldType::optional(FieldType::text()));
    }

    #[test]
    fn container_extracts_element_type() {
        let list = FieldType::list(FieldType::int());
        let (kind, element) = list.container().unwrap().unwrap();
        assert_eq!(kind, ContainerKind::List);
        assert_eq!(element, &FieldType::int());

        let set = FieldType::set(FieldType::boolean());
        assert_eq!(set.container().unwrap().unwrap().0, ContainerKind::Set);

        assert!(FieldType::text().container().unwrap().is_none());
    }

    #[test]
    fn mapping_is_rejected_as_container() {
        let dict = FieldType::map(FieldType::int(), FieldType::text());
        match dict.container() {
            Err(Error::UnsupportedContainer { type_name }) => {
                assert_eq!(type_name, "dict[int, text]")
            }
            other => panic!("expected UnsupportedContainer, got {:?}", other),
        }
        assert!(matches!(dict.classify(), TypeClass::Unknown));
    }

    #[test]
    fn primitive_membership() {
        for p in Primitive::ALL {
            assert!(FieldType::Primitive(p).is_primitive());
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert!(!FieldType::list(FieldType::int()).is_primitive());
        assert!(!FieldType::custom("timedelta").is_primitive());
    }

    #[test]
    fn classify_covers_enum_record_and_unknown() {
        let status = FieldType::Enum(Arc::new(EnumSchema::new("Status", ["ON", "OFF"])));
        assert!(matches!(status.classify(), TypeClass::Enum(e) if e.name() == "Status"));

        let nested = FieldType::Record(Arc::new(RecordSchema::new(
            "Internal",
            vec![FieldSpec::new("x", FieldType::int())],
        )));
        assert!(matches!(nested.classify(), TypeClass::Record(r) if r.name() == "Internal"));

        assert!(matches!(FieldType::custom("timedelta").classify(), TypeClass::Unknown));
    }

    #[test]
    fn keys_are_stable_names() {
        assert_eq!(FieldType::int().key(), "int");
        assert_eq!(FieldType::set(FieldType::text()).key(), "set[text]");
        assert_eq!(FieldType::optional(FieldType::timestamp()).key(), "optional[timestamp]");
        assert_eq!(FieldType::custom("Weight").key(), "Weight");
    }

    #[test]
    fn signature_preserves_declaration_order_and_is_idempotent() {
        let schema = RecordSchema::new(
            "P",
            vec![
                FieldSpec::new("d", FieldType::timestamp()),
                FieldSpec::new("a", FieldType::int()),
                FieldSpec::new("c", FieldType::optional(FieldType::text())),
            ],
        );
        let first = schema.signature();
        let second = schema.signature();
        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["d", "a", "c"]);
        assert!(first[2].optional);
        assert_eq!(first[2].ty, &FieldType::text());
    }

    #[test]
    fn schema_from_json() {
        let v = json!({
            "name": "Meeting",
            "fields": [
                {"name": "when", "type": "timestamp"},
                {"name": "where", "type": "text", "optional": true},
                {"name": "people", "type": {"list": "text"}},
                {"name": "status", "type": {"enum": "Status", "members": ["PLANNED", "DONE"]}},
                {"name": "room", "type": {"record": {"name": "Room", "fields": [{"name": "floor", "type": "int"}]}}},
                {"name": "length", "type": {"custom": "timedelta"}}
            ]
        });
        let schema = RecordSchema::from_json(&v).unwrap();
        assert_eq!(schema.name(), "Meeting");
        assert_eq!(schema.fields().len(), 6);
        assert_eq!(schema.fields()[1].ty, FieldType::optional(FieldType::text()));
        assert_eq!(schema.fields()[2].ty, FieldType::list(FieldType::text()));
        match &schema.fields()[3].ty {
            FieldType::Enum(e) => assert_eq!(e.members(), ["PLANNED", "DONE"]),
            other => panic!("expected enum, got {:?}", other),
        }
        match &schema.fields()[4].ty {
            FieldType::Record(r) => assert_eq!(r.name(), "Room"),
            other => panic!("expected record, got {:?}", other),
        }
        assert_eq!(schema.fields()[5].ty, FieldType::custom("timedelta"));
    }

    #[test]
    fn schema_from_json_rejects_unknown_type_and_duplicates() {
        let bad_type = json!({"name": "X", "fields": [{"name": "a", "type": "uuid"}]});
        assert!(matches!(RecordSchema::from_json(&bad_type), Err(Error::Schema(_))));

        let dup = json!({"name": "X", "fields": [
            {"name": "a", "type": "int"},
            {"name": "a", "type": "text"}
        ]});
        assert!(matches!(RecordSchema::from_json(&dup), Err(Error::Schema(_))));
    }
}
