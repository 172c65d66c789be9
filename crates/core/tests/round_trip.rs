//! Round-trip and policy properties of the value codec, exercised through the
//! public API with macro-declared and schema-file record types.

use std::collections::HashSet;
use std::sync::Arc;

use recform_core::{
    AppOption, Codec, Context, Decimal, FieldType, OffsetDateTime, Record, RecordSchema,
    RecordValue, Value, WarningKind,
};
use serde_json::json;
use time::macros::datetime;

recform_core::record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Inner {
        pub label: String,
    }
}

recform_core::record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Everything {
        pub text: String,
        pub maybe_text: Option<String>,
        pub count: i64,
        pub ratio: f64,
        pub flag: bool,
        pub at: OffsetDateTime,
        pub price: Decimal,
        pub counts: Vec<i64>,
        pub flags: HashSet<bool>,
        pub maybe_list: Option<Vec<String>>,
        pub inner: Inner,
        pub maybe_inner: Option<Inner>,
    }
}

recform_core::enumeration! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Status {
        Started = 1,
        Running = 2,
        Completed = 3,
    }
}

recform_core::record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Job {
        pub status: Status,
        pub history: Vec<Status>,
    }
}

fn sample() -> Everything {
    Everything {
        text: "hello".to_string(),
        maybe_text: None,
        count: -3,
        ratio: 2.5,
        flag: true,
        at: datetime!(2020-01-02 03:04:05 UTC),
        price: Decimal::new(12345, 3),
        counts: vec![1, 1, 2],
        flags: [true, false].into_iter().collect(),
        maybe_list: Some(vec!["x".to_string()]),
        inner: Inner {
            label: "in".to_string(),
        },
        maybe_inner: None,
    }
}

#[test]
fn every_supported_field_shape_round_trips() {
    let ctx = Context::new();
    let codec = Codec::new();
    let original = sample();
    let serialized = codec.serialize_as(&original, &ctx).unwrap();
    let back: Everything = codec.deserialize_as(&serialized, &ctx).unwrap();
    assert_eq!(back, original);
    assert!(ctx.warnings().is_empty(), "{:?}", ctx.warnings().snapshot());
}

#[test]
fn serialized_form_is_json_safe() {
    let ctx = Context::new();
    let serialized = Codec::new().serialize_as(&sample(), &ctx).unwrap();
    let json = serde_json::to_value(&serialized).unwrap();
    assert_eq!(json["at"], json!(1577934245));
    assert_eq!(json["price"], json!("12.345"));
    assert_eq!(json["counts"], json!([1, 1, 2]));
    assert_eq!(json["maybe_text"], json!(null));
    assert_eq!(json["inner"], json!({"label": "in"}));
    let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "text");
    assert_eq!(keys[11], "maybe_inner");
}

#[test]
fn timestamps_truncate_to_whole_seconds() {
    let ctx = Context::new();
    let mut e = sample();
    e.at = datetime!(2020-01-02 03:04:05.750 UTC);
    let codec = Codec::new();
    let back: Everything = codec
        .deserialize_as(&codec.serialize_as(&e, &ctx).unwrap(), &ctx)
        .unwrap();
    assert_eq!(back.at, datetime!(2020-01-02 03:04:05 UTC));
}

#[test]
fn enums_serialize_by_member_name() {
    let ctx = Context::new();
    let codec = Codec::new();
    let job = Job {
        status: Status::Running,
        history: vec![Status::Started, Status::Running],
    };
    let serialized = codec.serialize_as(&job, &ctx).unwrap();
    assert_eq!(
        serde_json::to_value(&serialized).unwrap(),
        json!({"status": "Running", "history": ["Started", "Running"]})
    );
    let back: Job = codec.deserialize_as(&serialized, &ctx).unwrap();
    assert_eq!(back, job);
}

#[test]
fn unknown_enum_member_respects_option_scope() {
    let ctx = Context::new();
    let codec = Codec::new();
    let data = Value::from(json!({"status": "Paused", "history": []}));
    assert!(codec.deserialize(&data, &Job::schema(), &ctx).is_err());

    let outer = ctx.options().enable(&[AppOption::ConvertUnknownEnumToNone]);
    {
        let _inner = ctx.options().enable(&[AppOption::ConvertUnknownEnumToNone]);
    }
    let rv = codec.deserialize(&data, &Job::schema(), &ctx).unwrap();
    assert_eq!(rv.get("status"), Some(&Value::Null));
    drop(outer);
    assert!(codec.deserialize(&data, &Job::schema(), &ctx).is_err());
}

#[test]
fn schema_file_records_round_trip() {
    let schema = Arc::new(
        RecordSchema::from_json(&json!({
            "name": "Water",
            "fields": [
                {"name": "at", "type": "timestamp"},
                {"name": "glass_count", "type": "float"},
                {"name": "note", "type": "text", "optional": true}
            ]
        }))
        .unwrap(),
    );
    assert_eq!(schema.fields()[2].ty, FieldType::optional(FieldType::text()));

    let ctx = Context::new();
    let codec = Codec::new();
    let data = Value::from(json!({"at": 1600000000, "glass_count": 2}));
    let rv: RecordValue = codec.deserialize(&data, &schema, &ctx).unwrap();
    assert_eq!(rv.get("glass_count"), Some(&Value::Float(2.0)));
    assert_eq!(rv.get("note"), Some(&Value::Null));
    assert!(ctx.warnings().is_empty());

    let again = codec.serialize(&rv, &ctx).unwrap();
    assert_eq!(
        serde_json::to_value(&again).unwrap(),
        json!({"at": 1600000000, "glass_count": 2.0, "note": null})
    );
}

#[test]
fn suppressed_context_records_nothing() {
    let ctx = Context::from_vars(vec![(
        "RECFORM_DISABLE_WARNINGS".to_string(),
        "1".to_string(),
    )]);
    let schema = Job::schema();
    let rv = Codec::new()
        .deserialize(&Value::from(json!({"status": "Started"})), &schema, &ctx)
        .unwrap();
    assert_eq!(rv.get("history"), Some(&Value::List(Vec::new())));
    assert_eq!(ctx.warnings().count(WarningKind::EmptyContainer), 0);
}
