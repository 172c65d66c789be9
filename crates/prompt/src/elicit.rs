//! Builds one prompt function per field and drives them to a record.
//!
//! Resolution per field, highest priority first:
//!
//! 1. attribute default (used verbatim, nothing is asked)
//! 2. attribute validator
//! 3. type default, then type validator, keyed by [`FieldType::key`]
//! 4. the built-in prompt for the field's type class
//!
//! Types with no way to prompt fail while building, before the first
//! question is shown. Attribute handlers apply to the top-level record only;
//! type handlers are shared with nested records.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use recform_core::{
    AppOption, ContainerKind, Context, EnumSchema, FieldType, FieldValue, Primitive, Record,
    RecordSchema, RecordValue, TypeClass, Value, WarningKind,
};
use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::datetime::parse_datetime;
use crate::terminal::{chosen, Terminal};
use crate::validators::{FieldDefault, ValidationError, Validator};
use crate::PromptError;

/// The terminal and context a prompt function runs against.
pub struct Session<'a> {
    pub terminal: &'a mut dyn Terminal,
    pub ctx: &'a Context,
}

impl<'a> Session<'a> {
    pub fn new(terminal: &'a mut dyn Terminal, ctx: &'a Context) -> Self {
        Session { terminal, ctx }
    }
}

/// Resolves one field value.
pub type PromptFn = Box<dyn Fn(&mut Session<'_>) -> Result<Value, PromptError>>;

fn prompt_fn<F>(f: F) -> PromptFn
where
    F: Fn(&mut Session<'_>) -> Result<Value, PromptError> + 'static,
{
    Box::new(f)
}

// ──────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────

/// Defaults and validators, keyed by field name or by field type.
#[derive(Debug, Clone, Default)]
pub struct PromptConfig {
    attr_defaults: HashMap<String, FieldDefault>,
    attr_validators: HashMap<String, Validator>,
    type_defaults: HashMap<String, FieldDefault>,
    type_validators: HashMap<String, Validator>,
}

impl PromptConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attr_default(mut self, name: impl Into<String>, default: FieldDefault) -> Self {
        self.attr_defaults.insert(name.into(), default);
        self
    }

    /// Shorthand for a fixed attribute default.
    pub fn with_attr_value(self, name: impl Into<String>, value: Value) -> Self {
        self.with_attr_default(name, FieldDefault::Value(value))
    }

    pub fn with_attr_validator(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.attr_validators.insert(name.into(), validator);
        self
    }

    pub fn with_type_default(mut self, ty: &FieldType, default: FieldDefault) -> Self {
        self.type_defaults.insert(ty.key(), default);
        self
    }

    pub fn with_type_validator(mut self, ty: &FieldType, validator: Validator) -> Self {
        self.type_validators.insert(ty.key(), validator);
        self
    }

    /// [`with_type_validator`](Self::with_type_validator) keyed by a Rust
    /// field type.
    pub fn with_validator_for<T: FieldValue>(self, validator: Validator) -> Self {
        self.with_type_validator(&T::field_type(), validator)
    }

    pub(crate) fn without_attr_default(mut self, name: &str) -> Self {
        self.attr_defaults.remove(name);
        self
    }

    /// The handlers a nested record sees: type-keyed ones only.
    fn for_nested(&self) -> PromptConfig {
        PromptConfig {
            type_defaults: self.type_defaults.clone(),
            type_validators: self.type_validators.clone(),
            ..PromptConfig::default()
        }
    }
}

// ──────────────────────────────────────────────
// Building
// ──────────────────────────────────────────────

/// Prompt functions for every field of a schema, in declaration order.
pub struct PromptFunctions {
    schema: Arc<RecordSchema>,
    fields: Vec<(String, PromptFn)>,
}

impl PromptFunctions {
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Run every function in order, then build the record in one step.
    pub fn run(&self, session: &mut Session<'_>) -> Result<RecordValue, PromptError> {
        let mut values = Vec::with_capacity(self.fields.len());
        for (name, f) in &self.fields {
            tracing::debug!(field = %name, "prompting");
            values.push(f(session)?);
        }
        Ok(RecordValue::new(Arc::clone(&self.schema), values)?)
    }
}

pub fn build_prompt_functions(
    schema: &Arc<RecordSchema>,
    config: &PromptConfig,
    ctx: &Context,
) -> Result<PromptFunctions, PromptError> {
    tracing::debug!(record = schema.name(), "creating prompt functions");
    if schema.is_empty() {
        ctx.warn(
            WarningKind::NoFields,
            format!("No fields declared on {}, may not be a record type?", schema.name()),
        );
    }

    let mut fields = Vec::with_capacity(schema.fields().len());
    for field in schema.signature() {
        let name = field.name.to_string();
        tracing::debug!(field = %name, ty = %field.ty, optional = field.optional, "field");

        let f = if let Some(default) = config.attr_defaults.get(&name) {
            default_fn(default.clone())
        } else if let Some(validator) = config.attr_validators.get(&name) {
            let f = validator_fn(&name, field.ty, validator.clone());
            maybe_optional(&name, f, field.optional)
        } else if let Some((kind, element)) = field.ty.container()? {
            let (element, _) = element.strip_optional();
            let (item, _) = scalar_fn(&name, element, config, ctx)?;
            prompt_many(&name, item, kind, field.optional)
        } else {
            let (f, is_default) = scalar_fn(&name, field.ty, config, ctx)?;
            if is_default {
                f
            } else {
                maybe_optional(&name, f, field.optional)
            }
        };
        fields.push((name, f));
    }
    Ok(PromptFunctions {
        schema: Arc::clone(schema),
        fields,
    })
}

/// Resolve one non-container value; the flag is true for type defaults.
fn scalar_fn(
    name: &str,
    ty: &FieldType,
    config: &PromptConfig,
    ctx: &Context,
) -> Result<(PromptFn, bool), PromptError> {
    let key = ty.key();
    if let Some(default) = config.type_defaults.get(&key) {
        return Ok((default_fn(default.clone()), true));
    }
    if let Some(validator) = config.type_validators.get(&key) {
        return Ok((validator_fn(name, ty, validator.clone()), false));
    }

    let prompt = field_prompt(name, ty);
    let f = match ty.classify() {
        TypeClass::Primitive(Primitive::Text) => {
            prompt_fn(move |s| Ok(Value::Text(s.terminal.prompt_line(&prompt, None)?)))
        }
        TypeClass::Primitive(Primitive::Int) => parsed_fn::<i64>(name, prompt, Value::Int),
        TypeClass::Primitive(Primitive::Float) => parsed_fn::<f64>(name, prompt, Value::Float),
        TypeClass::Primitive(Primitive::Decimal) => parsed_fn::<Decimal>(name, prompt, Value::Decimal),
        TypeClass::Primitive(Primitive::Bool) => {
            let name = name.to_string();
            prompt_fn(move |s| {
                let idx = s.terminal.choose(&name, &prompt, &["True", "False"])?;
                Ok(Value::Bool(idx == 0))
            })
        }
        TypeClass::Primitive(Primitive::Timestamp) => timestamp_fn(name, prompt),
        TypeClass::Enum(e) => enum_fn(name, prompt, Arc::clone(e)),
        TypeClass::Record(nested) => {
            let funcs = build_prompt_functions(nested, &config.for_nested(), ctx)?;
            prompt_fn(move |s| funcs.run(s).map(Value::Record))
        }
        TypeClass::Container(..) | TypeClass::Optional(_) | TypeClass::Unknown => {
            return Err(PromptError::Unhandled { type_name: key });
        }
    };
    Ok((f, false))
}

/// `'field' (type) > `
fn field_prompt(name: &str, ty: &FieldType) -> String {
    format!("'{}' ({}) > ", name, ty)
}

fn default_fn(default: FieldDefault) -> PromptFn {
    prompt_fn(move |_| Ok(default.resolve()))
}

fn validator_fn(name: &str, ty: &FieldType, validator: Validator) -> PromptFn {
    let name = name.to_string();
    let prompt = validator
        .prompt()
        .map(str::to_string)
        .unwrap_or_else(|| field_prompt(&name, ty));
    prompt_fn(move |s| loop {
        let text = s.terminal.prompt_line(&prompt, None)?;
        match validator.validate(&text) {
            Ok(value) => return Ok(value),
            Err(ValidationError::Retry(msg)) => {
                s.terminal.message("Please correct your input", &msg)?;
            }
            Err(ValidationError::Fatal(message)) => {
                return Err(PromptError::Validation {
                    field: name.clone(),
                    message,
                })
            }
        }
    })
}

fn parsed_fn<T>(name: &str, prompt: String, wrap: fn(T) -> Value) -> PromptFn
where
    T: FromStr + 'static,
    T::Err: std::fmt::Display,
{
    let name = name.to_string();
    prompt_fn(move |s| {
        let check = |text: &str| text.trim().parse::<T>().map(|_| ()).map_err(|e| e.to_string());
        let text = s.terminal.prompt_line(&prompt, Some(&check))?;
        text.trim()
            .parse::<T>()
            .map(wrap)
            .map_err(|e| PromptError::Validation {
                field: name.clone(),
                message: e.to_string(),
            })
    })
}

fn enum_fn(name: &str, prompt: String, schema: Arc<EnumSchema>) -> PromptFn {
    let name = name.to_string();
    prompt_fn(move |s| {
        let labels: Vec<&str> = schema.members().iter().map(String::as_str).collect();
        let idx = s.terminal.choose(&name, &prompt, &labels)?;
        Ok(Value::Enum(chosen(&labels, idx)?.to_string()))
    })
}

fn timestamp_fn(name: &str, prompt: String) -> PromptFn {
    let name = name.to_string();
    prompt_fn(move |s| {
        if s.ctx.is_enabled(AppOption::LiveDatetime) {
            return live_timestamp(s, &name, &prompt);
        }
        if s.terminal.choose(&name, &prompt, &["Now", "Describe"])? == 0 {
            return Ok(Value::Timestamp(OffsetDateTime::now_utc()));
        }
        loop {
            let Some(text) = s
                .terminal
                .text_dialog(&name, "Describe the time, e.g. '2 hours ago' or '2021-06-01 14:30'")?
            else {
                continue;
            };
            match parse_datetime(&text, OffsetDateTime::now_utc()) {
                Ok(ts) => return Ok(Value::Timestamp(ts)),
                Err(msg) => s.terminal.message(&name, &msg)?,
            }
        }
    })
}

fn live_timestamp(s: &mut Session<'_>, name: &str, prompt: &str) -> Result<Value, PromptError> {
    let preview = |text: &str| {
        parse_datetime(text, OffsetDateTime::now_utc())
            .and_then(|ts| ts.format(&Rfc3339).map_err(|e| e.to_string()))
    };
    let Some(text) = s.terminal.prompt_live(prompt, &preview)? else {
        return Err(PromptError::Aborted(name.to_string()));
    };
    parse_datetime(&text, OffsetDateTime::now_utc())
        .map(Value::Timestamp)
        .map_err(|message| PromptError::Validation {
            field: name.to_string(),
            message,
        })
}

/// Ask `'name' is optional. Add?` before running `f`.
fn maybe_optional(name: &str, f: PromptFn, optional: bool) -> PromptFn {
    if !optional {
        return f;
    }
    let name = name.to_string();
    let question = format!("'{}' is optional. Add?", name);
    prompt_fn(move |s| {
        if s.terminal.choose(&name, &question, &["Add", "Skip"])? == 0 {
            f(s)
        } else {
            Ok(Value::Null)
        }
    })
}

/// Prompt for items until the user declines another. Optional containers ask
/// before the first item.
fn prompt_many(name: &str, item: PromptFn, kind: ContainerKind, ask_first: bool) -> PromptFn {
    let name = name.to_string();
    let wrap = move |items: Vec<Value>| match kind {
        ContainerKind::List => Value::List(items),
        ContainerKind::Set => Value::set(items),
    };
    prompt_fn(move |s| {
        if ask_first {
            let question = format!("Add any items to '{}'?", name);
            if s.terminal.choose(&name, &question, &["Yes", "No"])? != 0 {
                return Ok(wrap(Vec::new()));
            }
        }
        let mut items: Vec<Value> = Vec::new();
        loop {
            let value = item(s)?;
            if kind == ContainerKind::List || !items.contains(&value) {
                items.push(value);
            }
            let title = format!("Add another item to '{}'?", name);
            let current = format!("Currently => {}", wrap(items.clone()));
            if s.terminal.choose(&title, &current, &["Yes", "No"])? != 0 {
                return Ok(wrap(items));
            }
        }
    })
}

// ──────────────────────────────────────────────
// Driving
// ──────────────────────────────────────────────

/// Prompt for every field of `schema` and build the record.
pub fn prompt_record(
    schema: &Arc<RecordSchema>,
    config: &PromptConfig,
    terminal: &mut dyn Terminal,
    ctx: &Context,
) -> Result<RecordValue, PromptError> {
    let funcs = build_prompt_functions(schema, config, ctx)?;
    funcs.run(&mut Session::new(terminal, ctx))
}

pub fn prompt_as<T: Record>(
    config: &PromptConfig,
    terminal: &mut dyn Terminal,
    ctx: &Context,
) -> Result<T, PromptError> {
    let record = prompt_record(&T::schema(), config, terminal, ctx)?;
    Ok(T::from_record(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::LineTerminal;
    use recform_core::FieldSpec;
    use std::io::Cursor;

    fn term(input: &str) -> LineTerminal<Cursor<Vec<u8>>, Vec<u8>> {
        LineTerminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn schema(fields: Vec<FieldSpec>) -> Arc<RecordSchema> {
        Arc::new(RecordSchema::new("T", fields))
    }

    #[test]
    fn primitives_in_field_order() {
        let s = schema(vec![
            FieldSpec::new("name", FieldType::text()),
            FieldSpec::new("count", FieldType::int()),
            FieldSpec::new("ratio", FieldType::float()),
            FieldSpec::new("done", FieldType::boolean()),
        ]);
        let ctx = Context::new();
        let mut t = term("widget\nnope\n3\n0.5\n2\n");
        let rv = prompt_record(&s, &PromptConfig::new(), &mut t, &ctx).unwrap();
        assert_eq!(rv.get("name"), Some(&Value::text("widget")));
        assert_eq!(rv.get("count"), Some(&Value::Int(3)));
        assert_eq!(rv.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(rv.get("done"), Some(&Value::Bool(false)));
        let out = String::from_utf8(t.into_writer()).unwrap();
        assert!(out.contains("'count' (int) > "));
    }

    #[test]
    fn optional_skip_yields_null() {
        let s = schema(vec![FieldSpec::new("note", FieldType::optional(FieldType::text()))]);
        let ctx = Context::new();
        let mut t = term("Skip\n");
        let rv = prompt_record(&s, &PromptConfig::new(), &mut t, &ctx).unwrap();
        assert_eq!(rv.get("note"), Some(&Value::Null));
    }

    #[test]
    fn containers_repeat_until_declined() {
        let s = schema(vec![
            FieldSpec::new("xs", FieldType::list(FieldType::int())),
            FieldSpec::new("tags", FieldType::optional(FieldType::set(FieldType::text()))),
        ]);
        let ctx = Context::new();
        // xs: 1, yes, 1, no. tags: no items.
        let mut t = term("1\nYes\n1\nNo\nNo\n");
        let rv = prompt_record(&s, &PromptConfig::new(), &mut t, &ctx).unwrap();
        assert_eq!(rv.get("xs"), Some(&Value::List(vec![Value::Int(1), Value::Int(1)])));
        assert_eq!(rv.get("tags"), Some(&Value::Set(Vec::new())));
    }

    #[test]
    fn unknown_type_fails_before_prompting() {
        let s = schema(vec![
            FieldSpec::new("a", FieldType::text()),
            FieldSpec::new("length", FieldType::custom("timedelta")),
        ]);
        let ctx = Context::new();
        let mut t = term("never read\n");
        match prompt_record(&s, &PromptConfig::new(), &mut t, &ctx) {
            Err(PromptError::Unhandled { type_name }) => assert_eq!(type_name, "timedelta"),
            other => panic!("expected Unhandled, got {:?}", other.map(|_| ())),
        }
        assert!(t.into_writer().is_empty());
    }

    #[test]
    fn mapping_fields_are_rejected() {
        let s = schema(vec![FieldSpec::new("m", FieldType::map(FieldType::text(), FieldType::int()))]);
        let ctx = Context::new();
        assert!(matches!(
            build_prompt_functions(&s, &PromptConfig::new(), &ctx),
            Err(PromptError::Core(recform_core::Error::UnsupportedContainer { .. }))
        ));
    }

    #[test]
    fn attribute_default_beats_validator_and_type_handlers() {
        let s = schema(vec![FieldSpec::new("length", FieldType::custom("timedelta"))]);
        let ctx = Context::new();
        let config = PromptConfig::new()
            .with_attr_value("length", Value::Int(60))
            .with_attr_validator("length", Validator::new(|_| Ok(Value::Int(1))));
        let mut t = term("");
        let rv = prompt_record(&s, &config, &mut t, &ctx).unwrap();
        assert_eq!(rv.get("length"), Some(&Value::Int(60)));
    }

    #[test]
    fn retryable_validator_reprompts_and_fatal_aborts() {
        let s = schema(vec![FieldSpec::new("weight", FieldType::custom("Weight"))]);
        let ctx = Context::new();
        let validator = Validator::new(|text| {
            let text = text.trim();
            if text == "quit" {
                return Err(ValidationError::Fatal("gave up".to_string()));
            }
            text.strip_suffix("lbs")
                .and_then(|n| n.trim().parse::<f64>().ok())
                .map(Value::Float)
                .ok_or_else(|| ValidationError::Retry("weight must end in lbs".to_string()))
        });
        let config = PromptConfig::new().with_type_validator(&FieldType::custom("Weight"), validator);

        let mut t = term("20\n20 lbs\n");
        let rv = prompt_record(&s, &config, &mut t, &ctx).unwrap();
        assert_eq!(rv.get("weight"), Some(&Value::Float(20.0)));
        let out = String::from_utf8(t.into_writer()).unwrap();
        assert!(out.contains("weight must end in lbs"));

        let mut t = term("quit\n");
        match prompt_record(&s, &config, &mut t, &ctx) {
            Err(PromptError::Validation { field, message }) => {
                assert_eq!(field, "weight");
                assert_eq!(message, "gave up");
            }
            other => panic!("expected Validation, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn type_default_skips_optional_dialog() {
        let s = schema(vec![FieldSpec::new("n", FieldType::optional(FieldType::int()))]);
        let ctx = Context::new();
        let config = PromptConfig::new().with_type_default(&FieldType::int(), FieldDefault::Value(Value::Int(9)));
        let mut t = term("");
        let rv = prompt_record(&s, &config, &mut t, &ctx).unwrap();
        assert_eq!(rv.get("n"), Some(&Value::Int(9)));
    }

    #[test]
    fn enum_and_nested_record() {
        let inner = Arc::new(RecordSchema::new("Inner", vec![FieldSpec::new("x", FieldType::int())]));
        let status = Arc::new(EnumSchema::new("Status", ["ON", "OFF"]));
        let s = schema(vec![
            FieldSpec::new("status", FieldType::Enum(status)),
            FieldSpec::new("inner", FieldType::Record(inner)),
        ]);
        let ctx = Context::new();
        let mut t = term("OFF\n7\n");
        let rv = prompt_record(&s, &PromptConfig::new(), &mut t, &ctx).unwrap();
        assert_eq!(rv.get("status"), Some(&Value::Enum("OFF".to_string())));
        let nested = rv.get("inner").and_then(Value::as_record).unwrap();
        assert_eq!(nested.get("x"), Some(&Value::Int(7)));
    }

    #[test]
    fn described_timestamp_reprompts_until_parseable() {
        let s = schema(vec![FieldSpec::new("at", FieldType::timestamp())]);
        let ctx = Context::new();
        let mut t = term("Describe\nsoonish\n2020-01-02 03:04\n");
        let rv = prompt_record(&s, &PromptConfig::new(), &mut t, &ctx).unwrap();
        match rv.get("at") {
            Some(Value::Timestamp(ts)) => assert_eq!(ts.unix_timestamp(), 1577934240),
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn live_timestamp_cancel_aborts() {
        let s = schema(vec![FieldSpec::new("at", FieldType::timestamp())]);
        let ctx = Context::new();
        let _live = ctx.options().enable(&[AppOption::LiveDatetime]);
        let mut t = term("\n");
        assert!(matches!(
            prompt_record(&s, &PromptConfig::new(), &mut t, &ctx),
            Err(PromptError::Aborted(ref name)) if name == "at"
        ));

        let mut t = term("2020-01-02\n");
        let rv = prompt_record(&s, &PromptConfig::new(), &mut t, &ctx).unwrap();
        assert!(matches!(rv.get("at"), Some(Value::Timestamp(_))));
    }

    #[test]
    fn empty_schema_warns_and_prompts_nothing() {
        let s = schema(Vec::new());
        let ctx = Context::new();
        let mut t = term("");
        let rv = prompt_record(&s, &PromptConfig::new(), &mut t, &ctx).unwrap();
        assert!(rv.values().is_empty());
        assert_eq!(ctx.warnings().count(WarningKind::NoFields), 1);
    }

    #[test]
    fn unparseable_number_names_the_field() {
        let s = schema(vec![FieldSpec::new("count", FieldType::int())]);
        let ctx = Context::new();
        let mut t = crate::terminal::Unchecked {
            line: "many".to_string(),
            pick: 0,
        };
        match prompt_record(&s, &PromptConfig::new(), &mut t, &ctx) {
            Err(PromptError::Validation { field, message }) => {
                assert_eq!(field, "count");
                assert!(message.contains("invalid digit"));
            }
            other => panic!("expected Validation, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn enum_choice_out_of_range_is_an_error() {
        let status = Arc::new(EnumSchema::new("Status", ["ON", "OFF"]));
        let s = schema(vec![FieldSpec::new("status", FieldType::Enum(status))]);
        let ctx = Context::new();
        let mut t = crate::terminal::Unchecked {
            line: String::new(),
            pick: 2,
        };
        assert!(matches!(
            prompt_record(&s, &PromptConfig::new(), &mut t, &ctx),
            Err(PromptError::InvalidChoice { index: 2, choices: 2 })
        ));
    }
}
