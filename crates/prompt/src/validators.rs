//! User-supplied field handlers: fixed defaults and text validators.

use std::fmt;
use std::rc::Rc;

use recform_core::{FieldValue, Value};

/// Why a validator rejected typed-in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Show the message and ask again.
    Retry(String),
    /// Abort the whole record.
    Fatal(String),
}

type ValidateFn = dyn Fn(&str) -> Result<Value, ValidationError>;

/// Turns the text a user typed into a field value.
#[derive(Clone)]
pub struct Validator {
    func: Rc<ValidateFn>,
    prompt: Option<String>,
}

impl Validator {
    pub fn new(f: impl Fn(&str) -> Result<Value, ValidationError> + 'static) -> Self {
        Validator {
            func: Rc::new(f),
            prompt: None,
        }
    }

    /// Wrap a typed parser. Every error it returns is retryable.
    pub fn from_fn<T, E>(f: impl Fn(&str) -> Result<T, E> + 'static) -> Self
    where
        T: FieldValue,
        E: fmt::Display,
    {
        Validator::new(move |text| {
            f(text)
                .map(|v| v.to_value())
                .map_err(|e| ValidationError::Retry(e.to_string()))
        })
    }

    /// Replace the generated `'field' (type) > ` prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn validate(&self, text: &str) -> Result<Value, ValidationError> {
        (self.func)(text)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

/// A value used in place of prompting.
#[derive(Clone)]
pub enum FieldDefault {
    Value(Value),
    /// Called each time the field is resolved.
    Factory(Rc<dyn Fn() -> Value>),
}

impl FieldDefault {
    pub fn factory(f: impl Fn() -> Value + 'static) -> Self {
        FieldDefault::Factory(Rc::new(f))
    }

    pub fn resolve(&self) -> Value {
        match self {
            FieldDefault::Value(v) => v.clone(),
            FieldDefault::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldDefault::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
