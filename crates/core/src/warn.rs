//! Advisory warnings.
//!
//! Advisory conditions never abort an operation. Each one is logged through
//! `tracing` and recorded on the [`Warnings`] channel of the current
//! [`Context`](crate::Context), where callers and tests can inspect it.
//! A suppressed channel drops warnings entirely.

use std::cell::{Cell, RefCell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A non-optional field had no key (or an explicit null) in loaded data.
    MissingKey,
    /// A loaded value's shape differs from the declared primitive.
    TypeMismatch,
    /// A non-optional container had no value; an empty one was substituted.
    EmptyContainer,
    /// A non-optional scalar field holds null while serializing.
    NullNonOptional,
    /// No built-in or registered way to serialize a type.
    NoSerializer,
    /// No built-in or registered way to deserialize a type.
    NoDeserializer,
    /// A record schema declares no fields.
    NoFields,
    /// A data file did not exist and an empty list was used.
    MissingFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

/// Collected advisory warnings for one context.
#[derive(Debug, Default)]
pub struct Warnings {
    suppressed: Cell<bool>,
    records: RefCell<Vec<Warning>>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&self, kind: WarningKind, message: impl Into<String>) {
        if self.suppressed.get() {
            return;
        }
        let message = message.into();
        tracing::warn!(kind = ?kind, "{}", message);
        self.records.borrow_mut().push(Warning { kind, message });
    }

    pub fn suppress(&self, suppressed: bool) {
        self.suppressed.set(suppressed);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.get()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.records.borrow().iter().filter(|w| w.kind == kind).count()
    }

    /// A copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<Warning> {
        self.records.borrow().clone()
    }

    /// Drain the recorded warnings.
    pub fn take(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.records.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order() {
        let w = Warnings::new();
        w.warn(WarningKind::MissingKey, "first");
        w.warn(WarningKind::TypeMismatch, "second");
        let all = w.snapshot();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "first");
        assert_eq!(all[1].kind, WarningKind::TypeMismatch);
        assert_eq!(w.count(WarningKind::MissingKey), 1);
    }

    #[test]
    fn suppressed_channel_drops_warnings() {
        let w = Warnings::new();
        w.suppress(true);
        w.warn(WarningKind::NoSerializer, "ignored");
        assert!(w.is_empty());
    }

    #[test]
    fn take_drains() {
        let w = Warnings::new();
        w.warn(WarningKind::NoFields, "x");
        assert_eq!(w.take().len(), 1);
        assert!(w.is_empty());
    }
}
