/// Fatal errors raised by the schema, codec and typed-record layers.
///
/// Advisory conditions never show up here; they go through
/// [`crate::Warnings`] and processing continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A mapping type was used where a single-element container was expected.
    #[error("{type_name} is not a supported container, only list and set of a single element type are")]
    UnsupportedContainer { type_name: String },

    /// A loaded value that should describe a record is not a mapping.
    #[error("expected a dict to load {record}, found {found}")]
    NotARecord { record: String, found: String },

    /// Loaded text does not name a member of the declared enumeration.
    #[error("'{token}' is not a member of {enum_name}, valid: {members:?}")]
    UnknownEnumMember {
        token: String,
        enum_name: String,
        members: Vec<String>,
    },

    /// An epoch timestamp outside the representable range.
    #[error("invalid timestamp {value}: {message}")]
    InvalidTimestamp { value: String, message: String },

    /// Text that could not be parsed as an exact decimal.
    #[error("invalid decimal '{value}': {message}")]
    InvalidDecimal { value: String, message: String },

    /// An option name that does not exist.
    #[error("unknown option '{name}', valid options: {valid}")]
    UnknownOption { name: String, valid: String },

    /// A dynamic value could not be converted into the typed Rust field.
    #[error("field '{field}' of {record}: expected {expected}, found {found}")]
    Conversion {
        record: String,
        field: String,
        expected: String,
        found: String,
    },

    /// A typed record was built from a record value of another schema.
    #[error("expected a {expected} record, found {found}")]
    SchemaMismatch { expected: String, found: String },

    /// A schema descriptor could not be parsed.
    #[error("invalid schema: {0}")]
    Schema(String),

    /// Raised by a user-supplied converter.
    #[error("{0}")]
    Handler(String),
}

impl Error {
    /// Build an error from inside a user-supplied converter.
    pub fn handler(message: impl Into<String>) -> Self {
        Error::Handler(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_enum_member_names_token_and_enum() {
        let err = Error::UnknownEnumMember {
            token: "PAUSED".to_string(),
            enum_name: "Status".to_string(),
            members: vec!["STARTED".to_string(), "DONE".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("PAUSED"));
        assert!(msg.contains("Status"));
        assert!(msg.contains("STARTED"));
    }

    #[test]
    fn handler_error_displays_message_verbatim() {
        assert_eq!(Error::handler("weight must end in lbs").to_string(), "weight must end in lbs");
    }
}
