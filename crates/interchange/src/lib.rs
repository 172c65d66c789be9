//! recform-interchange: JSON and YAML documents holding lists of records.
//!
//! Each record goes through a [`recform_core::Codec`]; the resulting list is
//! encoded as one document. Key order follows field declaration order.

pub mod error;
pub mod format;
pub mod transport;

pub use error::InterchangeError;
pub use format::{decode, Encoding, Format, JsonStyle};
pub use transport::{
    dump_as, dump_to, expand_home, from_str, from_str_as, load_as, load_from, read, to_string,
    to_string_as, write,
};
