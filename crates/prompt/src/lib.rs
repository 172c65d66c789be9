//! recform-prompt: interactive prompting for record types.
//!
//! [`build_prompt_functions`] turns a record schema into one prompt function
//! per field; [`prompt_record`] runs them against a [`Terminal`] and builds
//! the record. [`ReadlineTerminal`] is the console terminal with live
//! previews. [`edit_record`] re-prompts single fields of an existing
//! record, and the [`shortcuts`] tie prompting to data files.

pub mod datetime;
pub mod edit;
pub mod elicit;
pub mod error;
pub mod readline;
pub mod shortcuts;
pub mod terminal;
pub mod validators;

pub use datetime::parse_datetime;
pub use edit::{edit_as, edit_record, EditOptions, DONE_EDITING};
pub use elicit::{
    build_prompt_functions, prompt_as, prompt_record, PromptConfig, PromptFn, PromptFunctions,
    Session,
};
pub use error::PromptError;
pub use readline::ReadlineTerminal;
pub use shortcuts::{edit_and_writeback, load_prompt_and_writeback, load_prompt_and_writeback_as};
pub use terminal::{LineTerminal, Terminal};
pub use validators::{FieldDefault, ValidationError, Validator};
