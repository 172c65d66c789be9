//! Editing existing records one field at a time.

use recform_core::{Context, Record, RecordValue};

use crate::elicit::{prompt_record, PromptConfig};
use crate::terminal::{chosen, Terminal};
use crate::PromptError;

/// Menu entry that ends a looping edit.
pub const DONE_EDITING: &str = "DONE EDITING";

#[derive(Debug, Clone, Copy, Default)]
pub struct EditOptions {
    /// Keep offering fields until `DONE EDITING` is picked.
    pub repeat: bool,
    /// Show the record before each choice.
    pub show_record: bool,
}

/// Pick a field, prompt for it again and return the new record. Every other
/// field keeps its current value.
pub fn edit_record(
    record: &RecordValue,
    config: &PromptConfig,
    options: EditOptions,
    terminal: &mut dyn Terminal,
    ctx: &Context,
) -> Result<RecordValue, PromptError> {
    let schema = record.schema();
    let mut current = record.clone();
    loop {
        let mut choices: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        if options.repeat {
            choices.push(DONE_EDITING);
        }
        if options.show_record {
            terminal.message(schema.name(), &current.to_string())?;
        }
        let idx = terminal.choose("Which field to edit", "Which field to edit: ", &choices)?;
        let chosen = chosen(&choices, idx)?;
        if chosen == DONE_EDITING && idx == schema.fields().len() {
            return Ok(current);
        }
        tracing::debug!(record = schema.name(), field = chosen, "editing field");

        let mut keep = config.clone().without_attr_default(chosen);
        for (name, value) in current.fields() {
            if name != chosen {
                keep = keep.with_attr_value(name, value.clone());
            }
        }
        current = prompt_record(schema, &keep, terminal, ctx)?;
        if !options.repeat {
            return Ok(current);
        }
    }
}

pub fn edit_as<T: Record>(
    item: &T,
    config: &PromptConfig,
    options: EditOptions,
    terminal: &mut dyn Terminal,
    ctx: &Context,
) -> Result<T, PromptError> {
    let edited = edit_record(&item.to_record(), config, options, terminal, ctx)?;
    Ok(T::from_record(edited)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::LineTerminal;
    use recform_core::Value;
    use std::io::Cursor;

    recform_core::record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Meal {
            name: String,
            calories: i64,
        }
    }

    fn term(input: &str) -> LineTerminal<Cursor<Vec<u8>>, Vec<u8>> {
        LineTerminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn meal() -> Meal {
        Meal {
            name: "soup".to_string(),
            calories: 200,
        }
    }

    #[test]
    fn edits_one_field_and_keeps_the_rest() {
        let ctx = Context::new();
        let mut t = term("calories\n350\n");
        let edited = edit_as(&meal(), &PromptConfig::new(), EditOptions::default(), &mut t, &ctx).unwrap();
        assert_eq!(
            edited,
            Meal {
                name: "soup".to_string(),
                calories: 350
            }
        );
    }

    #[test]
    fn repeat_until_done() {
        let ctx = Context::new();
        let options = EditOptions {
            repeat: true,
            show_record: true,
        };
        let mut t = term("1\nstew\n2\n400\nDONE EDITING\n");
        let edited = edit_as(&meal(), &PromptConfig::new(), options, &mut t, &ctx).unwrap();
        assert_eq!(edited.name, "stew");
        assert_eq!(edited.calories, 400);
        let out = String::from_utf8(t.into_writer()).unwrap();
        assert!(out.contains(DONE_EDITING));
        assert!(out.contains("Meal(name=\"soup\", calories=200)"));
    }

    #[test]
    fn attribute_default_for_edited_field_is_ignored() {
        let ctx = Context::new();
        let config = PromptConfig::new().with_attr_value("name", Value::text("fixed"));
        let mut t = term("1\nsalad\n");
        let edited = edit_as(&meal(), &config, EditOptions::default(), &mut t, &ctx).unwrap();
        assert_eq!(edited.name, "salad");
    }

    #[test]
    fn field_choice_out_of_range_is_an_error() {
        let ctx = Context::new();
        let mut t = crate::terminal::Unchecked {
            line: "0".to_string(),
            pick: 5,
        };
        let err = edit_as(&meal(), &PromptConfig::new(), EditOptions::default(), &mut t, &ctx).unwrap_err();
        assert!(matches!(err, PromptError::InvalidChoice { index: 5, choices: 2 }));
    }
}
