//! The terminal capabilities the elicitor needs, and a line-oriented
//! implementation over any reader and writer.

use std::io::{BufRead, Write};

use crate::PromptError;

/// Inline check run on each entered line; `Err` is shown and the line is
/// asked for again.
pub type LineCheck<'c> = &'c dyn Fn(&str) -> Result<(), String>;

/// Inline preview of a live field. `Ok` is the preview of acceptable input,
/// `Err` explains why the input cannot be submitted yet.
pub type LivePreview<'c> = &'c dyn Fn(&str) -> Result<String, String>;

pub trait Terminal {
    /// Ask for one line of text, re-asking while `check` rejects it.
    fn prompt_line(&mut self, prompt: &str, check: Option<LineCheck<'_>>) -> Result<String, PromptError>;

    /// Present labelled buttons; returns the index of the chosen one.
    fn choose(&mut self, title: &str, text: &str, buttons: &[&str]) -> Result<usize, PromptError>;

    /// Free-text dialog. `None` when the user cancels.
    fn text_dialog(&mut self, title: &str, text: &str) -> Result<Option<String>, PromptError>;

    /// Message-only dialog.
    fn message(&mut self, title: &str, text: &str) -> Result<(), PromptError>;

    /// A single field previewing its input while typed. Only input the
    /// preview accepts is returned; `None` when the user cancels.
    fn prompt_live(&mut self, prompt: &str, preview: LivePreview<'_>) -> Result<Option<String>, PromptError>;
}

/// Resolve an answer to a button index, by 1-based number or by label.
pub(crate) fn pick_button(answer: &str, buttons: &[&str]) -> Option<usize> {
    match answer.parse::<usize>() {
        Ok(n) if (1..=buttons.len()).contains(&n) => Some(n - 1),
        _ => buttons.iter().position(|b| b.eq_ignore_ascii_case(answer)),
    }
}

/// The option behind an index returned by [`Terminal::choose`].
pub(crate) fn chosen<'a>(options: &[&'a str], index: usize) -> Result<&'a str, PromptError> {
    options.get(index).copied().ok_or(PromptError::InvalidChoice {
        index,
        choices: options.len(),
    })
}

/// A [`Terminal`] that reads whole lines from `R` and writes to `W`.
///
/// Buttons are listed with numbers and picked by number or label. An empty
/// line cancels dialogs. End of input is [`PromptError::Cancelled`].
#[derive(Debug)]
pub struct LineTerminal<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> LineTerminal<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        LineTerminal { reader, writer }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn read_line(&mut self, asking: &str) -> Result<String, PromptError> {
        self.writer.flush()?;
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(PromptError::Cancelled(asking.trim().to_string()));
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        Ok(trimmed.to_string())
    }
}

impl<R: BufRead, W: Write> Terminal for LineTerminal<R, W> {
    fn prompt_line(&mut self, prompt: &str, check: Option<LineCheck<'_>>) -> Result<String, PromptError> {
        loop {
            write!(self.writer, "{}", prompt)?;
            let line = self.read_line(prompt)?;
            match check.map(|c| c(&line)) {
                Some(Err(msg)) => writeln!(self.writer, "{}", msg)?,
                _ => return Ok(line),
            }
        }
    }

    fn choose(&mut self, title: &str, text: &str, buttons: &[&str]) -> Result<usize, PromptError> {
        loop {
            writeln!(self.writer, "{}", title)?;
            writeln!(self.writer, "{}", text)?;
            for (i, label) in buttons.iter().enumerate() {
                writeln!(self.writer, "  {}. {}", i + 1, label)?;
            }
            write!(self.writer, "> ")?;
            let line = self.read_line(text)?;
            let answer = line.trim();
            match pick_button(answer, buttons) {
                Some(idx) => return Ok(idx),
                None => writeln!(self.writer, "'{}' is not one of {:?}", answer, buttons)?,
            }
        }
    }

    fn text_dialog(&mut self, title: &str, text: &str) -> Result<Option<String>, PromptError> {
        writeln!(self.writer, "{}", title)?;
        write!(self.writer, "{} > ", text)?;
        let line = self.read_line(text)?;
        if line.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    fn message(&mut self, title: &str, text: &str) -> Result<(), PromptError> {
        writeln!(self.writer, "{}", title)?;
        writeln!(self.writer, "{}", text)?;
        Ok(())
    }

    fn prompt_live(&mut self, prompt: &str, preview: LivePreview<'_>) -> Result<Option<String>, PromptError> {
        loop {
            write!(self.writer, "{}", prompt)?;
            let line = self.read_line(prompt)?;
            if line.trim().is_empty() {
                return Ok(None);
            }
            match preview(&line) {
                Ok(shown) => {
                    writeln!(self.writer, "=> {}", shown)?;
                    return Ok(Some(line));
                }
                Err(msg) => writeln!(self.writer, "{}", msg)?,
            }
        }
    }
}

/// A terminal that answers every line with `line`, skipping any check, and
/// every choice with `pick`, whether or not it was offered.
#[cfg(test)]
pub(crate) struct Unchecked {
    pub line: String,
    pub pick: usize,
}

#[cfg(test)]
impl Terminal for Unchecked {
    fn prompt_line(&mut self, _prompt: &str, _check: Option<LineCheck<'_>>) -> Result<String, PromptError> {
        Ok(self.line.clone())
    }

    fn choose(&mut self, _title: &str, _text: &str, _buttons: &[&str]) -> Result<usize, PromptError> {
        Ok(self.pick)
    }

    fn text_dialog(&mut self, _title: &str, _text: &str) -> Result<Option<String>, PromptError> {
        Ok(Some(self.line.clone()))
    }

    fn message(&mut self, _title: &str, _text: &str) -> Result<(), PromptError> {
        Ok(())
    }

    fn prompt_live(&mut self, _prompt: &str, _preview: LivePreview<'_>) -> Result<Option<String>, PromptError> {
        Ok(Some(self.line.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn term(input: &str) -> LineTerminal<Cursor<Vec<u8>>, Vec<u8>> {
        LineTerminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn prompt_line_rechecks_until_accepted() {
        let mut t = term("abc\n12\n");
        let check = |s: &str| s.parse::<i64>().map(|_| ()).map_err(|e| e.to_string());
        let line = t.prompt_line("'a' (int) > ", Some(&check)).unwrap();
        assert_eq!(line, "12");
        let out = String::from_utf8(t.into_writer()).unwrap();
        assert!(out.contains("invalid digit"));
    }

    #[test]
    fn choose_by_number_or_label() {
        let mut t = term("2\nyes\nmaybe\n1\n");
        assert_eq!(t.choose("t", "q", &["Yes", "No"]).unwrap(), 1);
        assert_eq!(t.choose("t", "q", &["Yes", "No"]).unwrap(), 0);
        assert_eq!(t.choose("t", "q", &["Yes", "No"]).unwrap(), 0);
    }

    #[test]
    fn end_of_input_cancels() {
        let mut t = term("");
        assert!(matches!(t.prompt_line("x > ", None), Err(PromptError::Cancelled(_))));
    }

    #[test]
    fn empty_dialog_input_is_none() {
        let mut t = term("\nsomething\n");
        assert_eq!(t.text_dialog("t", "describe").unwrap(), None);
        assert_eq!(t.text_dialog("t", "describe").unwrap(), Some("something".to_string()));
    }

    #[test]
    fn live_field_shows_preview_and_cancels_on_empty() {
        let mut t = term("bad\ngood\n\n");
        let preview = |s: &str| {
            if s == "good" {
                Ok("GOOD".to_string())
            } else {
                Err(format!("cannot use {}", s))
            }
        };
        assert_eq!(t.prompt_live("> ", &preview).unwrap(), Some("good".to_string()));
        assert_eq!(t.prompt_live("> ", &preview).unwrap(), None);
        let out = String::from_utf8(t.into_writer()).unwrap();
        assert!(out.contains("cannot use bad"));
        assert!(out.contains("=> GOOD"));
    }

    #[test]
    fn chosen_rejects_indexes_past_the_options() {
        assert_eq!(chosen(&["a", "b"], 1).unwrap(), "b");
        match chosen(&["a", "b"], 2) {
            Err(PromptError::InvalidChoice { index, choices }) => assert_eq!((index, choices), (2, 2)),
            other => panic!("expected InvalidChoice, got {:?}", other),
        }
    }
}
