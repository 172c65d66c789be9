//! A [`Terminal`] on the process console, backed by rustyline.
//!
//! Live fields show their preview as a hint after the cursor, refreshed on
//! every keystroke, and refuse to submit input the preview rejects. When
//! stdin is not a terminal rustyline reads plain lines and no helper is
//! installed; the preview is then checked after each line instead.

use std::borrow::Cow;
use std::io::{self, IsTerminal};

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Context, Editor, Helper};

use crate::terminal::{pick_button, LineCheck, LivePreview, Terminal};
use crate::PromptError;

pub struct ReadlineTerminal {
    editor: Editor<(), DefaultHistory>,
    interactive: bool,
}

impl ReadlineTerminal {
    pub fn new() -> Result<Self, PromptError> {
        let editor = Editor::with_config(config()).map_err(readline_io)?;
        Ok(ReadlineTerminal {
            editor,
            interactive: io::stdin().is_terminal(),
        })
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(line),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                Err(PromptError::Cancelled(prompt.trim().to_string()))
            }
            Err(e) => Err(readline_io(e)),
        }
    }
}

fn config() -> Config {
    Config::builder().auto_add_history(false).build()
}

fn readline_io(e: ReadlineError) -> PromptError {
    match e {
        ReadlineError::Io(err) => PromptError::Io(err),
        other => PromptError::Io(io::Error::other(other.to_string())),
    }
}

impl Terminal for ReadlineTerminal {
    fn prompt_line(&mut self, prompt: &str, check: Option<LineCheck<'_>>) -> Result<String, PromptError> {
        loop {
            let line = self.read_line(prompt)?;
            match check.map(|c| c(&line)) {
                Some(Err(msg)) => println!("{}", msg),
                _ => return Ok(line),
            }
        }
    }

    fn choose(&mut self, title: &str, text: &str, buttons: &[&str]) -> Result<usize, PromptError> {
        loop {
            println!("{}", title);
            println!("{}", text);
            for (i, label) in buttons.iter().enumerate() {
                println!("  {}. {}", i + 1, label);
            }
            let line = self.read_line("> ")?;
            let answer = line.trim();
            match pick_button(answer, buttons) {
                Some(idx) => return Ok(idx),
                None => println!("'{}' is not one of {:?}", answer, buttons),
            }
        }
    }

    fn text_dialog(&mut self, title: &str, text: &str) -> Result<Option<String>, PromptError> {
        println!("{}", title);
        let line = self.read_line(&format!("{} > ", text))?;
        if line.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    fn message(&mut self, title: &str, text: &str) -> Result<(), PromptError> {
        println!("{}", title);
        println!("{}", text);
        Ok(())
    }

    fn prompt_live(&mut self, prompt: &str, preview: LivePreview<'_>) -> Result<Option<String>, PromptError> {
        let mut editor: Editor<LiveHelper<'_>, DefaultHistory> =
            Editor::with_config(config()).map_err(readline_io)?;
        if self.interactive {
            editor.set_helper(Some(LiveHelper { preview }));
        }
        loop {
            let line = match editor.readline(prompt) {
                Ok(line) => line,
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return Ok(None),
                Err(e) => return Err(readline_io(e)),
            };
            if line.trim().is_empty() {
                return Ok(None);
            }
            match preview(&line) {
                Ok(shown) => {
                    println!("=> {}", shown);
                    return Ok(Some(line));
                }
                Err(msg) => println!("{}", msg),
            }
        }
    }
}

// ──────────────────────────────────────────────
// Live field helper
// ──────────────────────────────────────────────

struct LiveHelper<'c> {
    preview: LivePreview<'c>,
}

/// Hint shown after the cursor for the current input.
fn live_hint(preview: LivePreview<'_>, line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }
    Some(match preview(line) {
        Ok(shown) => format!("  => {}", shown),
        Err(msg) => format!("  ({})", msg),
    })
}

/// Empty input submits (and cancels the field); anything else must preview.
fn live_validation(preview: LivePreview<'_>, input: &str) -> ValidationResult {
    if input.trim().is_empty() {
        return ValidationResult::Valid(None);
    }
    match preview(input) {
        Ok(_) => ValidationResult::Valid(None),
        Err(msg) => ValidationResult::Invalid(Some(format!("  ({})", msg))),
    }
}

impl Helper for LiveHelper<'_> {}

impl Completer for LiveHelper<'_> {
    type Candidate = Pair;
}

impl Hinter for LiveHelper<'_> {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        live_hint(self.preview, line)
    }
}

impl Highlighter for LiveHelper<'_> {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{}\x1b[0m", hint))
    }
}

impl Validator for LiveHelper<'_> {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        Ok(live_validation(self.preview, ctx.input()))
    }
}
