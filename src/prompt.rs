use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::error::Result;

pub trait Prompter {
    /// Ask for a single line of input.
    fn line(&mut self, label: &str) -> Result<String>;

    /// Ask for a secret value.
    fn secret(&mut self, label: &str) -> Result<String>;

    /// Ask for free-form multi-line text.
    fn text(&mut self, label: &str) -> Result<String>;
}

/// Prompts on stdout and reads answers from any buffered reader.
pub struct StdinPrompter<R> {
    input: R,
    /// Read secrets from the terminal with echo off.
    hide_secrets: bool,
}

impl StdinPrompter<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        let stdin = io::stdin();
        Self {
            hide_secrets: stdin.is_terminal(),
            input: stdin.lock(),
        }
    }
}

impl<R: BufRead> StdinPrompter<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            hide_secrets: false,
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead> Prompter for StdinPrompter<R> {
    fn line(&mut self, label: &str) -> Result<String> {
        print!("{label}: ");
        io::stdout().flush()?;
        Ok(self.read_line()?.unwrap_or_default())
    }

    fn secret(&mut self, label: &str) -> Result<String> {
        if !self.hide_secrets {
            return self.line(label);
        }

        print!("{label}: ");
        io::stdout().flush()?;
        let secret = read_hidden();
        println!();
        Ok(secret?)
    }

    fn text(&mut self, label: &str) -> Result<String> {
        println!("{label} (enter two blank lines to break):");
        io::stdout().flush()?;
        read_until_two_blank_lines(|| self.read_line())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Submit,
    Cancel,
}

/// Apply one key press to a secret being typed.
fn apply_key(buf: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Continue;
    }
    match key.code {
        KeyCode::Enter => KeyOutcome::Submit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Cancel,
        KeyCode::Esc => KeyOutcome::Cancel,
        KeyCode::Backspace => {
            buf.pop();
            KeyOutcome::Continue
        }
        KeyCode::Char(c) => {
            buf.push(c);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}

/// Read one line from the terminal in raw mode, so nothing is echoed.
fn read_hidden() -> io::Result<String> {
    enable_raw_mode()?;
    let result = read_keys();
    disable_raw_mode()?;
    result
}

fn read_keys() -> io::Result<String> {
    let mut buf = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            match apply_key(&mut buf, key) {
                KeyOutcome::Continue => {}
                KeyOutcome::Submit => return Ok(buf),
                KeyOutcome::Cancel => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "password entry cancelled"));
                }
            }
        }
    }
}

/// Collect lines until two consecutive blank lines or end of input.
fn read_until_two_blank_lines(
    mut next: impl FnMut() -> Result<Option<String>>,
) -> Result<String> {
    let mut text = String::new();
    let mut blanks = 0;

    while let Some(line) = next()? {
        if line.trim().is_empty() {
            blanks += 1;
            if blanks == 2 {
                break;
            }
        } else {
            blanks = 0;
        }
        text.push_str(&line);
        text.push('\n');
    }

    Ok(text.trim().to_string())
}
