use crate::error::{Error, Result};
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::cell::Cell;
use std::io::{self, BufRead, Write};

pub trait Prompter {
    fn username(&self, prompt: &str) -> Result<String>;
    /// Masked entry. Ctrl-C aborts with [`Error::Interrupted`].
    fn password(&self, prompt: &str) -> Result<String>;
}

#[derive(Default)]
pub struct TerminalPrompter {
    warned: Cell<bool>,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    fn warn_once(&self) {
        if self.warned.replace(true) {
            return;
        }
        let warning = "GitHub now requires that you use SSH or a personal access token \
                       instead of a password to log in, but you can still use push50! \
                       Create a token at https://github.com/settings/tokens and enter it as your password.";
        println!("{}", warning.yellow().bold());
    }
}

impl Prompter for TerminalPrompter {
    fn username(&self, prompt: &str) -> Result<String> {
        self.warn_once();
        read_username(prompt, &mut io::stdin().lock(), &mut io::stdout())
    }

    fn password(&self, prompt: &str) -> Result<String> {
        self.warn_once();
        let mut stdout = io::stdout();
        loop {
            write!(stdout, "{prompt}")?;
            stdout.flush()?;
            let password = {
                let _raw = RawMode::enable()?;
                read_masked(terminal_keys(), &mut stdout)?
            };
            if !password.is_empty() {
                return Ok(password);
            }
            println!("Password cannot be empty, please try again.");
        }
    }
}

struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("could not restore terminal: {}", e);
        }
    }
}

fn terminal_keys() -> impl Iterator<Item = io::Result<KeyEvent>> {
    std::iter::from_fn(|| {
        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => return Some(Ok(key)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    })
}

/// Reads lines until one isn't blank. End of input aborts with
/// [`Error::Interrupted`].
pub fn read_username(
    prompt: &str,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<String> {
    let mut line = String::new();
    loop {
        write!(out, "{prompt}")?;
        out.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            return Err(Error::Interrupted);
        }
        let name = line.trim();
        if !name.is_empty() {
            return Ok(name.to_owned());
        }
        writeln!(out, "Username cannot be empty, please try again.")?;
    }
}

/// Collects a password from key presses, echoing `*` per character.
/// Enter or Ctrl-D finish, Backspace deletes, Ctrl-C aborts.
pub fn read_masked(
    keys: impl IntoIterator<Item = io::Result<KeyEvent>>,
    out: &mut impl Write,
) -> Result<String> {
    let mut password = String::new();
    for key in keys {
        let key = key?;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => break,
            KeyCode::Char('d') if ctrl => break,
            KeyCode::Char('c') if ctrl => {
                write!(out, "^C\r\n")?;
                out.flush()?;
                return Err(Error::Interrupted);
            }
            KeyCode::Backspace => {
                if password.pop().is_some() {
                    write!(out, "\x08 \x08")?;
                }
            }
            KeyCode::Char(c) => {
                password.push(c);
                write!(out, "*")?;
            }
            _ => {}
        }
        out.flush()?;
    }
    write!(out, "\r\n")?;
    out.flush()?;
    Ok(password)
}
