//! Interactive programs driven through a pseudo-terminal.
//!
//! A session is read incrementally and matched against a list of patterns.
//! The first pattern, in list order, that matches the pending output wins and
//! everything up to the end of that match is consumed.

use portable_pty::{Child, ChildKiller, CommandBuilder, MasterPty, PtySize, native_pty_system};
use regex::bytes::Regex;
use std::ffi::OsStr;
use std::io::{self, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// Index of the pattern that matched and its capture groups.
    Matched { index: usize, groups: Vec<String> },
    Eof,
    Timeout,
}

pub trait Interactive {
    fn send_line(&mut self, line: &str) -> io::Result<()>;
    fn expect(&mut self, patterns: &[Regex], timeout: Duration) -> io::Result<Expect>;
    /// Stops the program if it is still running. Safe to call twice.
    fn terminate(&mut self) -> io::Result<()>;
}

/// Looks for the highest-priority match in `buffer` and drains the buffer
/// through it.
pub fn find_match(buffer: &mut Vec<u8>, patterns: &[Regex]) -> Option<Expect> {
    for (index, re) in patterns.iter().enumerate() {
        let Some(caps) = re.captures(buffer.as_slice()) else {
            continue;
        };
        let groups = caps
            .iter()
            .skip(1)
            .map(|g| {
                g.map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
                    .unwrap_or_default()
            })
            .collect();
        let end = caps.get(0).map_or(0, |m| m.end());
        buffer.drain(..end);
        return Some(Expect::Matched { index, groups });
    }
    None
}

pub struct PtySession {
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    output: Receiver<Vec<u8>>,
    buffer: Vec<u8>,
    eof: bool,
    terminated: bool,
    _master: Box<dyn MasterPty + Send>,
}

fn pty_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::other(e.to_string())
}

impl PtySession {
    pub fn spawn<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> io::Result<Self> {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(pty_error)?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);
        let child = pair.slave.spawn_command(cmd).map_err(pty_error)?;
        drop(pair.slave);

        let mut reader = pair.master.try_clone_reader().map_err(pty_error)?;
        let writer = pair.master.take_writer().map_err(pty_error)?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = [0u8; 1024];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            child,
            writer,
            output: rx,
            buffer: Vec::new(),
            eof: false,
            terminated: false,
            _master: pair.master,
        })
    }
}

impl Interactive for PtySession {
    fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn expect(&mut self, patterns: &[Regex], timeout: Duration) -> io::Result<Expect> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(m) = find_match(&mut self.buffer, patterns) {
                return Ok(m);
            }
            if self.eof {
                return Ok(Expect::Eof);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.output.recv_timeout(remaining) {
                Ok(chunk) => self.buffer.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => return Ok(Expect::Timeout),
                Err(RecvTimeoutError::Disconnected) => self.eof = true,
            }
        }
    }

    fn terminate(&mut self) -> io::Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;
        if self.child.try_wait()?.is_none() {
            self.child.kill()?;
        }
        self.child.wait()?;
        Ok(())
    }
}

impl Drop for PtySession {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            tracing::warn!("could not stop child process: {}", e);
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Replays canned output and records what was sent.
    #[derive(Debug, Default)]
    pub struct ScriptedSession {
        pub output: Vec<u8>,
        pub sent: Vec<String>,
        pub terminated: bool,
    }

    impl ScriptedSession {
        pub fn new(output: &str) -> Self {
            Self {
                output: output.as_bytes().to_vec(),
                ..Default::default()
            }
        }
    }

    impl Interactive for ScriptedSession {
        fn send_line(&mut self, line: &str) -> io::Result<()> {
            self.sent.push(line.to_owned());
            Ok(())
        }

        fn expect(&mut self, patterns: &[Regex], _timeout: Duration) -> io::Result<Expect> {
            Ok(find_match(&mut self.output, patterns).unwrap_or(Expect::Eof))
        }

        fn terminate(&mut self) -> io::Result<()> {
            self.terminated = true;
            Ok(())
        }
    }
}
