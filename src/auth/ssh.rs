use crate::auth::Identity;
use crate::config::Config;
use crate::session::{Expect, Interactive, PtySession};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

// priority order, see SshState
static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Hi (.+)! You've successfully authenticated",
        r"Enter passphrase for key",
        r"Permission denied",
        r"Are you sure you want to continue connecting",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum SshState {
    Authenticated(String),
    PassphrasePrompt,
    PermissionDenied,
    UnknownHost,
    NoAnswer,
}

impl From<Expect> for SshState {
    fn from(e: Expect) -> Self {
        match e {
            Expect::Matched { index: 0, groups } => match groups.into_iter().next() {
                Some(name) if !name.is_empty() => Self::Authenticated(name),
                _ => Self::NoAnswer,
            },
            Expect::Matched { index: 1, .. } => Self::PassphrasePrompt,
            Expect::Matched { index: 2, .. } => Self::PermissionDenied,
            Expect::Matched { index: 3, .. } => Self::UnknownHost,
            _ => Self::NoAnswer,
        }
    }
}

/// Key-based authentication through `ssh git@{host}`.
pub struct SshAuthenticator<'a> {
    config: &'a Config,
}

impl<'a> SshAuthenticator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// `None` when SSH can't be used without interaction.
    pub fn try_authenticate(&self, org: &str) -> Option<Identity> {
        let target = format!("git@{}", self.config.host);
        tracing::debug!("ssh {}", target);
        match PtySession::spawn("ssh", &[target]) {
            Ok(mut session) => self.probe(&mut session, org),
            Err(e) => {
                tracing::debug!("could not start ssh: {}", e);
                None
            }
        }
    }

    /// Reads the session until one of the known answers shows up, then
    /// stops the session whatever the answer was.
    pub fn probe(&self, session: &mut impl Interactive, org: &str) -> Option<Identity> {
        let answer = session.expect(&PATTERNS, self.config.expect_timeout());
        if let Err(e) = session.terminate() {
            tracing::warn!("could not stop ssh: {}", e);
        }
        let state = match answer {
            Ok(expect) => SshState::from(expect),
            Err(e) => {
                tracing::debug!("reading from ssh: {}", e);
                SshState::NoAnswer
            }
        };
        tracing::info!("ssh: {:?}", state);
        match state {
            SshState::Authenticated(name) => Some(Identity::ssh(&name, org, self.config)),
            _ => None,
        }
    }
}
