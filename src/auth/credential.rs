//! The git credential cache push50 keeps its HTTPS credential in.
//!
//! Everything goes through `git credential` with the `cache` helper bound to
//! push50's own socket, so other helpers configured by the user are never
//! consulted or written to.

use crate::auth::Credential;
use crate::config::Config;
use crate::error::{Error, Result, TransportError};
use crate::git::Git;
use crate::session::{Expect, Interactive, PtySession};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::path::Path;

static FILL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Username( for '[^']*')?:",
        r"Password( for '[^']*')?:",
        r"username=([^\r\n]+)\r?\npassword=([^\r\n]+)\r?\n",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

pub trait CredentialCache {
    /// Makes sure the cache's private directory exists.
    fn prepare(&self) -> Result<()>;
    /// The cached credential, if there is one.
    fn fill(&self) -> Result<Option<Credential>>;
    fn approve(&self, credential: &Credential, org: &str) -> Result<()>;
    /// Stops the cache daemon, dropping whatever it holds.
    fn erase(&self) -> Result<()>;
    /// Removes the host's entry from the OS keychain helper.
    fn erase_keychain(&self) -> Result<()>;
}

pub struct GitCredentialCache<'a> {
    git: &'a Git,
    config: &'a Config,
}

fn cache_error(e: TransportError) -> Error {
    tracing::debug!("credential cache: {}", e);
    Error::Authentication("Could not update the credential cache.".to_owned())
}

impl<'a> GitCredentialCache<'a> {
    pub fn new(git: &'a Git, config: &'a Config) -> Self {
        Self { git, config }
    }

    fn socket(&self) -> &Path {
        &self.config.credential_socket
    }

    /// git with only push50's cache as credential helper.
    fn with_helper(&self, timeout: Option<u64>) -> Git {
        let mut helper = format!("cache --socket '{}'", self.socket().display());
        if let Some(timeout) = timeout {
            helper.push_str(&format!(" --timeout {timeout}"));
        }
        self.git
            .with_config("credential.helper=")
            .with_config(format!("credential.helper={helper}"))
    }

    fn request(&self) -> String {
        format!(
            "protocol={}\nhost={}\n",
            self.config.protocol, self.config.host
        )
    }
}

/// Asks a running `git credential fill` session for the cached credential.
/// A username or password prompt means nothing is cached.
pub fn read_fill(
    session: &mut impl Interactive,
    config: &Config,
) -> std::io::Result<Option<Credential>> {
    session.send_line(&format!("protocol={}", config.protocol))?;
    session.send_line(&format!("host={}", config.host))?;
    session.send_line("")?;
    let found = match session.expect(&FILL_PATTERNS, config.expect_timeout())? {
        Expect::Matched { index: 2, groups } => match groups.as_slice() {
            [username, password] if !password.is_empty() => Some(Credential {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        },
        other => {
            tracing::debug!("credential fill: {:?}", other);
            None
        }
    };
    Ok(found)
}

impl CredentialCache for GitCredentialCache<'_> {
    fn prepare(&self) -> Result<()> {
        let Some(dir) = self.socket().parent() else {
            return Ok(());
        };
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(dir)?;
        Ok(())
    }

    fn fill(&self) -> Result<Option<Credential>> {
        let git = self.with_helper(None);
        let argv = git.argv(&["credential", "fill"]);
        tracing::debug!("{}", git.describe(&["credential", "fill"]));
        let mut session = PtySession::spawn(git.program(), &argv)?;
        let found = read_fill(&mut session, self.config);
        if let Err(e) = session.terminate() {
            tracing::warn!("could not stop git credential fill: {}", e);
        }
        Ok(found?)
    }

    fn approve(&self, credential: &Credential, org: &str) -> Result<()> {
        let input = format!(
            "{}path={}/{}\nusername={}\npassword={}\n\n",
            self.request(),
            org,
            credential.username,
            credential.username,
            credential.password
        );
        self.with_helper(Some(self.config.credential_timeout))
            .with_config("credentialcache.ignoresighup=true")
            .output_with_input(&["credential", "approve"], &input)
            .map_err(cache_error)?;
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        let socket = self.socket().display().to_string();
        self.git
            .output(&["credential-cache", "--socket", &socket, "exit"])
            .map_err(cache_error)?;
        Ok(())
    }

    fn erase_keychain(&self) -> Result<()> {
        let input = format!("{}\n", self.request());
        self.git
            .output_with_input(&["credential-osxkeychain", "erase"], &input)
            .map_err(cache_error)?;
        Ok(())
    }
}
