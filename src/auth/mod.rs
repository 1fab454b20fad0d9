//! Authentication against the git host.
//!
//! SSH is probed first; if the host doesn't recognise a key the user is
//! authenticated over HTTPS with a cached or prompted credential.

pub mod credential;
pub mod https;
pub mod prompt;
pub mod ssh;

use crate::config::Config;
use std::fmt;

/// An authenticated user and the fork they push to.
///
/// `password` is only set for HTTPS; SSH identities leave it `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub password: Option<String>,
    pub email: String,
    pub remote: String,
}

impl Identity {
    pub fn ssh(name: &str, org: &str, config: &Config) -> Self {
        Self {
            name: name.to_owned(),
            password: None,
            email: noreply(name, config),
            // no ':' after the host, matching the remotes push50 has always produced
            remote: format!("git@{}/{}/{}", config.host, org, name),
        }
    }

    pub fn https(name: &str, password: &str, org: &str, config: &Config) -> Self {
        Self {
            name: name.to_owned(),
            password: Some(password.to_owned()),
            email: noreply(name, config),
            remote: format!(
                "{}://{}@{}/{}/{}",
                config.protocol, name, config.host, org, name
            ),
        }
    }
}

fn noreply(name: &str, config: &Config) -> String {
    format!("{}@users.noreply.{}", name, config.host)
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
