pub mod auth;
pub mod connect;
pub mod logout;
pub mod push;

use crate::config::Config;
use crate::git::Git;

/// Built once in `main` and lent to every command.
pub struct Context {
    pub config: Config,
    pub git: Git,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            git: Git::new(),
        }
    }
}
