//! Ctrl-C outside raw mode.
//!
//! In raw mode Ctrl-C is a key press handled by the masked password reader.
//! Anywhere else it is a signal, and while an HTTPS attempt is under way the
//! handler clears the credential cache before the process exits.

use crate::auth::credential::GitCredentialCache;
use crate::auth::https::forget;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::Git;
use std::sync::atomic::{AtomicUsize, Ordering};

static HTTPS_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

/// Counts as in progress until dropped.
pub struct Attempt(&'static AtomicUsize);

impl Attempt {
    fn begin(counter: &'static AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for Attempt {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

pub fn https_attempt() -> Attempt {
    Attempt::begin(&HTTPS_ATTEMPTS)
}

pub fn https_in_progress() -> bool {
    HTTPS_ATTEMPTS.load(Ordering::Acquire) > 0
}

pub fn install(git: Git, config: Config) -> Result<()> {
    ctrlc::set_handler(move || {
        if https_in_progress() {
            tracing::info!("interrupted, clearing cached credential");
            forget(&GitCredentialCache::new(&git, &config));
        }
        eprintln!();
        std::process::exit(130);
    })
    .map_err(|e| Error::Io(std::io::Error::other(e)))
}
