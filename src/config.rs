use crate::env_keys::{ENV_HOME, ENV_PUSH50_HOST, ENV_PUSH50_LOCAL_PATH, ENV_XDG_CONFIG_HOME};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ONE_WEEK: u64 = 7 * 24 * 60 * 60;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub protocol: String,
    pub api_url: String,
    pub otp_header: String,
    pub config_file: String,
    pub local_path: PathBuf,
    pub credential_socket: PathBuf,
    /// Seconds an approved credential stays in the cache.
    pub credential_timeout: u64,
    /// Seconds to wait for an interactive session to print something we recognise.
    pub expect_timeout: u64,
}

impl Config {
    pub fn new() -> Self {
        let home = home_dir();
        Self {
            host: "github.com".to_owned(),
            protocol: "https".to_owned(),
            api_url: "https://api.github.com".to_owned(),
            otp_header: "X-GitHub-OTP".to_owned(),
            config_file: ".cs50.yaml".to_owned(),
            local_path: home.join(".local/share/push50"),
            credential_socket: home.join(".git-credential-cache/push50"),
            credential_timeout: ONE_WEEK,
            expect_timeout: 10,
        }
    }

    pub fn from_path(p: &Path) -> Self {
        let mut s = String::new();
        let conf = match File::open(p).and_then(|mut f| f.read_to_string(&mut s)) {
            Ok(_) => toml::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!("ignoring {}: {}", p.display(), e);
                Self::new()
            }),
            Err(_) => Self::new(),
        };
        conf.with_env()
    }

    fn with_env(mut self) -> Self {
        if let Ok(host) = std::env::var(ENV_PUSH50_HOST) {
            self.host = host;
        }
        if let Ok(path) = std::env::var(ENV_PUSH50_LOCAL_PATH) {
            self.local_path = PathBuf::from(path);
        }
        self
    }

    pub fn expect_timeout(&self) -> Duration {
        Duration::from_secs(self.expect_timeout)
    }

    /// Local mirror consulted for offline branch lookups.
    pub fn mirror_path(&self, org: &str, repo: &str) -> PathBuf {
        self.local_path.join(org).join(repo)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn home_dir() -> PathBuf {
    std::env::var(ENV_HOME).map(PathBuf::from).unwrap_or_default()
}

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    let mut path = match std::env::var(ENV_XDG_CONFIG_HOME) {
        Ok(p) => PathBuf::from(p),
        Err(_) => home_dir().join(".config"),
    };
    path.push("push50");
    path.push("config.toml");
    path
});
