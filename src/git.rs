//! Invocation of the `git` binary.
//!
//! A [`Git`] value carries every argument that has to precede the
//! subcommand (`-C`, `-c key=value`). It is built once by `main` and handed
//! to whatever needs to run git, so nothing depends on the process cwd or
//! on shared mutable state.

use crate::config::Config;
use crate::error::{Error, Result, TransportError};
use crate::slug::BranchLister;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const MIN_VERSION: (u32, u32, u32) = (2, 7, 0);

static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^git version (\d+)\.(\d+)\.(\d+)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Git {
    program: PathBuf,
    args: Vec<String>,
}

impl Git {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
            args: Vec::new(),
        }
    }

    /// Adds `-c key=value` in front of every subcommand.
    pub fn with_config(&self, setting: impl Into<String>) -> Self {
        let mut git = self.clone();
        git.args.push("-c".to_owned());
        git.args.push(setting.into());
        git
    }

    /// Runs every subcommand as if git had been started in `dir`.
    pub fn in_dir(&self, dir: &Path) -> Self {
        let mut git = self.clone();
        git.args.push("-C".to_owned());
        git.args.push(dir.display().to_string());
        git
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument list for `subcommand`, leading options included.
    pub fn argv(&self, subcommand: &[&str]) -> Vec<String> {
        self.args
            .iter()
            .cloned()
            .chain(subcommand.iter().map(|s| (*s).to_owned()))
            .collect()
    }

    pub fn describe(&self, subcommand: &[&str]) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.argv(subcommand) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }

    pub fn command(&self, subcommand: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.argv(subcommand));
        cmd
    }

    pub fn output(&self, subcommand: &[&str]) -> Result<String, TransportError> {
        self.run(subcommand, None)
    }

    /// Runs `subcommand` with `input` written to its stdin.
    pub fn output_with_input(
        &self,
        subcommand: &[&str],
        input: &str,
    ) -> Result<String, TransportError> {
        self.run(subcommand, Some(input))
    }

    fn run(&self, subcommand: &[&str], input: Option<&str>) -> Result<String, TransportError> {
        let line = self.describe(subcommand);
        tracing::debug!("{}", line);
        let mut child = self
            .command(subcommand)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(input.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(TransportError::Git {
                command: line,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Branch names advertised by the remote at `url`, in listing order.
    pub fn remote_heads(&self, url: &str) -> Result<Vec<String>, TransportError> {
        let out = self.output(&["ls-remote", "--heads", url])?;
        Ok(parse_heads(&out))
    }

    /// Local branches of the repository at `path`, in listing order.
    pub fn local_branches(&self, path: &Path) -> Result<Vec<String>, TransportError> {
        let out = self
            .in_dir(path)
            .output(&["for-each-ref", "--format=%(refname)", "refs/heads/"])?;
        Ok(out
            .lines()
            .filter_map(|l| l.trim().strip_prefix("refs/heads/"))
            .map(str::to_owned)
            .collect())
    }
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

/// Branch names from `ls-remote --heads` output (`<sha>\trefs/heads/<branch>`).
pub fn parse_heads(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .filter_map(|(_, reference)| reference.trim().strip_prefix("refs/heads/"))
        .map(str::to_owned)
        .collect()
}

/// Lists branches through `git`, remotely over `{protocol}://{host}` or from
/// the local mirror under `config.local_path`.
pub struct GitBranches<'a> {
    pub git: &'a Git,
    pub config: &'a Config,
}

impl BranchLister for GitBranches<'_> {
    fn branches(
        &self,
        org: &str,
        repo: &str,
        offline: bool,
    ) -> Result<Vec<String>, TransportError> {
        if offline {
            self.git.local_branches(&self.config.mirror_path(org, repo))
        } else {
            let url = format!(
                "{}://{}/{}/{}",
                self.config.protocol, self.config.host, org, repo
            );
            self.git.remote_heads(&url)
        }
    }
}

/// Checks that git is installed and recent enough for
/// `credentialcache.ignoresighup` to be honoured.
pub fn check_dependencies(git: &Git) -> Result<()> {
    let output = match git.command(&["--version"]).output() {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::Dependency(
                "You don't have git. Install git, then re-run!".to_owned(),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    let version = String::from_utf8_lossy(&output.stdout);
    tracing::debug!("{}", version.trim());
    match parse_version(&version) {
        Some(v) if v >= MIN_VERSION => Ok(()),
        _ => Err(Error::Dependency(
            "You have an old version of git. Install version 2.7 or later, then re-run!"
                .to_owned(),
        )),
    }
}

fn parse_version(s: &str) -> Option<(u32, u32, u32)> {
    let caps = VERSION.captures(s.trim())?;
    let part = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    Some((part(1)?, part(2)?, part(3)?))
}
