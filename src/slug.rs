use crate::error::{Error, Result, TransportError};
use std::path::PathBuf;

/// Source of branch names for a repository.
pub trait BranchLister {
    /// Branch names in the order the source lists them. `offline` selects
    /// the local mirror instead of the remote.
    fn branches(&self, org: &str, repo: &str, offline: bool)
    -> Result<Vec<String>, TransportError>;
}

/// A slug resolved to `org/repo/branch/problem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug {
    pub slug: String,
    pub org: String,
    pub repo: String,
    pub branch: String,
    pub problem: PathBuf,
}

struct Parts<'a> {
    org: &'a str,
    repo: &'a str,
    remainder: &'a str,
}

impl Slug {
    /// Parses `slug`, trying the local mirror's branches first unless they
    /// fail to resolve, in which case the remote's heads are consulted.
    /// With `offline` only the local mirror is used.
    pub fn resolve(slug: &str, offline: bool, lister: &impl BranchLister) -> Result<Self> {
        let parts = split(slug)?;
        let lookup = |offline: bool| -> Result<(String, String)> {
            let branches = lister
                .branches(parts.org, parts.repo, offline)
                .map_err(|e| {
                    tracing::debug!("listing branches of {}/{}: {}", parts.org, parts.repo, e);
                    invalid(slug)
                })?;
            match_branch(parts.remainder, &branches).ok_or_else(|| invalid(slug))
        };
        let (branch, problem) = if offline {
            lookup(true)?
        } else {
            lookup(true).or_else(|_| lookup(false))?
        };
        tracing::info!("resolved {} to branch {}", slug, branch);
        Ok(Self {
            slug: slug.to_owned(),
            org: parts.org.to_owned(),
            repo: parts.repo.to_owned(),
            branch,
            problem: PathBuf::from(problem),
        })
    }
}

fn invalid(slug: &str) -> Error {
    Error::InvalidSlug(format!("Invalid slug: {slug}"))
}

fn split(slug: &str) -> Result<Parts<'_>> {
    let trimmed = slug.trim_matches('/');
    let hint = match (slug.starts_with('/'), slug.ends_with('/')) {
        (true, true) => Some("without the leading and trailing slashes"),
        (true, false) => Some("without the leading slash"),
        (false, true) => Some("without the trailing slash"),
        (false, false) => None,
    };
    if let Some(hint) = hint {
        return Err(Error::InvalidSlug(format!(
            "Invalid slug. Did you mean {trimmed}, {hint}?"
        )));
    }

    let mut it = slug.splitn(3, '/');
    match (it.next(), it.next(), it.next()) {
        (Some(org), Some(repo), Some(remainder)) => Ok(Parts {
            org,
            repo,
            remainder,
        }),
        _ => Err(invalid(slug)),
    }
}

/// First branch (in the given order) that `remainder` starts with as a
/// whole `branch/` segment. Returns the branch and what follows it.
fn match_branch(remainder: &str, branches: &[String]) -> Option<(String, String)> {
    branches.iter().find_map(|branch| {
        remainder
            .strip_prefix(branch.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|problem| (branch.clone(), problem.to_owned()))
    })
}
