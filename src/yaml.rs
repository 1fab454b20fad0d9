//! `.cs50.yaml` handling.
//!
//! The file maps tool names to a mapping of settings. Settings are kept as
//! untyped YAML because every tool defines its own keys; the only typed
//! ones are `include` and `required`.

use crate::error::{Error, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfig(Mapping);

impl ProjectConfig {
    pub fn parse(content: &[u8]) -> Result<Self, serde_yaml::Error> {
        match serde_yaml::from_slice(content)? {
            Value::Null => Ok(Self::default()),
            value => Ok(Self(serde_yaml::from_value(value)?)),
        }
    }

    pub fn tool(&self, name: &str) -> Option<ToolConfig> {
        self.0.get(name).cloned().map(ToolConfig)
    }

    /// Merges a problem directory's config over the repository root's.
    ///
    /// For a key both sides set, a root sequence is extended with the local
    /// value (root entries first, duplicates kept); anything else is
    /// replaced by the local value. This runtime check on the root value is
    /// the only merge rule. Neither input is modified.
    pub fn merge(local: &Self, root: &Self) -> Self {
        let mut result = root.0.clone();
        for (tool, section) in &local.0 {
            if let (Some(Value::Mapping(merged)), Value::Mapping(keys)) =
                (result.get_mut(tool), section)
            {
                for (key, value) in keys {
                    match (merged.get_mut(key), value) {
                        (Some(Value::Sequence(seq)), Value::Sequence(extra)) => {
                            seq.extend(extra.iter().cloned())
                        }
                        _ => {
                            merged.insert(key.clone(), value.clone());
                        }
                    }
                }
                continue;
            }
            result.insert(tool.clone(), section.clone());
        }
        Self(result)
    }
}

/// One tool's section of the merged config.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig(Value);

impl ToolConfig {
    fn strings(&self, key: &str) -> Option<Vec<String>> {
        let seq = self.0.get(key)?.as_sequence()?;
        Some(
            seq.iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
        )
    }

    pub fn required(&self) -> Vec<String> {
        self.strings("required").unwrap_or_default()
    }

    pub fn include(&self) -> Option<Vec<String>> {
        self.strings("include")
    }

    /// Fails listing every `required` path that is not a regular file under `dir`.
    pub fn check_required(&self, dir: &Path) -> Result<()> {
        let missing: Vec<String> = self
            .required()
            .into_iter()
            .filter(|f| !dir.join(f).is_file())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(Error::Submission(format!(
            "You seem to be missing these files:\n{}\nEnsure you have the required files before submitting.",
            missing.join("\n")
        )))
    }

    /// Contents of a git exclude file that ignores everything but the files
    /// matched by `include` plus the `required` ones. Empty when no
    /// `include` is given.
    pub fn exclude(&self, dir: &Path) -> String {
        let Some(patterns) = self.include() else {
            return String::new();
        };
        let base = glob::Pattern::escape(&dir.to_string_lossy());
        let mut included: Vec<String> = Vec::new();
        for pattern in patterns {
            let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
            let Ok(paths) = glob::glob(&full) else {
                tracing::warn!("bad include pattern {}", pattern);
                continue;
            };
            for path in paths.flatten() {
                if let Ok(rel) = path.strip_prefix(dir) {
                    included.push(rel.to_string_lossy().into_owned());
                }
            }
        }
        for req in self.required() {
            if !included.contains(&req) {
                included.push(req);
            }
        }
        let mut out = "*".to_owned();
        for i in included {
            out.push_str("\n!");
            out.push_str(&i);
        }
        out
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.0)
            .map_err(|e| Error::Submission(format!("Could not render config: {e}")))
    }
}
