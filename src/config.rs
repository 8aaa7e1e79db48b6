// src/config.rs

use crate::model::ChangeType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read estimator config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid estimator config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid estimator config {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Keywords that classify a commit message, and the weight of that kind of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRule {
    pub change_type: ChangeType,
    pub keywords: Vec<String>,
    pub multiplier: f64,
}

impl TypeRule {
    fn new(change_type: ChangeType, keywords: &[&str], multiplier: f64) -> Self {
        Self {
            change_type,
            keywords: keywords.iter().map(|kw| kw.to_string()).collect(),
            multiplier,
        }
    }

    pub fn matches(&self, lowercase_message: &str) -> bool {
        self.keywords.iter().any(|kw| lowercase_message.contains(kw.as_str()))
    }
}

/// Applies `multiplier` to commits touching strictly more than `more_than` files
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBand {
    pub more_than: usize,
    pub multiplier: f64,
}

/// Tunable tables behind the effort estimate.
///
/// `type_rules` are tried top to bottom and the first match wins, so their
/// order is the classification priority. Every field may be omitted from a
/// config file and falls back to the built-in value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimatorConfig {
    pub type_rules: Vec<TypeRule>,
    /// Substrings of a file name that mark it as source code
    pub coding_extensions: Vec<String>,
    pub coding_multiplier: f64,
    pub file_bands: Vec<FileBand>,
    /// Base hours for a commit without any changed lines
    pub empty_commit_hours: f64,
    pub max_hours: f64,
    /// Estimates are rounded to a multiple of this
    pub quantum: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            type_rules: vec![
                TypeRule::new(
                    ChangeType::Feature,
                    &["feat", "feature", "add", "implement", "new", "introduce", "create"],
                    1.3,
                ),
                TypeRule::new(
                    ChangeType::Bugfix,
                    &["fix", "bug", "patch", "hotfix", "resolve", "repair", "issue"],
                    1.2,
                ),
                TypeRule::new(
                    ChangeType::Refactor,
                    &["refactor", "restructure", "cleanup", "clean up", "reorganize", "simplify", "rewrite"],
                    1.4,
                ),
                TypeRule::new(ChangeType::Test, &["test", "spec", "coverage"], 1.1),
                TypeRule::new(ChangeType::Documentation, &["doc", "readme", "comment", "changelog"], 0.8),
                TypeRule::new(ChangeType::Update, &["update", "bump", "upgrade", "chore", "version", "config"], 0.9),
                TypeRule::new(ChangeType::Optimization, &["perf", "optimi", "speed", "faster", "cache"], 1.3),
            ],
            coding_extensions: [
                ".rs", ".js", ".jsx", ".ts", ".tsx", ".py", ".go", ".java", ".kt", ".swift", ".cpp", ".cc",
                ".hpp", ".rb", ".php", ".scala", ".vue", ".svelte", ".sh", ".sql",
            ]
            .iter()
            .map(|ext| ext.to_string())
            .collect(),
            coding_multiplier: 1.1,
            file_bands: vec![
                FileBand { more_than: 10, multiplier: 1.3 },
                FileBand { more_than: 5, multiplier: 1.2 },
                FileBand { more_than: 2, multiplier: 1.1 },
            ],
            empty_commit_hours: 0.1,
            max_hours: 16.0,
            quantum: 0.25,
        }
    }
}

impl EstimatorConfig {
    /// Reads a JSON config file, filling anything it leaves out with defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EstimatorConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config.normalized())
    }

    /// Checks that the tables can produce an estimate within `(0, max_hours]`.
    pub fn validate(&self) -> Result<(), String> {
        if !self.quantum.is_finite() || self.quantum <= 0.0 {
            return Err(format!("quantum must be positive, got {}", self.quantum));
        }
        if !self.max_hours.is_finite() || self.max_hours < self.quantum {
            return Err(format!("maxHours {} is below the quantum {}", self.max_hours, self.quantum));
        }
        let weights = self
            .type_rules
            .iter()
            .map(|rule| ("type multiplier", rule.multiplier))
            .chain(self.file_bands.iter().map(|band| ("file band multiplier", band.multiplier)))
            .chain([("codingMultiplier", self.coding_multiplier), ("emptyCommitHours", self.empty_commit_hours)]);
        for (what, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", what, value));
            }
        }
        Ok(())
    }

    /// Lower-cases keywords and extensions and orders file bands from the highest threshold down.
    pub fn normalized(mut self) -> Self {
        for rule in &mut self.type_rules {
            for kw in &mut rule.keywords {
                *kw = kw.to_lowercase();
            }
        }
        for ext in &mut self.coding_extensions {
            *ext = ext.to_lowercase();
        }
        self.file_bands.sort_by(|a, b| b.more_than.cmp(&a.more_than));
        self
    }
}
