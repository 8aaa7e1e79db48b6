// src/model.rs

use serde::{Deserialize, Serialize};

/// Lines added and removed in a single file of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub name: String,
    pub additions: u64,
    pub deletions: u64,
}

/// A single non-merge commit reconstructed from the log stream.
///
/// The line totals are only ever derived from `files`, so
/// `total_changes() == additions() + deletions()` and both match the sums
/// over `files()` for every sealed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub author: String,
    pub email: String,
    /// Timestamp exactly as emitted by the log source
    pub date: String,
    /// Subject line, may contain the field separator
    pub message: String,
    files: Vec<FileChange>,
    additions: u64,
    deletions: u64,
}

impl CommitRecord {
    pub fn files(&self) -> &[FileChange] {
        &self.files
    }

    pub fn additions(&self) -> u64 {
        self.additions
    }

    pub fn deletions(&self) -> u64 {
        self.deletions
    }

    pub fn total_changes(&self) -> u64 {
        self.additions.saturating_add(self.deletions)
    }
}

/// An open commit that is still collecting stat lines.
#[derive(Debug)]
pub struct CommitBuilder {
    record: CommitRecord,
}

impl CommitBuilder {
    pub fn new(
        hash: impl Into<String>,
        author: impl Into<String>,
        email: impl Into<String>,
        date: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record: CommitRecord {
                hash: hash.into(),
                author: author.into(),
                email: email.into(),
                date: date.into(),
                message: message.into(),
                files: Vec::new(),
                additions: 0,
                deletions: 0,
            },
        }
    }

    pub fn add_file(&mut self, file: FileChange) {
        self.record.additions = self.record.additions.saturating_add(file.additions);
        self.record.deletions = self.record.deletions.saturating_add(file.deletions);
        self.record.files.push(file);
    }

    #[cfg(test)]
    pub fn with_file(mut self, name: impl Into<String>, additions: u64, deletions: u64) -> Self {
        self.add_file(FileChange { name: name.into(), additions, deletions });
        self
    }

    pub fn seal(self) -> CommitRecord {
        self.record
    }
}

/// Ordinal bucket for the magnitude of a commit, indexed by `floor(base_hours)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    Trivial,
    Simple,
    Medium,
    Large,
    VeryLarge,
    Massive,
}

impl SizeCategory {
    pub const ALL: [SizeCategory; 6] = [
        SizeCategory::Trivial,
        SizeCategory::Simple,
        SizeCategory::Medium,
        SizeCategory::Large,
        SizeCategory::VeryLarge,
        SizeCategory::Massive,
    ];

    /// Bucket for a base-hours value; anything past the last bucket is `Massive`.
    pub fn from_base_hours(base_hours: f64) -> Self {
        let index = base_hours.max(0.0).floor() as usize;
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }
}

/// What kind of work a commit message describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Feature,
    Bugfix,
    Refactor,
    Test,
    Documentation,
    Update,
    Optimization,
    General,
}

/// How an estimate was put together.
///
/// `multipliers` is `[base_hours, type, file_count, language]`, in that order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeValue {
    pub size: SizeCategory,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub multipliers: [f64; 4],
    pub hours_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationResult {
    pub hours_total: f64,
    pub change_value: ChangeValue,
}

/// A commit together with its estimate
#[derive(Debug, Clone)]
pub struct EstimatedCommit {
    pub commit: CommitRecord,
    pub estimate: EstimationResult,
}
