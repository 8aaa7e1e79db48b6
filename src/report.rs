// src/report.rs

use crate::model::{ChangeValue, EstimatedCommit};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const HOURS_PER_DAY: f64 = 8.0;
pub const HOURS_PER_WEEK: f64 = 40.0;
pub const SUMMARY_FILE: &str = "_summary.json";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub hash: String,
    pub date: String,
    pub message: String,
    pub additions: u64,
    pub deletions: u64,
    pub files_changed: usize,
    pub estimated_hours: f64,
    pub change_value: ChangeValue,
}

/// Per-developer report, written as `<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperReport {
    pub developer: String,
    pub email: String,
    pub total_commits: usize,
    pub total_hours: f64,
    pub total_days: f64,
    pub total_weeks: f64,
    pub commits: Vec<CommitSummary>,
}

impl DeveloperReport {
    /// Totals the estimates of one developer; the email is taken from the first commit.
    pub fn assemble(developer: &str, commits: &[EstimatedCommit]) -> Self {
        let total_hours: f64 = commits.iter().map(|c| c.estimate.hours_total).sum();
        let email = commits.first().map(|c| c.commit.email.clone()).unwrap_or_default();

        DeveloperReport {
            developer: developer.to_string(),
            email,
            total_commits: commits.len(),
            total_hours: round2(total_hours),
            total_days: round2(total_hours / HOURS_PER_DAY),
            total_weeks: round2(total_hours / HOURS_PER_WEEK),
            commits: commits
                .iter()
                .map(|c| CommitSummary {
                    hash: c.commit.hash.clone(),
                    date: c.commit.date.clone(),
                    message: c.commit.message.clone(),
                    additions: c.commit.additions(),
                    deletions: c.commit.deletions(),
                    files_changed: c.commit.files().len(),
                    estimated_hours: round2(c.estimate.hours_total),
                    change_value: c.estimate.change_value.clone(),
                })
                .collect(),
        }
    }

    pub fn totals(&self) -> DeveloperTotals {
        DeveloperTotals {
            developer: self.developer.clone(),
            email: self.email.clone(),
            commits: self.total_commits,
            hours: self.total_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperTotals {
    pub developer: String,
    pub email: String,
    pub commits: usize,
    pub hours: f64,
}

/// Repository-wide roll-up of every developer report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub generated_at: String,
    pub total_developers: usize,
    pub grand_total_hours: f64,
    pub grand_total_days: f64,
    pub grand_total_weeks: f64,
    pub developers: Vec<DeveloperTotals>,
}

impl Summary {
    pub fn new(developers: Vec<DeveloperTotals>, generated_at: DateTime<Utc>) -> Self {
        let grand_total: f64 = developers.iter().map(|d| d.hours).sum();
        Summary {
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_developers: developers.len(),
            grand_total_hours: round2(grand_total),
            grand_total_days: round2(grand_total / HOURS_PER_DAY),
            grand_total_weeks: round2(grand_total / HOURS_PER_WEEK),
            developers,
        }
    }
}

/// Makes a developer name or email safe to use as a file name.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .filter_map(|c| match c {
            '/' | '\\' => Some('-'),
            '[' | ']' | '<' | '>' | ':' | '"' | '|' | '?' | '*' | '@' => None,
            c => Some(c),
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Writes pretty-printed JSON reports into one directory.
#[derive(Debug)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("failed to create output directory {}", dir.display()))?;
        Ok(ReportWriter { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_developer(&self, report: &DeveloperReport, filename_base: &str) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.json", sanitize_filename(filename_base)));
        self.write(&path, report)?;
        Ok(path)
    }

    pub fn write_summary(&self, summary: &Summary) -> Result<PathBuf> {
        let path = self.dir.join(SUMMARY_FILE);
        self.write(&path, summary)?;
        Ok(path)
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
        Ok(())
    }
}
