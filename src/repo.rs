// src/repo.rs

use crate::parser::{BINARY_PLACEHOLDER, FIELD_SEPARATOR, STAT_SEPARATOR};
use chrono::{DateTime, FixedOffset};
use git2::{Commit, DiffOptions, ErrorCode, Patch, Repository, Revwalk, Sort};
use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Repository path does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),
    #[error("failed to resolve repository path {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Git(#[from] git2::Error),
}

impl RepoError {
    fn resolving(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => RepoError::NotFound(path.to_path_buf()),
            _ => RepoError::Io { path: path.to_path_buf(), source },
        }
    }
}

/// A distinct author identity found in the history
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

impl Author {
    fn of(commit: &Commit) -> Self {
        let signature = commit.author();
        Author {
            name: signature.name().unwrap_or("Unknown").trim().to_string(),
            email: signature.email().unwrap_or("").trim().to_string(),
        }
    }
}

/// Read access to the history of a local repository.
pub struct Repo {
    repo: Repository,
    path: PathBuf,
}

impl Repo {
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        let path = path.canonicalize().map_err(|e| RepoError::resolving(path, e))?;
        let repo = Repository::open(&path).map_err(|e| match e.code() {
            ErrorCode::NotFound => RepoError::NotARepository(path.clone()),
            _ => RepoError::Git(e),
        })?;
        debug!("opened repository at {}", path.display());
        Ok(Repo { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every author of a non-merge commit reachable from any ref, sorted by name then email.
    pub fn authors(&self) -> Result<Vec<Author>, RepoError> {
        let mut authors = BTreeSet::new();
        for commit in self.commits()? {
            authors.insert(Author::of(&commit?));
        }
        Ok(authors.into_iter().collect())
    }

    /// Renders the non-merge commits of `author`, newest first, as a numstat log stream:
    /// a `hash|author|email|date|subject` header, one `additions\tdeletions\tpath` line per
    /// changed file, then a blank line.
    pub fn log_for(&self, author: &Author) -> Result<String, RepoError> {
        let mut out = String::new();
        for commit in self.commits()? {
            let commit = commit?;
            if Author::of(&commit) != *author {
                continue;
            }
            let sep = FIELD_SEPARATOR;
            out.push_str(&format!(
                "{}{sep}{}{sep}{}{sep}{}{sep}{}\n",
                commit.id(),
                author.name,
                author.email,
                format_date(commit.author().when()),
                commit.summary().unwrap_or(""),
            ));
            self.push_numstat(&commit, &mut out)?;
            out.push('\n');
        }
        Ok(out)
    }

    /// Non-merge commits from all refs (and a detached HEAD), newest first.
    fn commits(&self) -> Result<impl Iterator<Item = Result<Commit<'_>, git2::Error>> + '_, RepoError> {
        let walk = self.revwalk()?;
        Ok(walk
            .map(move |oid| self.repo.find_commit(oid?))
            .filter(|commit| commit.as_ref().map_or(true, |c| c.parent_count() <= 1)))
    }

    fn revwalk(&self) -> Result<Revwalk<'_>, git2::Error> {
        let mut walk = self.repo.revwalk()?;
        walk.push_glob("*")?;
        // An unborn HEAD has nothing to push.
        if self.repo.head().is_ok() {
            walk.push_head()?;
        }
        walk.set_sorting(Sort::TIME)?;
        Ok(walk)
    }

    fn push_numstat(&self, commit: &Commit, out: &mut String) -> Result<(), git2::Error> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.ignore_filemode(true);
        let diff = self.repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

        for idx in 0..diff.deltas().len() {
            let Some(delta) = diff.get_delta(idx) else { continue };
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();

            let counts = match Patch::from_diff(&diff, idx)? {
                Some(patch) if !patch.delta().flags().is_binary() => {
                    let (_, additions, deletions) = patch.line_stats()?;
                    Some((additions, deletions))
                }
                _ => None,
            };
            let line = match counts {
                Some((additions, deletions)) => {
                    format!("{additions}{STAT_SEPARATOR}{deletions}{STAT_SEPARATOR}{path}\n")
                }
                None => format!("{BINARY_PLACEHOLDER}{STAT_SEPARATOR}{BINARY_PLACEHOLDER}{STAT_SEPARATOR}{path}\n"),
            };
            out.push_str(&line);
        }
        Ok(())
    }
}

/// `YYYY-MM-DD HH:MM:SS +ZZZZ` in the signature's own offset
fn format_date(time: git2::Time) -> String {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60);
    match (DateTime::from_timestamp(time.seconds(), 0), offset) {
        (Some(utc), Some(offset)) => utc.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S %z").to_string(),
        _ => time.seconds().to_string(),
    }
}
