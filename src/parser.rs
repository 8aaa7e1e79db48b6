// src/parser.rs

use crate::model::{CommitBuilder, CommitRecord, FileChange};
use log::{debug, trace};

/// Separates the fields of a header line: `hash|author|email|date|subject`
pub const FIELD_SEPARATOR: char = '|';

/// Separates the fields of a stat line: `additions\tdeletions\tpath`
pub const STAT_SEPARATOR: char = '\t';

/// Emitted instead of a number for binary files
pub const BINARY_PLACEHOLDER: &str = "-";

const HEADER_FIELDS: usize = 5;
const STAT_FIELDS: usize = 3;

#[derive(Debug, PartialEq, Eq)]
struct Header<'a> {
    hash: &'a str,
    author: &'a str,
    email: &'a str,
    date: &'a str,
    message: &'a str,
}

impl Header<'_> {
    fn open(self) -> CommitBuilder {
        CommitBuilder::new(self.hash, self.author, self.email, self.date, self.message)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Header(Header<'a>),
    Stat(FileChange),
    Blank,
    Unrecognized,
}

enum State {
    AwaitingHeader,
    InCommit(CommitBuilder),
}

/// Parses a raw log stream into commit records, in stream order.
///
/// Never fails: blank lines are ignored, lines that are neither a header nor a
/// stat line are skipped, and stat lines seen before the first header have
/// nothing to attach to and are dropped.
pub fn parse(raw: &str) -> Vec<CommitRecord> {
    let mut commits = Vec::new();
    let mut state = State::AwaitingHeader;

    for (line_no, line) in raw.lines().enumerate() {
        state = match (state, classify(line)) {
            (State::AwaitingHeader, Line::Header(header)) => State::InCommit(header.open()),
            (State::InCommit(open), Line::Header(header)) => {
                commits.push(open.seal());
                State::InCommit(header.open())
            }
            (State::InCommit(mut open), Line::Stat(file)) => {
                open.add_file(file);
                State::InCommit(open)
            }
            (State::AwaitingHeader, Line::Stat(file)) => {
                debug!("line {}: stat for {} outside of any commit, skipped", line_no + 1, file.name);
                State::AwaitingHeader
            }
            (state, Line::Blank) => state,
            (state, Line::Unrecognized) => {
                trace!("line {}: unrecognized, skipped: {:?}", line_no + 1, line);
                state
            }
        };
    }

    if let State::InCommit(open) = state {
        commits.push(open.seal());
    }

    debug!("parsed {} commits", commits.len());
    commits
}

fn classify(line: &str) -> Line<'_> {
    if line.split(FIELD_SEPARATOR).count() >= HEADER_FIELDS {
        // The subject keeps any separators of its own.
        let mut fields = line.splitn(HEADER_FIELDS, FIELD_SEPARATOR);
        let mut next = || fields.next().unwrap_or_default();
        return Line::Header(Header {
            hash: next(),
            author: next(),
            email: next(),
            date: next(),
            message: next(),
        });
    }

    if line.trim().is_empty() {
        return Line::Blank;
    }

    let fields: Vec<&str> = line.split(STAT_SEPARATOR).collect();
    if fields.len() < STAT_FIELDS {
        return Line::Unrecognized;
    }

    Line::Stat(FileChange {
        name: fields[2].to_string(),
        additions: parse_count(fields[0]),
        deletions: parse_count(fields[1]),
    })
}

/// Numeric stat token, read from its leading digits (`12abc` is 12). The binary
/// placeholder and tokens without leading digits count as zero.
fn parse_count(token: &str) -> u64 {
    let token = token.trim();
    if token == BINARY_PLACEHOLDER {
        return 0;
    }
    let digits = token.find(|c: char| !c.is_ascii_digit()).unwrap_or(token.len());
    token[..digits].parse().unwrap_or(0)
}
