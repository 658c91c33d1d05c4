//! Input sources for evaluation: queries and relevance judgments.
//!
//! Both sources are line-oriented text files. Blank lines are ignored and
//! malformed lines are skipped, so a single bad record never aborts a run.
//! Skipped lines are returned alongside the parsed records and logged.
//!
//! ## Query source
//!
//! ```text
//! 1\tWhat articles exist which deal with TSS?
//! 2\tInterested in articles on robotics
//! ```
//!
//! ## Relevance judgments
//!
//! ```text
//! 1;1410,1572,1605
//! 2;2434,2863
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rankeval_core::evaluation::datasets::{load_qrels, load_queries};
//!
//! let queries = load_queries(Path::new("evaluation/query.txt"))?;
//! let qrels = load_qrels(Path::new("evaluation/qrels.txt"))?;
//! println!("{} queries, {} skipped", queries.records.len(), queries.malformed.len());
//! ```

mod judgments;
mod queries;

pub use judgments::parse_qrels;
pub use queries::parse_queries;

use super::qrels::RelevanceTable;
use super::types::Query;
use crate::error::{DatasetError, MalformedRecord, ParseError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Records parsed from a source plus the lines that were skipped.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    /// Successfully parsed records
    pub records: T,
    /// Lines skipped because they could not be parsed
    pub malformed: Vec<MalformedRecord>,
}

impl<T> Parsed<T> {
    /// Returns true if every non-blank line was parsed.
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// Loads the query source from a file.
pub fn load_queries(path: &Path) -> Result<Parsed<Vec<Query>>, DatasetError> {
    let reader = open_source(path)?;
    let parsed = parse_queries(reader).map_err(|e| attach_path(e, path))?;
    debug!(
        "Loaded {} queries from {}",
        parsed.records.len(),
        path.display()
    );
    Ok(parsed)
}

/// Loads relevance judgments from a file.
pub fn load_qrels(path: &Path) -> Result<Parsed<RelevanceTable>, DatasetError> {
    let reader = open_source(path)?;
    let parsed = parse_qrels(reader).map_err(|e| attach_path(e, path))?;
    debug!(
        "Loaded judgments for {} queries from {}",
        parsed.records.len(),
        path.display()
    );
    Ok(parsed)
}

pub(crate) fn open_source(path: &Path) -> Result<BufReader<File>, DatasetError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn attach_path(err: DatasetError, path: &Path) -> DatasetError {
    match err {
        DatasetError::Read(source) => DatasetError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}

/// Feeds every non-blank line, without its line ending, to `parse_line`.
///
/// Lines rejected by `parse_line`, or that are not valid UTF-8, are collected
/// as [`MalformedRecord`]s. Only I/O failures abort.
pub(crate) fn parse_lines<R, F>(
    mut reader: R,
    source: &str,
    mut parse_line: F,
) -> Result<Vec<MalformedRecord>, DatasetError>
where
    R: BufRead,
    F: FnMut(&str) -> Result<(), ParseError>,
{
    let mut malformed = Vec::new();
    let mut buf = Vec::new();
    let mut line_number = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_number += 1;

        let result = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim_end_matches(['\r', '\n']);
                if line.trim().is_empty() {
                    continue;
                }
                parse_line(line)
            }
            Err(_) => Err(ParseError::InvalidEncoding),
        };

        if let Err(error) = result {
            let record = MalformedRecord {
                line: line_number,
                error,
            };
            warn!("Skipping malformed {} record: {}", source, record);
            malformed.push(record);
        }
    }

    Ok(malformed)
}
