//! Query source parser: one `id<TAB>text` record per line.

use super::{parse_lines, Parsed};
use crate::config::QUERY_FIELD_SEPARATOR;
use crate::error::{DatasetError, ParseError};
use crate::evaluation::types::{Query, QueryId};
use std::collections::HashSet;
use std::io::BufRead;

/// Parses the query source.
///
/// The first occurrence of a query id wins. Later lines reusing the id are
/// reported as malformed so ids stay unique within the run.
pub fn parse_queries<R: BufRead>(reader: R) -> Result<Parsed<Vec<Query>>, DatasetError> {
    let mut queries = Vec::new();
    let mut seen = HashSet::new();

    let malformed = parse_lines(reader, "query", |line| {
        let query = parse_query_line(line)?;
        if !seen.insert(query.id) {
            return Err(ParseError::DuplicateQueryId(query.id));
        }
        queries.push(query);
        Ok(())
    })?;

    Ok(Parsed {
        records: queries,
        malformed,
    })
}

fn parse_query_line(line: &str) -> Result<Query, ParseError> {
    let (id, text) = line
        .split_once(QUERY_FIELD_SEPARATOR)
        .ok_or(ParseError::MissingSeparator(QUERY_FIELD_SEPARATOR))?;

    let id = parse_query_id(id)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptyQueryText);
    }

    Ok(Query::new(id, text))
}

pub(super) fn parse_query_id(raw: &str) -> Result<QueryId, ParseError> {
    let raw = raw.trim();
    raw.parse::<u64>()
        .map(QueryId::from_u64)
        .map_err(|_| ParseError::InvalidQueryId(raw.to_string()))
}
