//! Relevance judgment parser: one `id;doc,doc,...` record per line.

use super::queries::parse_query_id;
use super::{parse_lines, Parsed};
use crate::config::{QRELS_DOC_SEPARATOR, QRELS_FIELD_SEPARATOR};
use crate::error::{DatasetError, ParseError};
use crate::evaluation::qrels::RelevanceTable;
use crate::evaluation::types::DocId;
use std::io::BufRead;
use tracing::debug;

/// Parses relevance judgments into a [`RelevanceTable`].
///
/// A line whose document list contains any unparsable id is skipped as a
/// whole. When a query id repeats, the later line replaces the earlier one.
pub fn parse_qrels<R: BufRead>(reader: R) -> Result<Parsed<RelevanceTable>, DatasetError> {
    let mut table = RelevanceTable::new();

    let malformed = parse_lines(reader, "qrels", |line| {
        let (query_id, docs) = line
            .split_once(QRELS_FIELD_SEPARATOR)
            .ok_or(ParseError::MissingSeparator(QRELS_FIELD_SEPARATOR))?;

        let query_id = parse_query_id(query_id)?;
        let relevant = docs
            .split(QRELS_DOC_SEPARATOR)
            .map(parse_doc_id)
            .collect::<Result<Vec<_>, _>>()?;

        if table.insert(query_id, relevant).is_some() {
            debug!("Judgments for query {} replaced by a later line", query_id);
        }
        Ok(())
    })?;

    Ok(Parsed {
        records: table,
        malformed,
    })
}

fn parse_doc_id(raw: &str) -> Result<DocId, ParseError> {
    let raw = raw.trim();
    raw.parse::<u64>()
        .map(DocId::from_u64)
        .map_err(|_| ParseError::InvalidDocId(raw.to_string()))
}
