//! TREC run-file loader.
//!
//! Each line holds six whitespace-separated columns:
//!
//! ```text
//! qid Q0 docno rank score tag
//! 1   Q0 1410  1    12.5  english
//! 1   Q0 1572  2    11.0  english
//! ```
//!
//! Every distinct `tag` becomes a configuration, in order of first
//! appearance. Rankings are ordered by the `rank` column; lines sharing a
//! rank keep their file order. The `score` column is validated but not used.

use super::InMemoryBackend;
use crate::error::{DatasetError, ParseError};
use crate::evaluation::datasets::{attach_path, open_source, parse_lines, Parsed};
use crate::evaluation::types::{DocId, QueryId};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use tracing::debug;

const RUN_COLUMNS: usize = 6;

struct RunLine {
    query_id: QueryId,
    doc_id: DocId,
    rank: u64,
    tag: String,
}

/// Loads a run file into an [`InMemoryBackend`].
pub fn load_run(path: &Path) -> Result<Parsed<InMemoryBackend>, DatasetError> {
    let reader = open_source(path)?;
    let parsed = parse_run(reader).map_err(|e| attach_path(e, path))?;
    debug!(
        "Loaded {} configurations from {}",
        parsed.records.len(),
        path.display()
    );
    Ok(parsed)
}

/// Parses a run file. Malformed lines are skipped and reported.
pub fn parse_run<R: BufRead>(reader: R) -> Result<Parsed<InMemoryBackend>, DatasetError> {
    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, HashMap<QueryId, Vec<(u64, DocId)>>> = HashMap::new();

    let malformed = parse_lines(reader, "run", |line| {
        let run_line = parse_run_line(line)?;
        if !entries.contains_key(&run_line.tag) {
            order.push(run_line.tag.clone());
        }
        entries
            .entry(run_line.tag)
            .or_default()
            .entry(run_line.query_id)
            .or_default()
            .push((run_line.rank, run_line.doc_id));
        Ok(())
    })?;

    let mut backend = InMemoryBackend::new();
    for tag in order {
        backend.add_configuration(&tag);
        let Some(by_query) = entries.remove(&tag) else {
            continue;
        };
        for (query_id, mut ranked) in by_query {
            // Stable: equal ranks keep file order
            ranked.sort_by_key(|&(rank, _)| rank);
            backend.insert(
                &tag,
                query_id,
                ranked.into_iter().map(|(_, doc)| doc).collect(),
            );
        }
    }

    Ok(Parsed {
        records: backend,
        malformed,
    })
}

fn parse_run_line(line: &str) -> Result<RunLine, ParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != RUN_COLUMNS {
        return Err(ParseError::InvalidRunLine(format!(
            "expected {RUN_COLUMNS} columns, found {}",
            fields.len()
        )));
    }

    let query_id = fields[0]
        .parse::<u64>()
        .map(QueryId::from_u64)
        .map_err(|_| ParseError::InvalidQueryId(fields[0].to_string()))?;
    let doc_id = fields[2]
        .parse::<u64>()
        .map(DocId::from_u64)
        .map_err(|_| ParseError::InvalidDocId(fields[2].to_string()))?;
    let rank = fields[3]
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidRunLine(format!("invalid rank '{}'", fields[3])))?;
    fields[4]
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidRunLine(format!("invalid score '{}'", fields[4])))?;

    Ok(RunLine {
        query_id,
        doc_id,
        rank,
        tag: fields[5].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RetrievalBackend;
    use crate::evaluation::types::{ranked_list, Query};

    #[test]
    fn test_parse_run_orders_by_rank() {
        let input = "\
1 Q0 20 3 0.5 english
1 Q0 10 1 0.9 english
1 Q0 5 2 0.7 english
";
        let parsed = parse_run(input.as_bytes()).unwrap();

        assert!(parsed.is_clean());
        assert_eq!(
            parsed.records.ranking("english", QueryId::from_u64(1)),
            Some(&ranked_list(&[10, 5, 20]))
        );
    }

    #[test]
    fn test_equal_ranks_keep_file_order() {
        let input = "1 Q0 7 1 1.0 a\n1 Q0 3 1 1.0 a\n1 Q0 9 0 1.0 a\n";
        let parsed = parse_run(input.as_bytes()).unwrap();

        assert_eq!(
            parsed.records.ranking("a", QueryId::from_u64(1)),
            Some(&ranked_list(&[9, 7, 3]))
        );
    }

    #[test]
    fn test_tags_become_configurations_in_first_seen_order() {
        let input = "\
2 Q0 1 1 1.0 standard
1 Q0 1 1 1.0 english
1 Q0 2 1 1.0 standard
";
        let parsed = parse_run(input.as_bytes()).unwrap();

        assert_eq!(parsed.records.configurations(), vec!["standard", "english"]);
        assert_eq!(
            parsed.records.ranking("standard", QueryId::from_u64(2)),
            Some(&ranked_list(&[1]))
        );
    }

    #[test]
    fn test_malformed_run_lines_are_skipped() {
        let input = "\
1 Q0 10 1 0.9 english
1 Q0 10 1 0.9
x Q0 10 1 0.9 english
1 Q0 -4 1 0.9 english
1 Q0 11 first 0.9 english
1 Q0 12 2 high english
1 Q0 13 3 0.1 english
";
        let parsed = parse_run(input.as_bytes()).unwrap();

        let lines: Vec<usize> = parsed.malformed.iter().map(|m| m.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5, 6]);
        assert!(matches!(
            parsed.malformed[1].error,
            ParseError::InvalidQueryId(_)
        ));
        assert!(matches!(
            parsed.malformed[2].error,
            ParseError::InvalidDocId(_)
        ));
        assert_eq!(
            parsed.records.ranking("english", QueryId::from_u64(1)),
            Some(&ranked_list(&[10, 13]))
        );
    }

    #[tokio::test]
    async fn test_run_backend_serves_missing_query_as_empty() {
        let parsed = parse_run("1 Q0 10 1 0.9 english\n".as_bytes()).unwrap();
        let query = Query::new(QueryId::from_u64(2), "unseen");

        let ranking = parsed.records.search(&query, "english").await.unwrap();
        assert!(ranking.is_empty());
    }
}
