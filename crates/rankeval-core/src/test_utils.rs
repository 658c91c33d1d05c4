//! Test utilities for rankeval-core.
//!
//! Shared fixtures for unit tests: metric builders over raw integer ids,
//! a float comparison helper and a scripted retrieval backend.
//! Only compiled when running tests.

use crate::backend::RetrievalBackend;
use crate::error::BackendError;
use crate::evaluation::metrics::PerQueryMetrics;
use crate::evaluation::types::{ranked_list, DocId, Query, QueryId, RankedList};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Absolute tolerance used by [`assert_close`].
pub const TOLERANCE: f64 = 1e-3;

/// Asserts two floats agree within [`TOLERANCE`].
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

/// Builds a relevant set from raw ids.
pub fn relevant_set(ids: &[u64]) -> BTreeSet<DocId> {
    ids.iter().copied().map(DocId::from_u64).collect()
}

/// Computes metrics for query 1.
pub fn compute(ranking: &[u64], relevant: &[u64]) -> PerQueryMetrics {
    compute_for(1, ranking, relevant)
}

/// Computes metrics for the given query id.
pub fn compute_for(query_id: u64, ranking: &[u64], relevant: &[u64]) -> PerQueryMetrics {
    PerQueryMetrics::compute(
        QueryId::from_u64(query_id),
        &ranked_list(ranking),
        &relevant_set(relevant),
    )
}

/// Builds queries `(id, text)`.
pub fn queries(records: &[(u64, &str)]) -> Vec<Query> {
    records
        .iter()
        .map(|&(id, text)| Query::new(QueryId::from_u64(id), text))
        .collect()
}

/// What the scripted backend does for one query text.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return this ranking
    Rank(RankedList),
    /// Return this ranking after a delay
    Slow(Duration, RankedList),
    /// Fail with this error
    Fail(BackendError),
}

/// Backend answering from a script keyed by query text; counts calls.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: HashMap<String, Scripted>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rank(mut self, text: &str, ids: &[u64]) -> Self {
        self.script
            .insert(text.to_string(), Scripted::Rank(ranked_list(ids)));
        self
    }

    pub fn slow(mut self, text: &str, delay: Duration, ids: &[u64]) -> Self {
        self.script
            .insert(text.to_string(), Scripted::Slow(delay, ranked_list(ids)));
        self
    }

    pub fn fail(mut self, text: &str, error: BackendError) -> Self {
        self.script.insert(text.to_string(), Scripted::Fail(error));
        self
    }

    /// Number of `search` calls issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Query texts searched, in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalBackend for ScriptedBackend {
    async fn search(&self, query: &Query, _configuration: &str) -> Result<RankedList, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(query.text.clone());

        match self.script.get(&query.text) {
            Some(Scripted::Rank(ranking)) => Ok(ranking.clone()),
            Some(Scripted::Slow(delay, ranking)) => {
                tokio::time::sleep(*delay).await;
                Ok(ranking.clone())
            }
            Some(Scripted::Fail(error)) => Err(error.clone()),
            None => Ok(Vec::new()),
        }
    }
}
