//! Retrieval backend abstraction.
//!
//! The evaluation core never ranks documents itself. It asks a
//! [`RetrievalBackend`] for the ranking of each (query, configuration) pair
//! and only scores what comes back.
//!
//! # Implementations
//!
//! - [`InMemoryBackend`] - Rankings held in memory (tests, embedding)
//! - [`run_file`] - Loads TREC run files into an [`InMemoryBackend`]
//!
//! Backends talking to a live search service implement the trait in the
//! application crate.

pub mod run_file;

pub use run_file::{load_run, parse_run};

use crate::error::BackendError;
use crate::evaluation::types::{Query, QueryId, RankedList};
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of ranked results for evaluation.
///
/// Implementations must be shareable across concurrent calls: the driver
/// issues up to `concurrency` searches at once for one configuration.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Returns document ids for `query` under `configuration`, best first.
    ///
    /// An empty ranking is a valid answer, not an error.
    async fn search(&self, query: &Query, configuration: &str) -> Result<RankedList, BackendError>;

    /// Configurations this backend can serve, in preferred report order.
    ///
    /// Backends that accept arbitrary configuration names return an empty list.
    fn configurations(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Backend serving rankings from memory.
///
/// Unknown queries get an empty ranking. Unknown configurations are an error
/// so a typo in a configuration name cannot silently score zero.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    order: Vec<String>,
    rankings: HashMap<String, HashMap<QueryId, RankedList>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a configuration without rankings.
    pub fn add_configuration(&mut self, configuration: &str) {
        if !self.rankings.contains_key(configuration) {
            self.order.push(configuration.to_string());
            self.rankings.insert(configuration.to_string(), HashMap::new());
        }
    }

    /// Sets the ranking for a (configuration, query) pair.
    pub fn insert(&mut self, configuration: &str, query_id: QueryId, ranking: RankedList) {
        self.add_configuration(configuration);
        if let Some(by_query) = self.rankings.get_mut(configuration) {
            by_query.insert(query_id, ranking);
        }
    }

    /// Builder-style variant of [`InMemoryBackend::insert`].
    pub fn with_ranking(
        mut self,
        configuration: &str,
        query_id: QueryId,
        ranking: RankedList,
    ) -> Self {
        self.insert(configuration, query_id, ranking);
        self
    }

    /// Returns the stored ranking, if any.
    pub fn ranking(&self, configuration: &str, query_id: QueryId) -> Option<&RankedList> {
        self.rankings.get(configuration)?.get(&query_id)
    }

    /// Number of configurations.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no configuration is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[async_trait]
impl RetrievalBackend for InMemoryBackend {
    async fn search(&self, query: &Query, configuration: &str) -> Result<RankedList, BackendError> {
        let by_query = self
            .rankings
            .get(configuration)
            .ok_or_else(|| BackendError::UnknownConfiguration(configuration.to_string()))?;
        Ok(by_query.get(&query.id).cloned().unwrap_or_default())
    }

    fn configurations(&self) -> Vec<String> {
        self.order.clone()
    }
}
