//! Relevance table: ground-truth lookup from query id to relevant documents.
//!
//! Lookups never fail. A query without judgments has an empty relevant set,
//! which downstream metrics treat as "recall undefined" rather than an error.

use super::types::{DocId, QueryId};
use std::collections::{BTreeSet, HashMap};

/// Shared empty set returned for queries without judgments.
static NO_RELEVANT_DOCS: BTreeSet<DocId> = BTreeSet::new();

/// Ground-truth relevance judgments (qrels) for one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceTable {
    judgments: HashMap<QueryId, BTreeSet<DocId>>,
}

impl RelevanceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relevant documents for a query, replacing earlier judgments.
    ///
    /// Returns the replaced set, if the query was already judged.
    pub fn insert(
        &mut self,
        query_id: QueryId,
        relevant: impl IntoIterator<Item = DocId>,
    ) -> Option<BTreeSet<DocId>> {
        self.judgments
            .insert(query_id, relevant.into_iter().collect())
    }

    /// Returns the relevant documents for a query.
    ///
    /// Unknown query ids resolve to the empty set.
    pub fn relevant_for(&self, query_id: QueryId) -> &BTreeSet<DocId> {
        self.judgments.get(&query_id).unwrap_or(&NO_RELEVANT_DOCS)
    }

    /// Returns true if the query has an entry in the table.
    pub fn contains_query(&self, query_id: QueryId) -> bool {
        self.judgments.contains_key(&query_id)
    }

    /// Number of judged queries.
    pub fn len(&self) -> usize {
        self.judgments.len()
    }

    /// Returns true if no query is judged.
    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    /// Total number of (query, relevant document) pairs.
    pub fn num_judgments(&self) -> usize {
        self.judgments.values().map(BTreeSet::len).sum()
    }
}

impl<D> FromIterator<(QueryId, D)> for RelevanceTable
where
    D: IntoIterator<Item = DocId>,
{
    fn from_iter<I: IntoIterator<Item = (QueryId, D)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (query_id, relevant) in iter {
            table.insert(query_id, relevant);
        }
        table
    }
}
