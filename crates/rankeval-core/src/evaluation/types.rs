//! Identifier and record types shared by the evaluation modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Query identifier from the query source and the relevance judgments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(u64);

impl QueryId {
    /// Creates a QueryId from a raw u64 value.
    pub const fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Document identifier as returned by the retrieval backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(u64);

impl DocId {
    /// Creates a DocId from a raw u64 value.
    pub const fn from_u64(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value of this ID.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A query read from the query source. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Unique identifier within one evaluation run
    pub id: QueryId,
    /// Query phrase sent to the retrieval backend
    pub text: String,
}

impl Query {
    /// Creates a new query.
    pub fn new(id: QueryId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

/// Ranked document ids for one (query, configuration) pair, rank 1 first.
pub type RankedList = Vec<DocId>;

/// Convenience for building a ranking from raw ids.
pub fn ranked_list(ids: &[u64]) -> RankedList {
    ids.iter().copied().map(DocId::from_u64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let query = Query::new(QueryId::from_u64(12), "retrieval effectiveness");
        let json = serde_json::to_string(&query).unwrap();
        assert_eq!(json, r#"{"id":12,"text":"retrieval effectiveness"}"#);
    }

    #[test]
    fn test_ranked_list_preserves_order() {
        let ranking = ranked_list(&[3, 1, 2]);
        assert_eq!(ranking[0], DocId::from_u64(3));
        assert_eq!(ranking[2].as_u64(), 2);
    }
}
