use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::token::Token;
use crate::DocId;

/// Per-document length statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    /// Kept tokens, repeats included.
    pub length: u32,
    /// Distinct kept tokens.
    pub unique_tokens: u32,
}

impl DocMetadata {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let mut distinct = HashSet::new();
        let mut length = 0u32;
        for term in tokens.iter().filter_map(Token::term) {
            length += 1;
            distinct.insert(term);
        }
        Self { length, unique_tokens: distinct.len() as u32 }
    }
}

/// docid → metadata, with the collection token total kept alongside.
#[derive(Debug, Clone, Default)]
pub struct DocumentTable {
    docs: HashMap<DocId, DocMetadata>,
    total_length: u64,
}

impl DocumentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc_id: DocId, meta: DocMetadata) {
        if let Some(old) = self.docs.insert(doc_id, meta) {
            self.total_length -= u64::from(old.length);
        }
        self.total_length += u64::from(meta.length);
    }

    pub fn remove(&mut self, doc_id: DocId) -> Option<DocMetadata> {
        let old = self.docs.remove(&doc_id)?;
        self.total_length -= u64::from(old.length);
        Some(old)
    }

    pub fn get(&self, doc_id: DocId) -> Option<DocMetadata> {
        self.docs.get(&doc_id).copied()
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.docs.contains_key(&doc_id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        let mut ids: Vec<DocId> = self.docs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn as_map(&self) -> &HashMap<DocId, DocMetadata> {
        &self.docs
    }
}

impl From<HashMap<DocId, DocMetadata>> for DocumentTable {
    fn from(docs: HashMap<DocId, DocMetadata>) -> Self {
        let total_length = docs.values().map(|m| u64::from(m.length)).sum();
        Self { docs, total_length }
    }
}
