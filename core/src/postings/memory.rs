use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{locate, Posting, PostingsStore, TermStats};
use crate::error::Result;
use crate::persist::{load_bincode, save_bincode, IndexPaths};
use crate::{DocId, Position};

/// Count-only postings: one `(docid, frequency)` entry per term and document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedPostings {
    lists: HashMap<String, Vec<Posting>>, // each sorted by doc_id
}

impl InvertedPostings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(paths: &IndexPaths) -> Result<Self> {
        load_bincode(&paths.postings())
    }
}

impl PostingsStore for InvertedPostings {
    fn add(&mut self, term: &str, doc_id: DocId, _position: Position) {
        let list = self.lists.entry(term.to_owned()).or_default();
        match locate(list, doc_id) {
            Ok(i) => list[i].frequency += 1,
            Err(i) => list.insert(i, Posting::new(doc_id, 1)),
        }
    }

    fn remove(&mut self, doc_id: DocId) -> Result<()> {
        self.lists.retain(|_, list| {
            if let Ok(i) = locate(list, doc_id) {
                list.remove(i);
            }
            !list.is_empty()
        });
        Ok(())
    }

    fn postings(&self, term: &str) -> Vec<Posting> {
        self.lists.get(term).cloned().unwrap_or_default()
    }

    fn term_frequency(&self, term: &str, doc_id: DocId) -> u32 {
        self.lists
            .get(term)
            .and_then(|list| locate(list, doc_id).ok().map(|i| list[i].frequency))
            .unwrap_or(0)
    }

    fn term_stats(&self, term: &str) -> TermStats {
        self.lists
            .get(term)
            .map(|list| TermStats::from_postings(list.iter()))
            .unwrap_or_default()
    }

    fn vocabulary_size(&self) -> usize {
        self.lists.len()
    }

    fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.lists.keys().cloned().collect();
        terms.sort();
        terms
    }

    fn save(&self, paths: &IndexPaths) -> Result<()> {
        save_bincode(&paths.postings(), self)
    }
}
