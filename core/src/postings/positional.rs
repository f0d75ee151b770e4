use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{locate, Posting, PostingsStore, TermStats};
use crate::error::Result;
use crate::persist::{load_bincode, save_bincode, IndexPaths};
use crate::{DocId, Position};

/// Postings that also carry every offset at which the term occurred.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PositionalPostings {
    lists: HashMap<String, Vec<Posting>>,
}

impl PositionalPostings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(paths: &IndexPaths) -> Result<Self> {
        load_bincode(&paths.postings())
    }

    /// Offsets of `term` inside `doc_id`, in insertion order.
    pub fn positions(&self, term: &str, doc_id: DocId) -> &[Position] {
        self.lists
            .get(term)
            .and_then(|list| locate(list, doc_id).ok().map(|i| list[i].positions.as_slice()))
            .unwrap_or(&[])
    }
}

impl PostingsStore for PositionalPostings {
    fn add(&mut self, term: &str, doc_id: DocId, position: Position) {
        let list = self.lists.entry(term.to_owned()).or_default();
        match locate(list, doc_id) {
            Ok(i) => {
                let posting = &mut list[i];
                posting.frequency += 1;
                posting.positions.push(position);
            }
            Err(i) => list.insert(
                i,
                Posting { doc_id, frequency: 1, positions: vec![position] },
            ),
        }
    }

    fn remove(&mut self, doc_id: DocId) -> Result<()> {
        let mut emptied = Vec::new();
        for (term, list) in self.lists.iter_mut() {
            if let Ok(i) = locate(list, doc_id) {
                list.remove(i);
                if list.is_empty() {
                    emptied.push(term.clone());
                }
            }
        }
        for term in emptied {
            self.lists.remove(&term);
        }
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
