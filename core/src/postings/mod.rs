//! Term → postings storage.
//!
//! Three interchangeable strategies share the [`PostingsStore`] contract:
//! [`InvertedPostings`] keeps a docid-sorted list of counts per term,
//! [`PositionalPostings`] additionally records every token offset, and
//! [`DiskPostings`] writes per-term `docid → count` maps to a sled tree while
//! serving reads from an in-memory mirror.

mod disk;
mod memory;
mod positional;

pub use disk::DiskPostings;
pub use memory::InvertedPostings;
pub use positional::PositionalPostings;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::persist::IndexPaths;
use crate::{DocId, Position};

/// One document's entry in a term's postings list.
///
/// `positions` is empty for stores that do not track offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
    pub positions: Vec<Position>,
}

impl Posting {
    pub fn new(doc_id: DocId, frequency: u32) -> Self {
        Self { doc_id, frequency, positions: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    pub document_frequency: u32,
    pub total_term_frequency: u64,
}

impl TermStats {
    fn from_postings<'a>(postings: impl Iterator<Item = &'a Posting>) -> Self {
        postings.fold(TermStats::default(), |mut stats, p| {
            stats.document_frequency += 1;
            stats.total_term_frequency += u64::from(p.frequency);
            stats
        })
    }
}

/// Mutable term → postings mapping.
///
/// Only the index façade mutates a store. Terms whose postings become empty
/// are dropped, so the key set is the vocabulary.
pub trait PostingsStore: Send + Sync + fmt::Debug {
    /// Register one occurrence of `term` at `position` in `doc_id`.
    fn add(&mut self, term: &str, doc_id: DocId, position: Position);

    /// Make every `add` since the last commit durable. In-memory stores have nothing to do.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Delete every posting of `doc_id`, dropping terms left without postings.
    fn remove(&mut self, doc_id: DocId) -> Result<()>;

    /// Postings of `term` sorted by docid; empty for unknown terms.
    fn postings(&self, term: &str) -> Vec<Posting>;

    fn term_frequency(&self, term: &str, doc_id: DocId) -> u32;

    fn term_stats(&self, term: &str) -> TermStats;

    fn vocabulary_size(&self) -> usize;

    /// Vocabulary in sorted order.
    fn terms(&self) -> Vec<String>;

    fn save(&self, paths: &IndexPaths) -> Result<()>;
}

fn locate(list: &[Posting], doc_id: DocId) -> std::result::Result<usize, usize> {
    list.binary_search_by_key(&doc_id, |p| p.doc_id)
}
