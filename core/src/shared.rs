use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use crate::error::Result;
use crate::index::{Index, IndexStatistics};
use crate::ranker::Ranker;
use crate::scorer::ScoredDoc;
use crate::token::Token;
use crate::DocId;

/// Single-writer, multi-reader handle to an [`Index`].
///
/// Mutations and `save` take the write lock; lookups and scoring share the
/// read lock, so a query never observes a half-applied `add_doc`.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Index>>,
}

impl SharedIndex {
    pub fn new(index: Index) -> Self {
        Self { inner: Arc::new(RwLock::new(index)) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Index> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Index> {
        self.inner.write()
    }

    pub fn add_doc(&self, doc_id: DocId, tokens: &[Token]) -> Result<()> {
        self.write().add_doc(doc_id, tokens)
    }

    pub fn remove_doc(&self, doc_id: DocId) -> Result<()> {
        self.write().remove_doc(doc_id)
    }

    pub fn save(&self) -> Result<()> {
        self.write().save()
    }

    pub fn statistics(&self) -> IndexStatistics {
        self.read().statistics()
    }

    pub fn query(&self, ranker: &Ranker, text: &str) -> Result<Vec<ScoredDoc>> {
        ranker.query(&self.read(), text)
    }
}
