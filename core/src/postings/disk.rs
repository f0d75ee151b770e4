use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use super::{Posting, PostingsStore, TermStats};
use crate::error::{Error, Result};
use crate::persist::IndexPaths;
use crate::{DocId, Position};

type DocCounts = HashMap<DocId, u32>;

/// Postings persisted per term in a sled tree, read from an in-memory mirror.
///
/// Each tree value is the bincode-encoded `docid → count` map for its term.
/// Mutations land in the mirror first and reach the tree as one atomic batch
/// per [`commit`](PostingsStore::commit) or [`remove`](PostingsStore::remove).
/// The tree is opened for each batch and closed again once it is flushed, so
/// no lock on it outlives a mutation.
pub struct DiskPostings {
    location: PathBuf,
    mirror: HashMap<String, DocCounts>,
    dirty: HashSet<String>,
}

fn open_tree(location: &Path) -> Result<sled::Db> {
    sled::open(location).map_err(|e| Error::persistence(location, e))
}

impl DiskPostings {
    /// Start an empty store at `location`, discarding anything already there.
    pub fn create<P: AsRef<Path>>(location: P) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        let db = open_tree(&location)?;
        db.clear().map_err(|e| Error::persistence(&location, e))?;
        db.flush().map_err(|e| Error::persistence(&location, e))?;
        Ok(Self { location, mirror: HashMap::new(), dirty: HashSet::new() })
    }

    /// Rebuild the mirror from an existing tree.
    pub fn open<P: AsRef<Path>>(location: P) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        if !location.is_dir() {
            return Err(Error::persistence(&location, "postings store not found"));
        }
        let db = open_tree(&location)?;
        let mut mirror = HashMap::new();
        for item in db.iter() {
            let (key, value) = item.map_err(|e| Error::persistence(&location, e))?;
            let term = String::from_utf8(key.to_vec())
                .map_err(|e| Error::persistence(&location, format!("non-utf8 term key: {e}")))?;
            let counts: DocCounts = bincode::deserialize(&value)
                .map_err(|e| Error::persistence(&location, format!("postings of {term:?}: {e}")))?;
            mirror.insert(term, counts);
        }
        tracing::debug!(location = %location.display(), num_terms = mirror.len(), "opened disk postings");
        Ok(Self { location, mirror, dirty: HashSet::new() })
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn encode(&self, term: &str, counts: &DocCounts) -> Result<Vec<u8>> {
        bincode::serialize(counts).map_err(|e| {
            Error::InconsistentState(format!("cannot encode postings of {term:?}: {e}"))
        })
    }

    /// Open the tree, apply `batch` atomically, flush, and close it again.
    fn apply(&self, batch: sled::Batch) -> Result<()> {
        let rejected = |e: sled::Error| {
            Error::InconsistentState(format!(
                "postings tree at {} rejected batch: {e}",
                self.location.display()
            ))
        };
        let db = open_tree(&self.location)?;
        db.apply_batch(batch).map_err(rejected)?;
        db.flush().map_err(rejected)?;
        Ok(())
    }
}

impl fmt::Debug for DiskPostings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskPostings")
            .field("location", &self.location)
            .field("num_terms", &self.mirror.len())
            .field("pending", &self.dirty.len())
            .finish()
    }
}

impl PostingsStore for DiskPostings {
    fn add(&mut self, term: &str, doc_id: DocId, _position: Position) {
        *self.mirror.entry(term.to_owned()).or_default().entry(doc_id).or_insert(0) += 1;
        if !self.dirty.contains(term) {
            self.dirty.insert(term.to_owned());
        }
    }

    fn commit(&mut self) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        let dirty = std::mem::take(&mut self.dirty);
        let mut batch = sled::Batch::default();
        for term in &dirty {
            match self.mirror.get(term) {
                Some(counts) => batch.insert(term.as_bytes(), self.encode(term, counts)?),
                None => batch.remove(term.as_bytes()),
            }
        }
        // the mirror is already ahead of the tree, so a failure here is a divergence
        self.apply(batch)
    }

    fn remove(&mut self, doc_id: DocId) -> Result<()> {
        self.commit()?;

        let mut batch = sled::Batch::default();
        let mut updates: Vec<(String, DocCounts)> = Vec::new();
        for (term, counts) in &self.mirror {
            if !counts.contains_key(&doc_id) {
                continue;
            }
            let mut remaining = counts.clone();
            remaining.remove(&doc_id);
            if remaining.is_empty() {
                batch.remove(term.as_bytes());
            } else {
                batch.insert(term.as_bytes(), self.encode(term, &remaining)?);
            }
            updates.push((term.clone(), remaining));
        }
        if updates.is_empty() {
            return Ok(());
        }

        // tree first: the mirror only changes once the whole batch is durable
        self.apply(batch)?;
        for (term, remaining) in updates {
            if remaining.is_empty() {
                self.mirror.remove(&term);
            } else {
                self.mirror.insert(term, remaining);
            }
        }
        Ok(())
    }

    fn postings(&self, term: &str) -> Vec<Posting> {
        let mut postings: Vec<Posting> = self
            .mirror
            .get(term)
            .map(|counts| counts.iter().map(|(&doc_id, &freq)| Posting::new(doc_id, freq)).collect())
            .unwrap_or_default();
        postings.sort_by_key(|p| p.doc_id);
        postings
    }

    fn term_frequency(&self, term: &str, doc_id: DocId) -> u32 {
        self.mirror
            .get(term)
            .and_then(|counts| counts.get(&doc_id).copied())
            .unwrap_or(0)
    }

    fn term_stats(&self, term: &str) -> TermStats {
        match self.mirror.get(term) {
            Some(counts) => TermStats {
                document_frequency: counts.len() as u32,
                total_term_frequency: counts.values().map(|&c| u64::from(c)).sum(),
            },
            None => TermStats::default(),
        }
    }

    fn vocabulary_size(&self) -> usize {
        self.mirror.len()
    }

    fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.mirror.keys().cloned().collect();
        terms.sort();
        terms
    }

    fn save(&self, paths: &IndexPaths) -> Result<()> {
        if !self.dirty.is_empty() {
            return Err(Error::InconsistentState(format!(
                "{} terms staged but never committed",
                self.dirty.len()
            )));
        }
        // every committed batch is already flushed
        if !paths.postings_db().is_dir() {
            return Err(Error::persistence(paths.postings_db(), "postings store not found"));
        }
        Ok(())
    }
}
