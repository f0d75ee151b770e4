use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::create_dir_all;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::metadata::{DocMetadata, DocumentTable};
use crate::persist::{self, IndexHeader, IndexPaths, FORMAT_VERSION};
use crate::postings::{
    DiskPostings, InvertedPostings, PositionalPostings, Posting, PostingsStore, TermStats,
};
use crate::token::Token;
use crate::{DocId, Position};

/// Postings storage strategy, fixed when an index is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexKind {
    Inverted,
    Positional,
    OnDisk,
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "inverted" | "invertedindex" | "basic" => Ok(IndexKind::Inverted),
            "positional" | "positionalindex" => Ok(IndexKind::Positional),
            "ondisk" | "disk" | "ondiskinvertedindex" => Ok(IndexKind::OnDisk),
            _ => Err(Error::configuration(format!("unknown index type: {s}"))),
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexKind::Inverted => "inverted",
            IndexKind::Positional => "positional",
            IndexKind::OnDisk => "ondisk",
        };
        f.write_str(name)
    }
}

/// Collection-level statistics, derived on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub number_of_documents: usize,
    pub total_token_count: u64,
    pub mean_document_length: f64,
    pub unique_token_count: usize,
}

/// An inverted index: postings, per-document metadata and a persistence location.
///
/// The index is the only mutator of its postings store. Wrap it in a
/// [`SharedIndex`](crate::SharedIndex) to read it from several threads.
#[derive(Debug)]
pub struct Index {
    kind: IndexKind,
    paths: IndexPaths,
    store: Box<dyn PostingsStore>,
    documents: DocumentTable,
}

impl Index {
    /// Create an empty index that persists to `location`.
    ///
    /// The on-disk variant opens (and clears) its backing tree immediately;
    /// the in-memory variants touch nothing until [`save`](Self::save).
    pub fn create<P: AsRef<Path>>(kind: IndexKind, location: P) -> Result<Self> {
        let paths = IndexPaths::new(location);
        let store: Box<dyn PostingsStore> = match kind {
            IndexKind::Inverted => Box::new(InvertedPostings::new()),
            IndexKind::Positional => Box::new(PositionalPostings::new()),
            IndexKind::OnDisk => {
                create_dir_all(&paths.root).map_err(|e| Error::persistence(&paths.root, e))?;
                Box::new(DiskPostings::create(paths.postings_db())?)
            }
        };
        tracing::debug!(index_type = %kind, location = %paths.root.display(), "created index");
        Ok(Self { kind, paths, store, documents: DocumentTable::new() })
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn location(&self) -> &Path {
        &self.paths.root
    }

    /// Index one document. Filtered slots count as positions but are not indexed.
    ///
    /// Re-adding a docid replaces the earlier version.
    pub fn add_doc(&mut self, doc_id: DocId, tokens: &[Token]) -> Result<()> {
        if self.documents.contains(doc_id) {
            tracing::debug!(doc_id, "replacing indexed document");
            self.remove_doc(doc_id)?;
        }
        self.documents.insert(doc_id, DocMetadata::from_tokens(tokens));
        for (position, token) in tokens.iter().enumerate() {
            if let Some(term) = token.term() {
                self.store.add(term, doc_id, position as Position);
            }
        }
        self.store.commit()
    }

    /// Remove a document from postings and metadata. Unknown docids are ignored.
    pub fn remove_doc(&mut self, doc_id: DocId) -> Result<()> {
        if !self.documents.contains(doc_id) {
            return Ok(());
        }
        self.store.remove(doc_id)?;
        self.documents.remove(doc_id);
        Ok(())
    }

    pub fn postings(&self, term: &str) -> Vec<Posting> {
        self.store.postings(term)
    }

    pub fn term_metadata(&self, term: &str) -> TermStats {
        self.store.term_stats(term)
    }

    pub fn term_frequency(&self, term: &str, doc_id: DocId) -> u32 {
        self.store.term_frequency(term, doc_id)
    }

    pub fn doc_metadata(&self, doc_id: DocId) -> Option<DocMetadata> {
        self.documents.get(doc_id)
    }

    pub fn contains_doc(&self, doc_id: DocId) -> bool {
        self.documents.contains(doc_id)
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.documents.doc_ids()
    }

    pub fn terms(&self) -> Vec<String> {
        self.store.terms()
    }

    pub fn statistics(&self) -> IndexStatistics {
        let number_of_documents = self.documents.len();
        let total_token_count = self.documents.total_length();
        let mean_document_length = if number_of_documents == 0 {
            0.0
        } else {
            total_token_count as f64 / number_of_documents as f64
        };
        IndexStatistics {
            number_of_documents,
            total_token_count,
            mean_document_length,
            unique_token_count: self.store.vocabulary_size(),
        }
    }

    /// Write a full snapshot to the index location.
    pub fn save(&self) -> Result<()> {
        let paths = &self.paths;
        create_dir_all(&paths.root).map_err(|e| Error::persistence(&paths.root, e))?;
        persist::save_bincode(&paths.docs(), self.documents.as_map())?;
        persist::save_bincode(&paths.vocabulary(), &self.store.terms())?;
        self.store.save(paths)?;
        let statistics = self.statistics();
        persist::save_header(
            paths,
            &IndexHeader {
                version: FORMAT_VERSION,
                index_type: self.kind,
                created_at: persist::timestamp(),
                statistics,
            },
        )?;
        tracing::info!(
            index_type = %self.kind,
            location = %paths.root.display(),
            num_docs = statistics.number_of_documents,
            num_terms = statistics.unique_token_count,
            "saved index"
        );
        Ok(())
    }

    /// Rebuild a query-ready index from what [`save`](Self::save) wrote.
    pub fn load<P: AsRef<Path>>(location: P) -> Result<Self> {
        let paths = IndexPaths::new(location);
        let header = persist::load_header(&paths)?;
        let docs: HashMap<DocId, DocMetadata> = persist::load_bincode(&paths.docs())?;
        let vocabulary: Vec<String> = persist::load_bincode(&paths.vocabulary())?;
        let store: Box<dyn PostingsStore> = match header.index_type {
            IndexKind::Inverted => Box::new(InvertedPostings::load(&paths)?),
            IndexKind::Positional => Box::new(PositionalPostings::load(&paths)?),
            IndexKind::OnDisk => Box::new(DiskPostings::open(paths.postings_db())?),
        };
        let index = Self { kind: header.index_type, paths, store, documents: DocumentTable::from(docs) };

        if index.store.terms() != vocabulary {
            return Err(Error::persistence(
                index.paths.vocabulary(),
                "vocabulary does not match stored postings",
            ));
        }
        let stats = index.statistics();
        let expected = header.statistics;
        if stats.number_of_documents != expected.number_of_documents
            || stats.total_token_count != expected.total_token_count
            || stats.unique_token_count != expected.unique_token_count
        {
            return Err(Error::persistence(
                index.paths.header(),
                format!("statistics mismatch: header {expected:?}, stored data {stats:?}"),
            ));
        }
        tracing::info!(
            index_type = %index.kind,
            location = %index.paths.root.display(),
            num_docs = stats.number_of_documents,
            "loaded index"
        );
        Ok(index)
    }
}
