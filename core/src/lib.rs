pub mod batch;
pub mod error;
pub mod index;
pub mod metadata;
pub mod persist;
pub mod pipeline;
pub mod postings;
pub mod ranker;
pub mod scorer;
pub mod shared;
pub mod stopwords;
pub mod token;
pub mod tokenizer;

pub use error::{Error, Result};
pub use index::{Index, IndexKind, IndexStatistics};
pub use metadata::DocMetadata;
pub use postings::{Posting, TermStats};
pub use ranker::Ranker;
pub use scorer::{QueryTerms, RelevanceScorer, ScoredDoc, ScorerConfig};
pub use shared::SharedIndex;
pub use stopwords::Stopwords;
pub use token::Token;

pub type DocId = u32;
/// Zero-based token offset within a document, filtered slots included.
pub type Position = u32;
