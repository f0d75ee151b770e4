use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::index::Index;
use crate::scorer::{QueryTerms, RelevanceScorer, ScoredDoc};
use crate::stopwords::Stopwords;
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::DocId;

/// Runs free-text queries against an index.
///
/// Candidates are every document holding at least one query term; each is
/// scored by the configured model. Results are ordered by descending score,
/// ties by ascending docid.
pub struct Ranker {
    tokenizer: Arc<dyn Tokenizer>,
    stopwords: Option<Arc<Stopwords>>,
    scorer: Box<dyn RelevanceScorer>,
}

impl Ranker {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, scorer: Box<dyn RelevanceScorer>) -> Self {
        Self { tokenizer, stopwords: None, scorer }
    }

    pub fn with_stopwords(mut self, stopwords: Arc<Stopwords>) -> Self {
        self.stopwords = Some(stopwords);
        self
    }

    pub fn scorer(&self) -> &dyn RelevanceScorer {
        self.scorer.as_ref()
    }

    /// Tokenize `text`, turning stopwords into filtered slots.
    pub fn query_tokens(&self, text: &str) -> Vec<Token> {
        let tokens = self.tokenizer.tokenize(text);
        match &self.stopwords {
            Some(stopwords) => tokens
                .into_iter()
                .map(|token| {
                    if token.term().is_some_and(|term| stopwords.contains(term)) {
                        Token::Filtered
                    } else {
                        token
                    }
                })
                .collect(),
            None => tokens,
        }
    }

    pub fn candidates(index: &Index, query: &QueryTerms) -> BTreeSet<DocId> {
        query
            .iter()
            .flat_map(|(term, _)| index.postings(term).into_iter().map(|p| p.doc_id))
            .collect()
    }

    pub fn query(&self, index: &Index, text: &str) -> Result<Vec<ScoredDoc>> {
        let query = QueryTerms::new(&self.query_tokens(text));
        self.rank(index, &query)
    }

    pub fn rank(&self, index: &Index, query: &QueryTerms) -> Result<Vec<ScoredDoc>> {
        let candidates = Self::candidates(index, query);
        let mut results = candidates
            .into_iter()
            .map(|doc_id| self.scorer.score(index, doc_id, query))
            .collect::<Result<Vec<_>>>()?;
        results.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
        tracing::debug!(
            scorer = self.scorer.name(),
            num_terms = query.len(),
            num_hits = results.len(),
            "ranked query"
        );
        Ok(results)
    }
}

impl fmt::Debug for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker")
            .field("scorer", &self.scorer)
            .field("stopwords", &self.stopwords.as_ref().map(|s| s.len()))
            .finish()
    }
}
