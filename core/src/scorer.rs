//! Relevance models.
//!
//! Each model is a pure function of the index contents, a document and the
//! query's term counts. Models are picked through [`ScorerConfig`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::index::Index;
use crate::token::Token;
use crate::DocId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

/// Query terms collapsed to counts, in order of first appearance.
///
/// Filtered slots are not scored but still count toward [`length`](Self::length).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    counts: Vec<(String, u32)>,
    length: u32,
}

impl QueryTerms {
    pub fn new(tokens: &[Token]) -> Self {
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut counts: Vec<(String, u32)> = Vec::new();
        for term in tokens.iter().filter_map(Token::term) {
            match slots.get(term) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    slots.insert(term, counts.len());
                    counts.push((term.to_string(), 1));
                }
            }
        }
        Self { counts, length: tokens.len() as u32 }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.counts.iter().map(|(term, count)| (term.as_str(), *count))
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of query slots, repeats and filtered slots included.
    pub fn length(&self) -> u32 {
        self.length
    }
}

pub trait RelevanceScorer: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn score(&self, index: &Index, doc_id: DocId, query: &QueryTerms) -> Result<ScoredDoc>;
}

fn doc_length(index: &Index, doc_id: DocId) -> f64 {
    index.doc_metadata(doc_id).map(|m| f64::from(m.length)).unwrap_or(0.0)
}

/// Unnormalized dot product of raw query and document term counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCountCosine;

impl RelevanceScorer for WordCountCosine {
    fn name(&self) -> &'static str {
        "cosine"
    }

    fn score(&self, index: &Index, doc_id: DocId, query: &QueryTerms) -> Result<ScoredDoc> {
        let score = query
            .iter()
            .map(|(term, qtf)| f64::from(qtf) * f64::from(index.term_frequency(term, doc_id)))
            .sum();
        Ok(ScoredDoc { doc_id, score })
    }
}

/// `ln(tf + 1) * (1 + ln(N / df))` per term.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdf;

impl RelevanceScorer for TfIdf {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn score(&self, index: &Index, doc_id: DocId, query: &QueryTerms) -> Result<ScoredDoc> {
        let n = index.statistics().number_of_documents as f64;
        let mut score = 0.0;
        for (term, qtf) in query.iter() {
            let df = index.term_metadata(term).document_frequency;
            let idf = if df > 0 { 1.0 + (n / f64::from(df)).ln() } else { 0.0 };
            let tf = (f64::from(index.term_frequency(term, doc_id)) + 1.0).ln();
            score += f64::from(qtf) * tf * idf;
        }
        Ok(ScoredDoc { doc_id, score })
    }
}

/// Okapi BM25 with query-term saturation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub b: f64,
    pub k1: f64,
    pub k3: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self { b: 0.75, k1: 1.2, k3: 8.0 }
    }
}

impl RelevanceScorer for Bm25 {
    fn name(&self) -> &'static str {
        "bm25"
    }

    fn score(&self, index: &Index, doc_id: DocId, query: &QueryTerms) -> Result<ScoredDoc> {
        let stats = index.statistics();
        if stats.mean_document_length == 0.0 {
            return Err(Error::DegenerateInput(
                "bm25 needs a non-zero mean document length".into(),
            ));
        }
        let n = stats.number_of_documents as f64;
        let avg_len = stats.mean_document_length;
        let doc_len = doc_length(index, doc_id);

        let mut score = 0.0;
        for (term, qtf) in query.iter() {
            let df = f64::from(index.term_metadata(term).document_frequency);
            let tf = f64::from(index.term_frequency(term, doc_id));
            let qtf = f64::from(qtf);

            let idf_part = ((n - df + 0.5) / (df + 0.5)).ln();
            let tf_part =
                (self.k1 + 1.0) * tf / (self.k1 * (1.0 - self.b + self.b * doc_len / avg_len) + tf);
            let qtf_part = (self.k3 + 1.0) * qtf / (self.k3 + qtf);
            score += idf_part * tf_part * qtf_part;
        }
        Ok(ScoredDoc { doc_id, score })
    }
}

/// Query likelihood with Dirichlet prior smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirichletLm {
    pub mu: f64,
}

impl Default for DirichletLm {
    fn default() -> Self {
        Self { mu: 2000.0 }
    }
}

impl RelevanceScorer for DirichletLm {
    fn name(&self) -> &'static str {
        "dirichlet"
    }

    fn score(&self, index: &Index, doc_id: DocId, query: &QueryTerms) -> Result<ScoredDoc> {
        let total_tokens = index.statistics().total_token_count as f64;
        let doc_len = doc_length(index, doc_id);

        let mut score = 0.0;
        for (term, qtf) in query.iter() {
            let collection_tf = index.term_metadata(term).total_term_frequency as f64;
            if total_tokens == 0.0 || collection_tf == 0.0 {
                continue;
            }
            let p_ref = collection_tf / total_tokens;
            let tf = f64::from(index.term_frequency(term, doc_id));
            score += f64::from(qtf) * (1.0 + tf / (self.mu * p_ref)).ln();
        }
        score += f64::from(query.length()) * (self.mu / (doc_len + self.mu)).ln();
        Ok(ScoredDoc { doc_id, score })
    }
}

/// Pivoted document length normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotedNormalization {
    pub b: f64,
}

impl Default for PivotedNormalization {
    fn default() -> Self {
        Self { b: 0.2 }
    }
}

impl RelevanceScorer for PivotedNormalization {
    fn name(&self) -> &'static str {
        "pivoted"
    }

    fn score(&self, index: &Index, doc_id: DocId, query: &QueryTerms) -> Result<ScoredDoc> {
        let stats = index.statistics();
        if stats.mean_document_length == 0.0 {
            return Err(Error::DegenerateInput(
                "pivoted normalization needs a non-zero mean document length".into(),
            ));
        }
        let n = stats.number_of_documents as f64;
        let avg_len = stats.mean_document_length;
        let doc_len = doc_length(index, doc_id);

        let mut score = 0.0;
        for (term, qtf) in query.iter() {
            let df = index.term_metadata(term).document_frequency;
            let tf = index.term_frequency(term, doc_id);
            if df == 0 || tf == 0 {
                continue;
            }
            let tf = f64::from(tf);
            let middle = (1.0 + (1.0 + tf.ln()).ln()) / (1.0 - self.b + self.b * doc_len / avg_len);
            score += f64::from(qtf) * middle * ((n + 1.0) / f64::from(df)).ln();
        }
        Ok(ScoredDoc { doc_id, score })
    }
}

/// Relevance model selector with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScorerConfig {
    WordCountCosine,
    TfIdf,
    Bm25 { b: f64, k1: f64, k3: f64 },
    DirichletLm { mu: f64 },
    PivotedNormalization { b: f64 },
}

impl ScorerConfig {
    pub fn build(self) -> Box<dyn RelevanceScorer> {
        match self {
            ScorerConfig::WordCountCosine => Box::new(WordCountCosine),
            ScorerConfig::TfIdf => Box::new(TfIdf),
            ScorerConfig::Bm25 { b, k1, k3 } => Box::new(Bm25 { b, k1, k3 }),
            ScorerConfig::DirichletLm { mu } => Box::new(DirichletLm { mu }),
            ScorerConfig::PivotedNormalization { b } => Box::new(PivotedNormalization { b }),
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        let Bm25 { b, k1, k3 } = Bm25::default();
        ScorerConfig::Bm25 { b, k1, k3 }
    }
}

/// Parses a model name into its default parameterization.
impl FromStr for ScorerConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "cosine" | "wordcount" | "wordcountcosine" => Ok(ScorerConfig::WordCountCosine),
            "tfidf" => Ok(ScorerConfig::TfIdf),
            "bm25" => Ok(ScorerConfig::default()),
            "dirichlet" | "dirichletlm" => Ok(ScorerConfig::DirichletLm { mu: DirichletLm::default().mu }),
            "pivoted" | "pivotednormalization" => {
                Ok(ScorerConfig::PivotedNormalization { b: PivotedNormalization::default().b })
            }
            _ => Err(Error::configuration(format!("unknown scorer: {s}"))),
        }
    }
}
