use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::token::Token;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\w+").expect("valid regex");
    static ref LETTER_WORD_RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Turns raw text into an ordered token stream.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Phrases that must survive tokenization as a single token.
#[derive(Debug, Clone, Default)]
pub struct MultiWordExpressions {
    // longest first so "new york city" wins over "new york"
    phrases: Vec<String>,
}

impl MultiWordExpressions {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut phrases: Vec<String> = phrases
            .into_iter()
            .map(Into::into)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        phrases.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        phrases.dedup();
        Self { phrases }
    }

    /// Load one phrase per line.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(Self::new(text.lines()))
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Join every configured phrase occurring in `text` with underscores.
    pub fn merge(&self, text: &str) -> String {
        let mut merged = text.to_string();
        for phrase in &self.phrases {
            if merged.contains(phrase.as_str()) {
                merged = merged.replace(phrase.as_str(), &phrase.replace(' ', "_"));
            }
        }
        merged
    }
}

fn restore_spaces(token: &str) -> Token {
    Token::Kept(token.replace('_', " "))
}

/// Splits on whitespace.
#[derive(Debug, Clone, Default)]
pub struct SplitTokenizer {
    expressions: MultiWordExpressions,
}

impl SplitTokenizer {
    pub fn new(expressions: MultiWordExpressions) -> Self {
        Self { expressions }
    }
}

impl Tokenizer for SplitTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        self.expressions
            .merge(text)
            .split_whitespace()
            .map(restore_spaces)
            .collect()
    }
}

/// Emits every `\w+` run.
#[derive(Debug, Clone, Default)]
pub struct RegexTokenizer {
    expressions: MultiWordExpressions,
}

impl RegexTokenizer {
    pub fn new(expressions: MultiWordExpressions) -> Self {
        Self { expressions }
    }
}

impl Tokenizer for RegexTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let merged = self.expressions.merge(text);
        WORD_RE.find_iter(&merged).map(|m| restore_spaces(m.as_str())).collect()
    }
}

/// NFKC normalization, lowercasing and English stemming.
#[derive(Debug, Clone, Default)]
pub struct StemmingTokenizer {
    expressions: MultiWordExpressions,
}

impl StemmingTokenizer {
    pub fn new(expressions: MultiWordExpressions) -> Self {
        Self { expressions }
    }
}

impl Tokenizer for StemmingTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let normalized = text.nfkc().collect::<String>();
        let merged = self.expressions.merge(&normalized).to_lowercase();
        LETTER_WORD_RE
            .find_iter(&merged)
            .map(|m| {
                let word = m.as_str();
                if word.contains('_') {
                    // merged phrases are kept verbatim
                    restore_spaces(word)
                } else {
                    Token::Kept(STEMMER.stem(word).to_string())
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    Split,
    #[default]
    Regex,
    Stemming,
}

impl TokenizerKind {
    pub fn build(self, expressions: MultiWordExpressions) -> Box<dyn Tokenizer> {
        match self {
            TokenizerKind::Split => Box::new(SplitTokenizer::new(expressions)),
            TokenizerKind::Regex => Box::new(RegexTokenizer::new(expressions)),
            TokenizerKind::Stemming => Box::new(StemmingTokenizer::new(expressions)),
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "split" => Ok(TokenizerKind::Split),
            "regex" => Ok(TokenizerKind::Regex),
            "stemming" | "stem" => Ok(TokenizerKind::Stemming),
            other => Err(Error::configuration(format!("unknown tokenizer: {other}"))),
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenizerKind::Split => "split",
            TokenizerKind::Regex => "regex",
            TokenizerKind::Stemming => "stemming",
        };
        f.write_str(name)
    }
}
