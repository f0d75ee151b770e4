//! Bulk construction of an index from a dataset of `{docid, text}` records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::index::{Index, IndexKind};
use crate::stopwords::Stopwords;
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::DocId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub docid: DocId,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct IndexingConfig {
    pub stopwords: Option<Stopwords>,
    /// Tokens rarer than this within their own document are filtered. 0 and 1 disable it.
    pub minimum_word_frequency: u32,
    /// Stop after this many records.
    pub max_documents: Option<usize>,
}

/// Mark stopwords and sub-threshold tokens as filtered, keeping their slots.
pub fn filter_tokens(tokens: Vec<Token>, config: &IndexingConfig) -> Vec<Token> {
    let min_freq = config.minimum_word_frequency;
    if config.stopwords.is_none() && min_freq <= 1 {
        return tokens;
    }

    let mut frequencies: HashMap<String, u32> = HashMap::new();
    if min_freq > 1 {
        for term in tokens.iter().filter_map(Token::term) {
            *frequencies.entry(term.to_lowercase()).or_insert(0) += 1;
        }
    }

    tokens
        .into_iter()
        .map(|token| {
            let keep = match token.term() {
                None => false,
                Some(term) => {
                    let lower = term.to_lowercase();
                    let stop = config.stopwords.as_ref().is_some_and(|sw| sw.contains(&lower));
                    let rare = min_freq > 1 && frequencies.get(&lower).copied().unwrap_or(0) < min_freq;
                    !stop && !rare
                }
            };
            if keep { token } else { Token::Filtered }
        })
        .collect()
}

/// `.json`/`.jsonl` files under `path`, or `path` itself when it is a file.
pub fn dataset_files(path: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if path.is_file() {
        files.push(path.to_path_buf());
    }
    files
}

/// Feed every record of `file` to `visit` until it returns `false`.
///
/// A `.json` file holds one record or an array of records; anything else is
/// read as JSON lines.
pub fn read_records<F>(file: &Path, visit: &mut F) -> Result<bool>
where
    F: FnMut(DatasetRecord) -> Result<bool>,
{
    let f = File::open(file)?;
    let reader = BufReader::new(f);
    if file.extension().and_then(|s| s.to_str()) == Some("json") {
        let json: serde_json::Value = serde_json::from_reader(reader)
            .map_err(|e| Error::Dataset(format!("{}: {e}", file.display())))?;
        let values = match json {
            serde_json::Value::Array(arr) => arr,
            other => vec![other],
        };
        for v in values {
            let record: DatasetRecord = serde_json::from_value(v)
                .map_err(|e| Error::Dataset(format!("{}: {e}", file.display())))?;
            if !visit(record)? {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let record: DatasetRecord = serde_json::from_str(&line)
            .map_err(|e| Error::Dataset(format!("{}:{}: {e}", file.display(), line_no + 1)))?;
        if !visit(record)? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub struct Indexer;

impl Indexer {
    /// Tokenize, filter and add each record. Returns how many were added.
    pub fn index_records<I>(
        index: &mut Index,
        records: I,
        tokenizer: &dyn Tokenizer,
        config: &IndexingConfig,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = DatasetRecord>,
    {
        let mut added = 0;
        for record in records {
            if config.max_documents.is_some_and(|max| added >= max) {
                break;
            }
            Self::index_record(index, record, tokenizer, config)?;
            added += 1;
        }
        Ok(added)
    }

    fn index_record(
        index: &mut Index,
        record: DatasetRecord,
        tokenizer: &dyn Tokenizer,
        config: &IndexingConfig,
    ) -> Result<()> {
        let tokens = filter_tokens(tokenizer.tokenize(&record.text), config);
        index.add_doc(record.docid, &tokens)
    }

    /// Build an index from a dataset file or directory and save it to `location`.
    pub fn create_index<P: AsRef<Path>>(
        kind: IndexKind,
        location: P,
        dataset: &Path,
        tokenizer: &dyn Tokenizer,
        config: &IndexingConfig,
    ) -> Result<Index> {
        let files = dataset_files(dataset);
        if files.is_empty() {
            return Err(Error::Dataset(format!("no dataset files at {}", dataset.display())));
        }

        let mut index = Index::create(kind, location)?;
        let mut added = 0usize;
        for file in &files {
            let keep_going = read_records(file, &mut |record| {
                if config.max_documents.is_some_and(|max| added >= max) {
                    return Ok(false);
                }
                Self::index_record(&mut index, record, tokenizer, config)?;
                added += 1;
                if added % 10_000 == 0 {
                    tracing::debug!(num_docs = added, "indexing progress");
                }
                Ok(true)
            })?;
            if !keep_going {
                break;
            }
        }

        let stats = index.statistics();
        tracing::info!(
            num_docs = stats.number_of_documents,
            num_terms = stats.unique_token_count,
            num_files = files.len(),
            "ingested documents"
        );
        index.save()?;
        Ok(index)
    }
}
