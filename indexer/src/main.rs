use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sift_core::batch::{read_queries, run_query_batch};
use sift_core::pipeline::{IndexingConfig, Indexer};
use sift_core::tokenizer::{MultiWordExpressions, Tokenizer, TokenizerKind};
use sift_core::{DocId, Index, IndexKind, Ranker, ScorerConfig, SharedIndex, Stopwords};
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sift-indexer")]
#[command(about = "Build, inspect and query an inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Tokenization settings shared by indexing and querying.
#[derive(Args, Clone)]
struct TextOptions {
    /// Tokenizer: split, regex or stemming
    #[arg(long, default_value = "regex")]
    tokenizer: String,
    /// File of multi-word expressions, one per line
    #[arg(long)]
    multiword: Option<PathBuf>,
    /// File of stopwords, one per line
    #[arg(long)]
    stopwords: Option<PathBuf>,
    /// Use the bundled English stopword list
    #[arg(long, default_value_t = false, conflicts_with = "stopwords")]
    english_stopwords: bool,
}

impl TextOptions {
    fn tokenizer(&self) -> Result<Arc<dyn Tokenizer>> {
        let kind: TokenizerKind = self.tokenizer.parse()?;
        let expressions = match &self.multiword {
            Some(path) => MultiWordExpressions::from_file(path)
                .with_context(|| format!("reading multi-word expressions from {}", path.display()))?,
            None => MultiWordExpressions::default(),
        };
        Ok(Arc::from(kind.build(expressions)))
    }

    fn stopwords(&self) -> Result<Option<Stopwords>> {
        if self.english_stopwords {
            return Ok(Some(Stopwords::english()));
        }
        Ok(match &self.stopwords {
            Some(path) => Some(Stopwords::from_file(path)?),
            None => None,
        })
    }

    fn ranker(&self, scorer: &str) -> Result<Ranker> {
        let config: ScorerConfig = scorer.parse()?;
        let ranker = Ranker::new(self.tokenizer()?, config.build());
        Ok(match self.stopwords()? {
            Some(stopwords) => ranker.with_stopwords(Arc::new(stopwords)),
            None => ranker,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a JSON/JSONL dataset file or directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Index type: inverted, positional or ondisk
        #[arg(long, default_value = "inverted")]
        index_type: String,
        /// Filter tokens occurring fewer times than this within their document
        #[arg(long, default_value_t = 0)]
        min_freq: u32,
        /// Only index the first N documents
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        text: TextOptions,
    },
    /// Print collection statistics
    Stats {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
    },
    /// Rank documents for one query
    Query {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        /// Query text
        #[arg(long)]
        q: String,
        /// Relevance model: cosine, tfidf, bm25, dirichlet or pivoted
        #[arg(long, default_value = "bm25")]
        scorer: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        #[command(flatten)]
        text: TextOptions,
    },
    /// Rank every line of a query file and write the results as JSON
    Batch {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        /// Query file, one query per line
        #[arg(long)]
        queries: PathBuf,
        /// Output JSON file
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value = "bm25")]
        scorer: String,
        #[arg(long, default_value_t = 10)]
        k: usize,
        #[arg(long, default_value_t = 4)]
        threads: usize,
        #[command(flatten)]
        text: TextOptions,
    },
    /// Remove a document and save the index
    Remove {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        #[arg(long)]
        doc_id: DocId,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, index_type, min_freq, limit, text } => {
            build_index(&input, &output, &index_type, min_freq, limit, &text)
        }
        Commands::Stats { index } => {
            let index = Index::load(&index)?;
            println!("{}", serde_json::to_string_pretty(&index.statistics())?);
            Ok(())
        }
        Commands::Query { index, q, scorer, k, text } => {
            let index = Index::load(&index)?;
            let ranker = text.ranker(&scorer)?;
            let mut results = ranker.query(&index, &q)?;
            results.truncate(k);
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Commands::Batch { index, queries, output, scorer, k, threads, text } => {
            let shared = SharedIndex::new(Index::load(&index)?);
            let ranker = text.ranker(&scorer)?;
            let queries = read_queries(&queries)?;
            let mut results = run_query_batch(&shared, &ranker, &queries, threads)?;
            for ranked in results.values_mut() {
                ranked.truncate(k);
            }
            fs::write(&output, serde_json::to_string_pretty(&results)?)
                .with_context(|| format!("writing {}", output.display()))?;
            tracing::info!(output = %output.display(), num_queries = results.len(), "wrote batch results");
            Ok(())
        }
        Commands::Remove { index, doc_id } => {
            let mut index = Index::load(&index)?;
            if !index.contains_doc(doc_id) {
                tracing::warn!(doc_id, "document not indexed");
            }
            index.remove_doc(doc_id)?;
            index.save()?;
            Ok(())
        }
    }
}

fn build_index(
    input: &Path,
    output: &Path,
    index_type: &str,
    min_freq: u32,
    limit: Option<usize>,
    text: &TextOptions,
) -> Result<()> {
    let kind: IndexKind = index_type.parse()?;
    let tokenizer = text.tokenizer()?;
    let config = IndexingConfig {
        stopwords: text.stopwords()?,
        minimum_word_frequency: min_freq,
        max_documents: limit,
    };
    let start = std::time::Instant::now();
    let index = Indexer::create_index(kind, output, input, tokenizer.as_ref(), &config)?;
    let stats = index.statistics();
    tracing::info!(
        output = %output.display(),
        index_type = %kind,
        num_docs = stats.number_of_documents,
        num_terms = stats.unique_token_count,
        took_s = start.elapsed().as_secs_f64(),
        "index build complete"
    );
    Ok(())
}
