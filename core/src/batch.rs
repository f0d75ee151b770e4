use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::thread;

use crate::error::Result;
use crate::ranker::Ranker;
use crate::scorer::ScoredDoc;
use crate::shared::SharedIndex;

/// Read one query per line, skipping blank lines.
pub fn read_queries<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Rank every distinct query over `workers` threads sharing the index read lock.
pub fn run_query_batch<I, S>(
    index: &SharedIndex,
    ranker: &Ranker,
    queries: I,
    workers: usize,
) -> Result<BTreeMap<String, Vec<ScoredDoc>>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: Vec<String> = queries
        .into_iter()
        .map(|q| q.as_ref().trim().to_string())
        .filter(|q| !q.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if unique.is_empty() {
        return Ok(BTreeMap::new());
    }
    let workers = workers.clamp(1, unique.len());
    let chunk_size = unique.len().div_ceil(workers);

    let per_worker: Vec<Result<Vec<(String, Vec<ScoredDoc>)>>> = thread::scope(|s| {
        let handles: Vec<_> = unique
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|q| Ok((q.clone(), index.query(ranker, q)?)))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    let mut results = BTreeMap::new();
    for chunk in per_worker {
        results.extend(chunk?);
    }
    tracing::info!(num_queries = results.len(), workers, "query batch complete");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Index, IndexKind};
    use crate::scorer::ScorerConfig;
    use crate::token::kept;
    use crate::tokenizer::SplitTokenizer;
    use std::sync::Arc;

    #[test]
    fn duplicate_queries_are_ranked_once() {
        let mut index = Index::create(IndexKind::Inverted, "unused").unwrap();
        index.add_doc(1, &kept(["red", "fish"])).unwrap();
        index.add_doc(2, &kept(["blue", "fish"])).unwrap();
        let shared = SharedIndex::new(index);
        let ranker = Ranker::new(Arc::new(SplitTokenizer::default()), ScorerConfig::WordCountCosine.build());

        let results = run_query_batch(&shared, &ranker, ["fish", " fish ", "red", ""], 4).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results["fish"].len(), 2);
        assert_eq!(results["red"], vec![ScoredDoc { doc_id: 1, score: 1.0 }]);
    }
}
