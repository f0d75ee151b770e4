use sift_core::scorer::{Bm25, DirichletLm, PivotedNormalization, TfIdf, WordCountCosine};
use sift_core::token::kept;
use sift_core::tokenizer::SplitTokenizer;
use sift_core::{
    Error, Index, IndexKind, QueryTerms, Ranker, RelevanceScorer, ScoredDoc, ScorerConfig, Stopwords,
    Token,
};
use std::sync::Arc;

fn index_of(docs: &[(u32, &str)]) -> Index {
    let mut index = Index::create(IndexKind::Inverted, "unused").unwrap();
    for (doc_id, text) in docs {
        index.add_doc(*doc_id, &kept(text.split_whitespace())).unwrap();
    }
    index
}

fn worked_example() -> Index {
    index_of(&[(1, "apple apple apple apple apple apple"), (2, "cat dog cat dog bird bird")])
}

fn three_docs() -> Index {
    index_of(&[
        (1, "apple apple apple apple apple apple"),
        (2, "cat dog cat dog bird bird"),
        (3, "cat fish"),
    ])
}

fn ranker(config: ScorerConfig) -> Ranker {
    Ranker::new(Arc::new(SplitTokenizer::default()), config.build())
}

fn query(text: &str) -> QueryTerms {
    QueryTerms::new(&kept(text.split_whitespace()))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn cosine_worked_example() {
    let results = ranker(ScorerConfig::WordCountCosine).query(&worked_example(), "apple").unwrap();
    assert_eq!(results, vec![ScoredDoc { doc_id: 1, score: 6.0 }]);
}

#[test]
fn cosine_multiplies_by_query_frequency() {
    let results = ranker(ScorerConfig::WordCountCosine).query(&worked_example(), "apple apple").unwrap();
    assert_eq!(results, vec![ScoredDoc { doc_id: 1, score: 12.0 }]);
}

#[test]
fn retrieval_is_disjunctive() {
    let results = ranker(ScorerConfig::WordCountCosine).query(&worked_example(), "apple bird").unwrap();
    assert_eq!(
        results,
        vec![ScoredDoc { doc_id: 1, score: 6.0 }, ScoredDoc { doc_id: 2, score: 2.0 }]
    );
}

#[test]
fn ties_break_by_ascending_docid() {
    let index = index_of(&[(9, "x y"), (3, "x z"), (5, "x w")]);
    let results = ranker(ScorerConfig::WordCountCosine).query(&index, "x").unwrap();
    let ids: Vec<u32> = results.iter().map(|r| r.doc_id).collect();
    assert_eq!(ids, vec![3, 5, 9]);
}

#[test]
fn filtered_or_unknown_queries_return_nothing() {
    let index = worked_example();
    let stopwords: Stopwords = ["the", "of"].into_iter().collect();
    for config in ["cosine", "tfidf", "bm25", "dirichlet", "pivoted"] {
        let ranker = ranker(config.parse().unwrap()).with_stopwords(Arc::new(stopwords.clone()));
        assert!(ranker.query(&index, "The of").unwrap().is_empty());
        assert!(ranker.query(&index, "zebra").unwrap().is_empty());
        assert!(ranker.query(&index, "").unwrap().is_empty());
        // terms are matched exactly as tokenized
        assert!(ranker.query(&index, "Apple").unwrap().is_empty());
    }
}

#[test]
fn stopword_in_query_is_skipped_when_scoring() {
    let index = index_of(&[(1, "the cat"), (2, "the dog")]);
    let stopwords: Stopwords = ["the"].into_iter().collect();
    let results = ranker(ScorerConfig::WordCountCosine)
        .with_stopwords(Arc::new(stopwords))
        .query(&index, "THE cat")
        .unwrap();
    assert_eq!(results, vec![ScoredDoc { doc_id: 1, score: 1.0 }]);
}

#[test]
fn tfidf_matches_formula() {
    let index = worked_example();
    let score = TfIdf.score(&index, 1, &query("apple")).unwrap().score;
    assert!(close(score, 7f64.ln() * (1.0 + 2f64.ln())));
}

#[test]
fn bm25_matches_formula() {
    let index = three_docs();
    let score = Bm25::default().score(&index, 3, &query("fish fish")).unwrap().score;

    let (n, df, tf, qtf, doc_len, avg_len): (f64, f64, f64, f64, f64, f64) = (3.0, 1.0, 1.0, 2.0, 2.0, 14.0 / 3.0);
    let (b, k1, k3) = (0.75, 1.2, 8.0);
    let idf = ((n - df + 0.5) / (df + 0.5)).ln();
    let tf_part = (k1 + 1.0) * tf / (k1 * (1.0 - b + b * doc_len / avg_len) + tf);
    let qtf_part = (k3 + 1.0) * qtf / (k3 + qtf);
    assert!(close(score, idf * tf_part * qtf_part));
    assert!(score > 0.0);
}

#[test]
fn bm25_term_in_every_document_is_not_rewarded() {
    let index = index_of(&[(1, "the cat"), (2, "the dog"), (3, "the owl the")]);
    for doc_id in 1..=3 {
        assert!(Bm25::default().score(&index, doc_id, &query("the")).unwrap().score <= 0.0);
    }
}

#[test]
fn bm25_on_empty_collection_is_degenerate() {
    let index = Index::create(IndexKind::Inverted, "unused").unwrap();
    let err = Bm25::default().score(&index, 1, &query("anything")).unwrap_err();
    assert!(matches!(err, Error::DegenerateInput(_)));
}

#[test]
fn dirichlet_matches_formula() {
    let index = worked_example();
    let score = DirichletLm::default().score(&index, 1, &query("apple")).unwrap().score;
    let mu = 2000.0f64;
    let expected = (1.0 + 6.0 / (mu * 0.5)).ln() + (mu / (6.0 + mu)).ln();
    assert!(close(score, expected));
}

#[test]
fn dirichlet_prior_counts_query_stopwords() {
    let index = worked_example();
    let stopwords: Stopwords = ["the"].into_iter().collect();
    let ranker = ranker(ScorerConfig::DirichletLm { mu: 2000.0 }).with_stopwords(Arc::new(stopwords));
    let results = ranker.query(&index, "the apple").unwrap();

    let mu = 2000.0f64;
    let expected = (1.0 + 6.0 / (mu * 0.5)).ln() + 2.0 * (mu / (6.0 + mu)).ln();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, 1);
    assert!(close(results[0].score, expected), "{}", results[0].score);
    assert!(results[0].score < 0.0);
}

#[test]
fn dirichlet_on_empty_collection_scores_zero() {
    let index = Index::create(IndexKind::Inverted, "unused").unwrap();
    let score = DirichletLm::default().score(&index, 1, &query("anything")).unwrap().score;
    assert_eq!(score, 0.0);
}

#[test]
fn pivoted_matches_formula() {
    let index = worked_example();
    let score = PivotedNormalization::default().score(&index, 1, &query("apple")).unwrap().score;
    let expected = (1.0 + (1.0 + 6f64.ln()).ln()) / 1.0 * 3f64.ln();
    assert!(close(score, expected));
}

#[test]
fn pivoted_on_empty_collection_is_degenerate() {
    let mut index = Index::create(IndexKind::Inverted, "unused").unwrap();
    index.add_doc(1, &[Token::Filtered, Token::Filtered]).unwrap();
    let err = PivotedNormalization::default().score(&index, 1, &query("anything")).unwrap_err();
    assert!(matches!(err, Error::DegenerateInput(_)));
}

#[test]
fn out_of_vocabulary_terms_contribute_nothing() {
    let index = three_docs();
    let with_oov = query("fish zebra");
    let without = query("fish");

    for scorer in [
        Box::new(Bm25::default()) as Box<dyn RelevanceScorer>,
        Box::new(PivotedNormalization::default()),
        Box::new(TfIdf),
        Box::new(WordCountCosine),
    ] {
        let a = scorer.score(&index, 3, &with_oov).unwrap().score;
        let b = scorer.score(&index, 3, &without).unwrap().score;
        assert!(close(a, b), "{}", scorer.name());
    }

    // Dirichlet skips the term but still counts it in the query-length prior
    let lm = DirichletLm::default();
    let a = lm.score(&index, 3, &with_oov).unwrap().score;
    let b = lm.score(&index, 3, &without).unwrap().score;
    assert!(close(a - b, (lm.mu / (2.0 + lm.mu)).ln()));
}

#[test]
fn every_model_ranks_through_the_executor() {
    let index = three_docs();
    for name in ["cosine", "tfidf", "bm25", "dirichlet", "pivoted"] {
        let results = ranker(name.parse().unwrap()).query(&index, "cat fish").unwrap();
        let ids: Vec<u32> = results.iter().map(|r| r.doc_id).collect();
        assert_eq!(ids.len(), 2, "{name}");
        assert!(ids.contains(&2) && ids.contains(&3), "{name}");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score), "{name}");
    }
}
