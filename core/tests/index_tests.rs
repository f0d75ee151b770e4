use sift_core::persist::{save_bincode, IndexPaths};
use sift_core::token::kept;
use sift_core::{DocId, DocMetadata, Error, Index, IndexKind, IndexStatistics, Posting, Token};
use tempfile::tempdir;

const KINDS: [IndexKind; 3] = [IndexKind::Inverted, IndexKind::Positional, IndexKind::OnDisk];

fn tokens(text: &str) -> Vec<Token> {
    kept(text.split_whitespace())
}

fn worked_example(kind: IndexKind, location: &std::path::Path) -> Index {
    let mut index = Index::create(kind, location).unwrap();
    index.add_doc(1, &tokens("apple apple apple apple apple apple")).unwrap();
    index.add_doc(2, &tokens("cat dog cat dog bird bird")).unwrap();
    index
}

#[test]
fn worked_example_statistics_and_postings() {
    for kind in KINDS {
        let dir = tempdir().unwrap();
        let index = worked_example(kind, dir.path());
        assert_eq!(
            index.statistics(),
            IndexStatistics {
                number_of_documents: 2,
                total_token_count: 12,
                mean_document_length: 6.0,
                unique_token_count: 4,
            },
            "{kind}"
        );
        let apple: Vec<(DocId, u32)> = index.postings("apple").iter().map(|p| (p.doc_id, p.frequency)).collect();
        assert_eq!(apple, vec![(1, 6)], "{kind}");
        assert_eq!(index.term_metadata("cat").document_frequency, 1);
        assert_eq!(index.term_metadata("bird").total_term_frequency, 2);
        assert_eq!(index.doc_metadata(2), Some(DocMetadata { length: 6, unique_tokens: 3 }));
    }
}

#[test]
fn unknown_lookups_are_empty_not_errors() {
    for kind in KINDS {
        let dir = tempdir().unwrap();
        let index = worked_example(kind, dir.path());
        assert!(index.postings("zebra").is_empty());
        assert_eq!(index.term_metadata("zebra").document_frequency, 0);
        assert_eq!(index.term_frequency("apple", 99), 0);
        assert_eq!(index.doc_metadata(99), None);
    }
}

#[test]
fn terms_are_case_sensitive() {
    let mut index = Index::create(IndexKind::Inverted, "unused").unwrap();
    index.add_doc(1, &tokens("Apple apple")).unwrap();
    assert_eq!(index.terms(), vec!["Apple".to_string(), "apple".to_string()]);
}

#[test]
fn positional_postings_keep_filtered_offsets() {
    let mut index = Index::create(IndexKind::Positional, "unused").unwrap();
    let doc = vec![Token::Filtered, "cat".into(), "sat".into(), Token::Filtered, "cat".into()];
    index.add_doc(4, &doc).unwrap();
    assert_eq!(index.postings("cat"), vec![Posting { doc_id: 4, frequency: 2, positions: vec![1, 4] }]);
    assert_eq!(index.doc_metadata(4), Some(DocMetadata { length: 3, unique_tokens: 2 }));
}

#[test]
fn add_then_remove_restores_statistics() {
    for kind in KINDS {
        let dir = tempdir().unwrap();
        let mut index = worked_example(kind, dir.path());
        let before = index.statistics();

        index.add_doc(3, &tokens("cat zebra zebra")).unwrap();
        assert_eq!(index.statistics().number_of_documents, 3);
        index.remove_doc(3).unwrap();

        assert_eq!(index.statistics(), before, "{kind}");
        assert!(index.postings("zebra").is_empty(), "{kind}");
        assert!(index.postings("cat").iter().all(|p| p.doc_id != 3), "{kind}");
        assert_eq!(index.doc_metadata(3), None);
        assert!(!index.terms().contains(&"zebra".to_string()));
    }
}

#[test]
fn removing_unknown_doc_is_a_no_op() {
    for kind in KINDS {
        let dir = tempdir().unwrap();
        let mut index = worked_example(kind, dir.path());
        let before = index.statistics();
        index.remove_doc(42).unwrap();
        assert_eq!(index.statistics(), before);
    }
}

#[test]
fn document_frequency_never_exceeds_document_count() {
    let mut index = Index::create(IndexKind::Positional, "unused").unwrap();
    for doc_id in 0..20u32 {
        let text = (0..=doc_id % 5).map(|i| format!("t{i} t{i}")).collect::<Vec<_>>().join(" ");
        index.add_doc(doc_id, &tokens(&text)).unwrap();
    }
    index.remove_doc(3).unwrap();
    let n = index.statistics().number_of_documents as u32;
    for term in index.terms() {
        assert!(index.term_metadata(&term).document_frequency <= n);
    }
}

struct Snapshot {
    statistics: IndexStatistics,
    postings: Vec<(String, Vec<Posting>)>,
    metadata: Vec<(DocId, Option<DocMetadata>)>,
}

fn snapshot(index: &Index) -> Snapshot {
    Snapshot {
        statistics: index.statistics(),
        postings: index.terms().into_iter().map(|t| { let p = index.postings(&t); (t, p) }).collect(),
        metadata: index.doc_ids().into_iter().map(|d| (d, index.doc_metadata(d))).collect(),
    }
}

#[test]
fn save_then_load_round_trips() {
    for kind in KINDS {
        let dir = tempdir().unwrap();
        let before = {
            let mut index = worked_example(kind, dir.path());
            index.add_doc(7, &[Token::Filtered, "cat".into(), "owl".into()]).unwrap();
            index.add_doc(8, &tokens("owl owl moth")).unwrap();
            index.remove_doc(2).unwrap();
            index.save().unwrap();
            snapshot(&index)
        };

        let loaded = Index::load(dir.path()).unwrap();
        let after = snapshot(&loaded);
        assert_eq!(loaded.kind(), kind);
        assert_eq!(after.statistics, before.statistics, "{kind}");
        assert_eq!(after.postings, before.postings, "{kind}");
        assert_eq!(after.metadata, before.metadata, "{kind}");
    }
}

#[test]
fn loaded_index_accepts_further_mutation() {
    let dir = tempdir().unwrap();
    worked_example(IndexKind::OnDisk, dir.path()).save().unwrap();

    {
        let mut index = Index::load(dir.path()).unwrap();
        index.remove_doc(1).unwrap();
        index.add_doc(5, &tokens("apple pie")).unwrap();
        index.save().unwrap();
    }
    let index = Index::load(dir.path()).unwrap();
    assert_eq!(index.postings("apple"), vec![Posting::new(5, 1)]);
    assert_eq!(index.statistics().number_of_documents, 2);
}

#[test]
fn on_disk_index_loads_while_writer_is_alive() {
    let dir = tempdir().unwrap();
    let mut writer = worked_example(IndexKind::OnDisk, dir.path());
    writer.save().unwrap();

    let reader = Index::load(dir.path()).unwrap();
    assert_eq!(reader.statistics(), writer.statistics());
    drop(reader);

    writer.add_doc(3, &tokens("apple tart")).unwrap();
    writer.save().unwrap();
    assert_eq!(Index::load(dir.path()).unwrap().postings("apple").len(), 2);
}

#[test]
fn load_missing_location_fails() {
    let dir = tempdir().unwrap();
    let err = Index::load(dir.path().join("absent")).unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));
}

#[test]
fn load_corrupt_docs_fails() {
    let dir = tempdir().unwrap();
    worked_example(IndexKind::Inverted, dir.path()).save().unwrap();
    std::fs::write(IndexPaths::new(dir.path()).docs(), b"garbage").unwrap();
    assert!(matches!(Index::load(dir.path()), Err(Error::Persistence { .. })));
}

#[test]
fn load_rejects_vocabulary_drift() {
    let dir = tempdir().unwrap();
    worked_example(IndexKind::Positional, dir.path()).save().unwrap();
    let paths = IndexPaths::new(dir.path());
    save_bincode(&paths.vocabulary(), &vec!["apple".to_string()]).unwrap();
    assert!(matches!(Index::load(dir.path()), Err(Error::Persistence { .. })));
}

#[test]
fn load_rejects_header_statistics_drift() {
    let dir = tempdir().unwrap();
    worked_example(IndexKind::Inverted, dir.path()).save().unwrap();
    let path = IndexPaths::new(dir.path()).header();
    let mut header: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    header["statistics"]["number_of_documents"] = serde_json::json!(3);
    std::fs::write(&path, header.to_string()).unwrap();
    assert!(matches!(Index::load(dir.path()), Err(Error::Persistence { .. })));
}
