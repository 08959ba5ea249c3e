//! Integration tests for the full tally pipeline over a real directory
//!
//! Each test builds a fixture directory with tempfile and runs `WordTally`
//! against it through the public API.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wordtally::config::{CountingStrategy, FailurePolicy};
use wordtally::corpus::{list_documents, DocumentSource};
use wordtally::tally::{OutputFormat, ReportFormatter};
use wordtally::{TallyConfig, TallyError, WordTally};

/// Helper to create a works directory from (name, content) pairs
fn create_works(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn config_for(dir: &Path) -> TallyConfig {
    TallyConfig {
        works_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_two_documents_end_to_end() {
    let works = create_works(&[("a.txt", "the cat the dog"), ("b.txt", "the fish")]);

    let outcome = WordTally::new(config_for(works.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    let table = &outcome.table;
    assert_eq!(table.count("the"), 3);
    assert_eq!(table.count("cat"), 1);
    assert_eq!(table.count("dog"), 1);
    assert_eq!(table.count("fish"), 1);
    assert_eq!(table.len(), 4);

    let most = table.most_common();
    assert_eq!(most.word, b"the");
    assert_eq!(most.count, 3);
    assert_eq!(outcome.report.documents, 2);
    assert!(!outcome.report.has_failures());
}

#[tokio::test]
async fn test_unreadable_entry_is_reported_not_fatal() {
    // A subdirectory is listed as a document but cannot be read as one
    let works = create_works(&[
        ("a.txt", "one two two"),
        ("b.txt", "two three"),
        ("sub/inner.txt", "ignored"),
    ]);

    let outcome = WordTally::new(config_for(works.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.documents, 3);
    assert_eq!(outcome.report.failed, 1);
    assert!(outcome.report.failures[0].contains("sub"));
    assert_eq!(outcome.table.count("two"), 3);
    assert_eq!(outcome.table.count("ignored"), 0);
}

#[tokio::test]
async fn test_discard_policy_over_directory() {
    let works = create_works(&[("a.txt", "x y"), ("sub/inner.txt", "z")]);
    let mut config = config_for(works.path());
    config.failure_policy = FailurePolicy::DiscardOnFailure;

    let outcome = WordTally::new(config).unwrap().run().await.unwrap();
    assert!(outcome.table.is_empty());
    assert_eq!(outcome.report.failed, 1);
}

#[tokio::test]
async fn test_recursive_listing_counts_nested_files() {
    let works = create_works(&[("a.txt", "x y"), ("sub/inner.txt", "x z")]);
    let mut config = config_for(works.path());
    config.recursive = true;

    let outcome = WordTally::new(config).unwrap().run().await.unwrap();
    assert_eq!(outcome.report.failed, 0);
    assert_eq!(outcome.table.count("x"), 2);
    assert_eq!(outcome.table.len(), 3);
}

#[tokio::test]
async fn test_missing_directory_is_fatal() {
    let works = TempDir::new().unwrap();
    let err = WordTally::new(config_for(&works.path().join("works")))
        .unwrap()
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::DirectoryListing { .. }));
}

#[tokio::test]
async fn test_empty_directory() {
    let works = TempDir::new().unwrap();
    let outcome = WordTally::new(config_for(works.path()))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.report.documents, 0);
    assert!(outcome.table.is_empty());
    assert_eq!(outcome.report.most_common.count, -1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_settings_agree() {
    let mut files = Vec::new();
    for i in 0..12 {
        let body = format!("{} tail{}\n", "Call me Ishmael. ".repeat(100 + i), i % 4);
        files.push((format!("work-{i:02}.txt"), body));
    }
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(n, b)| (n.as_str(), b.as_str()))
        .collect();
    let works = create_works(&refs);

    let mut baseline = None;
    for max_parallel in [1, 3, 8] {
        for strategy in [CountingStrategy::Locked, CountingStrategy::Partitioned] {
            let mut config = config_for(works.path());
            config.max_parallel = max_parallel;
            config.counter.strategy = strategy;
            config.counter.batch_size = 32;

            let table = WordTally::new(config).unwrap().run().await.unwrap().table;
            match &baseline {
                None => baseline = Some(table),
                Some(expected) => assert_eq!(&table, expected),
            }
        }
    }

    let table = baseline.unwrap();
    let expected: u64 = (0..12).map(|i| 100 + i as u64).sum();
    assert_eq!(table.count("Ishmael."), expected);
    assert_eq!(table.count("tail0"), 3);
}

#[tokio::test]
async fn test_json_report_round_trips_through_serde_json() {
    let works = create_works(&[("a.txt", "the cat the dog"), ("b.txt", "the fish")]);
    let mut config = config_for(works.path());
    config.top = 2;

    let outcome = WordTally::new(config).unwrap().run().await.unwrap();
    let json = ReportFormatter::new(OutputFormat::Json)
        .format(&outcome.report)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["documents"], 2);
    assert_eq!(value["unique_words"], 4);
    assert_eq!(value["most_common"]["word"], "the");
    assert_eq!(value["top"].as_array().unwrap().len(), 2);
    assert_eq!(value["top"][0]["count"], 3);
}

#[tokio::test]
async fn test_listing_ids_are_relative_names() {
    let works = create_works(&[("b.txt", ""), ("a.txt", "")]);
    let docs = list_documents(works.path(), false).await.unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
    assert_eq!(ids, vec!["a.txt", "b.txt"]);
}
