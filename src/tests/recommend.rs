//! Recommender flow: validation, ranking scenario, metadata fallbacks.

use std::sync::Arc;

use crate::recommend::{RecommendError, Recommender};
use crate::store::{StoreError, VectorStore};
use crate::tests::fakes::{job, FakeEmbedder};

fn recommender_at(dir: &tempfile::TempDir) -> Recommender {
    Recommender::new(VectorStore::new(
        dir.path().join("jobs.vec"),
        Arc::new(FakeEmbedder),
    ))
}

#[test]
fn test_empty_query_is_invalid_input_for_any_k() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    for k in [1, 5, 100] {
        assert!(matches!(
            rec.recommend("", k),
            Err(RecommendError::InvalidInput(_))
        ));
        assert!(matches!(
            rec.recommend("   \t ", k),
            Err(RecommendError::InvalidInput(_))
        ));
    }
}

#[test]
fn test_zero_top_k_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    assert!(matches!(
        rec.recommend("rust", 0),
        Err(RecommendError::InvalidInput(_))
    ));
}

#[test]
fn test_recommend_before_ingest_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    assert!(matches!(
        rec.recommend("rust", 5),
        Err(RecommendError::Store(StoreError::NotFound { .. }))
    ));
}

#[test]
fn test_ingest_rejects_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    assert!(matches!(rec.ingest(&[]), Err(RecommendError::Schema(_))));
}

#[test]
fn test_ingest_rejects_missing_description_citing_field() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    let jobs = vec![job("A", "Acme", "", "", "s")];
    match rec.ingest(&jobs) {
        Err(RecommendError::Schema(message)) => {
            assert!(message.contains("description"), "message: {message}");
        }
        other => panic!("expected Schema error, got {other:?}"),
    }
}

#[test]
fn test_backend_engineer_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    rec.ingest(&[
        job(
            "Backend Engineer",
            "Acme",
            "",
            "Python, distributed systems, Kubernetes",
            "s",
        ),
        job("Frontend Developer", "Acme", "", "React, CSS, UI design", "s"),
    ])
    .unwrap();

    let results = rec.recommend("I know Python and Kubernetes", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Backend Engineer");
}

#[test]
fn test_recommend_maps_metadata_with_unknown_fallbacks() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    // Storable via ingest even though title/company are blank: the storage
    // precondition is only the description. Older snapshots may hold such
    // rows, and display must degrade to "Unknown" rather than empty cells.
    let mut blank = job("x", "x", "", "niche embedded firmware role", "s");
    blank.title = String::new();
    blank.company = String::new();
    blank.location = String::new();
    rec.ingest(&[blank]).unwrap();

    let results = rec.recommend("embedded firmware", 1).unwrap();
    assert_eq!(results[0].title, "Unknown");
    assert_eq!(results[0].company, "Unknown");
    assert_eq!(results[0].location, "Unknown");
    assert_eq!(results[0].description, "niche embedded firmware role");
}

#[test]
fn test_recommendations_carry_scores_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let rec = recommender_at(&dir);

    rec.ingest(&[
        job("A", "Acme", "", "rust tokio async networking", "s"),
        job("B", "Acme", "", "rust cli tooling", "s"),
        job("C", "Acme", "", "php wordpress themes", "s"),
    ])
    .unwrap();

    let results = rec.recommend("rust async networking", 3).unwrap();
    assert_eq!(results.len(), 3);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert_eq!(results[0].title, "A");
}
