use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use libris::catalog::{Item, ItemCatalog, MemoryCatalog};
use libris::config::LibrisConfig;
use libris::embedding::HashingTextEmbedder;
use libris::error::{LibrisError, Result};
use libris::recommend::{
    AggregatorConfig, RecommendationAggregator, RecommendationService, SelectionPolicy,
};
use libris::store::{EmbeddingStore, FileEmbeddingStore, MemoryEmbeddingStore};
use libris::vector::Vector;
use libris::vector::index::{IndexManager, IvfBuildConfig, SearchParams};

fn abc_embeddings() -> Vec<(String, Vector)> {
    vec![
        ("A".to_string(), Vector::new(vec![0.0, 0.0])),
        ("B".to_string(), Vector::new(vec![0.0, 1.0])),
        ("C".to_string(), Vector::new(vec![10.0, 10.0])),
    ]
}

fn single_list_manager() -> Result<IndexManager> {
    IndexManager::new(IvfBuildConfig::default().with_ivf_params(1, 1))
}

fn favorites(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn nearest_neighbours_of_a_exclude_a_and_rank_b_before_c() -> Result<()> {
    let manager = single_list_manager()?;
    manager.build(abc_embeddings())?;

    let hits = manager.search(&Vector::new(vec![0.0, 0.0]), &SearchParams::new(3))?;
    let others: Vec<&str> = hits
        .iter()
        .map(|hit| hit.item_id.as_str())
        .filter(|id| *id != "A")
        .take(2)
        .collect();
    assert_eq!(others, vec!["B", "C"]);
    Ok(())
}

#[tokio::test]
async fn favoriting_a_recommends_b_and_c() -> Result<()> {
    let manager = single_list_manager()?;
    manager.build(abc_embeddings())?;
    let store = MemoryEmbeddingStore::from_embeddings(abc_embeddings());

    let sampled = RecommendationAggregator::new(AggregatorConfig::default().with_seed(5))?;
    let all = sampled
        .recommend(&manager, &store, &favorites(&["A"]), 3, 10)
        .await?;
    assert_eq!(all, vec!["B", "C"]);

    let ranked = RecommendationAggregator::new(
        AggregatorConfig::default().with_policy(SelectionPolicy::Ranked),
    )?;
    let closest = ranked
        .recommend(&manager, &store, &favorites(&["A"]), 3, 1)
        .await?;
    assert_eq!(closest, vec!["B"]);
    Ok(())
}

#[test]
fn empty_rebuild_fails_and_previous_snapshot_stays_queryable() -> Result<()> {
    let manager = single_list_manager()?;
    let first = manager.build(abc_embeddings())?;

    let err = manager.build(Vec::new()).unwrap_err();
    assert!(matches!(err, LibrisError::EmptyTrainingSet));

    assert_eq!(manager.snapshot()?.build_id(), first.build_id());
    let hits = manager.search(&Vector::new(vec![10.0, 10.0]), &SearchParams::new(1))?;
    assert_eq!(hits[0].item_id, "C");
    Ok(())
}

#[tokio::test]
async fn favoriting_only_an_unembedded_item_yields_nothing() -> Result<()> {
    let manager = single_list_manager()?;
    manager.build(abc_embeddings())?;
    let store = MemoryEmbeddingStore::from_embeddings(abc_embeddings());

    let aggregator = RecommendationAggregator::new(AggregatorConfig::default().with_seed(1))?;
    let recs = aggregator
        .recommend(&manager, &store, &favorites(&["D"]), 3, 10)
        .await?;
    assert!(recs.is_empty());
    Ok(())
}

fn library() -> MemoryCatalog {
    let catalog = MemoryCatalog::new();
    let books = [
        ("OL1W", "Dune", "Frank Herbert", "Science fiction", 1965),
        ("OL2W", "Dune Messiah", "Frank Herbert", "Science fiction", 1969),
        ("OL3W", "Children of Dune", "Frank Herbert", "Science fiction", 1976),
        ("OL4W", "Pride and Prejudice", "Jane Austen", "Romance", 1813),
        ("OL5W", "Emma", "Jane Austen", "Romance", 1815),
        ("OL6W", "Persuasion", "Jane Austen", "Romance", 1817),
        ("OL7W", "Foundation", "Isaac Asimov", "Science fiction", 1951),
        ("OL8W", "I, Robot", "Isaac Asimov", "Science fiction", 1950),
    ];
    for (key, title, author, subject, year) in books {
        catalog.add_item(
            Item::new(key, title)
                .with_authors([author])
                .with_subjects([subject])
                .with_publish_year(year),
        );
    }
    catalog.add_favorite("alice", "OL1W");
    catalog.add_favorite("alice", "OL4W");
    catalog
}

fn test_config() -> LibrisConfig {
    let mut config = LibrisConfig::default();
    config.encoder.text_dimension = 64;
    config.index = IvfBuildConfig::default().with_ivf_params(3, 3);
    config.aggregator = AggregatorConfig {
        per_item_k: 4,
        default_limit: 3,
        ..AggregatorConfig::default()
    }
    .with_seed(17);
    config
}

fn service_over(store: Arc<dyn EmbeddingStore>) -> Result<RecommendationService> {
    RecommendationService::from_config(
        &test_config(),
        Arc::new(library()),
        store,
        Arc::new(HashingTextEmbedder::new(64)?),
    )
}

#[tokio::test]
async fn service_recommends_unfavorited_books_within_limit() -> Result<()> {
    let service = service_over(Arc::new(MemoryEmbeddingStore::new()))?;
    let report = service.trigger_embedding_all().await?;
    assert_eq!(report.embedded, 8);
    service.trigger_index_rebuild().await?;

    let recs = service.get_recommendations("alice", None).await?;
    assert!(!recs.is_empty());
    assert!(recs.len() <= 3);
    for rec in &recs {
        assert!(rec.work_key != "OL1W" && rec.work_key != "OL4W");
    }

    let unique: HashSet<&str> = recs.iter().map(|r| r.work_key.as_str()).collect();
    assert_eq!(unique.len(), recs.len());
    Ok(())
}

#[tokio::test]
async fn same_seed_gives_same_recommendations_across_services() -> Result<()> {
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let service = service_over(Arc::new(MemoryEmbeddingStore::new()))?;
        service.trigger_embedding_all().await?;
        service.trigger_index_rebuild().await?;
        outputs.push(service.get_recommendations("alice", Some(2)).await?);
    }
    assert_eq!(outputs[0], outputs[1]);
    Ok(())
}

#[tokio::test]
async fn saved_index_serves_a_restarted_service() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let embeddings_path = dir.path().join("embeddings.json");
    let index_path = dir.path().join("books.lbix");

    let before = {
        let service = service_over(Arc::new(FileEmbeddingStore::open(&embeddings_path)?))?;
        service.trigger_embedding_all().await?;
        service.trigger_index_rebuild().await?;
        service.save_index(&index_path).await?;
        service.similar_items("OL7W", 3).await?
    };

    let restarted = service_over(Arc::new(FileEmbeddingStore::open(&embeddings_path)?))?;
    assert_eq!(restarted.store().len().await?, 8);
    assert!(!restarted.is_index_ready());

    let stats = restarted.load_index(&index_path).await?;
    assert_eq!(stats.vector_count, 8);
    assert!(restarted.is_index_ready());
    assert_eq!(restarted.similar_items("OL7W", 3).await?, before);
    Ok(())
}

#[tokio::test]
async fn corrupted_index_file_is_rejected_and_nothing_is_published() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let index_path = dir.path().join("books.lbix");

    let service = service_over(Arc::new(MemoryEmbeddingStore::new()))?;
    service.trigger_embedding_all().await?;
    service.trigger_index_rebuild().await?;
    service.save_index(&index_path).await?;

    let mut bytes = std::fs::read(&index_path)?;
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0x55;
    std::fs::write(&index_path, bytes)?;

    let fresh = service_over(Arc::new(MemoryEmbeddingStore::new()))?;
    let err = fresh.load_index(&index_path).await.unwrap_err();
    assert!(matches!(err, LibrisError::CorruptIndex(_)));
    assert!(!fresh.is_index_ready());
    Ok(())
}

#[tokio::test]
async fn catalog_loaded_from_json_lines_drives_recommendations() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"{{"work_key": "OL1W", "title": "Dune", "authors": ["Frank Herbert"], "first_publish_year": 1965, "favorited_by": ["bob"]}}"#
    )?;
    writeln!(file)?;
    writeln!(
        file,
        r#"{{"work_key": "OL2W", "title": "Dune Messiah", "authors": ["Frank Herbert"], "first_publish_year": 1969}}"#
    )?;

    let catalog = Arc::new(MemoryCatalog::from_jsonl_file(file.path())?);
    assert_eq!(catalog.item_ids().await?, vec!["OL1W", "OL2W"]);

    let service = RecommendationService::from_config(
        &test_config(),
        catalog,
        Arc::new(MemoryEmbeddingStore::new()),
        Arc::new(HashingTextEmbedder::new(64)?),
    )?;
    service.trigger_embedding_all().await?;
    service.trigger_index_rebuild().await?;

    let recs = service.get_recommendations("bob", Some(5)).await?;
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].work_key, "OL2W");
    assert_eq!(recs[0].first_publish_year, Some(1969));
    Ok(())
}
