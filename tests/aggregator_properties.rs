use std::collections::HashSet;

use futures::executor::block_on;
use proptest::prelude::*;

use libris::recommend::{AggregatorConfig, RecommendationAggregator, SelectionPolicy};
use libris::store::MemoryEmbeddingStore;
use libris::vector::Vector;
use libris::vector::index::{IndexManager, IvfBuildConfig};

fn points() -> impl Strategy<Value = Vec<(f32, f32)>> {
    prop::collection::vec((-50.0f32..50.0, -50.0f32..50.0), 2..40)
}

fn setup(points: &[(f32, f32)], nlist: usize) -> (IndexManager, MemoryEmbeddingStore) {
    let embeddings: Vec<(String, Vector)> = points
        .iter()
        .enumerate()
        .map(|(i, (x, y))| (format!("OL{i}W"), Vector::new(vec![*x, *y])))
        .collect();
    let manager = IndexManager::new(IvfBuildConfig::default().with_ivf_params(nlist, nlist))
        .expect("valid config");
    manager.build(embeddings.clone()).expect("non-empty build");
    (manager, MemoryEmbeddingStore::from_embeddings(embeddings))
}

fn pick_favorites(n: usize, picks: &[usize]) -> HashSet<String> {
    picks.iter().map(|p| format!("OL{}W", p % n)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn recommendations_are_bounded_unique_and_exclude_favorites(
        points in points(),
        picks in prop::collection::vec(0usize..1000, 0..6),
        nlist in 1usize..6,
        per_item_k in 0usize..12,
        limit in 0usize..12,
        seed in any::<u64>(),
        ranked in any::<bool>(),
    ) {
        let (manager, store) = setup(&points, nlist);
        let favorites = pick_favorites(points.len(), &picks);
        let policy = if ranked { SelectionPolicy::Ranked } else { SelectionPolicy::RandomSample };
        let aggregator = RecommendationAggregator::new(
            AggregatorConfig::default().with_seed(seed).with_policy(policy),
        ).unwrap();

        let recs = block_on(aggregator.recommend(&manager, &store, &favorites, per_item_k, limit))
            .unwrap();

        prop_assert!(recs.len() <= limit);
        let unique: HashSet<&String> = recs.iter().collect();
        prop_assert_eq!(unique.len(), recs.len());
        for id in &recs {
            prop_assert!(!favorites.contains(id));
            prop_assert!(id.starts_with("OL"));
        }
        if favorites.is_empty() || per_item_k == 0 || limit == 0 {
            prop_assert!(recs.is_empty());
        }
    }

    #[test]
    fn fixed_seed_gives_identical_samples(
        points in points(),
        picks in prop::collection::vec(0usize..1000, 1..6),
        limit in 1usize..6,
        seed in any::<u64>(),
    ) {
        let (manager, store) = setup(&points, 2);
        let favorites = pick_favorites(points.len(), &picks);

        let run = || {
            let aggregator =
                RecommendationAggregator::new(AggregatorConfig::default().with_seed(seed)).unwrap();
            block_on(aggregator.recommend(&manager, &store, &favorites, 8, limit)).unwrap()
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn single_favorite_never_recommends_itself(
        points in points(),
        pick in 0usize..1000,
        per_item_k in 1usize..12,
    ) {
        let (manager, store) = setup(&points, 1);
        let favorites = pick_favorites(points.len(), &[pick]);
        let aggregator =
            RecommendationAggregator::new(AggregatorConfig::default().with_seed(3)).unwrap();

        let recs = block_on(aggregator.recommend(&manager, &store, &favorites, per_item_k, 100))
            .unwrap();
        // One list, full scan: every other item up to per_item_k - 1 comes back,
        // unless a duplicate point displaced the favorite from its own results.
        prop_assert!(recs.len() <= per_item_k);
        prop_assert!(recs.len() >= per_item_k.min(points.len()).saturating_sub(1));
        for id in &recs {
            prop_assert!(!favorites.contains(id));
        }
    }
}
