//! Command implementations for the Libris CLI.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::catalog::MemoryCatalog;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::LibrisConfig;
use crate::embedding::{HashingTextEmbedder, TextEmbedder};
use crate::error::{LibrisError, Result};
use crate::recommend::RecommendationService;
use crate::store::{EmbeddingStore, FileEmbeddingStore};
use crate::vector::DistanceMetric;
use crate::vector::index::IndexManager;

/// Execute a CLI command.
pub async fn execute_command(args: LibrisArgs) -> Result<()> {
    let config = load_config(&args)?;
    match &args.command {
        Command::Embed(embed_args) => embed(embed_args, config, &args).await,
        Command::BuildIndex(build_args) => build_index(build_args, config, &args).await,
        Command::Similar(similar_args) => similar(similar_args, config, &args).await,
        Command::Recommend(recommend_args) => recommend(recommend_args, config, &args).await,
    }
}

/// The config file named on the command line, or defaults.
pub fn load_config(args: &LibrisArgs) -> Result<LibrisConfig> {
    let config = match &args.config {
        Some(path) => LibrisConfig::from_json_file(path)?,
        None => LibrisConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn open_service(
    config: &LibrisConfig,
    catalog_path: &Path,
    embeddings_path: &Path,
) -> Result<(RecommendationService, usize)> {
    let catalog = Arc::new(MemoryCatalog::from_jsonl_file(catalog_path)?);
    let items = catalog.len();
    let store = Arc::new(FileEmbeddingStore::open(embeddings_path)?);
    let embedder: Arc<dyn TextEmbedder> =
        Arc::new(HashingTextEmbedder::new(config.encoder.text_dimension)?);

    let service = RecommendationService::from_config(config, catalog, store, embedder)?;
    Ok((service, items))
}

/// Publish an index for `similar`/`recommend`: load it if a file was given,
/// otherwise build one from the embeddings.
async fn ready_index(service: &RecommendationService, index: Option<&Path>) -> Result<()> {
    let stats = match index {
        Some(path) => service.load_index(path).await?,
        None => service.trigger_index_rebuild().await?,
    };
    info!(build_id = %stats.build_id, vectors = stats.vector_count, "index ready");
    Ok(())
}

async fn embed(args: &EmbedArgs, config: LibrisConfig, cli_args: &LibrisArgs) -> Result<()> {
    let start = Instant::now();
    let (service, catalog_items) = open_service(&config, &args.catalog, &args.embeddings)?;
    let report = service.trigger_embedding_all().await?;

    output_result(
        &EmbedSummary {
            embeddings_path: args.embeddings.display().to_string(),
            catalog_items,
            embedded: report.embedded,
            failures: report.failures,
            duration_ms: start.elapsed().as_millis() as u64,
        },
        cli_args,
    )
}

async fn build_index(
    args: &BuildIndexArgs,
    mut config: LibrisConfig,
    cli_args: &LibrisArgs,
) -> Result<()> {
    if let Some(nlist) = args.nlist {
        config.index.nlist = nlist;
    }
    if let Some(nprobe) = args.nprobe {
        config.index.nprobe = nprobe;
    }
    if let Some(metric) = &args.metric {
        config.index.metric = DistanceMetric::parse_str(metric)?;
    }
    config.validate()?;

    let store = FileEmbeddingStore::open(&args.embeddings)?;
    let embeddings = store.all().await?;

    let start = Instant::now();
    let manager = Arc::new(IndexManager::new(config.resolved_index_config())?);
    let builder = manager.clone();
    let snapshot = tokio::task::spawn_blocking(move || builder.build(embeddings))
        .await
        .map_err(|e| LibrisError::other(format!("index build task failed: {e}")))??;
    let duration_ms = start.elapsed().as_millis() as u64;

    manager.save(&args.index)?;

    output_result(
        &IndexBuildSummary {
            index_path: args.index.display().to_string(),
            stats: snapshot.stats(),
            duration_ms,
        },
        cli_args,
    )
}

async fn similar(args: &SimilarArgs, config: LibrisConfig, cli_args: &LibrisArgs) -> Result<()> {
    let (service, _) = open_service(&config, &args.catalog, &args.embeddings)?;
    ready_index(&service, args.index.as_deref()).await?;

    let items = service.similar_items(&args.item_id, args.k).await?;
    output_result(
        &SimilarResults {
            item_id: args.item_id.clone(),
            items,
        },
        cli_args,
    )
}

async fn recommend(
    args: &RecommendArgs,
    mut config: LibrisConfig,
    cli_args: &LibrisArgs,
) -> Result<()> {
    if let Some(seed) = args.seed {
        config.aggregator.seed = Some(seed);
    }
    let (service, _) = open_service(&config, &args.catalog, &args.embeddings)?;

    if service.catalog().get_favorites(&args.user_id).await?.is_empty() {
        info!(user_id = %args.user_id, "user has no favorites");
    }
    // With nothing embedded yet there is no index; the user simply gets no
    // recommendations.
    match ready_index(&service, args.index.as_deref()).await {
        Err(LibrisError::EmptyTrainingSet) => {
            warn!(embeddings = %args.embeddings.display(), "no embeddings to index")
        }
        other => other?,
    }

    let items = service.get_recommendations(&args.user_id, args.limit).await?;
    output_result(
        &RecommendationResults {
            user_id: args.user_id.clone(),
            items,
        },
        cli_args,
    )
}
