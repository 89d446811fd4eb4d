//! Command line argument parsing for the Libris CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Libris - content-based book recommendations over an IVF vector index
#[derive(Parser, Debug, Clone)]
#[command(name = "libris")]
#[command(about = "Content-based book recommendations over an IVF vector index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct LibrisArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// JSON configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", env = "LIBRIS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl LibrisArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }

    /// Default tracing filter for the effective verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Encode every catalog item into an embeddings file
    Embed(EmbedArgs),

    /// Build an IVF index from an embeddings file
    #[command(name = "build-index")]
    BuildIndex(BuildIndexArgs),

    /// Show the items most similar to one item
    Similar(SimilarArgs),

    /// Recommend items for a user from their favorites
    Recommend(RecommendArgs),
}

/// Arguments for embedding a catalog
#[derive(Parser, Debug, Clone)]
pub struct EmbedArgs {
    /// Catalog file (JSON Lines, one item per line)
    #[arg(value_name = "CATALOG_JSONL")]
    pub catalog: PathBuf,

    /// Embeddings file to create or update
    #[arg(value_name = "EMBEDDINGS_JSON")]
    pub embeddings: PathBuf,
}

/// Arguments for building an index
#[derive(Parser, Debug, Clone)]
pub struct BuildIndexArgs {
    /// Embeddings file produced by `embed`
    #[arg(value_name = "EMBEDDINGS_JSON")]
    pub embeddings: PathBuf,

    /// Index file to write
    #[arg(value_name = "INDEX_FILE")]
    pub index: PathBuf,

    /// Number of inverted lists (overrides the config)
    #[arg(long)]
    pub nlist: Option<usize>,

    /// Default lists searched per query (overrides the config)
    #[arg(long)]
    pub nprobe: Option<usize>,

    /// Distance metric: squared_euclidean, euclidean, cosine or dot_product
    #[arg(long)]
    pub metric: Option<String>,
}

/// Arguments for the similar-items view
#[derive(Parser, Debug, Clone)]
pub struct SimilarArgs {
    #[arg(value_name = "CATALOG_JSONL")]
    pub catalog: PathBuf,

    #[arg(value_name = "EMBEDDINGS_JSON")]
    pub embeddings: PathBuf,

    /// Work key of the item
    #[arg(value_name = "ITEM_ID")]
    pub item_id: String,

    /// Number of similar items to return
    #[arg(short, default_value = "10")]
    pub k: usize,

    /// Load this index instead of building one in memory
    #[arg(long, value_name = "INDEX_FILE")]
    pub index: Option<PathBuf>,
}

/// Arguments for recommendations
#[derive(Parser, Debug, Clone)]
pub struct RecommendArgs {
    #[arg(value_name = "CATALOG_JSONL")]
    pub catalog: PathBuf,

    #[arg(value_name = "EMBEDDINGS_JSON")]
    pub embeddings: PathBuf,

    /// User whose favorites seed the recommendations
    #[arg(value_name = "USER_ID")]
    pub user_id: String,

    /// Maximum number of recommendations (defaults to the config)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Load this index instead of building one in memory
    #[arg(long, value_name = "INDEX_FILE")]
    pub index: Option<PathBuf>,

    /// Seed for sampling (overrides the config)
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
