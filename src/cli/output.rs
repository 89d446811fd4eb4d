//! Output formatting for CLI commands.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::catalog::ItemSummary;
use crate::cli::args::{LibrisArgs, OutputFormat};
use crate::error::Result;
use crate::recommend::{EmbeddingFailure, SimilarItem};
use crate::vector::index::IndexStats;

/// Result of the `embed` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedSummary {
    pub embeddings_path: String,
    pub catalog_items: usize,
    pub embedded: usize,
    pub failures: Vec<EmbeddingFailure>,
    pub duration_ms: u64,
}

/// Result of the `build-index` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexBuildSummary {
    pub index_path: String,
    pub stats: IndexStats,
    pub duration_ms: u64,
}

/// Result of the `similar` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct SimilarResults {
    pub item_id: String,
    pub items: Vec<SimilarItem>,
}

/// Result of the `recommend` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResults {
    pub user_id: String,
    pub items: Vec<ItemSummary>,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl HumanOutput for EmbedSummary {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(
            out,
            "Embedded {} of {} items into {} ({} ms)",
            self.embedded, self.catalog_items, self.embeddings_path, self.duration_ms
        )?;
        for failure in &self.failures {
            writeln!(out, "  failed {}: {}", failure.item_id, failure.error)?;
        }
        Ok(())
    }
}

impl HumanOutput for IndexBuildSummary {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        let stats = &self.stats;
        writeln!(out, "Index written to {}", self.index_path)?;
        writeln!(out, "  build id:     {}", stats.build_id)?;
        writeln!(out, "  built at:     {}", stats.built_at.to_rfc3339())?;
        writeln!(out, "  vectors:      {}", stats.vector_count)?;
        writeln!(out, "  dimension:    {}", stats.dimension)?;
        writeln!(out, "  metric:       {}", stats.metric.name())?;
        writeln!(
            out,
            "  lists:        {} (nprobe {}, largest {}, empty {})",
            stats.nlist, stats.default_nprobe, stats.largest_list, stats.empty_lists
        )?;
        writeln!(out, "  build time:   {} ms", self.duration_ms)
    }
}

impl HumanOutput for SimilarResults {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.items.is_empty() {
            return writeln!(out, "No items similar to {}", self.item_id);
        }
        writeln!(out, "Items similar to {}:", self.item_id)?;
        for (i, similar) in self.items.iter().enumerate() {
            writeln!(
                out,
                "{:>3}. {}  (distance {:.4})",
                i + 1,
                format_summary(&similar.item),
                similar.distance
            )?;
        }
        Ok(())
    }
}

impl HumanOutput for RecommendationResults {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.items.is_empty() {
            return writeln!(out, "No recommendations for {}", self.user_id);
        }
        writeln!(out, "Recommendations for {}:", self.user_id)?;
        for (i, item) in self.items.iter().enumerate() {
            writeln!(out, "{:>3}. {}", i + 1, format_summary(item))?;
        }
        Ok(())
    }
}

/// Output a result to stdout in the selected format.
pub fn output_result<T>(result: &T, args: &LibrisArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, result, args.output_format, args.pretty)
}

pub fn write_result<T>(out: &mut dyn Write, result: &T, format: OutputFormat, pretty: bool) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match format {
        OutputFormat::Human => result.write_human(out)?,
        OutputFormat::Json => {
            if pretty {
                serde_json::to_writer_pretty(&mut *out, result)?;
            } else {
                serde_json::to_writer(&mut *out, result)?;
            }
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn format_summary(item: &ItemSummary) -> String {
    let mut line = format!("{} [{}]", item.title, item.work_key);
    if !item.authors.is_empty() {
        line.push_str(&format!(" by {}", item.authors.join(", ")));
    }
    if let Some(year) = item.first_publish_year {
        line.push_str(&format!(" ({year})"));
    }
    line
}
