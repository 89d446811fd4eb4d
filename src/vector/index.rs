//! IVF vector index: building, searching, persistence and snapshot publication.
//!
//! - `config`: build parameters (`nlist`, `nprobe`, k-means settings)
//! - `ivf`: the immutable [`IvfIndex`] snapshot, its builder and searcher
//! - `io`: on-disk layout for faster restarts
//! - `manager`: [`IndexManager`], the atomically swappable current snapshot

pub mod config;
pub mod io;
pub mod ivf;
pub mod manager;

pub use self::config::IvfBuildConfig;
pub use self::ivf::builder::IvfIndexBuilder;
pub use self::ivf::searcher::{SearchHit, SearchParams};
pub use self::ivf::snapshot::{IndexStats, IvfIndex};
pub use self::manager::IndexManager;
