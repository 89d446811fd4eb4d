//! Embedding store persisted to a JSON file.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LibrisError, Result};
use crate::store::EmbeddingStore;
use crate::vector::Vector;

const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct EmbeddingFile {
    version: u32,
    embeddings: BTreeMap<String, Vec<f32>>,
}

/// Embeddings kept in memory and written to a JSON file on [`flush`].
///
/// The file is replaced atomically: it is written to `<path>.tmp` and renamed
/// over the previous version, so a crash mid-flush leaves the last complete
/// file in place.
///
/// [`flush`]: EmbeddingStore::flush
#[derive(Debug)]
pub struct FileEmbeddingStore {
    path: PathBuf,
    embeddings: RwLock<BTreeMap<String, Vector>>,
    dirty: AtomicBool,
    flush_lock: Mutex<()>,
}

impl FileEmbeddingStore {
    /// Open the store at `path`, loading it if the file exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let embeddings = if path.exists() {
            let file: EmbeddingFile = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
            if file.version != FILE_FORMAT_VERSION {
                return Err(LibrisError::invalid_argument(format!(
                    "unsupported embedding file version {}",
                    file.version
                )));
            }
            file.embeddings
                .into_iter()
                .map(|(id, data)| (id, Vector::new(data)))
                .collect()
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), embeddings = embeddings.len(), "opened embedding store");

        Ok(Self {
            path,
            embeddings: RwLock::new(embeddings),
            dirty: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self) -> Result<()> {
        let _guard = self.flush_lock.lock();
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let contents = EmbeddingFile {
            version: FILE_FORMAT_VERSION,
            embeddings: self
                .embeddings
                .read()
                .iter()
                .map(|(id, v)| (id.clone(), v.data.clone()))
                .collect(),
        };

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let result = (|| -> Result<()> {
            let mut writer = BufWriter::new(File::create(&temp)?);
            serde_json::to_writer(&mut writer, &contents)?;
            writer.flush()?;
            writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
            fs::rename(&temp, &self.path)?;
            Ok(())
        })();

        if result.is_err() {
            self.dirty.store(true, Ordering::Release);
        } else {
            debug!(path = %self.path.display(), embeddings = contents.embeddings.len(), "flushed embedding store");
        }
        result
    }
}

#[async_trait]
impl EmbeddingStore for FileEmbeddingStore {
    async fn get(&self, item_id: &str) -> Result<Option<Vector>> {
        Ok(self.embeddings.read().get(item_id).cloned())
    }

    async fn upsert(&self, item_id: &str, vector: Vector) -> Result<()> {
        self.embeddings.write().insert(item_id.to_string(), vector);
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(String, Vector)>> {
        Ok(self
            .embeddings
            .read()
            .iter()
            .map(|(id, v)| (id.clone(), v.clone()))
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.embeddings.read().len())
    }

    async fn flush(&self) -> Result<()> {
        self.write_file()
    }
}
