//! On-disk layout for IVF snapshots.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "LBIX"
//! 4       4     format version (u32, little endian)
//! 8       4     CRC32 of the payload (u32, little endian)
//! 12      8     payload length in bytes (u64, little endian)
//! 20      n     payload: bincode-encoded IvfIndex
//! ```
//!
//! The payload carries the centroids, inverted lists, ordinal → item id map,
//! the vectors themselves and the build metadata. Files are written to a
//! temporary sibling and renamed into place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::error::{LibrisError, Result};
use crate::vector::index::ivf::snapshot::IvfIndex;

pub const INDEX_MAGIC: &[u8; 4] = b"LBIX";
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Serialize a snapshot into `writer`.
pub fn write_index<W: Write>(index: &IvfIndex, mut writer: W) -> Result<()> {
    let payload = bincode::serialize(index)?;

    writer.write_all(INDEX_MAGIC)?;
    writer.write_u32::<LittleEndian>(INDEX_FORMAT_VERSION)?;
    writer.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
    writer.write_u64::<LittleEndian>(payload.len() as u64)?;
    writer.write_all(&payload)?;
    writer.flush()?;
    Ok(())
}

fn truncated_header(e: std::io::Error) -> LibrisError {
    LibrisError::corrupt_index(format!("truncated header: {e}"))
}

/// Deserialize and validate a snapshot from `reader`.
pub fn read_index<R: Read>(mut reader: R) -> Result<IvfIndex> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(truncated_header)?;
    if &magic != INDEX_MAGIC {
        return Err(LibrisError::corrupt_index("bad magic"));
    }

    let version = reader.read_u32::<LittleEndian>().map_err(truncated_header)?;
    if version != INDEX_FORMAT_VERSION {
        return Err(LibrisError::corrupt_index(format!(
            "unsupported format version {version}"
        )));
    }
    let checksum = reader.read_u32::<LittleEndian>().map_err(truncated_header)?;
    let len = reader.read_u64::<LittleEndian>().map_err(truncated_header)?;

    let mut payload = Vec::new();
    reader.take(len).read_to_end(&mut payload)?;
    if payload.len() as u64 != len {
        return Err(LibrisError::corrupt_index(format!(
            "payload truncated: expected {len} bytes, found {}",
            payload.len()
        )));
    }
    if crc32fast::hash(&payload) != checksum {
        return Err(LibrisError::corrupt_index("checksum mismatch"));
    }

    let index: IvfIndex = bincode::deserialize(&payload)
        .map_err(|e| LibrisError::corrupt_index(format!("undecodable payload: {e}")))?;
    index.check_consistency().map_err(LibrisError::corrupt_index)?;
    Ok(index)
}

/// Write a snapshot to `path`, replacing any existing file.
pub fn save_index(index: &IvfIndex, path: &Path) -> Result<()> {
    let temp = temp_path(path);
    {
        let file = File::create(&temp)?;
        let mut writer = BufWriter::new(file);
        write_index(index, &mut writer)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    }
    fs::rename(&temp, path)?;

    debug!(
        path = %path.display(),
        bytes = fs::metadata(path)?.len(),
        "saved index snapshot"
    );
    Ok(())
}

/// Read a snapshot from `path`.
pub fn load_index(path: &Path) -> Result<IvfIndex> {
    let file = File::open(path)?;
    read_index(BufReader::new(file))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector;
    use crate::vector::index::config::IvfBuildConfig;
    use crate::vector::index::ivf::builder::IvfIndexBuilder;
    use crate::vector::index::ivf::searcher::SearchParams;

    const HEADER_LEN: u64 = 20;

    fn sample_index() -> IvfIndex {
        let vectors = (0..12)
            .map(|i| {
                (
                    format!("OL{i}W"),
                    Vector::new(vec![i as f32, (i % 3) as f32, 0.5]),
                )
            })
            .collect();
        IvfIndexBuilder::new(IvfBuildConfig::default().with_ivf_params(3, 2))
            .unwrap()
            .build(vectors)
            .unwrap()
    }

    #[test]
    fn test_file_roundtrip_preserves_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.lbix");
        let index = sample_index();

        save_index(&index, &path).unwrap();
        let loaded = load_index(&path).unwrap();

        assert_eq!(loaded.build_id(), index.build_id());
        assert_eq!(loaded.stats(), index.stats());
        let query = Vector::new(vec![4.2, 1.0, 0.5]);
        assert_eq!(
            loaded.search(&query, &SearchParams::new(5)).unwrap(),
            index.search(&query, &SearchParams::new(5)).unwrap()
        );
        assert!(!dir.path().join("books.lbix.tmp").exists());
    }

    #[test]
    fn test_rejects_truncated_header() {
        for bytes in [&b"LBIX\x01\x00"[..], &b"LBIX\x01\x00\x00\x00\x07"[..]] {
            let err = read_index(bytes).unwrap_err();
            assert!(matches!(err, LibrisError::CorruptIndex(_)));
        }
    }

    #[test]
    fn test_rejects_bad_magic() {
        let err = read_index(&b"NOPE\x01\x00\x00\x00"[..]).unwrap_err();
        assert!(matches!(err, LibrisError::CorruptIndex(_)));
    }

    #[test]
    fn test_rejects_flipped_payload_byte() {
        let mut bytes = Vec::new();
        write_index(&sample_index(), &mut bytes).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;

        let err = read_index(&bytes[..]).unwrap_err();
        assert!(matches!(err, LibrisError::CorruptIndex(_)));
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let mut bytes = Vec::new();
        write_index(&sample_index(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() / 2);

        let err = read_index(&bytes[..]).unwrap_err();
        assert!(matches!(err, LibrisError::CorruptIndex(_)));
    }

    #[test]
    fn test_header_layout() {
        let mut bytes = Vec::new();
        write_index(&sample_index(), &mut bytes).unwrap();
        assert_eq!(&bytes[..4], INDEX_MAGIC);
        assert_eq!(&bytes[4..8], &INDEX_FORMAT_VERSION.to_le_bytes());
        let len = u64::from_le_bytes(bytes[12..20].try_into().unwrap());
        assert_eq!(len, bytes.len() as u64 - HEADER_LEN);
    }
}
