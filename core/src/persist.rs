use crate::error::{Error, Result};
use crate::index::{IndexKind, IndexStatistics};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

/// Contents of `meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHeader {
    pub version: u32,
    pub index_type: IndexKind,
    pub created_at: String,
    pub statistics: IndexStatistics,
}

/// File layout of a persisted index directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn header(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    pub fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    pub fn postings_db(&self) -> PathBuf { self.root.join("postings_db") }
}

pub fn save_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|e| Error::persistence(path, e))?;
    let mut f = File::create(path).map_err(|e| Error::persistence(path, e))?;
    f.write_all(&bytes).map_err(|e| Error::persistence(path, e))?;
    Ok(())
}

pub fn load_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).map_err(|e| Error::persistence(path, e))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(|e| Error::persistence(path, e))?;
    bincode::deserialize(&buf).map_err(|e| Error::persistence(path, e))
}

pub fn save_header(paths: &IndexPaths, header: &IndexHeader) -> Result<()> {
    create_dir_all(&paths.root).map_err(|e| Error::persistence(&paths.root, e))?;
    let path = paths.header();
    let json = serde_json::to_string_pretty(header).map_err(|e| Error::persistence(&path, e))?;
    let mut f = File::create(&path).map_err(|e| Error::persistence(&path, e))?;
    f.write_all(json.as_bytes()).map_err(|e| Error::persistence(&path, e))?;
    Ok(())
}

pub fn load_header(paths: &IndexPaths) -> Result<IndexHeader> {
    let path = paths.header();
    let mut f = File::open(&path).map_err(|e| Error::persistence(&path, e))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf).map_err(|e| Error::persistence(&path, e))?;
    let header: IndexHeader = serde_json::from_str(&buf).map_err(|e| Error::persistence(&path, e))?;
    if header.version != FORMAT_VERSION {
        return Err(Error::persistence(&path, format!("unsupported format version {}", header.version)));
    }
    Ok(header)
}

pub fn timestamp() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_header_is_a_persistence_error() {
        let dir = tempdir().unwrap();
        let err = load_header(&IndexPaths::new(dir.path())).unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
    }

    #[test]
    fn truncated_bincode_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("docs.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        assert!(load_bincode::<Vec<String>>(&path).is_err());
    }
}
