//! Byte sources handed between uploads, processors and storage backends
//!
//! A [`FileSource`] is cheap to clone: the same upload feeds every style, and a
//! processor output lives in a temporary file that is removed once the last
//! clone is dropped (normally right after the backend has written it).

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempPath;
use tokio::fs;

use crate::constants::{DEFAULT_CONTENT_TYPE, DEFAULT_FILE_NAME};

#[derive(Debug, Clone)]
pub enum FileSource {
    /// Bytes held in memory.
    Memory(Bytes),
    /// A file owned by the caller; it is read or copied, never moved.
    Path(PathBuf),
    /// A temporary file owned by affix; removed when the last clone is dropped.
    Temp(Arc<TempPath>),
}

/// A source guaranteed to exist on disk, e.g. for an external command.
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    _guard: Option<Arc<TempPath>>,
}

impl LocalFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileSource {
    pub fn temp(path: TempPath) -> Self {
        FileSource::Temp(Arc::new(path))
    }

    /// The on-disk location, if the source has one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            FileSource::Memory(_) => None,
            FileSource::Path(path) => Some(path),
            FileSource::Temp(temp) => Some(Path::new(temp.as_os_str())),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.path()
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
    }

    pub async fn len(&self) -> io::Result<u64> {
        match self {
            FileSource::Memory(bytes) => Ok(bytes.len() as u64),
            FileSource::Path(path) => Ok(fs::metadata(path).await?.len()),
            FileSource::Temp(temp) => Ok(fs::metadata(temp.to_path_buf()).await?.len()),
        }
    }

    pub async fn read(&self) -> io::Result<Bytes> {
        match self {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => Ok(Bytes::from(fs::read(path).await?)),
            FileSource::Temp(temp) => Ok(Bytes::from(fs::read(temp.to_path_buf()).await?)),
        }
    }

    /// Make sure the data is reachable through a filesystem path. In-memory data
    /// is spilled into a temporary file that lives as long as the returned guard.
    pub async fn materialize(&self, suffix: Option<&str>) -> io::Result<LocalFile> {
        match self {
            FileSource::Path(path) => Ok(LocalFile {
                path: path.clone(),
                _guard: None,
            }),
            FileSource::Temp(temp) => Ok(LocalFile {
                path: temp.to_path_buf(),
                _guard: Some(Arc::clone(temp)),
            }),
            FileSource::Memory(bytes) => {
                let temp = new_temp_path(suffix)?;
                fs::write(&temp, bytes).await?;
                let temp = Arc::new(temp);
                Ok(LocalFile {
                    path: temp.to_path_buf(),
                    _guard: Some(temp),
                })
            }
        }
    }
}

/// Reserve a fresh temporary file path, optionally with an extension.
pub fn new_temp_path(extension: Option<&str>) -> io::Result<TempPath> {
    let suffix = extension
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.trim_start_matches('.')))
        .unwrap_or_default();

    let file = tempfile::Builder::new()
        .prefix("affix-")
        .suffix(&suffix)
        .tempfile()?;
    Ok(file.into_temp_path())
}

impl From<Bytes> for FileSource {
    fn from(bytes: Bytes) -> Self {
        FileSource::Memory(bytes)
    }
}

impl From<Vec<u8>> for FileSource {
    fn from(bytes: Vec<u8>) -> Self {
        FileSource::Memory(Bytes::from(bytes))
    }
}

impl From<PathBuf> for FileSource {
    fn from(path: PathBuf) -> Self {
        FileSource::Path(path)
    }
}

/// An incoming file: its original name, the declared content type and its bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub source: FileSource,
}

impl Upload {
    pub fn from_source(file_name: impl AsRef<str>, source: FileSource) -> Self {
        Self {
            file_name: base_file_name(file_name.as_ref()),
            content_type: None,
            source,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path.to_string_lossy().into_owned();
        Self::from_source(file_name, FileSource::Path(path))
    }

    pub fn from_bytes(file_name: impl AsRef<str>, bytes: impl Into<Bytes>) -> Self {
        Self::from_source(file_name, FileSource::Memory(bytes.into()))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    pub async fn size(&self) -> io::Result<u64> {
        self.source.len().await
    }
}

fn base_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string()
}
