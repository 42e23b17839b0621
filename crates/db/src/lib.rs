//! On-disk Hanja data: typed JSON documents under a data directory.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod layout;
pub mod models;

pub use layout::DataLayout;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid json in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("background write task failed: {0}")]
    Task(String),
}

impl DbError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            DbError::NotFound(path.to_path_buf())
        } else {
            DbError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

/// Handle on the data directory. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DBService {
    pub layout: DataLayout,
}

impl DBService {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, DbError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DbError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| DbError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes `value` as pretty JSON, creating parent directories. The file is
    /// written to a temp file in the same directory and renamed into place, so
    /// readers never observe a partial document.
    pub async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), DbError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| DbError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| DbError::Task(e.to_string()))?
    }

    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DbError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| DbError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| DbError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| DbError::io(path, e))?;
    tmp.persist(path).map_err(|e| DbError::io(path, e.error))?;
    Ok(())
}
