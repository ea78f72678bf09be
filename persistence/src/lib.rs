use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use job_filter::Posting;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_SNAPSHOT_PATH: &str = "vagas_encontradas.json";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Snapshot '{path}' is not a valid list of postings: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize snapshot: '{0}'")]
    Serialize(#[from] serde_json::Error),
}

/// Postings accepted in the most recent cycle, kept as a JSON array on disk.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> Error {
        Error::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Previous snapshot, empty when the file does not exist yet.
    pub async fn load(&self) -> Result<Vec<Posting>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no snapshot at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        let postings: Vec<Posting> = serde_json::from_str(&data).map_err(|source| Error::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("loaded {} postings from {}", postings.len(), self.path.display());
        Ok(postings)
    }

    /// Replaces the snapshot with `postings`.
    ///
    /// The JSON is written to a sibling temp file first and renamed over the
    /// target, readers never observe a partially written snapshot.
    pub async fn save(&self, postings: &[Posting]) -> Result<()> {
        let json = serde_json::to_string_pretty(postings)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(json.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        log::info!("saved {} postings to {}", postings.len(), self.path.display());
        Ok(())
    }
}
