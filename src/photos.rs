use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Owner;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid photo key: {0:?}")]
    InvalidKey(String),
}

/// Object storage for plant photos.
///
/// Keys are path-like: `ana/1760000000000_albahaca.jpg`. Uploading the same
/// bytes twice produces two objects.
pub trait PhotoStore: Send + Sync {
    /// Store a photo. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), PhotoError>;

    /// Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PhotoError>;

    /// Public URL recorded verbatim on the plant.
    fn public_url(&self, key: &str) -> String;
}

/// `{owner}/{upload millis}_{filename}`.
pub fn photo_key(owner: &Owner, uploaded_at: DateTime<Utc>, filename: &str) -> String {
    let filename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("photo");
    format!(
        "{}/{}_{}",
        sanitize(owner.as_str()),
        uploaded_at.timestamp_millis(),
        sanitize(filename)
    )
}

/// Keeps keys usable as URL path segments: separators and URL-reserved
/// characters become `_`.
fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | '#' | '?' | '%' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
}

/// Filesystem-backed photo store. Keys map to `{base_dir}/{key}`.
pub struct FileStore {
    base_dir: PathBuf,
    public_base_url: String,
}

impl FileStore {
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path, public_base_url: &str) -> Result<Self, PhotoError> {
        fs::create_dir_all(base_dir).map_err(|e| PhotoError::Io(e.to_string()))?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Rejects empty and absolute keys and anything that climbs out of base_dir.
    fn resolve(&self, key: &str) -> Result<PathBuf, PhotoError> {
        let relative = Path::new(key);
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !only_normal {
            return Err(PhotoError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(relative))
    }
}

impl PhotoStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), PhotoError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PhotoError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| PhotoError::Io(e.to_string()))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PhotoError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .map_err(|e| PhotoError::Io(e.to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
