//! Document sources for the tally pipeline
//!
//! The pipeline only needs an identifier and a way to read bytes for each
//! document. [`FileDocument`] reads from disk; [`InMemoryDocument`] serves
//! fixed content and is handy for driving the pipeline without a filesystem.

use crate::error::{TallyError, TallyResult};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

/// One readable document
#[async_trait]
pub trait DocumentSource: Send + Sync + 'static {
    /// Identifier used in events and errors
    fn id(&self) -> &str;

    /// Read the whole document
    async fn read(&self) -> TallyResult<Vec<u8>>;
}

/// A document backed by a file on disk
#[derive(Debug, Clone)]
pub struct FileDocument {
    id: String,
    path: PathBuf,
}

impl FileDocument {
    /// Document at `path`, identified by its path relative to `root`
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let id = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        Self { id, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for FileDocument {
    fn id(&self) -> &str {
        &self.id
    }

    async fn read(&self) -> TallyResult<Vec<u8>> {
        fs::read(&self.path)
            .await
            .map_err(|e| TallyError::document_read(&self.id, e))
    }
}

/// A document with content held in memory
#[derive(Debug, Clone)]
pub struct InMemoryDocument {
    id: String,
    content: Result<Vec<u8>, io::ErrorKind>,
}

impl InMemoryDocument {
    pub fn new(id: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            content: Ok(content.into()),
        }
    }

    /// A document whose every read fails with `kind`
    pub fn failing(id: impl Into<String>, kind: io::ErrorKind) -> Self {
        Self {
            id: id.into(),
            content: Err(kind),
        }
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocument {
    fn id(&self) -> &str {
        &self.id
    }

    async fn read(&self) -> TallyResult<Vec<u8>> {
        match &self.content {
            Ok(content) => Ok(content.clone()),
            Err(kind) => Err(TallyError::document_read(
                &self.id,
                io::Error::new(*kind, format!("cannot read {}", self.id)),
            )),
        }
    }
}

/// List the documents of `dir`, sorted by path
///
/// Without `recursive` every direct entry is a document, subdirectories
/// included; reading those fails later as a per-document error. With
/// `recursive` only regular files at any depth are listed.
pub async fn list_documents(dir: &Path, recursive: bool) -> TallyResult<Vec<FileDocument>> {
    let listing_error = |source: io::Error| TallyError::DirectoryListing {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = if recursive {
        walk_files(dir).map_err(listing_error)?
    } else {
        let mut entries = fs::read_dir(dir).await.map_err(listing_error)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
            paths.push(entry.path());
        }
        paths
    };
    paths.sort();

    debug!("Listed {} documents in {}", paths.len(), dir.display());

    Ok(paths
        .into_iter()
        .map(|path| FileDocument::new(dir, path))
        .collect())
}

fn walk_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}
