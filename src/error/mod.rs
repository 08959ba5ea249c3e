//! Structured error types for word tallying
//!
//! Errors fall into two groups: fatal setup errors (the directory cannot be
//! listed, the configuration is invalid) that end the run, and per-document
//! errors that are collected by the worker pool and reported once every
//! document has been processed.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tally pipeline
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("Error reading dir {}: {source}", path.display())]
    DirectoryListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error opening document {document}: {source}")]
    DocumentRead {
        document: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Counting task for document {document} panicked: {reason}")]
    TaskPanicked { document: String, reason: String },

    /// A task could not get a permit because its semaphore was closed
    ///
    /// Each dispatch or aggregation pass owns its semaphore and never closes
    /// it, so this only appears if that ownership changes. The document is
    /// then reported as failed instead of panicking its task.
    #[error("Concurrency limiter closed before document {document} could run")]
    LimiterClosed { document: String },

    #[error("{0}")]
    Dispatch(Box<DispatchError>),

    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Failed to load configuration from {}: {reason}", path.display())]
    ConfigLoad {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Every per-document failure collected during one dispatch phase
#[derive(Debug)]
pub struct DispatchError {
    pub total_documents: usize,
    pub failures: Vec<TallyError>,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} documents failed",
            self.failures.len(),
            self.total_documents
        )?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

impl TallyError {
    /// Wrap an I/O failure for a single document
    pub fn document_read(document: impl Into<String>, source: std::io::Error) -> Self {
        Self::DocumentRead {
            document: document.into(),
            source,
        }
    }

    /// Create a configuration validation error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error ends the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DirectoryListing { .. }
                | Self::InvalidConfiguration { .. }
                | Self::ConfigLoad { .. }
        )
    }

    /// Identifier of the document this error belongs to, if any
    pub fn document(&self) -> Option<&str> {
        match self {
            Self::DocumentRead { document, .. }
            | Self::TaskPanicked { document, .. }
            | Self::LimiterClosed { document } => Some(document),
            _ => None,
        }
    }
}

/// Result type for tally operations
pub type TallyResult<T> = Result<T, TallyError>;
