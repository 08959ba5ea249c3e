//! Bounded-concurrency dispatch of per-document counting tasks
//!
//! One tokio task is spawned per document. A semaphore caps how many of them
//! hold a permit at once; a task reads its document and counts it only while
//! holding one. Every task is awaited, failed or not, before results are
//! handed back.

use super::counter::DocumentCounter;
use super::table::FrequencyTable;
use crate::config::FailurePolicy;
use crate::corpus::DocumentSource;
use crate::error::{DispatchError, TallyError, TallyResult};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

/// Counted table for one document
#[derive(Debug, Clone)]
pub struct DocumentTable {
    pub document: String,
    pub duration: Duration,
    pub table: FrequencyTable,
}

/// Everything collected from one dispatch phase
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Number of documents submitted
    pub total: usize,
    /// Tables in completion order
    pub tables: Vec<DocumentTable>,
    pub failures: Vec<TallyError>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// All tables, or one error listing every failed document
    pub fn into_result(self) -> TallyResult<Vec<DocumentTable>> {
        let (tables, error) = self.split();
        match error {
            Some(error) => Err(error),
            None => Ok(tables),
        }
    }

    /// Tables allowed through by `policy`, plus the joined failure if any
    pub fn apply_policy(self, policy: FailurePolicy) -> (Vec<DocumentTable>, Option<TallyError>) {
        let (tables, error) = self.split();
        match (policy, error) {
            (FailurePolicy::DiscardOnFailure, Some(error)) => (Vec::new(), Some(error)),
            (_, error) => (tables, error),
        }
    }

    fn split(self) -> (Vec<DocumentTable>, Option<TallyError>) {
        if self.failures.is_empty() {
            return (self.tables, None);
        }
        let error = TallyError::Dispatch(Box::new(DispatchError {
            total_documents: self.total,
            failures: self.failures,
        }));
        (self.tables, Some(error))
    }
}

/// Runs one counting task per document, at most `max_parallel` at a time
#[derive(Debug, Clone)]
pub struct WorkerPool {
    max_parallel: usize,
    counter: Arc<DocumentCounter>,
}

impl WorkerPool {
    pub fn new(max_parallel: usize, counter: DocumentCounter) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            counter: Arc::new(counter),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Count every document, waiting for all of them
    ///
    /// A failing document never cancels its siblings.
    pub async fn run<S: DocumentSource>(&self, sources: Vec<S>) -> DispatchOutcome {
        let counter = self.counter.clone();
        self.run_with(sources, move |content| counter.count(content))
            .await
    }

    /// Like [`run`](Self::run), counting each document's content with `count`
    ///
    /// `count` runs on the blocking pool while the task still holds its
    /// permit.
    pub async fn run_with<S, F>(&self, sources: Vec<S>, count: F) -> DispatchOutcome
    where
        S: DocumentSource,
        F: Fn(&[u8]) -> FrequencyTable + Send + Sync + 'static,
    {
        let count = Arc::new(count);
        let total = sources.len();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut futures = FuturesUnordered::new();

        debug!(
            "Dispatching {} documents (max parallel: {})",
            total, self.max_parallel
        );

        for source in sources {
            let document = source.id().to_string();
            let semaphore = semaphore.clone();
            let count = count.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| TallyError::LimiterClosed {
                        document: source.id().to_string(),
                    })?;
                count_document(source, count).await
            });

            futures.push(async move { (document, handle.await) });
        }

        let mut outcome = DispatchOutcome {
            total,
            ..Default::default()
        };
        while let Some((document, joined)) = futures.next().await {
            match joined {
                Ok(Ok(table)) => outcome.tables.push(table),
                Ok(Err(e)) => {
                    warn!(document = %document, "Counting failed: {}", e);
                    outcome.failures.push(e);
                }
                Err(e) => {
                    warn!(document = %document, "Counting task panicked: {}", e);
                    outcome.failures.push(panicked(document, e));
                }
            }
        }

        debug!(
            "Dispatch finished: {} counted, {} failed",
            outcome.tables.len(),
            outcome.failures.len()
        );
        outcome
    }
}

async fn count_document<S, F>(source: S, count: Arc<F>) -> TallyResult<DocumentTable>
where
    S: DocumentSource,
    F: Fn(&[u8]) -> FrequencyTable + Send + Sync + 'static,
{
    let start = Instant::now();
    let document = source.id().to_string();
    let content = source.read().await?;

    let table = tokio::task::spawn_blocking(move || count(&content))
        .await
        .map_err(|e| panicked(document.clone(), e))?;

    let duration = start.elapsed();
    info!(document = %document, duration = ?duration, "Done counting words");

    Ok(DocumentTable {
        document,
        duration,
        table,
    })
}

fn panicked(document: String, error: JoinError) -> TallyError {
    TallyError::TaskPanicked {
        document,
        reason: error.to_string(),
    }
}
