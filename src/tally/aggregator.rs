//! Fan-in of per-document tables into one global table
//!
//! Each table becomes one unit of work. Units compute their table's
//! statistics in parallel; the fold into the global table happens under a
//! mutex as each unit's last step. The global table is only read after every
//! unit has been joined.

use super::pool::DocumentTable;
use super::table::{FrequencyTable, MostCommon};
use crate::error::{TallyError, TallyResult};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::info;

/// Statistics for one document's table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub document: String,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub unique_words: usize,
    pub total_words: u64,
    pub most_common: MostCommon,
}

impl TableSummary {
    pub fn from_table(table: &DocumentTable) -> Self {
        Self {
            document: table.document.clone(),
            duration: table.duration,
            unique_words: table.table.len(),
            total_words: table.table.total(),
            most_common: table.table.most_common(),
        }
    }
}

/// The merged result of an aggregation
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub table: FrequencyTable,
    /// Per-table statistics in completion order
    pub summaries: Vec<TableSummary>,
}

/// Folds document tables together with bounded parallelism
#[derive(Debug, Clone)]
pub struct Aggregator {
    max_parallel: usize,
}

impl Aggregator {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    /// Merge every table into one, summarizing each along the way
    pub async fn aggregate(&self, tables: Vec<DocumentTable>) -> TallyResult<Aggregate> {
        self.aggregate_with(tables, TableSummary::from_table).await
    }

    /// Like [`aggregate`](Self::aggregate), computing each unit's statistics
    /// with `summarize` on the blocking pool
    pub async fn aggregate_with<F>(
        &self,
        tables: Vec<DocumentTable>,
        summarize: F,
    ) -> TallyResult<Aggregate>
    where
        F: Fn(&DocumentTable) -> TableSummary + Send + Sync + 'static,
    {
        let summarize = Arc::new(summarize);
        let global = Arc::new(Mutex::new(FrequencyTable::new()));
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut units = FuturesUnordered::new();

        for table in tables {
            let document = table.document.clone();
            let global = global.clone();
            let semaphore = semaphore.clone();
            let summarize = summarize.clone();
            let unit_document = document.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| TallyError::LimiterClosed {
                        document: unit_document.clone(),
                    })?;

                let (table, summary) = tokio::task::spawn_blocking(move || {
                    let summary = summarize(&table);
                    (table, summary)
                })
                .await
                .map_err(|e| TallyError::TaskPanicked {
                    document: unit_document,
                    reason: e.to_string(),
                })?;

                info!(
                    document = %summary.document,
                    unique_words = summary.unique_words,
                    most_common_word = %summary.most_common.word_lossy(),
                    most_common_count = summary.most_common.count,
                    "Table statistics"
                );

                global.lock().await.merge_owned(table.table);
                Ok::<_, TallyError>(summary)
            });

            units.push(async move { (document, handle.await) });
        }

        let mut summaries = Vec::with_capacity(units.len());
        let mut first_error = None;
        while let Some((document, joined)) = units.next().await {
            match joined {
                Ok(Ok(summary)) => summaries.push(summary),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(TallyError::TaskPanicked {
                        document,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        let table = std::mem::take(&mut *global.lock().await);
        Ok(Aggregate { table, summaries })
    }
}
