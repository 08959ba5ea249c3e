//! End-to-end tally run: list, dispatch, aggregate, summarize

use super::aggregator::Aggregator;
use super::counter::DocumentCounter;
use super::pool::WorkerPool;
use super::report::TallyReport;
use super::table::FrequencyTable;
use crate::config::TallyConfig;
use crate::corpus::{list_documents, DocumentSource};
use crate::error::TallyResult;
use std::time::Instant;
use tracing::{error, info};

/// Result of a run: the global table and its report
#[derive(Debug, Clone)]
pub struct TallyOutcome {
    pub table: FrequencyTable,
    pub report: TallyReport,
}

/// Drives the map-reduce pipeline for one configuration
#[derive(Debug, Clone)]
pub struct WordTally {
    config: TallyConfig,
    pool: WorkerPool,
    aggregator: Aggregator,
}

impl WordTally {
    /// Build a pipeline, rejecting invalid configuration
    pub fn new(config: TallyConfig) -> TallyResult<Self> {
        config.validate()?;
        let counter = DocumentCounter::from_config(&config);
        Ok(Self {
            pool: WorkerPool::new(config.max_parallel, counter),
            aggregator: Aggregator::new(config.max_parallel),
            config,
        })
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Tally every document in the configured directory
    ///
    /// Fails only if the directory cannot be listed. Documents that cannot
    /// be read are reported in the outcome.
    pub async fn run(&self) -> TallyResult<TallyOutcome> {
        let start = Instant::now();
        let documents = list_documents(&self.config.works_dir, self.config.recursive).await?;
        self.run_from(start, documents).await
    }

    /// Tally an explicit set of documents
    pub async fn run_sources<S: DocumentSource>(&self, sources: Vec<S>) -> TallyResult<TallyOutcome> {
        self.run_from(Instant::now(), sources).await
    }

    async fn run_from<S: DocumentSource>(
        &self,
        start: Instant,
        sources: Vec<S>,
    ) -> TallyResult<TallyOutcome> {
        let documents = sources.len();
        let dispatch = self.pool.run(sources).await;
        let failed = dispatch.failures.len();

        let failures: Vec<String> = dispatch.failures.iter().map(|e| e.to_string()).collect();
        let (tables, dispatch_error) = dispatch.apply_policy(self.config.failure_policy);
        if let Some(e) = dispatch_error {
            error!(err = %e, "Error generating word counts");
        }

        let aggregate = self.aggregator.aggregate(tables).await?;
        let table = aggregate.table;
        let most_common = table.most_common();
        let elapsed = start.elapsed();

        info!(
            elapsed = ?elapsed,
            total_unique_words = table.len(),
            most_common_word = %most_common.word_lossy(),
            most_common_count = most_common.count,
            "Done with all word counts"
        );

        let report = TallyReport {
            elapsed,
            documents,
            succeeded: documents - failed,
            failed,
            aggregated: aggregate.summaries.len(),
            failure_policy: self.config.failure_policy,
            total_words: table.total(),
            unique_words: table.len(),
            most_common,
            top: table.top(self.config.top),
            per_document: aggregate.summaries,
            failures,
        };

        Ok(TallyOutcome { table, report })
    }
}
