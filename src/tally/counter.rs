//! Per-document counting with a bounded set of worker threads
//!
//! Tokens are cut into fixed-size batches. Workers claim batches from a
//! shared cursor until none are left, so a slow batch never idles the rest.

use super::table::FrequencyTable;
use super::tokenizer::tokens;
use crate::config::{CountingStrategy, TallyConfig, DEFAULT_BATCH_SIZE};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use tracing::trace;

/// Counts the words of one document
#[derive(Debug, Clone)]
pub struct DocumentCounter {
    workers: usize,
    batch_size: usize,
    strategy: CountingStrategy,
}

impl Default for DocumentCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl DocumentCounter {
    /// Counter with `workers` threads and the default strategy
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            batch_size: DEFAULT_BATCH_SIZE,
            strategy: CountingStrategy::default(),
        }
    }

    /// Counter settings from `config`, one worker per permit unless overridden
    pub fn from_config(config: &TallyConfig) -> Self {
        Self::new(config.counter_workers())
            .with_batch_size(config.counter.batch_size)
            .with_strategy(config.counter.strategy)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_strategy(mut self, strategy: CountingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn strategy(&self) -> CountingStrategy {
        self.strategy
    }

    /// Count every token of `content`
    ///
    /// Blocks until all workers have joined. The result is exact for any
    /// worker count and strategy.
    pub fn count(&self, content: &[u8]) -> FrequencyTable {
        let words: Vec<&[u8]> = tokens(content).collect();
        let batches: Vec<&[&[u8]]> = words.chunks(self.batch_size).collect();
        let workers = self.workers.min(batches.len());

        trace!(
            tokens = words.len(),
            batches = batches.len(),
            workers,
            strategy = %self.strategy,
            "Counting document"
        );

        match (workers, self.strategy) {
            (0, _) => FrequencyTable::new(),
            (1, _) => words.iter().collect(),
            (_, CountingStrategy::Locked) => count_locked(&batches, workers),
            (_, CountingStrategy::Partitioned) => count_partitioned(&batches, workers),
        }
    }
}

/// Hand out batch indices until the batches run out
fn claim<'a>(cursor: &AtomicUsize, batches: &[&'a [&'a [u8]]]) -> Option<&'a [&'a [u8]]> {
    let index = cursor.fetch_add(1, Ordering::Relaxed);
    batches.get(index).copied()
}

fn count_locked(batches: &[&[&[u8]]], workers: usize) -> FrequencyTable {
    let shared = Mutex::new(FrequencyTable::new());
    let cursor = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                while let Some(batch) = claim(&cursor, batches) {
                    for word in batch {
                        // A poisoned lock still holds whole increments only
                        let mut table = shared.lock().unwrap_or_else(|e| e.into_inner());
                        table.increment(word);
                    }
                }
            });
        }
    });

    shared.into_inner().unwrap_or_else(|e| e.into_inner())
}

fn count_partitioned(batches: &[&[&[u8]]], workers: usize) -> FrequencyTable {
    let cursor = AtomicUsize::new(0);

    let partials: Vec<FrequencyTable> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut local = FrequencyTable::new();
                    while let Some(batch) = claim(&cursor, batches) {
                        for word in batch {
                            local.increment(word);
                        }
                    }
                    local
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    let mut result = FrequencyTable::new();
    for partial in partials {
        result.merge_owned(partial);
    }
    result
}
