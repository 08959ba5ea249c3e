//! The map-reduce word counting pipeline
//!
//! Documents fan out to a [`WorkerPool`], which counts each one with a
//! [`DocumentCounter`]. The resulting tables fan back in through the
//! [`Aggregator`] into one global [`FrequencyTable`]. [`WordTally`] wires the
//! stages together for a [`TallyConfig`](crate::config::TallyConfig).

pub mod aggregator;
pub mod counter;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod table;
pub mod tokenizer;

pub use aggregator::{Aggregate, Aggregator, TableSummary};
pub use counter::DocumentCounter;
pub use pipeline::{TallyOutcome, WordTally};
pub use pool::{DispatchOutcome, DocumentTable, WorkerPool};
pub use report::{OutputFormat, ReportFormatter, TallyReport};
pub use table::{FrequencyTable, MostCommon, WordCount};
pub use tokenizer::{tokens, Tokens};
