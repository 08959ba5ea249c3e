//! # wordtally
//!
//! Counts word frequencies across a directory of documents with a bounded
//! parallel map-reduce pipeline and reports the most frequent word.
//!
//! ## Usage
//!
//! ```bash
//! wordtally [DIR] [-j max-parallel] [--strategy locked|partitioned] [--format json]
//! ```
//!
//! ## Modules
//!
//! - `config` - Layered run configuration (defaults, TOML file, environment)
//! - `corpus` - Document sources and directory listing
//! - `error` - Error taxonomy shared by every stage
//! - `tally` - Tokenizer, frequency tables, worker pool, aggregation and reports
pub mod config;
pub mod corpus;
pub mod error;
pub mod tally;

pub use config::TallyConfig;
pub use error::{TallyError, TallyResult};
pub use tally::{FrequencyTable, WordTally};
