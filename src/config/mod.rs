//! Configuration for a tally run
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `WORDTALLY_*` environment variables. The binary applies CLI flags last and
//! calls [`TallyConfig::validate`] before anything runs.

use crate::error::{TallyError, TallyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// Default concurrency ceiling for document dispatch and aggregation
pub const DEFAULT_MAX_PARALLEL: usize = 3;

/// Default number of tokens handed to a counting worker at a time
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "WORDTALLY_";

/// How a document's counting workers share their table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountingStrategy {
    /// All workers increment one table behind a single mutex
    Locked,
    /// Each worker counts privately; tables are merged after the join
    #[default]
    Partitioned,
}

impl FromStr for CountingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "locked" => Ok(Self::Locked),
            "partitioned" => Ok(Self::Partitioned),
            other => Err(format!(
                "unknown counting strategy '{other}' (expected locked or partitioned)"
            )),
        }
    }
}

impl fmt::Display for CountingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Partitioned => write!(f, "partitioned"),
        }
    }
}

/// What happens to successfully counted documents when a sibling fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Aggregate every document that succeeded and report the failures
    #[default]
    KeepPartial,
    /// Aggregate nothing if any document failed
    #[serde(alias = "discard")]
    DiscardOnFailure,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep-partial" | "keep" => Ok(Self::KeepPartial),
            "discard-on-failure" | "discard" => Ok(Self::DiscardOnFailure),
            other => Err(format!(
                "unknown failure policy '{other}' (expected keep-partial or discard)"
            )),
        }
    }
}

/// Settings for counting inside a single document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterConfig {
    #[serde(default)]
    pub strategy: CountingStrategy,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Worker threads per document; falls back to `max_parallel`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            strategy: CountingStrategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: None,
        }
    }
}

/// Complete configuration for a tally run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Directory holding the documents
    #[serde(default = "default_works_dir")]
    pub works_dir: PathBuf,

    /// Concurrency ceiling shared by dispatch and aggregation
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// Descend into subdirectories of `works_dir`
    #[serde(default)]
    pub recursive: bool,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Number of entries in the report's top list
    #[serde(default = "default_top")]
    pub top: usize,

    #[serde(default)]
    pub counter: CounterConfig,
}

fn default_works_dir() -> PathBuf {
    PathBuf::from("./works")
}

fn default_max_parallel() -> usize {
    DEFAULT_MAX_PARALLEL
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_top() -> usize {
    10
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            works_dir: default_works_dir(),
            max_parallel: DEFAULT_MAX_PARALLEL,
            recursive: false,
            failure_policy: FailurePolicy::default(),
            top: default_top(),
            counter: CounterConfig::default(),
        }
    }
}

impl TallyConfig {
    /// Load defaults, overlay the TOML file if given, then the environment
    pub async fn load(path: Option<&Path>) -> TallyResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        config.merge_env_vars()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub async fn from_file(path: &Path) -> TallyResult<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| TallyError::ConfigLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
                source: Some(Box::new(e)),
            })?;
        Self::from_toml(&content).map_err(|e| match e {
            TallyError::ConfigLoad { reason, source, .. } => TallyError::ConfigLoad {
                path: path.to_path_buf(),
                reason,
                source,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> TallyResult<Self> {
        toml::from_str(content).map_err(|e| TallyError::ConfigLoad {
            path: PathBuf::new(),
            reason: e.message().to_string(),
            source: Some(Box::new(e)),
        })
    }

    /// Apply `WORDTALLY_*` overrides from the process environment
    pub fn merge_env_vars(&mut self) -> TallyResult<()> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn merge_env_with<F>(&mut self, lookup: F) -> TallyResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(dir) = var("WORKS_DIR") {
            self.works_dir = PathBuf::from(dir);
        }

        if let Some(value) = var("MAX_PARALLEL") {
            self.max_parallel = value.parse().map_err(|_| {
                TallyError::invalid_config("max_parallel", format!("'{value}' is not a count"))
            })?;
        }

        if let Some(value) = var("RECURSIVE") {
            self.recursive = value.parse().map_err(|_| {
                TallyError::invalid_config("recursive", format!("'{value}' is not a boolean"))
            })?;
        }

        if let Some(value) = var("FAILURE_POLICY") {
            self.failure_policy = value
                .parse()
                .map_err(|e: String| TallyError::invalid_config("failure_policy", e))?;
        }

        if let Some(value) = var("STRATEGY") {
            self.counter.strategy = value
                .parse()
                .map_err(|e: String| TallyError::invalid_config("counter.strategy", e))?;
        }

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> TallyResult<()> {
        if self.max_parallel == 0 {
            return Err(TallyError::invalid_config(
                "max_parallel",
                "must be at least 1",
            ));
        }
        if self.counter.batch_size == 0 {
            return Err(TallyError::invalid_config(
                "counter.batch_size",
                "must be at least 1",
            ));
        }
        if self.counter.workers == Some(0) {
            return Err(TallyError::invalid_config(
                "counter.workers",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Worker threads used per document
    pub fn counter_workers(&self) -> usize {
        self.counter.workers.unwrap_or(self.max_parallel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_match_reference_run() {
        let config = TallyConfig::default();
        assert_eq!(config.works_dir, PathBuf::from("./works"));
        assert_eq!(config.max_parallel, 3);
        assert_eq!(config.counter_workers(), 3);
        assert_eq!(config.failure_policy, FailurePolicy::KeepPartial);
        assert_eq!(config.counter.strategy, CountingStrategy::Partitioned);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial_file() {
        let config = TallyConfig::from_toml(
            r#"
            works_dir = "/srv/books"
            max_parallel = 8
            failure_policy = "discard"

            [counter]
            strategy = "locked"
            workers = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.works_dir, PathBuf::from("/srv/books"));
        assert_eq!(config.max_parallel, 8);
        assert_eq!(config.failure_policy, FailurePolicy::DiscardOnFailure);
        assert_eq!(config.counter.strategy, CountingStrategy::Locked);
        assert_eq!(config.counter.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.counter_workers(), 2);
        assert_eq!(config.top, 10);
    }

    #[test]
    fn test_from_toml_rejects_unknown_strategy() {
        let err = TallyConfig::from_toml("[counter]\nstrategy = \"sharded\"\n").unwrap_err();
        assert!(matches!(err, TallyError::ConfigLoad { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("WORDTALLY_MAX_PARALLEL", "5"),
            ("WORDTALLY_STRATEGY", "locked"),
            ("WORDTALLY_RECURSIVE", "true"),
            ("WORDTALLY_WORKS_DIR", "corpus"),
        ]);
        let mut config = TallyConfig::default();
        config.merge_env_with(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.max_parallel, 5);
        assert_eq!(config.counter.strategy, CountingStrategy::Locked);
        assert!(config.recursive);
        assert_eq!(config.works_dir, PathBuf::from("corpus"));
    }

    #[test]
    fn test_env_override_with_bad_value() {
        let vars = env(&[("WORDTALLY_MAX_PARALLEL", "many")]);
        let mut config = TallyConfig::default();
        let err = config.merge_env_with(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("max_parallel"));
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let config = TallyConfig {
            max_parallel: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = TallyConfig::default();
        config.counter.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = TallyConfig::default();
        config.counter.workers = Some(0);
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("wordtally.toml");
        tokio::fs::write(&path, "max_parallel = 1\ntop = 3\n")
            .await
            .unwrap();

        let config = TallyConfig::from_file(&path).await.unwrap();
        assert_eq!(config.max_parallel, 1);
        assert_eq!(config.top, 3);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = TallyConfig::from_file(Path::new("/nonexistent/wordtally.toml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/wordtally.toml"));
    }
}
