//! # Node Configuration
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults ([`NodeConfig::default`])
//! 2. Config file
//!    - `*.json`: any subset of the fields below
//!    - anything else: four positive integers, one per line, in the order
//!      `NUM_MINERS`, `POOL_CAPACITY`, `TRANSACTIONS_PER_BLOCK`,
//!      `LEDGER_CAPACITY`, then an optional fifth `TRANSACTION_POOL_SIZE`
//!      (default 10000, zero rejected). Blank lines and `#` comments are
//!      skipped; lines after the fifth value are ignored.
//! 3. Environment: `AC_NUM_MINERS`, `AC_POOL_CAPACITY`, `AC_TX_PER_BLOCK`,
//!    `AC_LEDGER_CAPACITY`, `AC_CONTROLLER_INTERVAL_MS`
//!
//! [`NodeConfig::validate`] runs last; setup fails on any violation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ac_02_proof_of_work::DEFAULT_MAX_OPERATIONS;
use ac_04_block_transport::DEFAULT_BUFFER_BYTES;
use ac_05_mining::MinerConfig;
use ac_07_autoscaler::{ControllerConfig, ScalePolicy};
use serde::Deserialize;
use shared_types::{MAX_REWARD, MIN_REWARD};
use thiserror::Error;

/// `TRANSACTION_POOL_SIZE` when the config file does not set it.
pub const DEFAULT_TRANSACTION_POOL_SIZE: usize = 10_000;

/// Shortest and longest generator interval.
pub const GENERATOR_INTERVAL_MS: std::ops::RangeInclusive<u64> = 200..=3000;

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Config file ends before {0}")]
    MissingValue(&'static str),

    #[error("Invalid value for {field} on line {line}: {value:?}")]
    InvalidLine {
        field: &'static str,
        line: usize,
        value: String,
    },

    #[error("Invalid JSON config: {0}")]
    Json(String),

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("Transactions per block ({per_block}) exceeds pool capacity ({capacity})")]
    BlockLargerThanPool { per_block: usize, capacity: usize },

    #[error("Generator {index}: reward {reward} outside 1..=3")]
    GeneratorReward { index: usize, reward: u8 },

    #[error("Generator {index}: interval {interval_ms} ms outside 200..=3000 ms")]
    GeneratorInterval { index: usize, interval_ms: u64 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// One transaction generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct GeneratorConfig {
    /// Reward of every transaction it produces.
    pub reward: u8,
    /// Delay between transactions.
    pub interval_ms: u64,
}

/// Complete node configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub num_miners: usize,
    pub pool_capacity: usize,
    pub transactions_per_block: usize,
    pub ledger_capacity: usize,
    /// Total transactions the generators are expected to produce. Reported
    /// at startup only.
    pub transaction_pool_size: usize,
    pub controller_interval_ms: u64,
    pub pow_max_operations: u64,
    /// Bounded wait of a producer on a full pool.
    pub producer_wait_ms: u64,
    /// Miner fallback wake-up.
    pub miner_recheck_ms: u64,
    pub transport_retry_ms: u64,
    pub transport_buffer_bytes: usize,
    /// How long validators may drain the closed transport at shutdown.
    pub validator_drain_ms: u64,
    pub generators: Vec<GeneratorConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            num_miners: 3,
            pool_capacity: 20,
            transactions_per_block: 3,
            ledger_capacity: 10,
            transaction_pool_size: DEFAULT_TRANSACTION_POOL_SIZE,
            controller_interval_ms: 2000,
            pow_max_operations: DEFAULT_MAX_OPERATIONS,
            producer_wait_ms: 1000,
            miner_recheck_ms: 500,
            transport_retry_ms: 100,
            transport_buffer_bytes: DEFAULT_BUFFER_BYTES,
            validator_drain_ms: 5000,
            generators: vec![
                GeneratorConfig {
                    reward: 1,
                    interval_ms: 500,
                },
                GeneratorConfig {
                    reward: 2,
                    interval_ms: 1000,
                },
                GeneratorConfig {
                    reward: 3,
                    interval_ms: 2000,
                },
            ],
        }
    }
}

const OPTIONAL_LINE_FIELD: &str = "TRANSACTION_POOL_SIZE";

const LINE_FIELDS: [&str; 4] = [
    "NUM_MINERS",
    "POOL_CAPACITY",
    "TRANSACTIONS_PER_BLOCK",
    "LEDGER_CAPACITY",
];

impl NodeConfig {
    /// Defaults, then `path` (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&text)
        } else {
            Self::from_lines(&text)
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Parse the line format on top of the defaults.
    pub fn from_lines(text: &str) -> Result<Self> {
        fn positive(field: &'static str, line: usize, raw: &str) -> Result<usize> {
            match raw.parse::<usize>() {
                Ok(v) if v > 0 => Ok(v),
                _ => Err(ConfigError::InvalidLine {
                    field,
                    line,
                    value: raw.to_string(),
                }),
            }
        }

        let mut values = [0usize; 4];
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        for (slot, field) in values.iter_mut().zip(LINE_FIELDS) {
            let (line, raw) = lines.next().ok_or(ConfigError::MissingValue(field))?;
            *slot = positive(field, line, raw)?;
        }
        let transaction_pool_size = match lines.next() {
            Some((line, raw)) => positive(OPTIONAL_LINE_FIELD, line, raw)?,
            None => DEFAULT_TRANSACTION_POOL_SIZE,
        };

        let [num_miners, pool_capacity, transactions_per_block, ledger_capacity] = values;
        Ok(Self {
            num_miners,
            pool_capacity,
            transactions_per_block,
            ledger_capacity,
            transaction_pool_size,
            ..Self::default()
        })
    }

    /// Apply `AC_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        fn parse<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T> {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|_| ConfigError::InvalidEnv { var, value })
        }

        if let Some(v) = lookup("AC_NUM_MINERS") {
            self.num_miners = parse("AC_NUM_MINERS", v)?;
        }
        if let Some(v) = lookup("AC_POOL_CAPACITY") {
            self.pool_capacity = parse("AC_POOL_CAPACITY", v)?;
        }
        if let Some(v) = lookup("AC_TX_PER_BLOCK") {
            self.transactions_per_block = parse("AC_TX_PER_BLOCK", v)?;
        }
        if let Some(v) = lookup("AC_LEDGER_CAPACITY") {
            self.ledger_capacity = parse("AC_LEDGER_CAPACITY", v)?;
        }
        if let Some(v) = lookup("AC_CONTROLLER_INTERVAL_MS") {
            self.controller_interval_ms = parse("AC_CONTROLLER_INTERVAL_MS", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("num_miners", self.num_miners as u64),
            ("pool_capacity", self.pool_capacity as u64),
            ("transactions_per_block", self.transactions_per_block as u64),
            ("ledger_capacity", self.ledger_capacity as u64),
            ("transaction_pool_size", self.transaction_pool_size as u64),
            ("controller_interval_ms", self.controller_interval_ms),
            ("pow_max_operations", self.pow_max_operations),
            ("producer_wait_ms", self.producer_wait_ms),
            ("miner_recheck_ms", self.miner_recheck_ms),
            ("transport_retry_ms", self.transport_retry_ms),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::Zero(*name));
        }
        if self.transactions_per_block > self.pool_capacity {
            return Err(ConfigError::BlockLargerThanPool {
                per_block: self.transactions_per_block,
                capacity: self.pool_capacity,
            });
        }
        for (index, generator) in self.generators.iter().enumerate() {
            if !(MIN_REWARD..=MAX_REWARD).contains(&generator.reward) {
                return Err(ConfigError::GeneratorReward {
                    index,
                    reward: generator.reward,
                });
            }
            if !GENERATOR_INTERVAL_MS.contains(&generator.interval_ms) {
                return Err(ConfigError::GeneratorInterval {
                    index,
                    interval_ms: generator.interval_ms,
                });
            }
        }
        Ok(())
    }

    pub fn miner_config(&self) -> MinerConfig {
        MinerConfig {
            num_miners: self.num_miners,
            transactions_per_block: self.transactions_per_block,
            pow_max_operations: self.pow_max_operations,
            recheck_interval: Duration::from_millis(self.miner_recheck_ms),
            retry_interval: Duration::from_millis(self.transport_retry_ms),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            interval: Duration::from_millis(self.controller_interval_ms),
            transactions_per_block: self.transactions_per_block,
            policy: ScalePolicy::default(),
        }
    }

    pub fn producer_wait(&self) -> Duration {
        Duration::from_millis(self.producer_wait_ms)
    }

    pub fn validator_drain(&self) -> Duration {
        Duration::from_millis(self.validator_drain_ms)
    }
}
