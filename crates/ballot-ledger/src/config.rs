//! # config
//!
//! why: collect the knobs that decide how the ledger starts and reacts to damage
//! relations: consumed by ledger.rs at initialization, populated by ballot-cli
//! what: LedgerConfig, CorruptStorePolicy, environment loading

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

pub const DATA_DIR_VAR: &str = "BALLOTIQ_DATA_DIR";
pub const CORRUPT_STORE_VAR: &str = "BALLOTIQ_CORRUPT_STORE";
pub const HOLD_ON_VIOLATION_VAR: &str = "BALLOTIQ_HOLD_ON_VIOLATION";

/// What to do when the chain store exists but cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptStorePolicy {
    /// Discard the unreadable store and start over from a fresh genesis entry
    #[default]
    Recreate,
    /// Refuse to start
    Refuse,
}

impl FromStr for CorruptStorePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recreate" => Ok(Self::Recreate),
            "refuse" => Ok(Self::Refuse),
            other => Err(format!("unknown corrupt store policy '{other}'")),
        }
    }
}

/// Configuration for a ledger instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Directory holding `chain.json`
    pub data_dir: PathBuf,
    pub corrupt_store: CorruptStorePolicy,
    /// Stop accepting appends once `verify` has found a violation
    pub hold_on_integrity_violation: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            corrupt_store: CorruptStorePolicy::default(),
            hold_on_integrity_violation: true,
        }
    }
}

impl LedgerConfig {
    /// Load from `BALLOTIQ_*` environment variables, defaulting anything unset
    /// or invalid
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            corrupt_store: parse_or(&lookup, CORRUPT_STORE_VAR, defaults.corrupt_store),
            hold_on_integrity_violation: parse_or(
                &lookup,
                HOLD_ON_VIOLATION_VAR,
                defaults.hold_on_integrity_violation,
            ),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default:?}");
        return default;
    };
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value: {e}, using default: {default:?}");
        default
    })
}
