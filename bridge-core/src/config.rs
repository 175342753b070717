//! Shared configuration fragments: the per-chain binding both services read
//! (spec §6.5). Relayer- and Indexer-specific wrapping config lives in their own
//! binary crates; this is only the part that is genuinely identical between them.

use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::env;
use std::fmt;

/// One EVM chain binding: RPC endpoint, bridge contract, and watcher tuning.
#[derive(Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub bridge_address: String,
    #[serde(default = "default_start_block")]
    pub start_block: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_min_confirmations")]
    pub min_confirmations: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .field("bridge_address", &self.bridge_address)
            .field("start_block", &self.start_block)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("min_confirmations", &self.min_confirmations)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl ChainConfig {
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }

    /// Read a prefixed chain config from the environment, e.g. prefix `CHAIN_1`
    /// reads `CHAIN_1_RPC_URL`, `CHAIN_1_BRIDGE_ADDRESS`, etc.
    pub fn from_env_prefix(prefix: &str) -> Result<Self> {
        let get = |suffix: &str| -> Result<String> {
            let key = format!("{prefix}_{suffix}");
            env::var(&key).map_err(|_| eyre!("{key} environment variable is required"))
        };
        let get_opt = |suffix: &str, default: u64| -> Result<u64> {
            let key = format!("{prefix}_{suffix}");
            match env::var(&key) {
                Ok(v) => v.parse().wrap_err_with(|| format!("{key} must be a u64")),
                Err(_) => Ok(default),
            }
        };

        Ok(ChainConfig {
            name: get("NAME").unwrap_or_else(|_| prefix.to_lowercase()),
            chain_id: get("CHAIN_ID")?.parse().wrap_err("CHAIN_ID must be a u64")?,
            rpc_url: get("RPC_URL")?,
            bridge_address: get("BRIDGE_ADDRESS")?,
            start_block: get_opt("START_BLOCK", default_start_block())?,
            poll_interval_ms: get_opt("POLL_INTERVAL_MS", default_poll_interval_ms())?,
            min_confirmations: get_opt("MIN_CONFIRMATIONS", default_min_confirmations())?,
            batch_size: get_opt("BATCH_SIZE", default_batch_size())?,
        })
    }
}

fn default_start_block() -> u64 {
    0
}

fn default_poll_interval_ms() -> u64 {
    12_000
}

fn default_min_confirmations() -> u64 {
    12
}

fn default_batch_size() -> u64 {
    1_000
}

/// Load a `.env` file if present, then fall through to the real environment —
/// matches the teacher's `Config::load_from_file(".env").or_else(load_from_env)`.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_converts_millis() {
        let cfg = ChainConfig {
            name: "test".into(),
            chain_id: 1,
            rpc_url: "http://localhost:8545".into(),
            bridge_address: "0x0000000000000000000000000000000000000000".into(),
            start_block: 0,
            poll_interval_ms: 5000,
            min_confirmations: 12,
            batch_size: 1000,
        };
        assert_eq!(cfg.poll_interval(), std::time::Duration::from_secs(5));
    }

    #[test]
    fn debug_does_not_panic_and_includes_rpc_url() {
        let cfg = ChainConfig {
            name: "test".into(),
            chain_id: 1,
            rpc_url: "http://localhost:8545".into(),
            bridge_address: "0x0".into(),
            start_block: 0,
            poll_interval_ms: 1000,
            min_confirmations: 1,
            batch_size: 100,
        };
        let debug = format!("{:?}", cfg);
        assert!(debug.contains("http://localhost:8545"));
    }
}
