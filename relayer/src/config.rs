//! Relayer configuration (spec §6.5). Loaded the way the teacher's
//! `operator::config::Config` is: an optional `.env` file followed by the real
//! environment, with every secret field carrying a redacting `Debug` impl.

use bridge_core::config::ChainConfig;
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;

#[derive(Clone)]
pub struct RelayerConfig {
    pub database_url: String,
    pub chains: Vec<ChainConfig>,
    pub validator_private_key: String,
    /// When true, the Processor signs and submits `withdraw()` itself
    /// (single-validator / dev mode). When false, it only persists a
    /// `ValidatorSignature` row for out-of-band pickup — spec §9's
    /// "store signatures" vs "submit directly" switch.
    pub direct_submit: bool,
    pub max_gas_price_gwei: u64,
    pub gas_limit_multiplier: f64,
    pub log_level: String,
    pub shutdown_grace_period_secs: u64,
}

impl fmt::Debug for RelayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayerConfig")
            .field("database_url", &"<redacted>")
            .field("chains", &self.chains)
            .field("validator_private_key", &"<redacted>")
            .field("direct_submit", &self.direct_submit)
            .field("max_gas_price_gwei", &self.max_gas_price_gwei)
            .field("gas_limit_multiplier", &self.gas_limit_multiplier)
            .field("log_level", &self.log_level)
            .field("shutdown_grace_period_secs", &self.shutdown_grace_period_secs)
            .finish()
    }
}

fn default_max_gas_price_gwei() -> u64 {
    100
}

fn default_gas_limit_multiplier() -> f64 {
    1.2
}

fn default_shutdown_grace_period_secs() -> u64 {
    30
}

impl RelayerConfig {
    /// Load configuration from a `.env` file if present, then the environment.
    pub fn load() -> Result<Self> {
        bridge_core::config::load_dotenv();
        Self::load_from_env()
    }

    fn load_from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| eyre!("DATABASE_URL environment variable is required"))?;

        let validator_private_key = env::var("VALIDATOR_PRIVATE_KEY")
            .map_err(|_| eyre!("VALIDATOR_PRIVATE_KEY environment variable is required"))?;

        let chain_count: usize = env::var("CHAIN_COUNT")
            .map_err(|_| eyre!("CHAIN_COUNT environment variable is required"))?
            .parse()
            .wrap_err("CHAIN_COUNT must be a usize")?;
        if chain_count == 0 {
            return Err(eyre!("CHAIN_COUNT must list at least one chain"));
        }

        let mut chains = Vec::with_capacity(chain_count);
        for i in 1..=chain_count {
            chains.push(ChainConfig::from_env_prefix(&format!("CHAIN_{i}"))?);
        }
        if chains.len() < 2 {
            return Err(eyre!(
                "the relayer needs at least two distinct chains configured (a source and a target)"
            ));
        }

        let direct_submit = env::var("DIRECT_SUBMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        let max_gas_price_gwei = env::var("MAX_GAS_PRICE_GWEI")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_max_gas_price_gwei);

        let gas_limit_multiplier = env::var("GAS_LIMIT_MULTIPLIER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_gas_limit_multiplier);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let shutdown_grace_period_secs = env::var("SHUTDOWN_GRACE_PERIOD_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_shutdown_grace_period_secs);

        Ok(RelayerConfig {
            database_url,
            chains,
            validator_private_key,
            direct_submit,
            max_gas_price_gwei,
            gas_limit_multiplier,
            log_level,
            shutdown_grace_period_secs,
        })
    }

    pub fn chain(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chain(id: u64) -> ChainConfig {
        ChainConfig {
            name: format!("chain-{id}"),
            chain_id: id,
            rpc_url: "http://localhost:8545".into(),
            bridge_address: "0x0000000000000000000000000000000000000000".into(),
            start_block: 0,
            poll_interval_ms: 12_000,
            min_confirmations: 12,
            batch_size: 1000,
        }
    }

    #[test]
    fn chain_lookup_by_id() {
        let cfg = RelayerConfig {
            database_url: "postgres://localhost/test".into(),
            chains: vec![sample_chain(1), sample_chain(137)],
            validator_private_key: "0xabc".into(),
            direct_submit: true,
            max_gas_price_gwei: 100,
            gas_limit_multiplier: 1.2,
            log_level: "info".into(),
            shutdown_grace_period_secs: 30,
        };
        assert!(cfg.chain(137).is_some());
        assert!(cfg.chain(999).is_none());
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = RelayerConfig {
            database_url: "postgres://user:pw@localhost/test".into(),
            chains: vec![sample_chain(1)],
            validator_private_key: "0xsecretkey".into(),
            direct_submit: true,
            max_gas_price_gwei: 100,
            gas_limit_multiplier: 1.2,
            log_level: "info".into(),
            shutdown_grace_period_secs: 30,
        };
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("secretkey"));
        assert!(!debug.contains("user:pw"));
    }
}
