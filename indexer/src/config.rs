//! Indexer configuration: a chain list plus database URL — no signer, no
//! submission tuning. Trimmed from the same env-loading shape as the Relayer's
//! `RelayerConfig` (itself grounded on `operator::config::Config`).

use bridge_core::config::ChainConfig;
use eyre::{eyre, Result, WrapErr};
use std::env;
use std::fmt;

#[derive(Clone)]
pub struct IndexerConfig {
    pub database_url: String,
    pub chains: Vec<ChainConfig>,
    pub log_level: String,
}

impl fmt::Debug for IndexerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexerConfig")
            .field("database_url", &"<redacted>")
            .field("chains", &self.chains)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl IndexerConfig {
    pub fn load() -> Result<Self> {
        bridge_core::config::load_dotenv();
        Self::load_from_env()
    }

    fn load_from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| eyre!("DATABASE_URL environment variable is required"))?;

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

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(IndexerConfig { database_url, chains, log_level })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_database_url() {
        let cfg = IndexerConfig {
            database_url: "postgres://user:pw@localhost/test".into(),
            chains: vec![],
            log_level: "info".into(),
        };
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("user:pw"));
    }
}
