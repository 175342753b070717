//! Chain Watcher (spec §4.2): one cooperative task per configured chain, polling
//! a bounded `[from, to]` window at `min_confirmations` depth and dispatching
//! deposits in ascending `(blockNumber, logIndex)` order. Grounded on the
//! teacher's `EvmWatcher::run`/`process_block_range` loop shape, generalized
//! from a single hardcoded chain to N chains behind the `ChainClient` trait.

use bridge_core::chain::ChainClient;
use bridge_core::config::ChainConfig;
use bridge_core::types::{DecodedDeposit, EvmAddress};
use eyre::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::db;
use crate::processor::RelayerProcessor;

pub struct ChainWatcher {
    chain: ChainConfig,
    client: Arc<dyn ChainClient>,
    pool: sqlx::PgPool,
    processor: Arc<RelayerProcessor>,
}

impl ChainWatcher {
    pub fn new(
        chain: ChainConfig,
        client: Arc<dyn ChainClient>,
        pool: sqlx::PgPool,
        processor: Arc<RelayerProcessor>,
    ) -> Self {
        Self { chain, client, pool, processor }
    }

    /// Runs until `shutdown` fires. On shutdown, finishes the in-flight window's
    /// dispatch but does not start a new one (spec §4.2 cancellation note).
    pub async fn run(&self, mut shutdown: mpsc::Receiver<()>) -> Result<()> {
        let bridge_address = EvmAddress::from_hex(&self.chain.bridge_address)?;

        loop {
            if shutdown.try_recv().is_ok() {
                info!(chain = %self.chain.name, "watcher shutting down");
                return Ok(());
            }

            if let Err(e) = self.poll_once(&bridge_address).await {
                error!(chain = %self.chain.name, error = %e, "watcher poll failed");
                bridge_core::metrics::record_error(&self.chain.name, "watch_poll");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.chain.poll_interval()) => {}
                _ = shutdown.recv() => {
                    info!(chain = %self.chain.name, "watcher shutting down");
                    return Ok(());
                }
            }
        }
    }

    async fn poll_once(&self, bridge_address: &EvmAddress) -> Result<()> {
        let cursor = db::get_cursor(&self.pool, self.chain.chain_id as i64).await?;
        let last_processed = cursor.as_ref().map(|c| c.last_block_number as u64).unwrap_or(
            self.chain.start_block.saturating_sub(1),
        );

        let head = self.client.head().await?;
        let confirmed_head = head.saturating_sub(self.chain.min_confirmations);

        if confirmed_head <= last_processed {
            return Ok(());
        }

        let from_block = last_processed + 1;
        let to_block = confirmed_head.min(from_block + self.chain.batch_size - 1);

        info!(
            chain = %self.chain.name,
            from_block,
            to_block,
            "scanning deposit window"
        );

        let mut deposits = self
            .client
            .deposit_logs(bridge_address, from_block, to_block)
            .await?;
        deposits.sort_by_key(|d| (d.block_number, d.log_index));

        let mut dispatched = 0i64;
        for deposit in &deposits {
            match self.dispatch(deposit).await {
                Ok(()) => dispatched += 1,
                Err(e) if e.is_retryable() => {
                    warn!(
                        chain = %self.chain.name,
                        tx_hash = %deposit.tx_hash,
                        error = %e,
                        "retryable dispatch failure — aborting window without advancing cursor"
                    );
                    return Ok(());
                }
                Err(e) => {
                    error!(
                        chain = %self.chain.name,
                        tx_hash = %deposit.tx_hash,
                        error = %e,
                        "terminal dispatch failure — skipping event"
                    );
                }
            }
        }

        let block_hash_hex = self.client.block_hash(to_block).await.ok().map(|h| format!("0x{}", hex::encode(h)));
        db::advance_cursor(
            &self.pool,
            self.chain.chain_id as i64,
            &self.chain.name,
            to_block as i64,
            block_hash_hex.as_deref(),
            dispatched,
        )
        .await?;

        for _ in 0..deposits.len() {
            bridge_core::metrics::record_event(&self.chain.name, "deposit");
        }
        bridge_core::metrics::record_cursor(&self.chain.name, to_block);
        bridge_core::metrics::record_block_processed(&self.chain.name);

        Ok(())
    }

    async fn dispatch(&self, deposit: &DecodedDeposit) -> Result<(), bridge_core::BridgeError> {
        self.processor.handle_deposit(&self.chain, deposit).await
    }
}
