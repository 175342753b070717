//! Chain Watcher (spec §4.2, generalized for the Indexer): one cooperative
//! task per configured chain, polling a bounded `[from, to]` window at
//! `min_confirmations` depth and dispatching both Deposit and Withdraw logs
//! in ascending `(blockNumber, logIndex)` order. Same loop shape as the
//! Relayer's `ChainWatcher`, including the retryable/terminal dispatch-failure
//! split: a retryable `BridgeError` (e.g. a transient `StoreFailure`) aborts
//! the whole window without advancing the cursor, regardless of which of the
//! two interleaved event streams it came from; a terminal failure is logged
//! and skipped.

use bridge_core::chain::ChainClient;
use bridge_core::config::ChainConfig;
use bridge_core::types::EvmAddress;
use eyre::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::db;
use crate::processor::IndexerProcessor;

pub struct ChainWatcher {
    chain: ChainConfig,
    client: Arc<dyn ChainClient>,
    pool: sqlx::PgPool,
    processor: Arc<IndexerProcessor>,
}

impl ChainWatcher {
    pub fn new(
        chain: ChainConfig,
        client: Arc<dyn ChainClient>,
        pool: sqlx::PgPool,
        processor: Arc<IndexerProcessor>,
    ) -> Self {
        Self { chain, client, pool, processor }
    }

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

        info!(chain = %self.chain.name, from_block, to_block, "scanning event window");

        let mut deposits = self.client.deposit_logs(bridge_address, from_block, to_block).await?;
        deposits.sort_by_key(|d| (d.block_number, d.log_index));

        let mut withdraws = self.client.withdraw_logs(bridge_address, from_block, to_block).await?;
        withdraws.sort_by_key(|w| (w.block_number, w.log_index));

        let mut processed = 0i64;

        for deposit in &deposits {
            match self.processor.handle_deposit(self.chain.chain_id, deposit).await {
                Ok(()) => {
                    processed += 1;
                    bridge_core::metrics::record_event(&self.chain.name, "deposit");
                }
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

        for withdraw in &withdraws {
            match self.processor.handle_withdraw(self.chain.chain_id, withdraw).await {
                Ok(()) => {
                    processed += 1;
                    bridge_core::metrics::record_event(&self.chain.name, "withdraw");
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        chain = %self.chain.name,
                        tx_hash = %withdraw.tx_hash,
                        error = %e,
                        "retryable dispatch failure — aborting window without advancing cursor"
                    );
                    return Ok(());
                }
                Err(e) => {
                    error!(
                        chain = %self.chain.name,
                        tx_hash = %withdraw.tx_hash,
                        error = %e,
                        "terminal dispatch failure — skipping event"
                    );
                }
            }
        }

        let block_hash_hex = self
            .client
            .block_hash(to_block)
            .await
            .ok()
            .map(|h| format!("0x{}", hex::encode(h)));
        db::advance_cursor(
            &self.pool,
            self.chain.chain_id as i64,
            &self.chain.name,
            to_block as i64,
            block_hash_hex.as_deref(),
            processed,
        )
        .await?;

        bridge_core::metrics::record_cursor(&self.chain.name, to_block);
        bridge_core::metrics::record_block_processed(&self.chain.name);

        Ok(())
    }
}
