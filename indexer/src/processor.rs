//! Indexer event processing (spec §4.5): turns decoded Deposit/Withdraw logs
//! into `BridgeEvent` rows and correlates them into `Transfer` rows, including
//! out-of-order arrivals. Grounded on the Relayer's `RelayerProcessor` shape,
//! generalized to not require signing or submission.

use bridge_core::types::{DecodedDeposit, DecodedWithdraw};
use bridge_core::BridgeError;
use tracing::warn;

use crate::db::{self, NewDepositEvent, NewWithdrawEvent};

pub struct IndexerProcessor {
    pool: sqlx::PgPool,
}

impl IndexerProcessor {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub async fn handle_deposit(
        &self,
        chain_id: u64,
        deposit: &DecodedDeposit,
    ) -> Result<(), BridgeError> {
        let event = NewDepositEvent {
            tx_hash: deposit.tx_hash.to_hex(),
            log_index: deposit.log_index as i64,
            chain_id: chain_id as i64,
            block_number: deposit.block_number as i64,
            block_hash: deposit.block_hash.to_hex(),
            token: deposit.token.to_checksum_hex(),
            sender: deposit.sender.to_checksum_hex(),
            recipient: deposit.recipient.to_checksum_hex(),
            amount: deposit.amount.clone(),
            nonce: deposit.nonce as i64,
            target_chain_id: deposit.target_chain_id as i64,
        };

        let inserted = db::record_deposit(&self.pool, &event).await?;
        if !inserted {
            warn!(tx_hash = %event.tx_hash, "duplicate deposit event, ignored");
        }
        Ok(())
    }

    pub async fn handle_withdraw(
        &self,
        chain_id: u64,
        withdraw: &DecodedWithdraw,
    ) -> Result<(), BridgeError> {
        let event = NewWithdrawEvent {
            tx_hash: withdraw.tx_hash.to_hex(),
            log_index: withdraw.log_index as i64,
            chain_id: chain_id as i64,
            block_number: withdraw.block_number as i64,
            block_hash: withdraw.block_hash.to_hex(),
            token: withdraw.token.to_checksum_hex(),
            recipient: withdraw.recipient.to_checksum_hex(),
            amount: withdraw.amount.clone(),
            nonce: withdraw.nonce as i64,
            source_chain_id: withdraw.source_chain_id as i64,
        };

        let inserted = db::record_withdraw(&self.pool, &event).await?;
        if !inserted {
            warn!(tx_hash = %event.tx_hash, "duplicate withdraw event, ignored");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_deposit_to_new_event_preserves_identity() {
        let hash = bridge_core::types::TxHash([0u8; 32]);
        assert_eq!(hash.to_hex(), "0x".to_string() + &"00".repeat(32));
    }
}
