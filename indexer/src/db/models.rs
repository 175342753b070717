//! Indexer store rows (spec §3): `BridgeEvent`, `Transfer`, `ChainCursor` (the
//! Indexer's own cursor copy — distinct from the Relayer's, per spec §9's note
//! that the two stores are intentionally not unified).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BridgeEvent {
    pub id: i64,
    pub tx_hash: String,
    pub log_index: i64,
    pub event_type: String,
    pub chain_id: i64,
    pub block_number: i64,
    pub block_hash: String,
    pub timestamp: DateTime<Utc>,
    pub token: String,
    pub sender: Option<String>,
    pub recipient: String,
    pub amount: String,
    pub nonce: i64,
    pub source_chain_id: Option<i64>,
    pub target_chain_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewDepositEvent {
    pub tx_hash: String,
    pub log_index: i64,
    pub chain_id: i64,
    pub block_number: i64,
    pub block_hash: String,
    pub token: String,
    pub sender: String,
    pub recipient: String,
    pub amount: String,
    pub nonce: i64,
    pub target_chain_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewWithdrawEvent {
    pub tx_hash: String,
    pub log_index: i64,
    pub chain_id: i64,
    pub block_number: i64,
    pub block_hash: String,
    pub token: String,
    pub recipient: String,
    pub amount: String,
    pub nonce: i64,
    pub source_chain_id: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub deposit_tx_hash: String,
    pub withdraw_tx_hash: Option<String>,
    pub source_chain_id: i64,
    pub target_chain_id: i64,
    pub token: String,
    pub sender: String,
    pub recipient: String,
    pub amount: String,
    pub nonce: i64,
    pub deposit_block: i64,
    pub withdraw_block: Option<i64>,
    pub deposit_time: DateTime<Utc>,
    pub withdraw_time: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChainCursor {
    pub chain_id: i64,
    pub chain_name: String,
    pub last_block_number: i64,
    pub last_block_hash: Option<String>,
    pub last_synced_at: DateTime<Utc>,
    pub total_events: i64,
}
