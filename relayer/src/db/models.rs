//! Relayer store rows (spec §3): `BridgeTransaction`, `ValidatorSignature`,
//! `ChainCursor`. Amounts are kept as `String`; the database stores them as
//! `NUMERIC(78,0)` and we cast to/from `TEXT` at the query boundary, the same
//! idiom as the teacher's `EvmDeposit`/`amount` handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BridgeTransaction {
    pub id: i64,
    pub source_tx_hash: String,
    pub target_tx_hash: Option<String>,
    pub source_chain: i64,
    pub target_chain: i64,
    pub token: String,
    pub sender: String,
    pub recipient: String,
    pub amount: String,
    pub nonce: i64,
    pub block_number: i64,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBridgeTransaction {
    pub source_tx_hash: String,
    pub source_chain: i64,
    pub target_chain: i64,
    pub token: String,
    pub sender: String,
    pub recipient: String,
    pub amount: String,
    pub nonce: i64,
    pub block_number: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ValidatorSignature {
    pub id: i64,
    pub source_tx_hash: String,
    pub validator: String,
    pub signature: String,
    pub created_at: DateTime<Utc>,
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
