//! Query Surface (spec §6.4): read-only views over events and transfers,
//! consumed by whatever presentation layer sits in front of the Indexer
//! (out of scope here — these are library functions, not HTTP handlers).

use eyre::{Result, WrapErr};
use sqlx::PgPool;

use crate::db::models::{BridgeEvent, ChainCursor, Transfer};

const DEFAULT_EVENT_LIMIT: i64 = 50;
const MAX_EVENT_LIMIT: i64 = 100;

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_EVENT_LIMIT).clamp(1, MAX_EVENT_LIMIT)
}

/// Most recent events, newest first by block number (spec §6.4 bullet 1).
pub async fn recent_events(pool: &PgPool, limit: Option<i64>) -> Result<Vec<BridgeEvent>> {
    sqlx::query_as::<_, BridgeEvent>(
        "SELECT * FROM bridge_events ORDER BY block_number DESC, log_index DESC LIMIT $1",
    )
    .bind(clamp_limit(limit))
    .fetch_all(pool)
    .await
    .wrap_err("failed to list recent events")
}

pub async fn events_by_chain(pool: &PgPool, chain_id: i64, limit: Option<i64>) -> Result<Vec<BridgeEvent>> {
    sqlx::query_as::<_, BridgeEvent>(
        r#"SELECT * FROM bridge_events WHERE chain_id = $1
           ORDER BY block_number DESC, log_index DESC LIMIT $2"#,
    )
    .bind(chain_id)
    .bind(clamp_limit(limit))
    .fetch_all(pool)
    .await
    .wrap_err("failed to list events by chain")
}

/// Events where `address` appears as sender OR recipient, matched case-insensitively.
pub async fn events_by_address(pool: &PgPool, address: &str, limit: Option<i64>) -> Result<Vec<BridgeEvent>> {
    let needle = address.to_lowercase();
    sqlx::query_as::<_, BridgeEvent>(
        r#"SELECT * FROM bridge_events
           WHERE lower(recipient) = $1 OR lower(sender) = $1
           ORDER BY block_number DESC, log_index DESC LIMIT $2"#,
    )
    .bind(needle)
    .bind(clamp_limit(limit))
    .fetch_all(pool)
    .await
    .wrap_err("failed to list events by address")
}

pub async fn transfers(pool: &PgPool, status: Option<&str>, limit: Option<i64>) -> Result<Vec<Transfer>> {
    match status {
        Some(status) => sqlx::query_as::<_, Transfer>(
            "SELECT * FROM transfers WHERE status = $1 ORDER BY deposit_block DESC LIMIT $2",
        )
        .bind(status)
        .bind(clamp_limit(limit))
        .fetch_all(pool)
        .await
        .wrap_err("failed to list transfers by status"),
        None => sqlx::query_as::<_, Transfer>(
            "SELECT * FROM transfers ORDER BY deposit_block DESC LIMIT $1",
        )
        .bind(clamp_limit(limit))
        .fetch_all(pool)
        .await
        .wrap_err("failed to list transfers"),
    }
}

pub async fn pending_transfers(pool: &PgPool, limit: Option<i64>) -> Result<Vec<Transfer>> {
    transfers(pool, Some("pending"), limit).await
}

pub async fn transfers_by_address(pool: &PgPool, address: &str, limit: Option<i64>) -> Result<Vec<Transfer>> {
    let needle = address.to_lowercase();
    sqlx::query_as::<_, Transfer>(
        r#"SELECT * FROM transfers
           WHERE lower(recipient) = $1 OR lower(sender) = $1
           ORDER BY deposit_block DESC LIMIT $2"#,
    )
    .bind(needle)
    .bind(clamp_limit(limit))
    .fetch_all(pool)
    .await
    .wrap_err("failed to list transfers by address")
}

pub async fn transfer_by_deposit_tx_hash(pool: &PgPool, tx_hash: &str) -> Result<Option<Transfer>> {
    sqlx::query_as::<_, Transfer>("SELECT * FROM transfers WHERE deposit_tx_hash = $1")
        .bind(tx_hash)
        .fetch_optional(pool)
        .await
        .wrap_err("failed to look up transfer by deposit tx hash")
}

pub async fn sync_status(pool: &PgPool) -> Result<Vec<ChainCursor>> {
    sqlx::query_as::<_, ChainCursor>("SELECT * FROM chain_cursors ORDER BY chain_id")
        .fetch_all(pool)
        .await
        .wrap_err("failed to load sync status")
}

#[cfg(test)]
mod tests {
    use super::clamp_limit;

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(5)), 5);
        assert_eq!(clamp_limit(Some(500)), 100);
        assert_eq!(clamp_limit(Some(0)), 1);
    }
}
