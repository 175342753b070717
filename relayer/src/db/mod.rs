//! Relayer persistence layer, grounded on `operator::db`'s pool/migration/query
//! shape (`PgPoolOptions::max_connections(10)`, `sqlx::migrate!`, `NUMERIC` cast
//! idiom) generalized from Approval/Release rows to BridgeTransaction/
//! ValidatorSignature/ChainCursor.

pub mod models;

pub use models::*;

use eyre::{Result, WrapErr};
use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .wrap_err("failed to connect to the relayer database")
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .wrap_err("failed to run relayer migrations")?;
    Ok(())
}

/// Upsert keyed by `source_tx_hash`, status fixed at `pending` on first insert.
/// Never overwrites an existing row's status or `target_tx_hash` (spec §4.4 step 3).
///
/// Returns a plain `sqlx::Error` on failure (not wrapped in `eyre::Report`) so
/// callers on the per-deposit dispatch path can convert it straight into
/// `BridgeError::StoreFailure` and keep the retryable/terminal distinction
/// spec §7 requires.
pub async fn upsert_pending_transaction(
    pool: &PgPool,
    tx: &NewBridgeTransaction,
) -> sqlx::Result<BridgeTransaction> {
    let row = sqlx::query_as::<_, BridgeTransaction>(
        r#"
        INSERT INTO bridge_transactions
            (source_tx_hash, source_chain, target_chain, token, sender, recipient,
             amount, nonce, block_number, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7::NUMERIC, $8, $9, 'pending')
        ON CONFLICT (source_tx_hash) DO UPDATE SET source_tx_hash = EXCLUDED.source_tx_hash
        RETURNING id, source_tx_hash, target_tx_hash, source_chain, target_chain, token,
                  sender, recipient, amount::TEXT as amount, nonce, block_number, status,
                  error, created_at, updated_at
        "#,
    )
    .bind(&tx.source_tx_hash)
    .bind(tx.source_chain)
    .bind(tx.target_chain)
    .bind(&tx.token)
    .bind(&tx.sender)
    .bind(&tx.recipient)
    .bind(&tx.amount)
    .bind(tx.nonce)
    .bind(tx.block_number)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn find_by_source_tx_hash(
    pool: &PgPool,
    source_tx_hash: &str,
) -> Result<Option<BridgeTransaction>> {
    let row = sqlx::query_as::<_, BridgeTransaction>(
        r#"SELECT id, source_tx_hash, target_tx_hash, source_chain, target_chain, token,
                  sender, recipient, amount::TEXT as amount, nonce, block_number, status,
                  error, created_at, updated_at
           FROM bridge_transactions WHERE source_tx_hash = $1"#,
    )
    .bind(source_tx_hash)
    .fetch_optional(pool)
    .await
    .wrap_err("failed to look up bridge transaction by source tx hash")?;
    Ok(row)
}

pub async fn transition_to_relaying(pool: &PgPool, id: i64) -> sqlx::Result<()> {
    sqlx::query(
        r#"UPDATE bridge_transactions SET status = 'relaying', updated_at = now()
           WHERE id = $1 AND status = 'pending'"#,
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_completed(pool: &PgPool, id: i64, target_tx_hash: &str) -> sqlx::Result<()> {
    sqlx::query(
        r#"UPDATE bridge_transactions SET status = 'completed', target_tx_hash = $2,
           updated_at = now() WHERE id = $1"#,
    )
    .bind(id)
    .bind(target_tx_hash)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn mark_failed(pool: &PgPool, id: i64, error: &str) -> sqlx::Result<()> {
    sqlx::query(
        r#"UPDATE bridge_transactions SET status = 'failed', error = $2, updated_at = now()
           WHERE id = $1"#,
    )
    .bind(id)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

/// Rows left `relaying` across a restart — reconciliation re-checks `isProcessed`
/// for each (spec §4.8 / §7's recovery note).
pub async fn get_relaying_transactions(pool: &PgPool) -> sqlx::Result<Vec<BridgeTransaction>> {
    let rows = sqlx::query_as::<_, BridgeTransaction>(
        r#"SELECT id, source_tx_hash, target_tx_hash, source_chain, target_chain, token,
                  sender, recipient, amount::TEXT as amount, nonce, block_number, status,
                  error, created_at, updated_at
           FROM bridge_transactions WHERE status = 'relaying'"#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn upsert_validator_signature(
    pool: &PgPool,
    source_tx_hash: &str,
    validator: &str,
    signature: &str,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO validator_signatures (source_tx_hash, validator, signature)
        VALUES ($1, $2, $3)
        ON CONFLICT (source_tx_hash, validator) DO NOTHING
        "#,
    )
    .bind(source_tx_hash)
    .bind(validator)
    .bind(signature)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_cursor(pool: &PgPool, chain_id: i64) -> Result<Option<ChainCursor>> {
    let row = sqlx::query_as::<_, ChainCursor>(
        r#"SELECT chain_id, chain_name, last_block_number, last_block_hash,
                  last_synced_at, total_events FROM chain_cursors WHERE chain_id = $1"#,
    )
    .bind(chain_id)
    .fetch_optional(pool)
    .await
    .wrap_err("failed to load chain cursor")?;
    Ok(row)
}

pub async fn advance_cursor(
    pool: &PgPool,
    chain_id: i64,
    chain_name: &str,
    last_block_number: i64,
    last_block_hash: Option<&str>,
    events_in_window: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO chain_cursors (chain_id, chain_name, last_block_number, last_block_hash,
            last_synced_at, total_events)
        VALUES ($1, $2, $3, $4, now(), $5)
        ON CONFLICT (chain_id) DO UPDATE SET
            last_block_number = EXCLUDED.last_block_number,
            last_block_hash = EXCLUDED.last_block_hash,
            last_synced_at = now(),
            total_events = chain_cursors.total_events + EXCLUDED.total_events
        "#,
    )
    .bind(chain_id)
    .bind(chain_name)
    .bind(last_block_number)
    .bind(last_block_hash)
    .bind(events_in_window)
    .execute(pool)
    .await
    .wrap_err("failed to advance chain cursor")?;
    Ok(())
}
