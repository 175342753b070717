//! Indexer persistence layer (spec §4.5 / §6.3). Every public insert here runs
//! inside one `sqlx::Transaction` combining the `BridgeEvent` insert and the
//! `Transfer` upsert, so a crash never leaves an event recorded without its
//! Transfer side effect (spec §4.5's atomicity requirement). Pool/migration
//! shape grounded on `operator::db`'s `create_pool`/`run_migrations`.

pub mod models;

pub use models::*;

use eyre::{Result, WrapErr};
use sqlx::postgres::{PgPool, PgPoolOptions};

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .wrap_err("failed to connect to the indexer database")
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .wrap_err("failed to run indexer migrations")?;
    Ok(())
}

pub async fn event_exists(pool: &PgPool, tx_hash: &str, log_index: i64) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM bridge_events WHERE tx_hash = $1 AND log_index = $2",
    )
    .bind(tx_hash)
    .bind(log_index)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Deposit handling (spec §4.5 steps 1-3 plus the reverse-match requirement):
/// dedup, insert the raw event, upsert the Transfer, and complete it immediately
/// if a prior out-of-order Withdraw is already sitting uncorrelated.
///
/// Returns a plain `sqlx::Error` on failure (not wrapped in `eyre::Report`) so
/// callers can convert it straight into `BridgeError::StoreFailure` and keep
/// the retryable/terminal distinction spec §7 requires.
pub async fn record_deposit(pool: &PgPool, event: &NewDepositEvent) -> sqlx::Result<bool> {
    if event_exists(pool, &event.tx_hash, event.log_index).await? {
        return Ok(false);
    }

    let mut txn = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO bridge_events
            (tx_hash, log_index, event_type, chain_id, block_number, block_hash,
             timestamp, token, sender, recipient, amount, nonce, target_chain_id)
        VALUES ($1, $2, 'deposit', $3, $4, $5, now(), $6, $7, $8, $9::NUMERIC, $10, $11)
        "#,
    )
    .bind(&event.tx_hash)
    .bind(event.log_index)
    .bind(event.chain_id)
    .bind(event.block_number)
    .bind(&event.block_hash)
    .bind(&event.token)
    .bind(&event.sender)
    .bind(&event.recipient)
    .bind(&event.amount)
    .bind(event.nonce)
    .bind(event.target_chain_id)
    .execute(&mut *txn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO transfers
            (deposit_tx_hash, source_chain_id, target_chain_id, token, sender, recipient,
             amount, nonce, deposit_block, deposit_time, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7::NUMERIC, $8, $9, now(), 'pending')
        ON CONFLICT (deposit_tx_hash) DO NOTHING
        "#,
    )
    .bind(&event.tx_hash)
    .bind(event.chain_id)
    .bind(event.target_chain_id)
    .bind(&event.token)
    .bind(&event.sender)
    .bind(&event.recipient)
    .bind(&event.amount)
    .bind(event.nonce)
    .bind(event.block_number)
    .execute(&mut *txn)
    .await?;

    // Reverse match: an out-of-order Withdraw may already be sitting uncorrelated
    // for this (nonce, sourceChainId) pair.
    let prior_withdraw: Option<(String, i64, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
        r#"
        SELECT tx_hash, block_number, timestamp FROM bridge_events
        WHERE event_type = 'withdraw' AND nonce = $1 AND source_chain_id = $2
        AND NOT EXISTS (SELECT 1 FROM transfers WHERE withdraw_tx_hash = bridge_events.tx_hash)
        ORDER BY id ASC LIMIT 1
        "#,
    )
    .bind(event.nonce)
    .bind(event.chain_id)
    .fetch_optional(&mut *txn)
    .await?;

    if let Some((withdraw_tx_hash, withdraw_block, withdraw_time)) = prior_withdraw {
        sqlx::query(
            r#"
            UPDATE transfers SET withdraw_tx_hash = $2, withdraw_block = $3,
                withdraw_time = $4, status = 'completed'
            WHERE deposit_tx_hash = $1 AND withdraw_tx_hash IS NULL
            "#,
        )
        .bind(&event.tx_hash)
        .bind(&withdraw_tx_hash)
        .bind(withdraw_block)
        .bind(withdraw_time)
        .execute(&mut *txn)
        .await?;
    }

    txn.commit().await?;
    Ok(true)
}

/// Withdraw handling (spec §4.5 steps 1-3): dedup, insert the raw event, and
/// correlate to the matching deposit's Transfer by `(nonce, sourceChainId)` if
/// it has already arrived; otherwise leave it for the Deposit handler's reverse
/// match. Same `sqlx::Error` return convention as [`record_deposit`].
pub async fn record_withdraw(pool: &PgPool, event: &NewWithdrawEvent) -> sqlx::Result<bool> {
    if event_exists(pool, &event.tx_hash, event.log_index).await? {
        return Ok(false);
    }

    let mut txn = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO bridge_events
            (tx_hash, log_index, event_type, chain_id, block_number, block_hash,
             timestamp, token, recipient, amount, nonce, source_chain_id)
        VALUES ($1, $2, 'withdraw', $3, $4, $5, now(), $6, $7, $8::NUMERIC, $9, $10)
        "#,
    )
    .bind(&event.tx_hash)
    .bind(event.log_index)
    .bind(event.chain_id)
    .bind(event.block_number)
    .bind(&event.block_hash)
    .bind(&event.token)
    .bind(&event.recipient)
    .bind(&event.amount)
    .bind(event.nonce)
    .bind(event.source_chain_id)
    .execute(&mut *txn)
    .await?;

    sqlx::query(
        r#"
        UPDATE transfers SET withdraw_tx_hash = $3, withdraw_block = $4,
            withdraw_time = now(), status = 'completed'
        WHERE nonce = $1 AND source_chain_id = $2 AND withdraw_tx_hash IS NULL
        "#,
    )
    .bind(event.nonce)
    .bind(event.source_chain_id)
    .bind(&event.tx_hash)
    .bind(event.block_number)
    .execute(&mut *txn)
    .await?;

    txn.commit().await?;
    Ok(true)
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
