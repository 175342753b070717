//! Query Surface (spec §6.4), Relayer side: per-transaction signatures, for
//! pickup by a withdrawal-claiming UI when running in signature-collection
//! mode (`direct_submit = false`).

use eyre::{Result, WrapErr};
use sqlx::PgPool;

use crate::db::models::ValidatorSignature;

pub async fn signatures_for_tx(pool: &PgPool, source_tx_hash: &str) -> Result<Vec<ValidatorSignature>> {
    sqlx::query_as::<_, ValidatorSignature>(
        "SELECT * FROM validator_signatures WHERE source_tx_hash = $1 ORDER BY id",
    )
    .bind(source_tx_hash)
    .fetch_all(pool)
    .await
    .wrap_err("failed to list signatures for transaction")
}
