//! Relayer Processor (spec §4.4): validate → upsert pending → transition to
//! relaying → `isProcessed` short-circuit → liquidity check → sign → submit
//! with gas discipline and retry → commit to completed/failed. Grounded on the
//! teacher's `EvmWriter::process_deposit`/`submit_approval` pipeline shape,
//! generalized from Terra→EVM approval to arbitrary chain-pair withdrawal.

use alloy::primitives::U256;
use bridge_core::chain::ChainClient;
use bridge_core::config::ChainConfig;
use bridge_core::hash::inner_hash;
use bridge_core::retry::{classify_error, RetryConfig};
use bridge_core::signer::Signer;
use bridge_core::types::{DecodedDeposit, EvmAddress};
use bridge_core::validator::{validate_deposit_params, DepositParams};
use bridge_core::BridgeError;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::RelayerConfig;
use crate::db;

pub struct RelayerProcessor {
    pool: sqlx::PgPool,
    /// Chains this relayer can submit withdrawals on, keyed by `chainId`.
    submit_clients: HashMap<u64, Arc<dyn ChainClient>>,
    signer: Signer,
    config: RelayerConfig,
    retry: RetryConfig,
}

impl RelayerProcessor {
    pub fn new(
        pool: sqlx::PgPool,
        submit_clients: HashMap<u64, Arc<dyn ChainClient>>,
        signer: Signer,
        config: RelayerConfig,
    ) -> Self {
        Self {
            pool,
            submit_clients,
            signer,
            config,
            retry: RetryConfig::default(),
        }
    }

    pub async fn handle_deposit(
        &self,
        chain: &ChainConfig,
        deposit: &DecodedDeposit,
    ) -> Result<(), BridgeError> {
        let token_hex = deposit.token.to_lower_hex();
        let sender_hex = deposit.sender.to_lower_hex();
        let recipient_hex = deposit.recipient.to_lower_hex();
        let tx_hash_hex = deposit.tx_hash.to_hex();
        let params = DepositParams {
            token: &token_hex,
            sender: &sender_hex,
            recipient: &recipient_hex,
            amount: &deposit.amount,
            nonce: deposit.nonce as i64,
            source_chain_id: chain.chain_id,
            target_chain_id: deposit.target_chain_id,
            block_number: deposit.block_number,
            tx_hash: &tx_hash_hex,
        };
        let validation = validate_deposit_params(&params);
        if !validation.ok() {
            return Err(BridgeError::InvalidEvent(validation.errors.join("; ")));
        }

        let tx = db::upsert_pending_transaction(
            &self.pool,
            &db::NewBridgeTransaction {
                source_tx_hash: deposit.tx_hash.to_hex(),
                source_chain: chain.chain_id as i64,
                target_chain: deposit.target_chain_id as i64,
                token: deposit.token.to_lower_hex(),
                sender: deposit.sender.to_lower_hex(),
                recipient: deposit.recipient.to_lower_hex(),
                amount: deposit.amount.clone(),
                nonce: deposit.nonce as i64,
                block_number: deposit.block_number as i64,
            },
        )
        .await
        .map_err(BridgeError::StoreFailure)?;

        if tx.status != "pending" {
            // Already past the pending stage (dedup — scenario 2/6).
            return Ok(());
        }

        db::transition_to_relaying(&self.pool, tx.id)
            .await
            .map_err(BridgeError::StoreFailure)?;

        self.relay(chain, deposit, tx.id).await
    }

    async fn relay(
        &self,
        source_chain: &ChainConfig,
        deposit: &DecodedDeposit,
        tx_id: i64,
    ) -> Result<(), BridgeError> {
        let target_client = self.submit_clients.get(&deposit.target_chain_id).ok_or_else(|| {
            BridgeError::TerminalRpc(format!(
                "no submit client configured for target chain {}",
                deposit.target_chain_id
            ))
        })?;

        let amount = U256::from_str(&deposit.amount)
            .map_err(|e| BridgeError::InvalidEvent(format!("amount not parseable: {e}")))?;
        let nonce = U256::from(deposit.nonce);

        let target_chain_config = self.config.chain(deposit.target_chain_id).ok_or_else(|| {
            BridgeError::TerminalRpc(format!(
                "no chain config for target chain {}",
                deposit.target_chain_id
            ))
        })?;
        let target_bridge = EvmAddress::from_hex(&target_chain_config.bridge_address)
            .map_err(|e| BridgeError::TerminalRpc(format!("invalid target bridge address: {e}")))?;

        let message_hash = inner_hash(
            &deposit.token,
            &deposit.recipient,
            amount,
            nonce,
            source_chain.chain_id,
            deposit.target_chain_id,
        );

        if target_client
            .is_processed(&target_bridge, message_hash)
            .await
            .unwrap_or(false)
        {
            info!(source_tx_hash = %deposit.tx_hash, "already processed on target — short-circuiting (scenario 5)");
            db::mark_completed(&self.pool, tx_id, "")
                .await
                .map_err(BridgeError::StoreFailure)?;
            return Ok(());
        }

        let balance = if deposit.token.is_native() {
            target_client.native_balance(&deposit.recipient).await
        } else {
            target_client.erc20_balance_of(&deposit.token, &deposit.recipient).await
        }
        .unwrap_or(U256::ZERO);

        if balance < amount {
            let msg = format!(
                "insufficient bridge balance: have {balance}, need {amount}"
            );
            warn!(source_tx_hash = %deposit.tx_hash, %msg, "liquidity check failed");
            db::mark_failed(&self.pool, tx_id, &msg)
                .await
                .map_err(BridgeError::StoreFailure)?;
            return Err(BridgeError::InsufficientLiquidity(msg));
        }

        let (_, signature) = self
            .signer
            .sign_withdrawal(
                &deposit.token,
                &deposit.recipient,
                amount,
                nonce,
                source_chain.chain_id,
                deposit.target_chain_id,
            )
            .await
            .map_err(|e| BridgeError::TerminalRpc(e.to_string()))?;

        if !self.config.direct_submit {
            db::upsert_validator_signature(
                &self.pool,
                &deposit.tx_hash.to_hex(),
                &self.signer.address_as_evm().to_lower_hex(),
                &signature.to_hex(),
            )
            .await
            .map_err(BridgeError::StoreFailure)?;
            info!(source_tx_hash = %deposit.tx_hash, "stored validator signature (store-signature mode)");
            return Ok(());
        }

        let signatures = vec![signature.0.to_vec()];
        self.submit_with_retry(
            target_client.as_ref(),
            &target_bridge,
            source_chain,
            deposit,
            amount,
            nonce,
            &signatures,
            tx_id,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn submit_with_retry(
        &self,
        target_client: &dyn ChainClient,
        target_bridge: &EvmAddress,
        source_chain: &ChainConfig,
        deposit: &DecodedDeposit,
        amount: U256,
        nonce: U256,
        signatures: &[Vec<u8>],
        tx_id: i64,
    ) -> Result<(), BridgeError> {
        let base_gas_price = target_client
            .fee_data()
            .await
            .map(|f| f.gas_price)
            .unwrap_or(20_000_000_000);
        let max_gas_price = (self.config.max_gas_price_gwei as u128) * 1_000_000_000;

        let mut last_err = None;
        for attempt in 0..=self.retry.max_retries {
            let gas_price = self
                .retry
                .gas_price_for_attempt(base_gas_price, attempt)
                .min(max_gas_price);

            let gas_limit = target_client
                .estimate_withdraw_gas(
                    target_bridge,
                    &deposit.token,
                    &deposit.recipient,
                    amount,
                    nonce,
                    source_chain.chain_id,
                    signatures,
                )
                .await
                .map(|g| (g as f64 * self.config.gas_limit_multiplier) as u64)
                .unwrap_or(250_000);

            match target_client
                .submit_withdraw(
                    target_bridge,
                    &deposit.token,
                    &deposit.recipient,
                    amount,
                    nonce,
                    source_chain.chain_id,
                    signatures,
                    gas_limit,
                    gas_price,
                )
                .await
            {
                Ok(tx_hash) => {
                    let receipt = target_client
                        .wait_receipt(&tx_hash, 1, Duration::from_secs(120))
                        .await
                        .map_err(|e| BridgeError::TerminalRpc(e.to_string()))?;
                    if receipt.success {
                        db::mark_completed(&self.pool, tx_id, &tx_hash.to_hex())
                            .await
                            .map_err(BridgeError::StoreFailure)?;
                        bridge_core::metrics::record_withdrawal(&source_chain.name, "completed");
                        return Ok(());
                    } else {
                        let msg = format!("withdraw transaction reverted: {tx_hash}");
                        db::mark_failed(&self.pool, tx_id, &msg)
                            .await
                            .map_err(BridgeError::StoreFailure)?;
                        return Err(BridgeError::TerminalRpc(msg));
                    }
                }
                Err(e) => {
                    let class = classify_error(&e.to_string());
                    if !class.is_retryable() || !self.retry.should_retry(attempt) {
                        let msg = e.to_string();
                        db::mark_failed(&self.pool, tx_id, &msg)
                            .await
                            .map_err(BridgeError::StoreFailure)?;
                        bridge_core::metrics::record_withdrawal(&source_chain.name, "failed");
                        return Err(e);
                    }
                    warn!(attempt, error = %e, "submission failed, retrying");
                    last_err = Some(e);
                    tokio::time::sleep(self.retry.backoff_for_attempt(attempt)).await;
                }
            }
        }

        let msg = last_err.map(|e| e.to_string()).unwrap_or_else(|| "exhausted retries".into());
        db::mark_failed(&self.pool, tx_id, &msg)
            .await
            .map_err(BridgeError::StoreFailure)?;
        Err(BridgeError::TerminalRpc(msg))
    }
}
