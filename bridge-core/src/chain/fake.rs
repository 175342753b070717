//! In-memory [`ChainClient`] double used by watcher/processor unit tests — no RPC
//! endpoint required. Grounded on the same role the teacher's `MockOperator`-style
//! test scaffolding plays in `operator`'s test modules, generalized into a reusable
//! fake instead of ad hoc per-test structs.

use alloy::primitives::U256;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use crate::chain::client::{ChainClient, FeeData, ReceiptInfo};
use crate::error::BridgeError;
use crate::types::{DecodedDeposit, DecodedWithdraw, EvmAddress, TxHash};

/// A scripted chain: a fixed log history plus a mutable `processed` set and a
/// movable `head`, so tests can simulate confirmation delay and reorg-free catch-up.
#[derive(Default)]
pub struct FakeChainClient {
    head: Mutex<u64>,
    deposits: Vec<DecodedDeposit>,
    withdraws: Vec<DecodedWithdraw>,
    processed: Mutex<HashSet<[u8; 32]>>,
    gas_price: u128,
    submissions: Mutex<Vec<TxHash>>,
    fail_next_submit: Mutex<bool>,
}

impl FakeChainClient {
    pub fn new(head: u64) -> Self {
        Self {
            head: Mutex::new(head),
            gas_price: 20_000_000_000,
            ..Default::default()
        }
    }

    pub fn with_deposit(mut self, deposit: DecodedDeposit) -> Self {
        self.deposits.push(deposit);
        self
    }

    pub fn with_withdraw(mut self, withdraw: DecodedWithdraw) -> Self {
        self.withdraws.push(withdraw);
        self
    }

    pub fn mark_processed(&self, message_hash: [u8; 32]) {
        self.processed.lock().unwrap().insert(message_hash);
    }

    pub fn set_head(&self, head: u64) {
        *self.head.lock().unwrap() = head;
    }

    pub fn fail_next_submit(&self) {
        *self.fail_next_submit.lock().unwrap() = true;
    }

    pub fn submissions(&self) -> Vec<TxHash> {
        self.submissions.lock().unwrap().clone()
    }
}

fn fake_tx_hash(seed: u64) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&seed.to_be_bytes());
    TxHash(bytes)
}

#[async_trait]
impl ChainClient for FakeChainClient {
    async fn head(&self) -> Result<u64, BridgeError> {
        Ok(*self.head.lock().unwrap())
    }

    async fn block_hash(&self, number: u64) -> Result<[u8; 32], BridgeError> {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&number.to_be_bytes());
        Ok(bytes)
    }

    async fn deposit_logs(
        &self,
        _bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedDeposit>, BridgeError> {
        Ok(self
            .deposits
            .iter()
            .filter(|d| d.block_number >= from_block && d.block_number <= to_block)
            .cloned()
            .collect())
    }

    async fn withdraw_logs(
        &self,
        _bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedWithdraw>, BridgeError> {
        Ok(self
            .withdraws
            .iter()
            .filter(|w| w.block_number >= from_block && w.block_number <= to_block)
            .cloned()
            .collect())
    }

    async fn is_processed(
        &self,
        _bridge: &EvmAddress,
        message_hash: [u8; 32],
    ) -> Result<bool, BridgeError> {
        Ok(self.processed.lock().unwrap().contains(&message_hash))
    }

    async fn native_balance(&self, _addr: &EvmAddress) -> Result<U256, BridgeError> {
        Ok(U256::MAX)
    }

    async fn erc20_balance_of(
        &self,
        _token: &EvmAddress,
        _holder: &EvmAddress,
    ) -> Result<U256, BridgeError> {
        Ok(U256::MAX)
    }

    async fn fee_data(&self) -> Result<FeeData, BridgeError> {
        Ok(FeeData { gas_price: self.gas_price })
    }

    async fn estimate_withdraw_gas(
        &self,
        _bridge: &EvmAddress,
        _token: &EvmAddress,
        _recipient: &EvmAddress,
        _amount: U256,
        _nonce: U256,
        _source_chain_id: u64,
        _signatures: &[Vec<u8>],
    ) -> Result<u64, BridgeError> {
        Ok(120_000)
    }

    async fn submit_withdraw(
        &self,
        _bridge: &EvmAddress,
        _token: &EvmAddress,
        _recipient: &EvmAddress,
        _amount: U256,
        nonce: U256,
        _source_chain_id: u64,
        _signatures: &[Vec<u8>],
        _gas_limit: u64,
        _gas_price: u128,
    ) -> Result<TxHash, BridgeError> {
        if *self.fail_next_submit.lock().unwrap() {
            *self.fail_next_submit.lock().unwrap() = false;
            return Err(BridgeError::RetryableRpc("fake: connection timeout".into()));
        }
        let tx_hash = fake_tx_hash(nonce.try_into().unwrap_or(u64::MAX));
        self.submissions.lock().unwrap().push(tx_hash);
        Ok(tx_hash)
    }

    async fn wait_receipt(
        &self,
        tx_hash: &TxHash,
        _min_confirmations: u64,
        _timeout: Duration,
    ) -> Result<ReceiptInfo, BridgeError> {
        Ok(ReceiptInfo {
            tx_hash: *tx_hash,
            block_number: *self.head.lock().unwrap(),
            success: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_deposit(block: u64, nonce: u64) -> DecodedDeposit {
        DecodedDeposit {
            token: EvmAddress::NATIVE,
            sender: EvmAddress([1u8; 20]),
            recipient: EvmAddress([2u8; 20]),
            amount: "1000".into(),
            nonce,
            target_chain_id: 2,
            tx_hash: fake_tx_hash(nonce),
            log_index: 0,
            block_number: block,
            block_hash: fake_tx_hash(block),
        }
    }

    #[tokio::test]
    async fn deposit_logs_filters_by_window() {
        let client = FakeChainClient::new(100)
            .with_deposit(sample_deposit(10, 1))
            .with_deposit(sample_deposit(50, 2));
        let logs = client.deposit_logs(&EvmAddress::NATIVE, 0, 20).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].nonce, 1);
    }

    #[tokio::test]
    async fn submit_withdraw_honors_scripted_failure() {
        let client = FakeChainClient::new(100);
        client.fail_next_submit();
        let err = client
            .submit_withdraw(
                &EvmAddress::NATIVE,
                &EvmAddress::NATIVE,
                &EvmAddress::NATIVE,
                U256::from(1u64),
                U256::from(1u64),
                1,
                &[],
                100_000,
                1,
            )
            .await
            .unwrap_err();
        assert!(err.is_retryable());

        let tx = client
            .submit_withdraw(
                &EvmAddress::NATIVE,
                &EvmAddress::NATIVE,
                &EvmAddress::NATIVE,
                U256::from(1u64),
                U256::from(1u64),
                1,
                &[],
                100_000,
                1,
            )
            .await
            .unwrap();
        assert_eq!(client.submissions(), vec![tx]);
    }
}
