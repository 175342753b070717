//! EVM chain client adaptor (spec §4.1). Wraps one JSON-RPC endpoint; classifies
//! failures as retryable or terminal but never retries itself — callers own retry
//! policy via [`crate::retry`].

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::Filter;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use alloy::transports::http::{Client as HttpClient, Http};
use async_trait::async_trait;
use std::time::Duration;

use crate::chain::contracts::{Bridge, Erc20};
use crate::error::BridgeError;
use crate::retry::classify_error;
use crate::types::{DecodedDeposit, DecodedWithdraw, EvmAddress, TxHash};

pub struct FeeData {
    pub gas_price: u128,
}

pub struct ReceiptInfo {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub success: bool,
}

fn classify(err: impl std::fmt::Display) -> BridgeError {
    let msg = err.to_string();
    match classify_error(&msg) {
        c if c.is_retryable() => BridgeError::RetryableRpc(msg),
        _ => BridgeError::TerminalRpc(msg),
    }
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn head(&self) -> Result<u64, BridgeError>;
    async fn block_hash(&self, number: u64) -> Result<[u8; 32], BridgeError>;
    async fn deposit_logs(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedDeposit>, BridgeError>;
    async fn withdraw_logs(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedWithdraw>, BridgeError>;
    async fn is_processed(
        &self,
        bridge: &EvmAddress,
        message_hash: [u8; 32],
    ) -> Result<bool, BridgeError>;
    async fn native_balance(&self, addr: &EvmAddress) -> Result<U256, BridgeError>;
    async fn erc20_balance_of(
        &self,
        token: &EvmAddress,
        holder: &EvmAddress,
    ) -> Result<U256, BridgeError>;
    async fn fee_data(&self) -> Result<FeeData, BridgeError>;
    async fn estimate_withdraw_gas(
        &self,
        bridge: &EvmAddress,
        token: &EvmAddress,
        recipient: &EvmAddress,
        amount: U256,
        nonce: U256,
        source_chain_id: u64,
        signatures: &[Vec<u8>],
    ) -> Result<u64, BridgeError>;
    async fn submit_withdraw(
        &self,
        bridge: &EvmAddress,
        token: &EvmAddress,
        recipient: &EvmAddress,
        amount: U256,
        nonce: U256,
        source_chain_id: u64,
        signatures: &[Vec<u8>],
        gas_limit: u64,
        gas_price: u128,
    ) -> Result<TxHash, BridgeError>;
    async fn wait_receipt(
        &self,
        tx_hash: &TxHash,
        min_confirmations: u64,
        timeout: Duration,
    ) -> Result<ReceiptInfo, BridgeError>;
}

fn to_address(addr: &EvmAddress) -> Address {
    Address::from(addr.0)
}

/// Read-only adaptor: watchers and the Indexer only ever need this variant.
pub struct EvmReadClient {
    provider: RootProvider<Http<HttpClient>>,
}

impl EvmReadClient {
    pub fn new(rpc_url: &str) -> eyre::Result<Self> {
        let url = rpc_url.parse().map_err(|e| eyre::eyre!("invalid RPC URL: {e}"))?;
        Ok(Self {
            provider: ProviderBuilder::new().on_http(url),
        })
    }

    async fn decode_deposits(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedDeposit>, BridgeError> {
        let filter = Filter::new()
            .address(to_address(bridge))
            .from_block(from_block)
            .to_block(to_block)
            .event_signature(Bridge::Deposit::SIGNATURE_HASH);
        let logs = self.provider.get_logs(&filter).await.map_err(classify)?;

        let mut out = Vec::with_capacity(logs.len());
        for log in logs {
            let tx_hash = log.transaction_hash.ok_or_else(|| {
                BridgeError::TerminalRpc("log missing transaction_hash".into())
            })?;
            let log_index = log
                .log_index
                .ok_or_else(|| BridgeError::TerminalRpc("log missing log_index".into()))?;
            let block_number = log
                .block_number
                .ok_or_else(|| BridgeError::TerminalRpc("log missing block_number".into()))?;
            let block_hash = log
                .block_hash
                .ok_or_else(|| BridgeError::TerminalRpc("log missing block_hash".into()))?;

            let decoded = log
                .log_decode::<Bridge::Deposit>()
                .map_err(|e| BridgeError::TerminalRpc(format!("failed to decode Deposit: {e}")))?
                .inner
                .data;

            out.push(DecodedDeposit {
                token: EvmAddress(decoded.token.into_array()),
                sender: EvmAddress(decoded.sender.into_array()),
                recipient: EvmAddress(decoded.recipient.into_array()),
                amount: decoded.amount.to_string(),
                nonce: decoded.nonce.try_into().unwrap_or(u64::MAX),
                target_chain_id: decoded.targetChainId.try_into().unwrap_or(u64::MAX),
                tx_hash: TxHash(tx_hash.into()),
                log_index,
                block_number,
                block_hash: TxHash(block_hash.into()),
            });
        }
        Ok(out)
    }

    async fn decode_withdraws(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedWithdraw>, BridgeError> {
        let filter = Filter::new()
            .address(to_address(bridge))
            .from_block(from_block)
            .to_block(to_block)
            .event_signature(Bridge::Withdraw::SIGNATURE_HASH);
        let logs = self.provider.get_logs(&filter).await.map_err(classify)?;

        let mut out = Vec::with_capacity(logs.len());
        for log in logs {
            let tx_hash = log.transaction_hash.ok_or_else(|| {
                BridgeError::TerminalRpc("log missing transaction_hash".into())
            })?;
            let log_index = log
                .log_index
                .ok_or_else(|| BridgeError::TerminalRpc("log missing log_index".into()))?;
            let block_number = log
                .block_number
                .ok_or_else(|| BridgeError::TerminalRpc("log missing block_number".into()))?;
            let block_hash = log
                .block_hash
                .ok_or_else(|| BridgeError::TerminalRpc("log missing block_hash".into()))?;

            let decoded = log
                .log_decode::<Bridge::Withdraw>()
                .map_err(|e| BridgeError::TerminalRpc(format!("failed to decode Withdraw: {e}")))?
                .inner
                .data;

            out.push(DecodedWithdraw {
                token: EvmAddress(decoded.token.into_array()),
                recipient: EvmAddress(decoded.recipient.into_array()),
                amount: decoded.amount.to_string(),
                nonce: decoded.nonce.try_into().unwrap_or(u64::MAX),
                source_chain_id: decoded.sourceChainId.try_into().unwrap_or(u64::MAX),
                tx_hash: TxHash(tx_hash.into()),
                log_index,
                block_number,
                block_hash: TxHash(block_hash.into()),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl ChainClient for EvmReadClient {
    async fn head(&self) -> Result<u64, BridgeError> {
        self.provider.get_block_number().await.map_err(classify)
    }

    async fn block_hash(&self, number: u64) -> Result<[u8; 32], BridgeError> {
        let block = self
            .provider
            .get_block_by_number(number.into(), false.into())
            .await
            .map_err(classify)?
            .ok_or_else(|| BridgeError::TerminalRpc(format!("block {number} not found (pruned)")))?;
        Ok(block.header.hash.into())
    }

    async fn deposit_logs(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedDeposit>, BridgeError> {
        self.decode_deposits(bridge, from_block, to_block).await
    }

    async fn withdraw_logs(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedWithdraw>, BridgeError> {
        self.decode_withdraws(bridge, from_block, to_block).await
    }

    async fn is_processed(
        &self,
        bridge: &EvmAddress,
        message_hash: [u8; 32],
    ) -> Result<bool, BridgeError> {
        let contract = Bridge::new(to_address(bridge), &self.provider);
        contract
            .isProcessed(message_hash.into())
            .call()
            .await
            .map(|r| r._0)
            .map_err(classify)
    }

    async fn native_balance(&self, addr: &EvmAddress) -> Result<U256, BridgeError> {
        self.provider.get_balance(to_address(addr)).await.map_err(classify)
    }

    async fn erc20_balance_of(
        &self,
        token: &EvmAddress,
        holder: &EvmAddress,
    ) -> Result<U256, BridgeError> {
        let contract = Erc20::new(to_address(token), &self.provider);
        contract
            .balanceOf(to_address(holder))
            .call()
            .await
            .map(|r| r._0)
            .map_err(classify)
    }

    async fn fee_data(&self) -> Result<FeeData, BridgeError> {
        let gas_price = self.provider.get_gas_price().await.map_err(classify)?;
        Ok(FeeData { gas_price })
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
        Err(BridgeError::TerminalRpc(
            "read-only chain client cannot estimate a submission".into(),
        ))
    }

    async fn submit_withdraw(
        &self,
        _bridge: &EvmAddress,
        _token: &EvmAddress,
        _recipient: &EvmAddress,
        _amount: U256,
        _nonce: U256,
        _source_chain_id: u64,
        _signatures: &[Vec<u8>],
        _gas_limit: u64,
        _gas_price: u128,
    ) -> Result<TxHash, BridgeError> {
        Err(BridgeError::TerminalRpc(
            "read-only chain client cannot submit transactions".into(),
        ))
    }

    async fn wait_receipt(
        &self,
        tx_hash: &TxHash,
        min_confirmations: u64,
        timeout: Duration,
    ) -> Result<ReceiptInfo, BridgeError> {
        wait_receipt_impl(&self.provider, tx_hash, min_confirmations, timeout).await
    }
}

#[allow(clippy::type_complexity)]
type WalletProvider = alloy::providers::fillers::FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::Identity,
        alloy::providers::fillers::WalletFiller<EthereumWallet>,
    >,
    RootProvider<Http<HttpClient>>,
    Http<HttpClient>,
    alloy::network::Ethereum,
>;

/// Target-chain client: a read client plus the signer needed to submit `withdraw`.
pub struct EvmSubmitClient {
    read: EvmReadClient,
    provider: WalletProvider,
    signer_address: Address,
}

impl EvmSubmitClient {
    pub fn new(rpc_url: &str, signer: PrivateKeySigner) -> eyre::Result<Self> {
        let signer_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let url = rpc_url.parse().map_err(|e| eyre::eyre!("invalid RPC URL: {e}"))?;
        let provider = ProviderBuilder::new().wallet(wallet).on_http(url);
        Ok(Self {
            read: EvmReadClient::new(rpc_url)?,
            provider,
            signer_address,
        })
    }

    pub fn signer_address(&self) -> Address {
        self.signer_address
    }
}

#[async_trait]
impl ChainClient for EvmSubmitClient {
    async fn head(&self) -> Result<u64, BridgeError> {
        self.read.head().await
    }

    async fn block_hash(&self, number: u64) -> Result<[u8; 32], BridgeError> {
        self.read.block_hash(number).await
    }

    async fn deposit_logs(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedDeposit>, BridgeError> {
        self.read.deposit_logs(bridge, from_block, to_block).await
    }

    async fn withdraw_logs(
        &self,
        bridge: &EvmAddress,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<DecodedWithdraw>, BridgeError> {
        self.read.withdraw_logs(bridge, from_block, to_block).await
    }

    async fn is_processed(
        &self,
        bridge: &EvmAddress,
        message_hash: [u8; 32],
    ) -> Result<bool, BridgeError> {
        self.read.is_processed(bridge, message_hash).await
    }

    async fn native_balance(&self, addr: &EvmAddress) -> Result<U256, BridgeError> {
        self.read.native_balance(addr).await
    }

    async fn erc20_balance_of(
        &self,
        token: &EvmAddress,
        holder: &EvmAddress,
    ) -> Result<U256, BridgeError> {
        self.read.erc20_balance_of(token, holder).await
    }

    async fn fee_data(&self) -> Result<FeeData, BridgeError> {
        self.read.fee_data().await
    }

    async fn estimate_withdraw_gas(
        &self,
        bridge: &EvmAddress,
        token: &EvmAddress,
        recipient: &EvmAddress,
        amount: U256,
        nonce: U256,
        source_chain_id: u64,
        signatures: &[Vec<u8>],
    ) -> Result<u64, BridgeError> {
        let contract = Bridge::new(to_address(bridge), &self.provider);
        let sigs = signatures.iter().cloned().map(Into::into).collect::<Vec<_>>();
        contract
            .withdraw(
                to_address(token),
                to_address(recipient),
                amount,
                nonce,
                U256::from(source_chain_id),
                sigs,
            )
            .estimate_gas()
            .await
            .map_err(classify)
    }

    async fn submit_withdraw(
        &self,
        bridge: &EvmAddress,
        token: &EvmAddress,
        recipient: &EvmAddress,
        amount: U256,
        nonce: U256,
        source_chain_id: u64,
        signatures: &[Vec<u8>],
        gas_limit: u64,
        gas_price: u128,
    ) -> Result<TxHash, BridgeError> {
        let contract = Bridge::new(to_address(bridge), &self.provider);
        let sigs = signatures.iter().cloned().map(Into::into).collect::<Vec<_>>();
        let pending = contract
            .withdraw(
                to_address(token),
                to_address(recipient),
                amount,
                nonce,
                U256::from(source_chain_id),
                sigs,
            )
            .gas(gas_limit)
            .gas_price(gas_price)
            .send()
            .await
            .map_err(classify)?;
        let tx_hash = *pending.tx_hash();
        Ok(TxHash(tx_hash.into()))
    }

    async fn wait_receipt(
        &self,
        tx_hash: &TxHash,
        min_confirmations: u64,
        timeout: Duration,
    ) -> Result<ReceiptInfo, BridgeError> {
        wait_receipt_impl(&self.provider, tx_hash, min_confirmations, timeout).await
    }
}

async fn wait_receipt_impl<P: Provider<Http<HttpClient>>>(
    provider: &P,
    tx_hash: &TxHash,
    min_confirmations: u64,
    timeout: Duration,
) -> Result<ReceiptInfo, BridgeError> {
    let hash = alloy::primitives::B256::from(tx_hash.0);
    let start = std::time::Instant::now();
    let poll_interval = Duration::from_millis(500);

    loop {
        if let Some(receipt) = provider.get_transaction_receipt(hash).await.map_err(classify)? {
            let head = provider.get_block_number().await.map_err(classify)?;
            let confirmations = head.saturating_sub(receipt.block_number.unwrap_or(head));
            if confirmations >= min_confirmations {
                return Ok(ReceiptInfo {
                    tx_hash: *tx_hash,
                    block_number: receipt.block_number.unwrap_or(head),
                    success: receipt.status(),
                });
            }
        }
        if start.elapsed() >= timeout {
            return Err(BridgeError::RetryableRpc(format!(
                "receipt for {tx_hash} not confirmed after {timeout:?}"
            )));
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_maps_to_bridge_error() {
        match classify("connection timeout") {
            BridgeError::RetryableRpc(_) => {}
            other => panic!("expected retryable, got {other:?}"),
        }
        match classify("execution reverted") {
            BridgeError::TerminalRpc(_) => {}
            other => panic!("expected terminal, got {other:?}"),
        }
    }
}
