//! Validator signer: holds the secp256k1 key used to attest withdrawals.
//!
//! Distinct from a transaction signer (there is no nonce/gas here) — this signs a
//! message digest directly so the on-chain verifier can `ecrecover` it, per spec §4.3.

use alloy::primitives::{PrimitiveSignature as AlloySignature, B256};
use alloy::signers::{local::PrivateKeySigner, Signer as AlloySigner};
use eyre::{eyre, Result, WrapErr};

use crate::hash::{inner_hash, withdrawal_digest};
use crate::types::{EvmAddress, Signature65};

/// Wraps a `PrivateKeySigner` to produce validator attestations over withdrawal
/// digests. Immutable after construction and safe to share across tasks (spec §5).
pub struct Signer {
    inner: PrivateKeySigner,
}

impl Signer {
    pub fn from_private_key(private_key: &str) -> Result<Self> {
        let inner: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| eyre!("invalid validator private key: {e}"))?;
        Ok(Self { inner })
    }

    pub fn address(&self) -> alloy::primitives::Address {
        self.inner.address()
    }

    pub fn address_as_evm(&self) -> EvmAddress {
        EvmAddress(self.inner.address().into_array())
    }

    /// Sign a withdrawal: computes the canonical digest and returns a 65-byte
    /// `r‖s‖v` signature with `v` normalized to {27, 28}.
    pub async fn sign_withdrawal(
        &self,
        token: &EvmAddress,
        recipient: &EvmAddress,
        amount: alloy::primitives::U256,
        nonce: alloy::primitives::U256,
        source_chain_id: u64,
        target_chain_id: u64,
    ) -> Result<([u8; 32], Signature65)> {
        let inner = inner_hash(token, recipient, amount, nonce, source_chain_id, target_chain_id);
        let digest = withdrawal_digest(token, recipient, amount, nonce, source_chain_id, target_chain_id);
        let sig = self.sign_prehash(&digest).await?;
        Ok((inner, sig))
    }

    async fn sign_prehash(&self, digest: &[u8; 32]) -> Result<Signature65> {
        let sig = self
            .inner
            .sign_hash(&B256::from(*digest))
            .await
            .wrap_err("failed to sign withdrawal digest")?;
        Ok(normalize(sig))
    }

    /// Mirror of the on-chain verifier: recover the signer from `digest` and
    /// compare to `expected`. Used in tests and cross-service sanity checks.
    pub fn verify(digest: &[u8; 32], sig: &Signature65, expected: &EvmAddress) -> bool {
        let Ok(parsed) = parse_signature(sig) else {
            return false;
        };
        match parsed.recover_address_from_prehash(&B256::from(*digest)) {
            Ok(addr) => addr.into_array() == expected.0,
            Err(_) => false,
        }
    }
}

fn normalize(sig: AlloySignature) -> Signature65 {
    let r: [u8; 32] = sig.r().to_be_bytes();
    let s: [u8; 32] = sig.s().to_be_bytes();
    let v: u8 = if sig.v() { 28 } else { 27 };
    Signature65::from_parts(r, s, v)
}

fn parse_signature(sig: &Signature65) -> Result<AlloySignature> {
    let r = alloy::primitives::U256::from_be_bytes(sig.r());
    let s = alloy::primitives::U256::from_be_bytes(sig.s());
    let v_byte = sig.v();
    if v_byte != 27 && v_byte != 28 {
        return Err(eyre!("signature v must be normalized to 27/28, got {v_byte}"));
    }
    let y_parity = v_byte == 28;
    Ok(AlloySignature::new(r, s, y_parity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Well-known Anvil/Hardhat dev key #0 — never used on a real chain.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let signer = Signer::from_private_key(DEV_KEY).unwrap();
        let token = EvmAddress::NATIVE;
        let recipient = EvmAddress::from_hex("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();

        let (_inner, sig) = signer
            .sign_withdrawal(&token, &recipient, U256::from(1_000u64), U256::from(0u64), 1, 137)
            .await
            .unwrap();

        assert!(sig.v() == 27 || sig.v() == 28);

        let digest = withdrawal_digest(&token, &recipient, U256::from(1_000u64), U256::from(0u64), 1, 137);
        assert!(Signer::verify(&digest, &sig, &signer.address_as_evm()));
    }

    #[tokio::test]
    async fn verify_rejects_wrong_signer() {
        let signer = Signer::from_private_key(DEV_KEY).unwrap();
        let other = EvmAddress::from_hex("0x0000000000000000000000000000000000000099").unwrap();
        let token = EvmAddress::NATIVE;
        let recipient = EvmAddress::from_hex("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();

        let (_inner, sig) = signer
            .sign_withdrawal(&token, &recipient, U256::from(1u64), U256::from(0u64), 1, 137)
            .await
            .unwrap();
        let digest = withdrawal_digest(&token, &recipient, U256::from(1u64), U256::from(0u64), 1, 137);
        assert!(!Signer::verify(&digest, &sig, &other));
    }

    #[test]
    fn rejects_unnormalized_v() {
        let sig = Signature65::from_parts([0u8; 32], [0u8; 32], 1);
        let digest = [0u8; 32];
        assert!(!Signer::verify(&digest, &sig, &EvmAddress::NATIVE));
    }
}
