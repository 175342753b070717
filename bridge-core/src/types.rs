//! Domain types shared by the Relayer and Indexer: addresses, hashes, signatures.
//!
//! Amounts are kept as decimal `String` at this boundary (never `u128`/`U256`) so a
//! value larger than `2**256 - 1` never silently truncates between the chain client
//! and the store — see spec §3's "unbounded non-negative integers stored as decimal
//! text".

use alloy::primitives::keccak256;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 20-byte EVM address. `0x00..00` is the native-currency sentinel (spec §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvmAddress(pub [u8; 20]);

impl EvmAddress {
    pub const NATIVE: EvmAddress = EvmAddress([0u8; 20]);

    pub fn is_native(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|e| eyre!("invalid address hex: {e}"))?;
        if bytes.len() != 20 {
            return Err(eyre!("EvmAddress must be 20 bytes, got {}", bytes.len()));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(EvmAddress(out))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn as_bytes32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(&self.0);
        out
    }

    pub fn from_bytes32(bytes: &[u8; 32]) -> Self {
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes[12..]);
        EvmAddress(out)
    }

    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum: uppercase a hex digit iff the corresponding
    /// nibble of `keccak256(lowercase_hex_without_0x)` is >= 8.
    pub fn to_checksum_hex(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            if c.is_ascii_digit() {
                out.push(c);
                continue;
            }
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum_hex())
    }
}

impl FromStr for EvmAddress {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// 32-byte transaction hash, always rendered `0x` + 64 lowercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|e| eyre!("invalid tx hash hex: {e}"))?;
        if bytes.len() != 32 {
            return Err(eyre!("TxHash must be 32 bytes, got {}", bytes.len()));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        Ok(TxHash(out))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// 65-byte recoverable ECDSA signature (r ‖ s ‖ v), v normalized to {27, 28}.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature65(pub [u8; 65]);

// serde's derive only covers arrays up to 32 elements, so [u8; 65] needs a manual
// impl; this mirrors exactly what the derive would emit for a smaller array.
impl Serialize for Signature65 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tup = serializer.serialize_tuple(65)?;
        for b in self.0.iter() {
            tup.serialize_element(b)?;
        }
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Signature65 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ArrVisitor;
        impl<'de> serde::de::Visitor<'de> for ArrVisitor {
            type Value = [u8; 65];

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a 65-byte array")
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<[u8; 65], A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = [0u8; 65];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = seq
                        .next_element()?
                        .ok_or_else(|| serde::de::Error::invalid_length(i, &self))?;
                }
                Ok(out)
            }
        }
        let arr = deserializer.deserialize_tuple(65, ArrVisitor)?;
        Ok(Signature65(arr))
    }
}

impl Signature65 {
    pub fn from_parts(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        let mut out = [0u8; 65];
        out[0..32].copy_from_slice(&r);
        out[32..64].copy_from_slice(&s);
        out[64] = v;
        Signature65(out)
    }

    pub fn r(&self) -> [u8; 32] {
        self.0[0..32].try_into().unwrap()
    }

    pub fn s(&self) -> [u8; 32] {
        self.0[32..64].try_into().unwrap()
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let bytes = hex::decode(hex).map_err(|e| eyre!("invalid signature hex: {e}"))?;
        if bytes.len() != 65 {
            return Err(eyre!("Signature65 must be 65 bytes, got {}", bytes.len()));
        }
        let mut out = [0u8; 65];
        out.copy_from_slice(&bytes);
        Ok(Signature65(out))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature65").field(&"<redacted>").finish()
    }
}

impl fmt::Display for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// On-chain event kind, shared between BridgeEvent rows and watcher dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Deposit,
    Withdraw,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Deposit => "deposit",
            EventKind::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded `Deposit` or `Withdraw` log, canonical field order per spec §9:
/// `(token, sender, recipient, amount, nonce, targetChainId)` for Deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDeposit {
    pub token: EvmAddress,
    pub sender: EvmAddress,
    pub recipient: EvmAddress,
    pub amount: String,
    pub nonce: u64,
    pub target_chain_id: u64,
    pub tx_hash: TxHash,
    pub log_index: u64,
    pub block_number: u64,
    pub block_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedWithdraw {
    pub token: EvmAddress,
    pub recipient: EvmAddress,
    pub amount: String,
    pub nonce: u64,
    pub source_chain_id: u64,
    pub tx_hash: TxHash,
    pub log_index: u64,
    pub block_number: u64,
    pub block_hash: TxHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_rejects_wrong_length() {
        assert!(EvmAddress::from_hex("0xdead").is_err());
    }

    #[test]
    fn address_bytes32_roundtrip() {
        let addr = EvmAddress::from_hex("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        let bytes32 = addr.as_bytes32();
        let recovered = EvmAddress::from_bytes32(&bytes32);
        assert_eq!(addr, recovered);
    }

    #[test]
    fn native_sentinel() {
        assert!(EvmAddress::NATIVE.is_native());
        let addr = EvmAddress::from_hex("0x0000000000000000000000000000000000000001").unwrap();
        assert!(!addr.is_native());
    }

    #[test]
    fn checksum_matches_known_vector() {
        // Known EIP-55 vector from the Ethereum reference implementation.
        let addr = EvmAddress::from_hex("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        assert_eq!(addr.to_checksum_hex(), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn tx_hash_requires_64_hex_chars() {
        assert!(TxHash::from_hex("0xdead").is_err());
        let hash = TxHash::from_hex(&format!("0x{}", "ab".repeat(32))).unwrap();
        assert_eq!(hash.to_hex().len(), 66);
    }

    #[test]
    fn signature_debug_redacts() {
        let sig = Signature65::from_parts([1u8; 32], [2u8; 32], 27);
        let debug = format!("{:?}", sig);
        assert!(!debug.contains("0101"));
        assert!(debug.contains("redacted"));
    }
}
