//! Pure, I/O-free predicates over bridge event parameters (spec §4.6).
//!
//! Every `validate_*` function accumulates all errors rather than short-circuiting,
//! so a caller can report every problem with a malformed event in one pass.

use crate::types::{EvmAddress, Signature65, TxHash};

/// Accepts only all-lowercase hex or an exactly EIP-55-checksummed address
/// (spec §4.6: "valid EIP-55 checksum OR all-lowercase"). A mixed-case string
/// whose casing doesn't match the checksum is rejected even though it parses
/// as 20 bytes.
pub fn is_address(s: &str) -> bool {
    let Ok(addr) = EvmAddress::from_hex(s) else {
        return false;
    };
    let body = s.strip_prefix("0x").unwrap_or(s);
    let checksum_body = addr.to_checksum_hex();
    let checksum_body = checksum_body.strip_prefix("0x").unwrap_or(&checksum_body);
    body == body.to_ascii_lowercase() || body == checksum_body
}

pub fn is_tx_hash(s: &str) -> bool {
    TxHash::from_hex(s).is_ok()
}

pub fn is_signature(s: &str) -> bool {
    Signature65::from_hex(s).is_ok()
}

/// `amount` is a decimal string; valid and strictly positive.
pub fn is_positive_amount(amount: &str) -> bool {
    matches!(num_parse::parse_decimal(amount), Some(marker) if marker > 0)
}

pub fn is_valid_nonce(nonce: i64) -> bool {
    nonce >= 0
}

#[derive(Debug, Default, Clone)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
}

pub struct DepositParams<'a> {
    pub token: &'a str,
    pub sender: &'a str,
    pub recipient: &'a str,
    pub amount: &'a str,
    pub nonce: i64,
    pub source_chain_id: u64,
    pub target_chain_id: u64,
    pub block_number: u64,
    pub tx_hash: &'a str,
}

pub struct WithdrawParams<'a> {
    pub token: &'a str,
    pub recipient: &'a str,
    pub amount: &'a str,
    pub nonce: i64,
    pub source_chain_id: u64,
    pub tx_hash: &'a str,
}

pub struct TransferParams<'a> {
    pub token: &'a str,
    pub sender: &'a str,
    pub recipient: &'a str,
    pub amount: &'a str,
    pub nonce: i64,
    pub source_chain_id: u64,
    pub target_chain_id: u64,
}

pub fn validate_deposit_params(p: &DepositParams) -> ValidationResult {
    let mut result = ValidationResult::default();
    if !is_address(p.token) {
        result.push("token is not a valid address");
    }
    if !is_address(p.sender) {
        result.push("sender is not a valid address");
    }
    if !is_address(p.recipient) {
        result.push("recipient is not a valid address");
    }
    if !is_positive_amount(p.amount) {
        result.push("amount must be a positive integer");
    }
    if !is_valid_nonce(p.nonce) {
        result.push("nonce must be non-negative");
    }
    if p.source_chain_id == p.target_chain_id {
        result.push("source and target chain must differ");
    }
    if p.block_number == 0 {
        result.push("blockNumber must be greater than zero");
    }
    if !is_tx_hash(p.tx_hash) {
        result.push("txHash is not well-formed");
    }
    result
}

pub fn validate_withdraw_params(p: &WithdrawParams) -> ValidationResult {
    let mut result = ValidationResult::default();
    if !is_address(p.token) {
        result.push("token is not a valid address");
    }
    if !is_address(p.recipient) {
        result.push("recipient is not a valid address");
    }
    if !is_positive_amount(p.amount) {
        result.push("amount must be a positive integer");
    }
    if !is_valid_nonce(p.nonce) {
        result.push("nonce must be non-negative");
    }
    if !is_tx_hash(p.tx_hash) {
        result.push("txHash is not well-formed");
    }
    let _ = p.source_chain_id;
    result
}

pub fn validate_transfer_params(p: &TransferParams) -> ValidationResult {
    let mut result = ValidationResult::default();
    if !is_address(p.token) {
        result.push("token is not a valid address");
    }
    if !is_address(p.sender) {
        result.push("sender is not a valid address");
    }
    if !is_address(p.recipient) {
        result.push("recipient is not a valid address");
    }
    if !is_positive_amount(p.amount) {
        result.push("amount must be a positive integer");
    }
    if !is_valid_nonce(p.nonce) {
        result.push("nonce must be non-negative");
    }
    if p.source_chain_id == p.target_chain_id {
        result.push("source and target chain must differ");
    }
    result
}

/// Minimal decimal-string big-integer parsing: just enough to validate
/// "parses as a non-negative integer", without pulling in a bignum crate for
/// a single predicate. Values up to 2**256-1 fit comfortably as plain decimal
/// digit strings; we only need well-formedness and positivity here, not the
/// numeric value itself.
mod num_parse {
    pub type BigAmount = u8; // only used as a truthy marker; see parse_decimal

    pub fn parse_decimal(s: &str) -> Option<BigAmount> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Reject values that are all zeros (not positive) but otherwise accept
        // arbitrarily large digit strings (spec requires amount up to 2**256-1).
        if s.bytes().all(|b| b == b'0') {
            return Some(0);
        }
        Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_zero_rejected() {
        assert!(!is_positive_amount("0"));
    }

    #[test]
    fn address_accepts_lowercase_and_exact_checksum() {
        assert!(is_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
        assert!(is_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
    }

    #[test]
    fn address_rejects_mixed_case_with_wrong_checksum() {
        // Same address as above with one letter's case flipped.
        assert!(!is_address("0x5aAeb6053f3E94C9b9A09f33669435E7Ef1BeAed"));
    }

    #[test]
    fn amount_max_u256_accepted() {
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert!(is_positive_amount(max));
    }

    #[test]
    fn amount_non_numeric_rejected() {
        assert!(!is_positive_amount("abc"));
        assert!(!is_positive_amount(""));
        assert!(!is_positive_amount("-5"));
    }

    #[test]
    fn nonce_zero_is_valid() {
        assert!(is_valid_nonce(0));
        assert!(!is_valid_nonce(-1));
    }

    #[test]
    fn source_equals_target_rejected() {
        let p = TransferParams {
            token: "0x0000000000000000000000000000000000000000",
            sender: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            recipient: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            amount: "100",
            nonce: 0,
            source_chain_id: 1,
            target_chain_id: 1,
        };
        let result = validate_transfer_params(&p);
        assert!(!result.ok());
        assert!(result.errors.iter().any(|e| e.contains("differ")));
    }

    #[test]
    fn native_token_zero_address_accepted() {
        let p = DepositParams {
            token: "0x0000000000000000000000000000000000000000",
            sender: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            recipient: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            amount: "1",
            nonce: 0,
            source_chain_id: 1,
            target_chain_id: 137,
            block_number: 10,
            tx_hash: &format!("0x{}", "ab".repeat(32)),
        };
        let result = validate_deposit_params(&p);
        assert!(result.ok(), "{:?}", result.errors);
    }

    #[test]
    fn validate_accumulates_multiple_errors() {
        let p = DepositParams {
            token: "not-an-address",
            sender: "also-not",
            recipient: "nope",
            amount: "0",
            nonce: -1,
            source_chain_id: 1,
            target_chain_id: 1,
            block_number: 0,
            tx_hash: "bad",
        };
        let result = validate_deposit_params(&p);
        assert!(result.errors.len() >= 6);
    }
}
