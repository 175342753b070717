pub mod client;
pub mod contracts;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use client::{ChainClient, EvmReadClient, EvmSubmitClient, FeeData, ReceiptInfo};
