//! Exponential backoff, gas-price bumping, and RPC error classification (spec §4.1,
//! §4.2, §4.4 step 5, §7). Generalized from the teacher's approval/release
//! submission retry into a chain-client-agnostic policy.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub gas_bump_percent: u32,
    pub max_gas_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            gas_bump_percent: 20,
            max_gas_multiplier: 3.0,
        }
    }
}

impl RetryConfig {
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let secs = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(secs.min(self.max_backoff.as_secs_f64()))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    pub fn gas_price_for_attempt(&self, base_gas_price: u128, attempt: u32) -> u128 {
        if attempt == 0 {
            return base_gas_price;
        }
        let multiplier = 1.0 + (self.gas_bump_percent as f64 / 100.0) * attempt as f64;
        let capped = multiplier.min(self.max_gas_multiplier);
        (base_gas_price as f64 * capped) as u128
    }

    pub fn next_retry_after(&self, attempt: u32) -> DateTime<Utc> {
        let backoff = self.backoff_for_attempt(attempt);
        Utc::now() + chrono::Duration::from_std(backoff).unwrap_or(chrono::Duration::seconds(60))
    }
}

/// Classification of a chain-client failure (spec §4.1's retryable/terminal split,
/// refined into the named categories of spec §7's error table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Timeouts, resets, RPC overload — retry with the same gas.
    Transient,
    /// "replacement underpriced" / "nonce too low" races — retry with bumped gas.
    Underpriced,
    /// Already mined under this nonce — safe to treat as done.
    NonceTooLow,
    /// A prior submission is still pending — back off longer.
    NonceTooHigh,
    /// Malformed request or deterministic revert — never retry.
    Permanent,
    Unknown,
}

impl ErrorClass {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ErrorClass::Permanent)
    }
}

pub fn classify_error(error: &str) -> ErrorClass {
    let lower = error.to_lowercase();

    if lower.contains("timeout")
        || lower.contains("connection")
        || lower.contains("network")
        || lower.contains("rate limit")
        || lower.contains("too many requests")
        || lower.contains("503")
        || lower.contains("502")
        || lower.contains("temporarily unavailable")
    {
        return ErrorClass::Transient;
    }

    if lower.contains("underpriced")
        || lower.contains("replacement transaction")
        || lower.contains("gas price too low")
        || lower.contains("max fee per gas less than")
    {
        return ErrorClass::Underpriced;
    }

    if lower.contains("nonce too low")
        || lower.contains("already known")
        || lower.contains("already been processed")
    {
        return ErrorClass::NonceTooLow;
    }

    if lower.contains("nonce too high") {
        return ErrorClass::NonceTooHigh;
    }

    if lower.contains("revert")
        || lower.contains("invalid signature")
        || lower.contains("insufficient funds")
        || lower.contains("out of gas")
        || lower.contains("invalid parameters")
        || lower.contains("malformed")
    {
        return ErrorClass::Permanent;
    }

    ErrorClass::Unknown
}

/// Action to take after a failed attempt.
#[derive(Debug, Clone)]
pub enum RetryAction {
    RetryAfter(Duration),
    RetryWithGas { backoff: Duration, gas_price: u128 },
    Skip,
    DeadLetter,
}

/// Mutable per-submission retry state, one instance per in-flight withdrawal.
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub config: RetryConfig,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub last_gas_price: Option<u128>,
}

impl RetryContext {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            attempt: 0,
            last_error: None,
            last_gas_price: None,
        }
    }

    pub fn record_failure(&mut self, error: String, gas_price: Option<u128>) {
        self.attempt += 1;
        self.last_error = Some(error);
        self.last_gas_price = gas_price;
    }

    pub fn next_action(&self) -> RetryAction {
        let error = self.last_error.as_deref().unwrap_or("");
        match classify_error(error) {
            ErrorClass::Permanent => {
                warn!(error, "permanent RPC error, giving up");
                RetryAction::DeadLetter
            }
            ErrorClass::NonceTooLow => {
                debug!("nonce too low, treating submission as already mined");
                RetryAction::Skip
            }
            ErrorClass::NonceTooHigh => {
                RetryAction::RetryAfter(self.config.max_backoff)
            }
            ErrorClass::Underpriced => {
                if !self.config.should_retry(self.attempt) {
                    return RetryAction::DeadLetter;
                }
                let new_gas = self
                    .config
                    .gas_price_for_attempt(self.last_gas_price.unwrap_or(1_000_000_000), self.attempt);
                RetryAction::RetryWithGas {
                    backoff: Duration::from_secs(1),
                    gas_price: new_gas,
                }
            }
            ErrorClass::Transient | ErrorClass::Unknown => {
                if !self.config.should_retry(self.attempt) {
                    return RetryAction::DeadLetter;
                }
                RetryAction::RetryAfter(self.config.backoff_for_attempt(self.attempt))
            }
        }
    }
}

/// Generic retry executor over an async operation parameterized by attempt
/// number and the last bumped gas price, matching spec §4.4 step 5's "wrap the
/// entire submission in a retry with exponential backoff" requirement.
pub async fn with_retry<F, T, Fut>(config: &RetryConfig, mut operation: F) -> eyre::Result<T>
where
    F: FnMut(u32, Option<u128>) -> Fut,
    Fut: std::future::Future<Output = eyre::Result<T>>,
{
    let mut ctx = RetryContext::new(config.clone());

    loop {
        let gas_price = ctx.last_gas_price;
        match operation(ctx.attempt, gas_price).await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let error_str = e.to_string();
                ctx.record_failure(error_str.clone(), gas_price);

                match ctx.next_action() {
                    RetryAction::RetryAfter(backoff) => {
                        warn!(attempt = ctx.attempt, ?backoff, error = %error_str, "retrying after backoff");
                        tokio::time::sleep(backoff).await;
                    }
                    RetryAction::RetryWithGas { backoff, gas_price: new_gas } => {
                        warn!(attempt = ctx.attempt, new_gas, "retrying with bumped gas");
                        ctx.last_gas_price = Some(new_gas);
                        tokio::time::sleep(backoff).await;
                    }
                    RetryAction::Skip => {
                        return Err(eyre::eyre!("skipped (already processed): {error_str}"));
                    }
                    RetryAction::DeadLetter => {
                        return Err(eyre::eyre!("exhausted retries: {error_str}"));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let config = RetryConfig::default();
        assert_eq!(config.backoff_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.backoff_for_attempt(10), config.max_backoff);
    }

    #[test]
    fn gas_bump_is_capped() {
        let config = RetryConfig::default();
        let base = 1_000_000_000u128;
        assert_eq!(config.gas_price_for_attempt(base, 0), base);
        assert_eq!(config.gas_price_for_attempt(base, 1), 1_200_000_000);
        assert_eq!(config.gas_price_for_attempt(base, 20), 3_000_000_000); // capped 3x
    }

    #[test]
    fn classification_matches_known_strings() {
        assert_eq!(classify_error("connection timeout"), ErrorClass::Transient);
        assert_eq!(classify_error("replacement transaction underpriced"), ErrorClass::Underpriced);
        assert_eq!(classify_error("nonce too low"), ErrorClass::NonceTooLow);
        assert_eq!(classify_error("execution reverted"), ErrorClass::Permanent);
        assert_eq!(classify_error("something odd"), ErrorClass::Unknown);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_max_attempts() {
        let config = RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            ..Default::default()
        };
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result: eyre::Result<()> = with_retry(&config, |_attempt, _gas| {
            attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err(eyre::eyre!("network timeout")) }
        })
        .await;
        assert!(result.is_err());
        assert!(attempts.load(std::sync::atomic::Ordering::SeqCst) >= 2);
    }
}
