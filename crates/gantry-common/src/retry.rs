//! Retry utilities with exponential backoff
//!
//! Used for read-path requests against the provisioning service. Write
//! requests are deliberately never routed through here.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (0 = infinite)
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a config with a specific number of attempts
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }
}

/// Execute an operation with retry and exponential backoff
///
/// The operation is retried until it succeeds or max_attempts is reached.
/// Delays between retries follow exponential backoff with jitter.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        operation = %operation_name,
                        attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                if config.max_attempts > 0 && attempt >= config.max_attempts {
                    error!(
                        operation = %operation_name,
                        attempt,
                        error = %e,
                        "Operation failed after maximum attempts"
                    );
                    return Err(e);
                }

                // Add jitter: +/- 50% of current delay
                let jitter = rand::thread_rng().gen_range(0.5..1.5);
                let sleep_duration = delay.mul_f64(jitter);

                warn!(
                    operation = %operation_name,
                    attempt,
                    error = %e,
                    retry_in_ms = sleep_duration.as_millis() as u64,
                    "Operation failed, will retry"
                );

                tokio::time::sleep(sleep_duration).await;

                delay = std::cmp::min(
                    delay.mul_f64(config.backoff_multiplier),
                    config.max_delay,
                );
            }
        }
    }
}
