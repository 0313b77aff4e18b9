//! Retry-until-valid wrapper around a non-deterministic generation call.
//!
//! Too-short output is retried, never escalated. When every attempt is
//! invalid the last produced result is handed back as best-effort content,
//! flagged by [`Generated::valid`]. Transport failures use up attempts the
//! same way; only a run in which no attempt produced any result returns `Err`.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use recap_markdown::strip_date_header;
use recap_shared::{GenerationConfig, RecapError, Result};

/// Minimum body length (chars, header excluded) of usable content.
pub const MIN_CONTENT_CHARS: usize = 50;

/// Default number of attempts per stage.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Whether generated text is substantial enough to use.
///
/// A leading `## Meeting Date:` line does not count towards the length.
pub fn is_valid_content(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    strip_date_header(text).trim().chars().count() >= MIN_CONTENT_CHARS
}

// ---------------------------------------------------------------------------
// Policy & outcome
// ---------------------------------------------------------------------------

/// Retry settings for one generation stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between attempts. Zero retries immediately.
    pub retry_delay: Duration,
    /// Deadline for each attempt; a timeout counts as a failed attempt.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::ZERO,
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig, attempt_timeout: Option<Duration>) -> Self {
        Self {
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay(),
            attempt_timeout,
        }
    }
}

/// Result of [`generate_with_retry`].
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub value: T,
    /// Number of times the operation was invoked.
    pub attempts: u32,
    /// Whether `value` passed [`is_valid_content`].
    pub valid: bool,
}

// ---------------------------------------------------------------------------
// Retry loop
// ---------------------------------------------------------------------------

/// Invoke `operation` until `extract(result)` is valid content or attempts run out.
pub async fn generate_with_retry<T, F, Fut, X>(
    stage: &str,
    policy: &RetryPolicy,
    mut operation: F,
    extract: X,
) -> Result<Generated<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    X: Fn(&T) -> &str,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_value: Option<T> = None;
    let mut last_error: Option<RecapError> = None;

    for attempt in 1..=max_attempts {
        let outcome = match policy.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, operation()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(RecapError::backend(format!(
                    "{stage}: no response within {}s",
                    limit.as_secs_f64()
                ))),
            },
            None => operation().await,
        };

        match outcome {
            Ok(value) => {
                let text = extract(&value);
                if is_valid_content(text) {
                    if attempt > 1 {
                        info!(stage, attempt, "generation self-corrected after retry");
                    }
                    return Ok(Generated {
                        value,
                        attempts: attempt,
                        valid: true,
                    });
                }
                warn!(
                    stage,
                    attempt,
                    max_attempts,
                    chars = text.trim().chars().count(),
                    "generated content empty or too short"
                );
                last_value = Some(value);
            }
            Err(e) => {
                warn!(stage, attempt, max_attempts, error = %e, "generation attempt failed");
                last_error = Some(e);
            }
        }

        if attempt < max_attempts && !policy.retry_delay.is_zero() {
            tokio::time::sleep(policy.retry_delay).await;
        }
    }

    match last_value {
        Some(value) => {
            warn!(
                stage,
                attempts = max_attempts,
                "retries exhausted, returning best-effort content"
            );
            Ok(Generated {
                value,
                attempts: max_attempts,
                valid: false,
            })
        }
        None => Err(last_error
            .unwrap_or_else(|| RecapError::backend(format!("{stage}: no attempts were made")))),
    }
}
