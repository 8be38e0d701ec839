//! Throttle backoff and retry helpers

mod backoff;
mod error;

pub use backoff::{Backoff, FixedBackoff, DEFAULT_THROTTLE_BACKOFF};
pub use error::RetryError;

use tracing::{debug, trace, warn};

/// Retries an operation while it keeps failing with a throttling error
///
/// Every throttled attempt is followed by a backoff sleep, including the last
/// one, so the caller never resubmits or moves on without slowing down first.
/// Any error the classifier does not recognize as throttling ends the loop
/// immediately.
pub struct RetryHandle<B: Backoff> {
    max_attempts: u32,
    backoff: B,
    attempts: u32,
}

impl<B: Backoff> RetryHandle<B> {
    pub fn new(max_attempts: u32, backoff: B) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            attempts: 0,
        }
    }

    /// Run `operation` until it succeeds, fails fatally or uses up its attempts
    pub async fn retry<F, Fut, T, E>(
        &mut self,
        mut operation: F,
        is_throttled: impl Fn(&E) -> bool,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        loop {
            self.attempts += 1;
            trace!(attempt = self.attempts, "Executing operation");

            match operation().await {
                Ok(value) => {
                    debug!(attempts = self.attempts, "Operation succeeded");
                    return Ok(value);
                }
                Err(e) if !is_throttled(&e) => return Err(RetryError::Fatal(e)),
                Err(e) => {
                    let delay = self.backoff.next_delay(self.attempts);
                    warn!(
                        attempt = self.attempts,
                        delay_ms = ?delay.as_millis(),
                        error = %e,
                        "Throttled, backing off"
                    );
                    tokio::time::sleep(delay).await;

                    if self.attempts >= self.max_attempts {
                        return Err(RetryError::Exhausted {
                            attempts: self.attempts,
                            last_error: e,
                        });
                    }
                }
            }
        }
    }

}
