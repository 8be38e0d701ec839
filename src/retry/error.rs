use thiserror::Error;

/// Error type for throttle-aware retries
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("Still throttled after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: E },

    #[error("Non-retriable failure: {0}")]
    Fatal(E),
}
