use thiserror::Error;

/// Error kinds surfaced to the user through the chat. None of these
/// are fatal to the process: every variant leaves the conversation in
/// a resumable state.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The calendar provider rejected or could not obtain
    /// credentials. Retryable.
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    /// The LLM call errored or timed out. The turn is discarded and
    /// can be retried.
    #[error("The assistant is unavailable: {0}")]
    LlmUnavailable(String),

    /// A single cancel/send call failed. Recorded per item, the batch
    /// continues.
    #[error("Calendar operation failed: {0}")]
    GatewayOperationFailure(String),

    /// Malformed date range or missing required event fields. No
    /// state is mutated.
    #[error("Invalid input: {0}")]
    ValidationFailure(String),
}
