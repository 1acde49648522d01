/// Errors raised by metric sources and alert sinks.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store returned a non-2xx status code.
    #[error("Store returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// A key held something other than a number or `null`.
    #[error("Unexpected value at '{key}': {value}")]
    UnexpectedType {
        key: String,
        value: serde_json::Value,
    },

    /// The store answered but the body was not what we expected.
    #[error("Invalid store response: {0}")]
    InvalidResponse(String),

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
