//! Error codes shared by every subsystem.
//!
//! Each error enum implements [`ErrorCode`] so the HTTP layer can report a
//! grepable `E_*` code and a retryable flag next to the human message.

/// Grepable error code and retryable flag for structured error responses.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
