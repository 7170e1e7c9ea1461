use crate::error::ErrorCode;

/// Source that cannot be compiled: malformed markup or unbalanced braces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file}:{line}: {message}")]
pub struct CompileError {
    pub file: String,
    pub line: usize,
    pub message: String,
}

impl CompileError {
    pub fn new(file: &str, line: usize, message: impl Into<String>) -> Self {
        Self { file: file.to_string(), line, message: message.into() }
    }
}

impl ErrorCode for CompileError {
    fn error_code(&self) -> &'static str {
        "E_SANDBOX_COMPILE"
    }
}

/// Failure while rendering compiled modules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    pub file: Option<String>,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), file: None }
    }

    #[must_use]
    pub fn in_file(mut self, file: &str) -> Self {
        self.file = Some(file.to_string());
        self
    }
}

impl ErrorCode for RuntimeError {
    fn error_code(&self) -> &'static str {
        "E_SANDBOX_RUNTIME"
    }
}

/// Errors at the host boundary of the sandbox.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("invalid host message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
    #[error("no such node: {0}")]
    UnknownNode(usize),
}

impl ErrorCode for SandboxError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMessage(_) => "E_SANDBOX_MESSAGE",
            Self::UnknownNode(_) => "E_SANDBOX_NODE",
        }
    }
}
