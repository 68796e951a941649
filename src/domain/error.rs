use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend timed out: {0}")]
    BackendTimeout(String),

    #[error("Backend protocol error: {0}")]
    BackendProtocol(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    pub fn backend_timeout(msg: impl Into<String>) -> Self {
        Self::BackendTimeout(msg.into())
    }

    pub fn backend_protocol(msg: impl Into<String>) -> Self {
        Self::BackendProtocol(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Errors caused by the caller's input rather than by the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::BackendTimeout(_) | Self::BackendProtocol(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_is_client_error() {
        let err = DomainError::invalid_input("bad ohlc_json");
        assert!(err.is_client_error());
        assert!(!err.is_backend_error());
        assert_eq!(err.to_string(), "Invalid input: bad ohlc_json");
    }

    #[test]
    fn backend_variants_are_backend_errors() {
        for err in [
            DomainError::backend_unavailable("connection refused"),
            DomainError::backend_timeout("after 120s"),
            DomainError::backend_protocol("not json"),
        ] {
            assert!(err.is_backend_error());
            assert!(!err.is_client_error());
        }
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "ollama");
        let err: DomainError = io.into();
        assert!(matches!(err, DomainError::IoError(_)));
    }
}
