use thiserror::Error;

/// Errors reported by a [`ChainSyncSource`](super::ChainSyncSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The JSON-RPC client failed.
    #[error(transparent)]
    Client(#[from] jsonrpsee::core::ClientError),

    /// Request parameters could not be encoded.
    #[error("failed to encode request params: {0}")]
    Params(#[from] serde_json::Error),

    /// The connection to the node is gone.
    #[error("event source disconnected")]
    Disconnected,
}

impl SourceError {
    /// Returns `true` if the error is a lost or stalled connection, after which a new session
    /// can be started.
    pub const fn is_disconnect(&self) -> bool {
        use jsonrpsee::core::ClientError;
        matches!(
            self,
            Self::Disconnected |
                Self::Client(
                    ClientError::RestartNeeded(_) |
                        ClientError::Transport(_) |
                        ClientError::RequestTimeout
                )
        )
    }
}

impl PartialEq for SourceError {
    fn eq(&self, other: &Self) -> bool {
        use SourceError::*;
        match (self, other) {
            (Client(a), Client(b)) => a.to_string() == b.to_string(),
            (Params(a), Params(b)) => a.to_string() == b.to_string(),
            (Disconnected, Disconnected) => true,
            _ => false,
        }
    }
}

impl Eq for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::{core::ClientError, types::ErrorObjectOwned};
    use std::sync::Arc;

    #[test]
    fn test_disconnect_classification() {
        assert!(SourceError::Disconnected.is_disconnect());
        assert!(SourceError::Client(ClientError::RequestTimeout).is_disconnect());
        assert!(
            SourceError::Client(ClientError::RestartNeeded(Arc::new(ClientError::Custom(
                "socket closed".to_string()
            ))))
            .is_disconnect()
        );

        let call = ErrorObjectOwned::owned(1000, "IntersectionNotFound", None::<()>);
        assert!(!SourceError::Client(ClientError::Call(call)).is_disconnect());
        assert!(!SourceError::Client(ClientError::Custom("bad".to_string())).is_disconnect());
    }

    #[test]
    fn test_source_error_eq() {
        assert_eq!(SourceError::Disconnected, SourceError::Disconnected);
        assert_ne!(
            SourceError::Disconnected,
            SourceError::Client(ClientError::Custom("x".to_string()))
        );
    }
}
