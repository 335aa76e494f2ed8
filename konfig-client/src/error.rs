pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// `start()` was called while the client was already running.
    #[error("Client is already running")]
    AlreadyRunning,

    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    /// Channel establishment failures; absorbed by the reconnect loop.
    #[error(transparent)]
    Transport(#[from] Box<tonic::transport::Error>),

    /// Stream-level failures; absorbed by the reconnect loop.
    #[error(transparent)]
    Status(#[from] Box<tonic::Status>),
}
