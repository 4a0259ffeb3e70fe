use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Tracking error: {0}")]
    Tracking(#[from] TrackingError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Wallet registry errors, surfaced to the user as replies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Wallet {0} is already tracked")]
    DuplicateAddress(String),

    #[error("Wallet {0} not found")]
    NotFound(String),
}

/// Errors that block a chat from starting to track
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("No wallets tracked")]
    NoWalletsTracked,

    #[error("No wallet selected")]
    NoWalletSelected,
}

/// JSON-RPC call failures. The client never retries; callers decide.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC returned HTTP {status}")]
    Http { status: u16 },

    #[error("RPC error {code}: {message}")]
    JsonRpc { code: i64, message: String },

    #[error("RPC returned a null result for {method}")]
    NullResult { method: String },

    #[error("Failed to decode RPC response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Short diagnostic suitable for sending to a chat
    pub fn diagnostic(&self) -> String {
        match self {
            RpcError::Http { status } => format!("Error: '{}'", status),
            RpcError::JsonRpc { code, .. } => format!("Error: RPC code '{}'", code),
            RpcError::NullResult { method } => format!("Error: empty result from '{}'", method),
            RpcError::Transport(_) => "Error: RPC endpoint unreachable".to_string(),
            RpcError::Decode(_) => "Error: unreadable RPC response".to_string(),
        }
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
