use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Channel not accessible: {0}")]
    ChannelNotAccessible(String),

    #[error("Backend request failed: {0}")]
    Request(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
