use crate::bridge::NotificationDomain;
use crate::library::LibraryError;

/// Errors raised inside the notification bridge
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to register {domain} listener: {source}")]
    Registration {
        domain: NotificationDomain,
        #[source]
        source: LibraryError,
    },

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}
