use thiserror::Error;

/// Errors surfaced by the backend, configuration and input validation layers.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("realtime channel join rejected: {0}")]
    JoinRejected(String),

    #[error("realtime connection closed before the channel was joined")]
    ClosedBeforeJoin,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("image is too large ({0} bytes)")]
    ImageTooLarge(usize),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend thread is not running")]
    BackendGone,
}

pub type Result<T> = std::result::Result<T, ChatError>;
