use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("DevTools HTTP error: {0}")]
    Http(String),

    #[error(
        "Chrome executable not found. Searched:\n  {}\nInstall Google Chrome or Chromium, or set {env_var} to the executable path.",
        .searched.join("\n  ")
    )]
    ChromeNotFound {
        env_var: String,
        searched: Vec<String>,
    },

    #[error("{env_var} is set to '{path}', which does not exist")]
    BadChromeOverride { env_var: String, path: String },

    #[error("failed to launch Chrome: {0}")]
    Launch(String),

    #[error("no page target available on DevTools port {0}")]
    NoPageTarget(u16),

    #[error("CDP error {code} from {method}: {message}")]
    Protocol {
        method: String,
        code: i64,
        message: String,
    },

    #[error("CDP connection closed")]
    ConnectionClosed,

    #[error("page script failed: {0}")]
    Evaluation(String),

    #[error("could not find {field}; tried selectors: {}", .tried.join(", "))]
    SelectorNotFound { field: String, tried: Vec<String> },

    #[error("timed out after {}s waiting for {what}", .waited.as_secs())]
    Timeout { what: String, waited: Duration },

    #[error(
        "login was not completed within {}s; log in using the opened browser window and run again",
        .waited.as_secs()
    )]
    LoginTimeout { waited: Duration },
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}
