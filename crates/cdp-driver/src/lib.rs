//! `cdp-driver`: a small Chrome DevTools Protocol client for filling in
//! web editors on behalf of a logged-in user.
//!
//! # Architecture
//!
//! ```text
//! find_chrome / ChromeProcess   ← locate and launch Chrome with a dedicated
//!     │                            profile and a remote-debugging port
//!     ▼
//! DevToolsEndpoint              ← /json/version, /json/list, /json/new
//!     │
//!     ▼
//! CdpConnection                 ← WebSocket JSON-RPC; responses routed by id,
//!     │                            events fanned out on a broadcast channel
//!     ▼
//! Page                          ← navigate, evaluate, insertText, key events
//!     │
//!     ├── SelectorChain         ← ordered selector fallbacks per form field
//!     ├── LoginProbe            ← login-wall detection and bounded waiting
//!     └── poll_until            ← every wait is a bounded poll
//! ```
//!
//! [`BrowserSession::open`] wires the pieces together: it attaches to a
//! browser already listening on the port or launches a new one, then
//! connects to the first page target.

pub mod chrome;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod login;
pub mod page;
pub mod poll;
pub mod profile;
pub mod script;
pub mod selector;
pub mod session;

pub use chrome::{find_chrome, ChromeProcess, LaunchOptions};
pub use connection::CdpConnection;
pub use endpoint::{DevToolsEndpoint, TargetInfo, VersionInfo};
pub use error::CdpError;
pub use login::{LoginProbe, LoginState};
pub use page::{Evaluator, KeyPress, Page};
pub use poll::poll_until;
pub use profile::BrowserProfile;
pub use selector::{Locator, SelectorChain};
pub use session::{BrowserSession, SessionOptions};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, CdpError>;
