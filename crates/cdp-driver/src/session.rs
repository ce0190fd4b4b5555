use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;

use crate::chrome::{find_chrome, ChromeProcess, LaunchOptions};
use crate::connection::CdpConnection;
use crate::endpoint::DevToolsEndpoint;
use crate::page::Page;
use crate::profile::BrowserProfile;
use crate::{CdpError, Result};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Environment variable that may point at the Chrome executable.
    pub chrome_env_var: String,
    pub profile_dir: PathBuf,
    pub port: u16,
    pub headless: bool,
    pub launch_timeout: Duration,
}

impl SessionOptions {
    pub fn new(chrome_env_var: impl Into<String>, profile_dir: PathBuf, port: u16) -> Self {
        Self {
            chrome_env_var: chrome_env_var.into(),
            profile_dir,
            port,
            headless: false,
            launch_timeout: Duration::from_secs(20),
        }
    }
}

/// A connected browser tab, either attached to a running Chrome or freshly
/// launched with a dedicated profile.
pub struct BrowserSession {
    page: Page,
    endpoint: DevToolsEndpoint,
    process: Option<ChromeProcess>,
}

impl BrowserSession {
    pub async fn open(opts: &SessionOptions) -> Result<Self> {
        let endpoint = DevToolsEndpoint::local(opts.port);

        let (version, process) = match endpoint.version().await {
            Ok(version) => {
                tracing::info!(port = opts.port, "attaching to running Chrome");
                (version, None)
            }
            Err(_) => {
                let profile = BrowserProfile::new(&opts.profile_dir);
                profile.prepare()?;
                let executable = find_chrome(&opts.chrome_env_var)?;
                let mut chrome = ChromeProcess::launch(&LaunchOptions {
                    executable,
                    user_data_dir: profile.dir().to_path_buf(),
                    port: opts.port,
                    headless: opts.headless,
                    start_url: None,
                    extra_args: Vec::new(),
                })?;
                let version = match endpoint.wait_until_listening(opts.launch_timeout).await {
                    Ok(version) => version,
                    Err(e) => {
                        // A crashed Chrome explains itself better than the timeout.
                        chrome.ensure_running()?;
                        chrome.kill().await;
                        return Err(e);
                    }
                };
                tracing::info!(port = chrome.port(), "launched Chrome");
                (version, Some(chrome))
            }
        };
        tracing::debug!(
            browser = %version.browser,
            protocol = %version.protocol_version,
            "DevTools ready"
        );

        let target = endpoint.page_target().await?;
        let ws_url = target
            .web_socket_debugger_url
            .ok_or(CdpError::NoPageTarget(opts.port))?;
        let page = Page::new(CdpConnection::connect(&ws_url).await?);
        page.enable().await?;
        page.bring_to_front().await?;

        Ok(Self {
            page,
            endpoint,
            process,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Whether this session started the browser (as opposed to attaching).
    pub fn launched(&self) -> bool {
        self.process.is_some()
    }

    /// Close the whole browser. Without this the browser keeps running and
    /// the next session attaches to it.
    pub async fn close(mut self) -> Result<()> {
        let version = self.endpoint.version().await?;
        if let Some(ws) = version.web_socket_debugger_url {
            let browser = CdpConnection::connect(&ws).await?;
            match browser.call("Browser.close", json!({})).await {
                Ok(_) | Err(CdpError::ConnectionClosed) => {}
                Err(e) => return Err(e),
            }
        }
        if let Some(chrome) = self.process.as_mut() {
            chrome.kill().await;
        }
        tracing::info!(port = self.endpoint.port(), "browser closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{SinkExt, StreamExt};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    /// WebSocket stand-in for both the page and the browser target. Replies
    /// `{}` to every call and records the method names it saw.
    async fn devtools_ws() -> (String, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::clone(&seen);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
                    let (mut tx, mut rx) = ws.split();
                    while let Some(Ok(Message::Text(txt))) = rx.next().await {
                        let req: Value = serde_json::from_str(txt.as_str()).unwrap();
                        calls
                            .lock()
                            .unwrap()
                            .push(req["method"].as_str().unwrap_or_default().to_string());
                        let reply = json!({ "id": req["id"], "result": {} });
                        if tx.send(Message::text(reply.to_string())).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });
        (format!("ws://{addr}/devtools"), seen)
    }

    fn version_body(ws: &str) -> String {
        json!({
            "Browser": "Chrome/126.0",
            "Protocol-Version": "1.3",
            "webSocketDebuggerUrl": format!("{ws}/browser/B1"),
        })
        .to_string()
    }

    fn list_body(ws: &str) -> String {
        json!([
            { "id": "W1", "type": "service_worker", "webSocketDebuggerUrl": format!("{ws}/sw") },
            { "id": "P1", "type": "page", "url": "about:blank", "webSocketDebuggerUrl": format!("{ws}/page/P1") },
        ])
        .to_string()
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[cfg(unix)]
    fn fake_chrome(dir: &TempDir, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join("fake-chrome");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn attaches_to_listening_browser() {
        let (ws, calls) = devtools_ws().await;
        let mut server = mockito::Server::new_async().await;
        let _version = server
            .mock("GET", "/json/version")
            .with_body(version_body(&ws))
            .create_async()
            .await;
        let _list = server
            .mock("GET", "/json/list")
            .with_body(list_body(&ws))
            .create_async()
            .await;

        let profile = TempDir::new().unwrap();
        let opts = SessionOptions::new(
            "CDP_DRIVER_TEST_UNUSED_CHROME",
            profile.path().join("p"),
            server.socket_address().port(),
        );
        let session = BrowserSession::open(&opts).await.unwrap();
        assert!(!session.launched());
        // Attaching never touches the profile directory.
        assert!(!profile.path().join("p").exists());
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["Page.enable".to_string(), "Page.bringToFront".to_string()]
        );

        session.close().await.unwrap();
        assert!(calls.lock().unwrap().contains(&"Browser.close".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn launches_then_waits_for_devtools() {
        let (ws, calls) = devtools_ws().await;
        let mut server = mockito::Server::new_async().await;
        // Nothing answers until the launched browser has "started".
        let booting = server
            .mock("GET", "/json/version")
            .with_status(503)
            .create_async()
            .await;
        let _list = server
            .mock("GET", "/json/list")
            .with_body(list_body(&ws))
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let chrome = fake_chrome(&dir, "sleep 30");
        std::env::set_var("CDP_DRIVER_TEST_LAUNCH_CHROME", &chrome);
        let mut opts = SessionOptions::new(
            "CDP_DRIVER_TEST_LAUNCH_CHROME",
            dir.path().join("profile"),
            server.socket_address().port(),
        );
        opts.launch_timeout = Duration::from_secs(10);

        let started = async {
            tokio::time::sleep(Duration::from_millis(600)).await;
            booting.remove_async().await;
            server
                .mock("GET", "/json/version")
                .with_body(version_body(&ws))
                .create_async()
                .await
        };
        let (session, _ready) = tokio::join!(BrowserSession::open(&opts), started);
        let session = session.unwrap();

        assert!(session.launched());
        assert!(dir.path().join("profile").is_dir());
        assert!(calls.lock().unwrap().contains(&"Page.enable".to_string()));
        session.close().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn early_exit_reports_chrome_stderr() {
        let dir = TempDir::new().unwrap();
        let chrome = fake_chrome(&dir, "echo 'profile is locked by another process' >&2\nexit 3");
        std::env::set_var("CDP_DRIVER_TEST_CRASHING_CHROME", &chrome);
        let mut opts = SessionOptions::new(
            "CDP_DRIVER_TEST_CRASHING_CHROME",
            dir.path().join("profile"),
            free_port(),
        );
        opts.launch_timeout = Duration::from_secs(1);

        let err = BrowserSession::open(&opts).await.err().unwrap();
        assert!(matches!(err, CdpError::Launch(_)), "{err}");
        let msg = err.to_string();
        assert!(msg.contains("exited early"), "{msg}");
        assert!(msg.contains("profile is locked by another process"), "{msg}");
    }

    #[tokio::test]
    async fn missing_chrome_is_reported_before_waiting() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("CDP_DRIVER_TEST_MISSING_CHROME", dir.path().join("nope"));
        let opts = SessionOptions::new(
            "CDP_DRIVER_TEST_MISSING_CHROME",
            dir.path().join("profile"),
            free_port(),
        );
        let err = BrowserSession::open(&opts).await.err().unwrap();
        assert!(matches!(err, CdpError::BadChromeOverride { .. }), "{err}");
    }
}
