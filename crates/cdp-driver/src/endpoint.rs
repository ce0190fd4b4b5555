use std::time::Duration;

use serde::Deserialize;

use crate::poll::poll_until;
use crate::{CdpError, Result};

/// Response of `GET /json/version`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    #[serde(rename = "Browser", default)]
    pub browser: String,
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub web_socket_debugger_url: Option<String>,
}

/// One entry of `GET /json/list`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetInfo {
    pub fn is_page(&self) -> bool {
        self.target_type == "page" && self.web_socket_debugger_url.is_some()
    }
}

/// The HTTP side of Chrome's remote-debugging port.
#[derive(Debug, Clone)]
pub struct DevToolsEndpoint {
    base_url: String,
    port: u16,
    http: reqwest::Client,
}

impl DevToolsEndpoint {
    pub fn local(port: u16) -> Self {
        Self::with_base_url(format!("http://127.0.0.1:{port}"), port)
    }

    pub fn with_base_url(base_url: impl Into<String>, port: u16) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            port,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn version(&self) -> Result<VersionInfo> {
        let resp = self
            .http
            .get(format!("{}/json/version", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Whether a browser already answers on this port.
    pub async fn is_listening(&self) -> bool {
        self.version().await.is_ok()
    }

    pub async fn wait_until_listening(&self, timeout: Duration) -> Result<VersionInfo> {
        poll_until(
            &format!("DevTools on port {}", self.port),
            timeout,
            Duration::from_millis(250),
            || async { Ok(self.version().await.ok()) },
        )
        .await
    }

    pub async fn list_targets(&self) -> Result<Vec<TargetInfo>> {
        let resp = self
            .http
            .get(format!("{}/json/list", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Open a new tab. Recent Chrome versions only accept `PUT` here.
    pub async fn new_page(&self, url: &str) -> Result<TargetInfo> {
        let resp = self
            .http
            .put(format!("{}/json/new?{url}", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// The first page target, opening one at `about:blank` when none exists.
    pub async fn page_target(&self) -> Result<TargetInfo> {
        if let Some(t) = self.list_targets().await?.into_iter().find(TargetInfo::is_page) {
            return Ok(t);
        }
        tracing::debug!(port = self.port, "no page target; opening a new tab");
        let t = self.new_page("about:blank").await?;
        if t.is_page() {
            Ok(t)
        } else {
            Err(CdpError::NoPageTarget(self.port))
        }
    }
}
