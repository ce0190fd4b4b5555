//! Qiita item payloads, request headers, and a small v2 API client.

use crate::article::Article;
use crate::error::{PublishError, Result};
use crate::frontmatter::render_document;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://qiita.com";
pub const TOKEN_ENV: &str = "QIITA_TOKEN";

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QiitaTag {
    pub name: String,
}

/// Body of `POST /api/v2/items` and `PATCH /api/v2/items/:id`.
///
/// Optional keys are left out entirely when unset; the API treats an explicit
/// `null` differently from an absent key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QiitaItemPayload {
    pub title: String,
    pub body: String,
    pub tags: Vec<QiitaTag>,
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_url_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<bool>,
}

pub fn build_item_payload(article: &Article) -> QiitaItemPayload {
    QiitaItemPayload {
        title: article.title.clone(),
        body: article.content.clone(),
        tags: article
            .tags
            .iter()
            .map(|t| QiitaTag { name: t.clone() })
            .collect(),
        private: article.private,
        slide: article.slide,
        organization_url_name: article.organization_url_name.clone(),
        tweet: article.tweet,
    }
}

/// Request headers for an authenticated API call.
pub fn build_headers(token: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers.insert("Authorization".to_string(), format!("Bearer {token}"));
    headers.insert("Content-Type".to_string(), "application/json".to_string());
    headers
}

// ---------------------------------------------------------------------------
// qiita-cli article files
// ---------------------------------------------------------------------------

/// Render an article in the frontmatter layout qiita-cli keeps under `public/`.
pub fn render_cli_document(article: &Article) -> Result<String> {
    let mut m = Mapping::new();
    m.insert("title".into(), article.title.clone().into());
    m.insert(
        "tags".into(),
        Value::Sequence(article.tags.iter().cloned().map(Value::from).collect()),
    );
    m.insert("private".into(), article.private.into());
    m.insert("updated_at".into(), "".into());
    m.insert("id".into(), opt_string(&article.id));
    m.insert(
        "organization_url_name".into(),
        opt_string(&article.organization_url_name),
    );
    m.insert("slide".into(), article.slide.unwrap_or(false).into());
    m.insert("ignorePublish".into(), false.into());
    render_document(&m, &article.content)
}

fn opt_string(v: &Option<String>) -> Value {
    v.as_ref().map(|s| Value::from(s.as_str())).unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// API client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiitaItem {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

pub struct QiitaClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl QiitaClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: impl Into<String>, base_url: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Read the access token from `QIITA_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| PublishError::MissingEnv(TOKEN_ENV.to_string()))?;
        Self::new(token)
    }

    pub fn create_item(&self, payload: &QiitaItemPayload) -> Result<QiitaItem> {
        let url = format!("{}/api/v2/items", self.base_url);
        tracing::info!(title = %payload.title, "creating qiita item");
        self.send(self.http.post(url), payload)
    }

    pub fn update_item(&self, id: &str, payload: &QiitaItemPayload) -> Result<QiitaItem> {
        let url = format!("{}/api/v2/items/{id}", self.base_url);
        tracing::info!(id, title = %payload.title, "updating qiita item");
        self.send(self.http.patch(url), payload)
    }

    fn send(
        &self,
        mut req: reqwest::blocking::RequestBuilder,
        payload: &QiitaItemPayload,
    ) -> Result<QiitaItem> {
        for (k, v) in build_headers(&self.token) {
            req = req.header(k, v);
        }
        let resp = req.body(serde_json::to_vec(payload)?).send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or_else(|_| text.trim().to_string());
            return Err(PublishError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}
