use std::path::PathBuf;

use chrono::Utc;
use publish_core::publish_log::PublishRecord;
use publish_core::{Article, Method, Platform, SubmitMode, Visibility};
use serde::Serialize;

use crate::output::print_json;

/// Result of one publish run, printed at the end of every platform command.
#[derive(Debug, Serialize)]
pub struct PublishOutcome {
    pub platform: Platform,
    pub method: Method,
    pub mode: SubmitMode,
    pub visibility: Visibility,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<PathBuf>,
}

impl PublishOutcome {
    pub fn new(
        article: &Article,
        platform: Platform,
        method: Method,
        mode: SubmitMode,
        visibility: Visibility,
    ) -> Self {
        Self {
            platform,
            method,
            mode,
            visibility,
            title: article.title.clone(),
            url: None,
            file: None,
            log: None,
        }
    }

    /// Record the publish next to the source markdown (if any) and print the outcome.
    pub fn finish(mut self, article: &Article, json: bool) -> anyhow::Result<()> {
        if let Some(dir) = article.source_dir() {
            let record = PublishRecord {
                platform: self.platform,
                method: self.method,
                mode: self.mode,
                visibility: self.visibility,
                title: self.title.clone(),
                url: self.url.clone(),
                source: article.source.as_ref().map(|p| p.display().to_string()),
                published_at: Utc::now(),
            };
            match record.write(dir) {
                Ok(path) => self.log = Some(path),
                // The publish itself already happened; losing the log is not fatal.
                Err(e) => tracing::warn!(error = %e, "could not write publish log"),
            }
        }

        if json {
            return print_json(&self);
        }
        let verb = match self.mode {
            SubmitMode::Draft => "Saved draft",
            SubmitMode::Submit => "Published",
        };
        println!("{verb} \"{}\" on {} ({})", self.title, self.platform, self.method);
        if let Some(url) = &self.url {
            println!("  url:  {url}");
        }
        if let Some(file) = &self.file {
            println!("  file: {}", file.display());
        }
        if let Some(log) = &self.log {
            println!("  log:  {}", log.display());
        }
        Ok(())
    }
}
