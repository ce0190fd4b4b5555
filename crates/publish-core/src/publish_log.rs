use crate::error::{PublishError, Result};
use crate::frontmatter::render_document;
use crate::io;
use crate::paths;
use crate::platform::{Method, Platform, SubmitMode, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One successful publish, kept next to the source article as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRecord {
    pub platform: Platform,
    pub method: Method,
    pub mode: SubmitMode,
    pub visibility: Visibility,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl PublishRecord {
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}",
            self.platform.as_str(),
            self.published_at.format("%Y%m%dT%H%M%SZ")
        )
    }

    pub fn render(&self) -> Result<String> {
        let serde_yaml::Value::Mapping(m) = serde_yaml::to_value(self)? else {
            return Err(PublishError::InvalidFrontmatter(
                "publish record did not serialize to a mapping".into(),
            ));
        };
        let summary = match &self.url {
            Some(url) => format!(
                "{} \"{}\" on {} ({}): {url}",
                verb(self.mode),
                self.title,
                self.platform,
                self.method
            ),
            None => format!(
                "{} \"{}\" on {} ({}).",
                verb(self.mode),
                self.title,
                self.platform,
                self.method
            ),
        };
        render_document(&m, &summary)
    }

    /// Write the record under `<article_dir>/publish/`, never replacing an
    /// existing record.
    pub fn write(&self, article_dir: &Path) -> Result<PathBuf> {
        let dir = paths::publish_log_dir(article_dir);
        io::ensure_dir(&dir)?;
        let path = io::unique_path(&dir, &self.file_stem(), "md");
        io::atomic_write(&path, self.render()?.as_bytes())?;
        Ok(path)
    }
}

fn verb(mode: SubmitMode) -> &'static str {
    match mode {
        SubmitMode::Draft => "Saved draft",
        SubmitMode::Submit => "Published",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record() -> PublishRecord {
        PublishRecord {
            platform: Platform::Qiita,
            method: Method::Api,
            mode: SubmitMode::Submit,
            visibility: Visibility::Public,
            title: "Hello".into(),
            url: Some("https://qiita.com/u/items/1".into()),
            source: Some("drafts/hello.md".into()),
            published_at: Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap(),
        }
    }

    #[test]
    fn file_stem_has_platform_and_timestamp() {
        assert_eq!(record().file_stem(), "qiita-20260304T050607Z");
    }

    #[test]
    fn render_is_frontmatter_document() {
        let doc = record().render().unwrap();
        let (fm, body) = crate::frontmatter::split_frontmatter(&doc);
        let fm = fm.unwrap();
        assert!(fm.contains("platform: qiita"));
        assert!(fm.contains("method: api"));
        assert!(fm.contains("mode: submit"));
        assert!(body.contains("https://qiita.com/u/items/1"));
    }

    #[test]
    fn write_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let first = record().write(dir.path()).unwrap();
        let second = record().write(dir.path()).unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with(dir.path().join("publish")));
        assert!(second.exists());
    }
}
