use crate::error::{PublishError, Result};
use crate::frontmatter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A validated article ready to be handed to a publishing flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub tags: Vec<String>,
    pub content: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_url_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Article {
    /// Build an article from inline values, applying the same validation as
    /// frontmatter parsing.
    pub fn from_parts(title: &str, content: &str, tags: Vec<String>) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(PublishError::TitleRequired);
        }
        let tags = frontmatter::dedupe(tags);
        if tags.is_empty() {
            return Err(PublishError::TagsRequired);
        }
        Ok(Self {
            title: title.to_string(),
            tags,
            content: content.trim().to_string(),
            private: false,
            slide: None,
            organization_url_name: None,
            tweet: None,
            id: None,
            slug: None,
            emoji: None,
            article_type: None,
            source: None,
        })
    }

    /// Directory the article was read from, if it came from a file.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source.as_deref().and_then(Path::parent)
    }

    /// File stem of the source markdown, used to name generated files.
    pub fn source_stem(&self) -> Option<&str> {
        self.source
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
    }
}

/// Split a `--tags a,b,c` argument into tag names.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    frontmatter::dedupe(raw.split(',').map(str::to_string).collect())
}

// ---------------------------------------------------------------------------
// ArticleInput
// ---------------------------------------------------------------------------

/// Where the article comes from: a markdown file or inline flags.
#[derive(Debug, Clone, Default)]
pub struct ArticleInput {
    pub markdown: Option<PathBuf>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<String>,
}

impl ArticleInput {
    /// Resolve into a validated [`Article`].
    ///
    /// `read_stdin` is only called when `content` is `-`.
    pub fn resolve<F>(&self, read_stdin: F) -> Result<Article>
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        if let Some(path) = &self.markdown {
            if self.title.is_some() || self.content.is_some() {
                return Err(PublishError::ConflictingInput(
                    "--markdown cannot be combined with --title or --content".into(),
                ));
            }
            let tags = self.tags.as_deref().map(parse_tag_list);
            return frontmatter::parse_markdown_file_with_tags(path, tags);
        }

        let title = self.title.as_deref().unwrap_or_default();
        let content = match self.content.as_deref() {
            Some("-") => read_stdin()?,
            Some(c) => c.to_string(),
            None => String::new(),
        };
        let tags = self
            .tags
            .as_deref()
            .map(parse_tag_list)
            .unwrap_or_default();
        Article::from_parts(title, &content, tags)
    }
}
