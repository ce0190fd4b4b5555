use crate::article::Article;
use crate::error::{PublishError, Result};
use crate::frontmatter::render_document;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::OnceLock;

pub const DEFAULT_EMOJI: &str = "📝";
pub const DEFAULT_TYPE: &str = "tech";
pub const MAX_TOPICS: usize = 5;
pub const ARTICLES_DIR: &str = "articles";

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9_-]{12,50}$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug_re().is_match(slug) {
        Ok(())
    } else {
        Err(PublishError::InvalidSlug(slug.to_string()))
    }
}

/// A fresh 14-character slug, the same length zenn-cli generates.
pub fn generate_slug() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..14].to_string()
}

/// The slug to use for `article`: explicit override, then frontmatter, then a new one.
pub fn resolve_slug(article: &Article, explicit: Option<&str>) -> Result<String> {
    let slug = explicit
        .map(str::to_string)
        .or_else(|| article.slug.clone())
        .unwrap_or_else(generate_slug);
    validate_slug(&slug)?;
    Ok(slug)
}

pub fn article_type(article: &Article) -> Result<&str> {
    let t = article.article_type.as_deref().unwrap_or(DEFAULT_TYPE);
    match t {
        "tech" | "idea" => Ok(t),
        other => Err(PublishError::InvalidArticleType(other.to_string())),
    }
}

/// Render the file zenn-cli expects at `articles/<slug>.md`.
pub fn render_article(article: &Article, published: bool) -> Result<String> {
    if article.tags.len() > MAX_TOPICS {
        return Err(PublishError::TooManyTopics {
            count: article.tags.len(),
            max: MAX_TOPICS,
        });
    }
    let mut m = Mapping::new();
    m.insert("title".into(), article.title.clone().into());
    m.insert(
        "emoji".into(),
        article.emoji.as_deref().unwrap_or(DEFAULT_EMOJI).into(),
    );
    m.insert("type".into(), article_type(article)?.into());
    m.insert(
        "topics".into(),
        Value::Sequence(article.tags.iter().cloned().map(Value::from).collect()),
    );
    m.insert("published".into(), published.into());
    render_document(&m, &article.content)
}
