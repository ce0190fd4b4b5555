//! Markdown documents with a leading `---`-delimited YAML block.
//!
//! Every artifact the publishing pipeline touches (article drafts, CLI tool
//! article files, publish logs) uses this one shape, so parsing and rendering
//! live together here.

use crate::article::Article;
use crate::error::{PublishError, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;

pub const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Split `text` into its frontmatter block and the remaining body.
///
/// The frontmatter must open on the very first line (a UTF-8 BOM is
/// tolerated) and close on the next line that is exactly `---`. When either
/// delimiter is missing the whole text is the body and no metadata is
/// returned.
pub fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let Some(first_end) = text.find('\n') else {
        return (None, text);
    };
    if text[..first_end].trim_end() != DELIMITER {
        return (None, text);
    }

    let yaml_start = first_end + 1;
    let mut pos = yaml_start;
    while pos < text.len() {
        let line_end = text[pos..]
            .find('\n')
            .map(|i| pos + i)
            .unwrap_or(text.len());
        if text[pos..line_end].trim_end() == DELIMITER {
            let body_start = (line_end + 1).min(text.len());
            return (Some(&text[yaml_start..pos]), &text[body_start..]);
        }
        pos = line_end + 1;
    }

    (None, text)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    tags: Option<Value>,
    #[serde(default)]
    topics: Option<Value>,
    #[serde(default)]
    private: Option<bool>,
    #[serde(default)]
    slide: Option<bool>,
    #[serde(default)]
    organization_url_name: Option<Value>,
    #[serde(default)]
    tweet: Option<bool>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    slug: Option<Value>,
    #[serde(default)]
    emoji: Option<Value>,
    #[serde(default, rename = "type")]
    article_type: Option<Value>,
}

/// Parse a markdown document into a validated [`Article`].
///
/// `title` is checked before `tags`, so a document missing both reports the
/// title first.
pub fn parse_markdown(text: &str) -> Result<Article> {
    parse_markdown_with_tags(text, None)
}

/// Like [`parse_markdown`], but a non-empty `tags` list replaces the
/// document's own tags before validation.
pub fn parse_markdown_with_tags(text: &str, tags: Option<Vec<String>>) -> Result<Article> {
    let (yaml, body) = split_frontmatter(text);
    let raw = match yaml {
        Some(y) => parse_raw(y)?,
        None => RawFrontmatter::default(),
    };

    let title = raw
        .title
        .as_ref()
        .and_then(scalar_to_string)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(PublishError::TitleRequired)?;

    let tag_source = raw.tags.as_ref().or(raw.topics.as_ref());
    let tags = match (tags.filter(|t| !t.is_empty()), tag_source) {
        (Some(given), _) => dedupe(given),
        (None, Some(v)) => normalize_tags(v)?,
        (None, None) => Vec::new(),
    };
    if tags.is_empty() {
        return Err(PublishError::TagsRequired);
    }

    Ok(Article {
        title,
        tags,
        content: body.trim().to_string(),
        private: raw.private.unwrap_or(false),
        slide: raw.slide,
        organization_url_name: text_field(raw.organization_url_name.as_ref()),
        tweet: raw.tweet,
        id: text_field(raw.id.as_ref()),
        slug: text_field(raw.slug.as_ref()),
        emoji: text_field(raw.emoji.as_ref()),
        article_type: text_field(raw.article_type.as_ref()),
        source: None,
    })
}

/// Read `path` as UTF-8 and parse it with [`parse_markdown`].
pub fn parse_markdown_file(path: &Path) -> Result<Article> {
    parse_markdown_file_with_tags(path, None)
}

/// Read `path` and parse it with [`parse_markdown_with_tags`].
pub fn parse_markdown_file_with_tags(path: &Path, tags: Option<Vec<String>>) -> Result<Article> {
    let text = std::fs::read_to_string(path)?;
    let mut article = parse_markdown_with_tags(&text, tags)?;
    article.source = Some(path.to_path_buf());
    Ok(article)
}

fn parse_raw(yaml: &str) -> Result<RawFrontmatter> {
    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| PublishError::InvalidFrontmatter(e.to_string()))?;
    match value {
        Value::Null => Ok(RawFrontmatter::default()),
        Value::Mapping(_) => serde_yaml::from_value(value)
            .map_err(|e| PublishError::InvalidFrontmatter(e.to_string())),
        _ => Err(PublishError::InvalidFrontmatter(
            "frontmatter must be a mapping".into(),
        )),
    }
}

/// Optional text field: YAML may type an unquoted `202401011234` as a
/// number, which is still a valid slug or id. Blank values are absent.
fn text_field(v: Option<&Value>) -> Option<String> {
    v.and_then(scalar_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize a `tags` value to a list of distinct, trimmed, non-empty names.
///
/// Accepts block or flow sequences, a comma-separated string, and sequences
/// of `{name: ...}` mappings (the Qiita API shape).
pub fn normalize_tags(value: &Value) -> Result<Vec<String>> {
    let raw: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let name = match item {
                    Value::Mapping(m) => m.get("name").and_then(scalar_to_string),
                    other => scalar_to_string(other),
                };
                match name {
                    Some(n) => out.push(n),
                    None if item.is_null() => {}
                    None => {
                        return Err(PublishError::InvalidFrontmatter(format!(
                            "unsupported tag entry: {item:?}"
                        )))
                    }
                }
            }
            out
        }
        other => {
            return Err(PublishError::InvalidFrontmatter(format!(
                "tags must be a list or a comma-separated string, got {other:?}"
            )))
        }
    };
    Ok(dedupe(raw))
}

/// Trim, drop empties, and remove repeats while keeping first-seen order.
pub fn dedupe(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for t in tags {
        let t = t.trim();
        if !t.is_empty() && !out.iter().any(|seen| seen == t) {
            out.push(t.to_string());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render `frontmatter` and `body` back into a markdown document.
pub fn render_document(frontmatter: &Mapping, body: &str) -> Result<String> {
    let mut yaml = serde_yaml::to_string(frontmatter)?;
    if !yaml.ends_with('\n') {
        yaml.push('\n');
    }
    let body = body.trim();
    let mut out = String::with_capacity(yaml.len() + body.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    out.push_str(DELIMITER);
    out.push('\n');
    if !body.is_empty() {
        out.push('\n');
        out.push_str(body);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_inline_tag_array() {
        let article = parse_markdown("---\ntitle: Test\ntags: [tag1, tag2]\n---\n\nBody").unwrap();
        assert_eq!(article.title, "Test");
        assert_eq!(article.tags, vec!["tag1", "tag2"]);
        assert_eq!(article.content, "Body");
    }

    #[test]
    fn block_and_flow_tags_are_equivalent() {
        let flow = parse_markdown("---\ntitle: T\ntags: [a, b, c]\n---\nx").unwrap();
        let block = parse_markdown("---\ntitle: T\ntags:\n  - a\n  - b\n  - c\n---\nx").unwrap();
        assert_eq!(flow.tags, block.tags);
        assert_eq!(flow.content, block.content);
    }

    #[test]
    fn missing_tags_is_rejected() {
        let err = parse_markdown("---\ntitle: Test\n---\n\nBody").unwrap_err();
        assert!(err.to_string().contains("Tags are required"));
    }

    #[test]
    fn empty_tags_fail_like_missing_tags() {
        let empty = parse_markdown("---\ntitle: Test\ntags: []\n---\nBody").unwrap_err();
        let missing = parse_markdown("---\ntitle: Test\n---\nBody").unwrap_err();
        assert_eq!(empty.to_string(), missing.to_string());
    }

    #[test]
    fn missing_title_is_rejected_before_tags() {
        let err = parse_markdown("---\ntags: [a]\n---\nBody").unwrap_err();
        assert!(matches!(err, PublishError::TitleRequired));
        let err = parse_markdown("---\nprivate: true\n---\nBody").unwrap_err();
        assert!(err.to_string().contains("Title is required"));
    }

    #[test]
    fn blank_title_counts_as_missing() {
        let err = parse_markdown("---\ntitle: '   '\ntags: [a]\n---\n").unwrap_err();
        assert!(matches!(err, PublishError::TitleRequired));
    }

    #[test]
    fn no_delimiters_means_no_metadata() {
        let err = parse_markdown("# Just a heading\n\ntext").unwrap_err();
        assert!(matches!(err, PublishError::TitleRequired));
    }

    #[test]
    fn unterminated_frontmatter_is_body() {
        let (fm, body) = split_frontmatter("---\ntitle: x\nno close");
        assert!(fm.is_none());
        assert_eq!(body, "---\ntitle: x\nno close");
    }

    #[test]
    fn split_handles_bom_and_crlf() {
        let (fm, body) = split_frontmatter("\u{feff}---\r\ntitle: x\r\n---\r\nbody");
        assert_eq!(fm, Some("title: x\r\n"));
        assert_eq!(body, "body");
    }

    #[test]
    fn optional_fields_default() {
        let a = parse_markdown("---\ntitle: T\ntags: [x]\n---\nC").unwrap();
        assert!(!a.private);
        assert_eq!(a.slide, None);
        assert_eq!(a.organization_url_name, None);
        assert_eq!(a.tweet, None);
    }

    #[test]
    fn optional_fields_are_read() {
        let a = parse_markdown(
            "---\ntitle: T\ntags: [x]\nprivate: true\nslide: true\norganization_url_name: acme\ntweet: false\n---\nC",
        )
        .unwrap();
        assert!(a.private);
        assert_eq!(a.slide, Some(true));
        assert_eq!(a.organization_url_name.as_deref(), Some("acme"));
        assert_eq!(a.tweet, Some(false));
    }

    #[test]
    fn qiita_cli_null_fields_are_none() {
        let a = parse_markdown(
            "---\ntitle: T\ntags:\n  - rust\nprivate: false\nupdated_at: ''\nid: null\norganization_url_name: null\nslide: false\nignorePublish: false\n---\nC",
        )
        .unwrap();
        assert_eq!(a.id, None);
        assert_eq!(a.organization_url_name, None);
        assert_eq!(a.slide, Some(false));
    }

    #[test]
    fn comma_string_tags_and_topics_alias() {
        let a = parse_markdown("---\ntitle: T\ntags: 'rust, cli,, rust'\n---\n").unwrap();
        assert_eq!(a.tags, vec!["rust", "cli"]);
        let z = parse_markdown("---\ntitle: T\ntopics: [zenn, rust]\ntype: idea\nemoji: 🦀\n---\n").unwrap();
        assert_eq!(z.tags, vec!["zenn", "rust"]);
        assert_eq!(z.article_type.as_deref(), Some("idea"));
        assert_eq!(z.emoji.as_deref(), Some("🦀"));
    }

    #[test]
    fn numeric_title_and_tags_become_strings() {
        let a = parse_markdown("---\ntitle: 2024\ntags: [1, true]\n---\n").unwrap();
        assert_eq!(a.title, "2024");
        assert_eq!(a.tags, vec!["1", "true"]);
    }

    #[test]
    fn numeric_slug_is_kept_as_text() {
        let a = parse_markdown("---\ntitle: t\ntags: [a]\nslug: 202401011234\n---\nbody").unwrap();
        assert_eq!(a.slug.as_deref(), Some("202401011234"));
    }

    #[test]
    fn numeric_id_is_kept_as_text() {
        let a = parse_markdown("---\ntitle: t\ntags: [a]\nid: 1234567890\n---\nbody").unwrap();
        assert_eq!(a.id.as_deref(), Some("1234567890"));
        assert_eq!(a.organization_url_name, None);
    }

    #[test]
    fn tag_override_satisfies_missing_tags() {
        let a = parse_markdown_with_tags("---\ntitle: t\n---\nbody", Some(vec!["x".into()])).unwrap();
        assert_eq!(a.tags, vec!["x"]);
        let err = parse_markdown_with_tags("---\ntitle: t\n---\nbody", Some(Vec::new())).unwrap_err();
        assert!(matches!(err, PublishError::TagsRequired));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let err = parse_markdown("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, PublishError::InvalidFrontmatter(_)));
    }

    #[test]
    fn scalar_frontmatter_is_rejected() {
        let err = parse_markdown("---\njust text\n---\n").unwrap_err();
        assert!(err.to_string().contains("mapping"));
    }

    #[test]
    fn parse_file_records_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("post.md");
        std::fs::write(&path, "---\ntitle: File\ntags: [a]\n---\n\nHello\n").unwrap();
        let a = parse_markdown_file(&path).unwrap();
        assert_eq!(a.title, "File");
        assert_eq!(a.content, "Hello");
        assert_eq!(a.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn render_then_parse_keeps_fields() {
        let mut m = Mapping::new();
        m.insert("title".into(), "Rendered".into());
        m.insert(
            "tags".into(),
            Value::Sequence(vec!["a".into(), "b".into()]),
        );
        let doc = render_document(&m, "\nBody text\n").unwrap();
        assert!(doc.starts_with("---\ntitle: Rendered\n"));
        assert!(doc.ends_with("\nBody text\n"));
        let a = parse_markdown(&doc).unwrap();
        assert_eq!(a.tags, vec!["a", "b"]);
        assert_eq!(a.content, "Body text");
    }
}
