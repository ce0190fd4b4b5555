//! `~/.claude/wt/config.jsonc`: shared defaults for every publishing command.
//!
//! The file is JSON with comments. User values are deep-merged over the
//! built-in defaults before being deserialized, so a config only needs the
//! keys it wants to change. Command-line flags always win over config values.

use crate::article::Article;
use crate::error::{PublishError, Result};
use crate::paths;
use crate::platform::{Method, Platform, SubmitMode, Visibility};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Per-platform sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QiitaConfig {
    #[serde(default = "default_cli_method")]
    pub method: Method,
    #[serde(default)]
    pub project: Option<PathBuf>,
    #[serde(default)]
    pub organization: Option<String>,
}

impl Default for QiitaConfig {
    fn default() -> Self {
        Self {
            method: Method::Cli,
            project: None,
            organization: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZennConfig {
    #[serde(default = "default_cli_method")]
    pub method: Method,
    #[serde(default)]
    pub project: Option<PathBuf>,
    /// GitHub repository linked to Zenn, `owner/name`.
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub profile: Option<PathBuf>,
}

impl Default for ZennConfig {
    fn default() -> Self {
        Self {
            method: Method::Cli,
            project: None,
            repo: None,
            profile: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoqConfig {
    #[serde(default = "default_browser_method")]
    pub method: Method,
    #[serde(default)]
    pub profile: Option<PathBuf>,
    #[serde(default)]
    pub editor_url: Option<String>,
}

impl Default for InfoqConfig {
    fn default() -> Self {
        Self {
            method: Method::Browser,
            profile: None,
            editor_url: None,
        }
    }
}

fn default_cli_method() -> Method {
    Method::Cli
}

fn default_browser_method() -> Method {
    Method::Browser
}

// ---------------------------------------------------------------------------
// PublishConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_visibility")]
    pub default_visibility: Visibility,
    #[serde(default = "default_mode")]
    pub default_mode: SubmitMode,
    #[serde(default)]
    pub qiita: QiitaConfig,
    #[serde(default)]
    pub zenn: ZennConfig,
    #[serde(default)]
    pub infoq: InfoqConfig,
}

fn default_visibility() -> Visibility {
    Visibility::Public
}

fn default_mode() -> SubmitMode {
    SubmitMode::Draft
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            default_visibility: default_visibility(),
            default_mode: default_mode(),
            qiita: QiitaConfig::default(),
            zenn: ZennConfig::default(),
            infoq: InfoqConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// WtConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WtConfig {
    /// Variables exported into the process environment at startup.
    #[serde(default, deserialize_with = "env_values")]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub publish: PublishConfig,
}

/// `env` values may be any JSON scalar; numbers and booleans are exported as
/// their text, `null` as empty (never exported).
fn env_values<'de, D>(de: D) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(de)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                other => {
                    return Err(serde::de::Error::custom(format!(
                        "env.{key} must be a string, number or boolean, got {other}"
                    )))
                }
            };
            Ok((key, text))
        })
        .collect()
}

impl WtConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::parse_str(&text).map_err(|message| PublishError::Config {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse JSONC text and merge it over the defaults.
    pub fn parse_str(text: &str) -> std::result::Result<Self, String> {
        let cleaned = strip_jsonc(text);
        if cleaned.trim().is_empty() {
            return Ok(Self::default());
        }
        let user: Value = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;
        if !user.is_object() {
            return Err("top-level value must be an object".into());
        }
        let mut merged = serde_json::to_value(Self::default()).map_err(|e| e.to_string())?;
        deep_merge(&mut merged, user);
        serde_json::from_value(merged).map_err(|e| e.to_string())
    }

    /// Export every non-empty `env` entry that is not already set.
    ///
    /// Returns the names that were set. The real environment always wins.
    pub fn inject_env(&self) -> Vec<String> {
        let mut injected = Vec::new();
        for (key, value) in &self.env {
            if value.is_empty() || std::env::var_os(key).is_some() {
                continue;
            }
            std::env::set_var(key, value);
            injected.push(key.clone());
        }
        injected
    }

    pub fn method_for(&self, platform: Platform) -> Method {
        match platform {
            Platform::Infoq => self.publish.infoq.method,
            Platform::Qiita => self.publish.qiita.method,
            Platform::Zenn => self.publish.zenn.method,
        }
    }

    pub fn project_for(&self, platform: Platform) -> Option<&Path> {
        match platform {
            Platform::Infoq => None,
            Platform::Qiita => self.publish.qiita.project.as_deref(),
            Platform::Zenn => self.publish.zenn.project.as_deref(),
        }
    }

    pub fn profile_for(&self, platform: Platform) -> Option<&Path> {
        match platform {
            Platform::Infoq => self.publish.infoq.profile.as_deref(),
            Platform::Qiita => None,
            Platform::Zenn => self.publish.zenn.profile.as_deref(),
        }
    }

    /// Visibility for `article`: explicit flag, then a `private: true`
    /// frontmatter field, then the configured default.
    pub fn visibility_for(&self, flag: Option<Visibility>, article: &Article) -> Visibility {
        match flag {
            Some(v) => v,
            None if article.private => Visibility::Private,
            None => self.publish.default_visibility,
        }
    }

    pub fn mode_for(&self, flag: Option<SubmitMode>) -> SubmitMode {
        flag.unwrap_or(self.publish.default_mode)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for platform in Platform::all() {
            let method = self.method_for(*platform);
            if !platform.supports(method) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!(
                        "publish.{platform}.method '{method}' is not supported (expected one of: {})",
                        platform
                            .supported_methods()
                            .iter()
                            .map(|m| m.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                });
            }

            if let Some(project) = self.project_for(*platform) {
                let resolved = match paths::home_dir() {
                    Ok(home) => paths::expand_home(project, &home),
                    Err(_) => project.to_path_buf(),
                };
                if !resolved.is_dir() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "publish.{platform}.project '{}' does not exist yet",
                            project.display()
                        ),
                    });
                }
            }
        }

        if let Some(repo) = &self.publish.zenn.repo {
            let parts: Vec<&str> = repo.split('/').collect();
            if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("publish.zenn.repo '{repo}' should look like 'owner/name'"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// JSONC helpers
// ---------------------------------------------------------------------------

/// Remove `//` and `/* */` comments and trailing commas, leaving string
/// literals untouched.
pub fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    // keep line numbers stable for parse errors
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    remove_trailing_commas(&out)
}

fn remove_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Merge `over` into `base`: objects merge key by key, anything else replaces.
pub fn deep_merge(base: &mut Value, over: Value) {
    match (base, over) {
        (Value::Object(base_map), Value::Object(over_map)) => {
            for (key, value) in over_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = WtConfig::load_from(&dir.path().join("nope.jsonc")).unwrap();
        assert_eq!(cfg.publish.default_mode, SubmitMode::Draft);
        assert_eq!(cfg.method_for(Platform::Infoq), Method::Browser);
        assert_eq!(cfg.method_for(Platform::Qiita), Method::Cli);
    }

    #[test]
    fn partial_config_merges_over_defaults() {
        let cfg = WtConfig::parse_str(
            r#"{
                // prefer the API for qiita
                "publish": { "qiita": { "method": "api" } }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.publish.qiita.method, Method::Api);
        assert_eq!(cfg.publish.zenn.method, Method::Cli);
        assert_eq!(cfg.publish.default_visibility, Visibility::Public);
    }

    #[test]
    fn comments_inside_strings_survive() {
        let cleaned = strip_jsonc(r#"{"url": "https://example.com/*x*/", /* gone */ "a": 1, // tail
        }"#);
        let v: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(v["url"], "https://example.com/*x*/");
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn trailing_commas_are_tolerated() {
        let cleaned = strip_jsonc("{\"a\": [1, 2,], \"b\": \"x,}\",}");
        let v: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(v["a"], serde_json::json!([1, 2]));
        assert_eq!(v["b"], "x,}");
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let cleaned = strip_jsonc(r#"{"a": "say \"//hi\"" // c
        }"#);
        let v: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(v["a"], "say \"//hi\"");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, "{ not json").unwrap();
        let err = WtConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, PublishError::Config { .. }));
    }

    #[test]
    fn scalar_env_values_become_text() {
        let cfg = WtConfig::parse_str(
            r#"{"env": {"PORT": 8080, "DEBUG": true, "UNSET": null, "TOKEN": "abc"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.env["PORT"], "8080");
        assert_eq!(cfg.env["DEBUG"], "true");
        assert_eq!(cfg.env["UNSET"], "");
        assert_eq!(cfg.env["TOKEN"], "abc");
        assert!(WtConfig::parse_str(r#"{"env": {"LIST": [1, 2]}}"#).is_err());
    }

    #[test]
    fn unknown_method_is_rejected_at_parse() {
        assert!(WtConfig::parse_str(r#"{"publish": {"zenn": {"method": "carrier-pigeon"}}}"#).is_err());
    }

    #[test]
    fn validate_flags_unsupported_method() {
        let cfg = WtConfig::parse_str(r#"{"publish": {"infoq": {"method": "cli"}}}"#).unwrap();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("publish.infoq.method")));
    }

    #[test]
    fn validate_warns_on_missing_project_and_bad_repo() {
        let cfg = WtConfig::parse_str(
            r#"{"publish": {"zenn": {"project": "/definitely/not/here", "repo": "just-a-name"}}}"#,
        )
        .unwrap();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
    }

    #[test]
    fn default_config_has_no_warnings() {
        assert!(WtConfig::default().validate().is_empty());
    }

    #[test]
    fn inject_env_skips_empty_and_existing() {
        let mut cfg = WtConfig::default();
        cfg.env.insert("WTPUB_TEST_INJECT_NEW".into(), "value".into());
        cfg.env.insert("WTPUB_TEST_INJECT_EMPTY".into(), String::new());
        cfg.env.insert("PATH".into(), "/should/not/replace".into());
        let injected = cfg.inject_env();
        assert_eq!(injected, vec!["WTPUB_TEST_INJECT_NEW".to_string()]);
        assert_eq!(std::env::var("WTPUB_TEST_INJECT_NEW").unwrap(), "value");
        assert!(std::env::var_os("WTPUB_TEST_INJECT_EMPTY").is_none());
        assert_ne!(std::env::var("PATH").unwrap(), "/should/not/replace");
    }

    #[test]
    fn visibility_precedence() {
        let cfg = WtConfig::parse_str(r#"{"publish": {"default_visibility": "private"}}"#).unwrap();
        let mut article = Article::from_parts("T", "C", vec!["x".into()]).unwrap();
        assert_eq!(cfg.visibility_for(None, &article), Visibility::Private);
        assert_eq!(
            cfg.visibility_for(Some(Visibility::Public), &article),
            Visibility::Public
        );
        article.private = true;
        assert_eq!(
            WtConfig::default().visibility_for(None, &article),
            Visibility::Private
        );
    }

    #[test]
    fn deep_merge_replaces_non_objects() {
        let mut base = serde_json::json!({"a": {"b": 1, "c": [1]}, "d": 1});
        deep_merge(&mut base, serde_json::json!({"a": {"c": [2]}, "e": true}));
        assert_eq!(base, serde_json::json!({"a": {"b": 1, "c": [2]}, "d": 1, "e": true}));
    }
}
