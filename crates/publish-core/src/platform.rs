use crate::error::{PublishError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Infoq,
    Qiita,
    Zenn,
}

impl Platform {
    pub fn all() -> &'static [Platform] {
        &[Platform::Infoq, Platform::Qiita, Platform::Zenn]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Infoq => "infoq",
            Platform::Qiita => "qiita",
            Platform::Zenn => "zenn",
        }
    }

    /// Methods this platform can be published with, default first.
    pub fn supported_methods(&self) -> &'static [Method] {
        match self {
            Platform::Infoq => &[Method::Browser],
            Platform::Qiita => &[Method::Cli, Method::Api],
            Platform::Zenn => &[Method::Cli, Method::Browser],
        }
    }

    pub fn default_method(&self) -> Method {
        self.supported_methods()[0]
    }

    pub fn supports(&self, method: Method) -> bool {
        self.supported_methods().contains(&method)
    }

    /// Fail with [`PublishError::UnsupportedMethod`] unless `method` is allowed.
    pub fn check_method(&self, method: Method) -> Result<()> {
        if self.supports(method) {
            Ok(())
        } else {
            Err(PublishError::UnsupportedMethod {
                platform: self.as_str().to_string(),
                method: method.as_str().to_string(),
            })
        }
    }

    /// Environment variable that overrides the Chrome executable path.
    pub fn chrome_path_env(&self) -> &'static str {
        match self {
            Platform::Infoq => "INFOQ_BROWSER_CHROME_PATH",
            Platform::Qiita => "QIITA_BROWSER_CHROME_PATH",
            Platform::Zenn => "ZENN_BROWSER_CHROME_PATH",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Cli,
    Browser,
    Api,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Cli => "cli",
            Method::Browser => "browser",
            Method::Api => "api",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = PublishError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cli" => Ok(Method::Cli),
            "browser" => Ok(Method::Browser),
            "api" => Ok(Method::Api),
            _ => Err(invalid("method", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Visibility / SubmitMode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn is_private(&self) -> bool {
        *self == Visibility::Private
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Save without publishing or submitting for review.
    Draft,
    /// Publish, or submit for editorial review where the site requires it.
    Submit,
}

impl SubmitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitMode::Draft => "draft",
            SubmitMode::Submit => "submit",
        }
    }
}

fn invalid(field: &str, value: &str) -> PublishError {
    PublishError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_methods() {
        assert_eq!(Platform::Infoq.default_method(), Method::Browser);
        assert_eq!(Platform::Qiita.default_method(), Method::Cli);
        assert_eq!(Platform::Zenn.default_method(), Method::Cli);
    }

    #[test]
    fn infoq_rejects_cli() {
        let err = Platform::Infoq.check_method(Method::Cli).unwrap_err();
        assert_eq!(err.to_string(), "method 'cli' is not supported for infoq");
        assert!(Platform::Zenn.check_method(Method::Browser).is_ok());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("API".parse::<Method>().unwrap(), Method::Api);
        assert!("carrier-pigeon".parse::<Method>().is_err());
    }

    #[test]
    fn chrome_env_vars() {
        assert_eq!(Platform::Infoq.chrome_path_env(), "INFOQ_BROWSER_CHROME_PATH");
        assert_eq!(Platform::Zenn.chrome_path_env(), "ZENN_BROWSER_CHROME_PATH");
    }

    #[test]
    fn serde_names_are_snake_case() {
        assert_eq!(serde_json::to_string(&Method::Browser).unwrap(), "\"browser\"");
        let v: Visibility = serde_json::from_str("\"private\"").unwrap();
        assert!(v.is_private());
    }
}
