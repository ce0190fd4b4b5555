use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Tags are required")]
    TagsRequired,

    #[error("invalid frontmatter: {0}")]
    InvalidFrontmatter(String),

    #[error("invalid slug '{0}': must be 12-50 characters of a-z, 0-9, '-' or '_'")]
    InvalidSlug(String),

    #[error("invalid article type '{0}': expected 'tech' or 'idea'")]
    InvalidArticleType(String),

    #[error("too many topics ({count}): zenn allows at most {max}")]
    TooManyTopics { count: usize, max: usize },

    #[error("invalid value for {field}: '{value}'")]
    InvalidValue { field: String, value: String },

    #[error("conflicting input: {0}")]
    ConflictingInput(String),

    #[error("method '{method}' is not supported for {platform}")]
    UnsupportedMethod { platform: String, method: String },

    #[error("missing environment variable {0}")]
    MissingEnv(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error("config error in {path}: {message}")]
    Config { path: String, message: String },

    #[error("qiita api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("http error: {0}")]
    Http(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PublishError {
    fn from(e: reqwest::Error) -> Self {
        PublishError::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;
