pub mod article;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod io;
pub mod paths;
pub mod platform;
pub mod publish_log;
pub mod qiita;
pub mod zenn;

pub use article::{Article, ArticleInput};
pub use error::{PublishError, Result};
pub use platform::{Method, Platform, SubmitMode, Visibility};
