use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use publish_core::{Article, ArticleInput, SubmitMode, Visibility};

/// Article source and publish options shared by every platform command.
#[derive(Args, Debug, Clone, Default)]
pub struct ArticleArgs {
    /// Markdown file with YAML frontmatter (title, tags, ...)
    #[arg(long, value_name = "PATH")]
    pub markdown: Option<PathBuf>,

    /// Article title (inline mode)
    #[arg(long)]
    pub title: Option<String>,

    /// Article body in markdown; `-` reads it from stdin
    #[arg(long)]
    pub content: Option<String>,

    /// Comma-separated tags; overrides frontmatter tags
    #[arg(long)]
    pub tags: Option<String>,

    /// Publish as private / limited sharing
    #[arg(long, conflicts_with = "public")]
    pub private: bool,

    /// Publish publicly even if the config default is private
    #[arg(long)]
    pub public: bool,

    /// Save as a draft (default unless the config says otherwise)
    #[arg(long, conflicts_with = "submit")]
    pub draft: bool,

    /// Submit / publish immediately
    #[arg(long)]
    pub submit: bool,
}

impl ArticleArgs {
    pub fn input(&self) -> ArticleInput {
        ArticleInput {
            markdown: self.markdown.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
        }
    }

    pub fn load(&self) -> anyhow::Result<Article> {
        let article = self.input().resolve(|| {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        });
        match &self.markdown {
            Some(path) => article.with_context(|| format!("failed to load {}", path.display())),
            None => Ok(article?),
        }
    }

    pub fn visibility(&self) -> Option<Visibility> {
        match (self.private, self.public) {
            (true, _) => Some(Visibility::Private),
            (_, true) => Some(Visibility::Public),
            _ => None,
        }
    }

    pub fn mode(&self) -> Option<SubmitMode> {
        match (self.draft, self.submit) {
            (true, _) => Some(SubmitMode::Draft),
            (_, true) => Some(SubmitMode::Submit),
            _ => None,
        }
    }
}

/// Browser session options for the CDP-driven methods.
#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
    /// Chrome profile directory (default: ~/.claude/wt/browser-profiles/<platform>)
    #[arg(long, value_name = "DIR")]
    pub profile: Option<PathBuf>,

    /// Remote debugging port (default depends on the platform)
    #[arg(long)]
    pub port: Option<u16>,

    /// Run Chrome without a window (login is impossible in this mode)
    #[arg(long)]
    pub headless: bool,

    /// Quit the browser when done instead of keeping the session open
    #[arg(long)]
    pub close: bool,
}
