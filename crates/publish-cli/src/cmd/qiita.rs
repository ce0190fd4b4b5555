use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use publish_core::frontmatter::split_frontmatter;
use publish_core::qiita::{self, QiitaClient};
use publish_core::{Article, Method, Platform, SubmitMode, Visibility};

use crate::args::ArticleArgs;
use crate::cmd::{print_plan, Ctx};
use crate::output::print_json;
use crate::publish::PublishOutcome;
use crate::steps::{self, PlanItem, Step};

const CLI_PACKAGE: &str = "@qiita/qiita-cli";
const PROJECT_CONFIG: &str = "qiita.config.json";
const PUBLIC_DIR: &str = "public";

#[derive(Args)]
pub struct QiitaArgs {
    #[command(flatten)]
    pub article: ArticleArgs,

    /// Publishing method: cli (qiita-cli) or api (Qiita API v2)
    #[arg(long)]
    pub method: Option<Method>,

    /// qiita-cli project directory (default: config, then current directory)
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Organization URL name to publish under
    #[arg(long)]
    pub organization: Option<String>,

    /// Print what would happen without running anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: QiitaArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let mut article = args.article.load()?;
    let method = args
        .method
        .unwrap_or_else(|| ctx.config.method_for(Platform::Qiita));
    Platform::Qiita.check_method(method)?;

    let visibility = ctx.config.visibility_for(args.article.visibility(), &article);
    let mode = ctx.config.mode_for(args.article.mode());
    article.private = visibility.is_private();
    if article.organization_url_name.is_none() {
        article.organization_url_name = args
            .organization
            .clone()
            .or_else(|| ctx.config.publish.qiita.organization.clone());
    }

    match method {
        Method::Api => run_api(&article, mode, visibility, args.dry_run, ctx),
        _ => run_cli(&article, &args, mode, visibility, ctx),
    }
}

// ---------------------------------------------------------------------------
// qiita-cli
// ---------------------------------------------------------------------------

/// What already exists in a qiita-cli project.
#[derive(Debug, Clone, Default)]
pub struct CliState {
    pub has_cli: bool,
    pub has_config: bool,
    pub has_credentials: bool,
    pub has_article: bool,
    /// `id` of an already-published item found in the existing article file.
    pub existing_id: Option<String>,
}

impl CliState {
    pub fn inspect(project: &Path, basename: &str, home: &Path) -> Self {
        let article_path = article_path(project, basename);
        let existing = std::fs::read_to_string(&article_path).ok();
        Self {
            has_cli: project.join("node_modules/.bin/qiita").exists(),
            has_config: project.join(PROJECT_CONFIG).exists(),
            has_credentials: has_credentials(home),
            has_article: existing.is_some(),
            existing_id: existing.as_deref().and_then(existing_item_id),
        }
    }
}

fn has_credentials(home: &Path) -> bool {
    if std::env::var(qiita::TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty()) {
        return true;
    }
    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home.join(".config"));
    config_home.join("qiita-cli/credentials.json").exists()
}

fn existing_item_id(text: &str) -> Option<String> {
    let (fm, _) = split_frontmatter(text);
    let map: serde_yaml::Mapping = serde_yaml::from_str(fm?).ok()?;
    match map.get("id")? {
        serde_yaml::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

pub fn article_path(project: &Path, basename: &str) -> PathBuf {
    project.join(PUBLIC_DIR).join(format!("{basename}.md"))
}

/// File basename for the article: the source file stem, else a slug of the title.
pub fn basename_for(article: &Article) -> String {
    if let Some(stem) = article.source_stem() {
        return stem.to_string();
    }
    let mut slug = String::new();
    for c in article.title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        format!("article-{}", chrono::Utc::now().format("%Y%m%d%H%M%S"))
    } else {
        slug.to_string()
    }
}

pub fn cli_plan(
    article: &Article,
    basename: &str,
    project: &Path,
    state: &CliState,
    mode: SubmitMode,
) -> anyhow::Result<Vec<PlanItem>> {
    let mut plan = Vec::new();
    if !state.has_cli {
        plan.push(PlanItem::Run(Step::new(
            "install",
            "npm",
            &["install", "--save-dev", CLI_PACKAGE],
            project,
        )));
    }
    if !state.has_config {
        plan.push(PlanItem::Run(Step::new("init", "npx", &["qiita", "init"], project)));
    }
    if !state.has_credentials {
        plan.push(PlanItem::Run(
            Step::new("login", "npx", &["qiita", "login"], project).interactive(),
        ));
    }
    if !state.has_article {
        plan.push(PlanItem::Run(Step::new(
            "new",
            "npx",
            &["qiita", "new", basename],
            project,
        )));
    }

    let mut article = article.clone();
    if article.id.is_none() {
        article.id = state.existing_id.clone();
    }
    plan.push(PlanItem::WriteFile {
        name: "write".into(),
        path: article_path(project, basename),
        contents: qiita::render_cli_document(&article)?,
    });

    if mode == SubmitMode::Submit {
        plan.push(PlanItem::Run(Step::new(
            "publish",
            "npx",
            &["qiita", "publish", basename],
            project,
        )));
    }
    Ok(plan)
}

fn run_cli(
    article: &Article,
    args: &QiitaArgs,
    mode: SubmitMode,
    visibility: Visibility,
    ctx: &Ctx,
) -> anyhow::Result<()> {
    let project = match args
        .project
        .as_deref()
        .or(ctx.config.project_for(Platform::Qiita))
    {
        Some(p) => ctx.expand(p),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&project)
        .with_context(|| format!("cannot create project dir {}", project.display()))?;

    let basename = basename_for(article);
    let state = CliState::inspect(&project, &basename, &ctx.home);
    let plan = cli_plan(article, &basename, &project, &state, mode)?;

    if args.dry_run {
        return print_plan(&plan, ctx.json);
    }
    steps::run_plan(&plan)?;

    let mut outcome = PublishOutcome::new(article, Platform::Qiita, Method::Cli, mode, visibility);
    outcome.file = Some(article_path(&project, &basename));
    outcome.finish(article, ctx.json)
}

// ---------------------------------------------------------------------------
// Qiita API v2
// ---------------------------------------------------------------------------

fn run_api(
    article: &Article,
    mode: SubmitMode,
    visibility: Visibility,
    dry_run: bool,
    ctx: &Ctx,
) -> anyhow::Result<()> {
    let mut article = article.clone();
    // The API has no drafts; a draft is created as a private item.
    if mode == SubmitMode::Draft && !article.private {
        tracing::info!("qiita api has no drafts; creating the item as private");
        article.private = true;
    }
    let visibility = if article.private {
        Visibility::Private
    } else {
        visibility
    };
    let payload = qiita::build_item_payload(&article);

    if dry_run {
        let (verb, path) = match &article.id {
            Some(id) => ("PATCH", format!("/api/v2/items/{id}")),
            None => ("POST", "/api/v2/items".to_string()),
        };
        let mut headers = qiita::build_headers("<QIITA_TOKEN>");
        headers.insert("Authorization".into(), "Bearer <redacted>".into());
        let request = serde_json::json!({
            "dry_run": true,
            "method": verb,
            "url": format!("{}{path}", qiita::DEFAULT_BASE_URL),
            "headers": headers,
            "body": payload,
        });
        if ctx.json {
            return print_json(&request);
        }
        println!("Dry run: {verb} {}{path}", qiita::DEFAULT_BASE_URL);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let client = QiitaClient::from_env()?;
    let item = match &article.id {
        Some(id) => client.update_item(id, &payload)?,
        None => client.create_item(&payload)?,
    };

    let mut outcome = PublishOutcome::new(&article, Platform::Qiita, Method::Api, mode, visibility);
    outcome.url = Some(item.url);
    outcome.finish(&article, ctx.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::step_names;

    fn article() -> Article {
        Article::from_parts("Hello, Rust World!", "Body", vec!["rust".into()]).unwrap()
    }

    #[test]
    fn fresh_project_gets_full_plan() {
        let plan = cli_plan(
            &article(),
            "hello",
            Path::new("/p"),
            &CliState::default(),
            SubmitMode::Submit,
        )
        .unwrap();
        assert_eq!(
            step_names(&plan),
            vec!["install", "init", "login", "new", "write", "publish"]
        );
        match &plan[2] {
            PlanItem::Run(step) => assert!(step.interactive),
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn ready_project_draft_only_writes() {
        let state = CliState {
            has_cli: true,
            has_config: true,
            has_credentials: true,
            has_article: true,
            existing_id: Some("abc123".into()),
        };
        let plan = cli_plan(&article(), "hello", Path::new("/p"), &state, SubmitMode::Draft).unwrap();
        assert_eq!(step_names(&plan), vec!["write"]);
        match &plan[0] {
            PlanItem::WriteFile { path, contents, .. } => {
                assert_eq!(path, Path::new("/p/public/hello.md"));
                assert!(contents.contains("id: abc123"));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn basename_from_title() {
        assert_eq!(basename_for(&article()), "hello-rust-world");
        let mut a = article();
        a.source = Some(PathBuf::from("/drafts/my-post.md"));
        assert_eq!(basename_for(&a), "my-post");
        let a = Article::from_parts("日本語のタイトル", "b", vec!["x".into()]).unwrap();
        assert!(basename_for(&a).starts_with("article-"));
    }

    #[test]
    fn existing_id_is_read_from_frontmatter() {
        let doc = "---\ntitle: x\nid: 'c686397e4a0f4f11683d'\n---\nbody\n";
        assert_eq!(existing_item_id(doc).as_deref(), Some("c686397e4a0f4f11683d"));
        assert_eq!(existing_item_id("---\ntitle: x\nid: null\n---\n"), None);
        assert_eq!(existing_item_id("no frontmatter"), None);
    }
}
