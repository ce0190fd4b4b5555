use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use publish_core::zenn::{self, ARTICLES_DIR};
use publish_core::{Article, Method, Platform, SubmitMode, Visibility};

use crate::args::{ArticleArgs, BrowserArgs};
use crate::cmd::{browser_publish, print_plan, Ctx};
use crate::publish::PublishOutcome;
use crate::sites;
use crate::steps::{self, PlanItem, Step};

const CLI_PACKAGE: &str = "zenn-cli";

#[derive(Args)]
pub struct ZennArgs {
    #[command(flatten)]
    pub article: ArticleArgs,

    #[command(flatten)]
    pub browser: BrowserArgs,

    /// Publishing method: cli (zenn-cli + git) or browser
    #[arg(long)]
    pub method: Option<Method>,

    /// Zenn content repository (default: config, then current directory)
    #[arg(long, value_name = "DIR")]
    pub project: Option<PathBuf>,

    /// Article slug (12-50 chars of a-z0-9_-); generated when omitted
    #[arg(long)]
    pub slug: Option<String>,

    /// Print what would happen without running anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: ZennArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let article = args.article.load()?;
    let method = args
        .method
        .unwrap_or_else(|| ctx.config.method_for(Platform::Zenn));
    Platform::Zenn.check_method(method)?;

    let visibility = ctx.config.visibility_for(args.article.visibility(), &article);
    let mode = ctx.config.mode_for(args.article.mode());

    match method {
        Method::Browser => browser_publish(
            &sites::zenn::profile(),
            &article,
            &args.browser,
            ctx.config.profile_for(Platform::Zenn),
            mode,
            visibility,
            args.dry_run,
            ctx,
        ),
        _ => run_cli(&article, &args, mode, visibility, ctx),
    }
}

// ---------------------------------------------------------------------------
// zenn-cli + git
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CliState {
    pub has_cli: bool,
    pub has_articles_dir: bool,
    pub has_article: bool,
}

impl CliState {
    pub fn inspect(project: &Path, slug: &str) -> Self {
        Self {
            has_cli: project.join("node_modules/.bin/zenn").exists(),
            has_articles_dir: project.join(ARTICLES_DIR).is_dir(),
            has_article: article_path(project, slug).exists(),
        }
    }
}

pub fn article_path(project: &Path, slug: &str) -> PathBuf {
    project.join(ARTICLES_DIR).join(format!("{slug}.md"))
}

/// Zenn has no private articles, so only a public submit is published.
pub fn published(mode: SubmitMode, visibility: Visibility) -> bool {
    mode == SubmitMode::Submit && !visibility.is_private()
}

pub fn cli_plan(
    article: &Article,
    slug: &str,
    project: &Path,
    state: &CliState,
    mode: SubmitMode,
    visibility: Visibility,
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
    if !state.has_articles_dir {
        plan.push(PlanItem::Run(Step::new("init", "npx", &["zenn", "init"], project)));
    }
    if !state.has_article {
        plan.push(PlanItem::Run(Step::new(
            "new",
            "npx",
            &["zenn", "new:article", "--slug", slug],
            project,
        )));
    }

    plan.push(PlanItem::WriteFile {
        name: "write".into(),
        path: article_path(project, slug),
        contents: zenn::render_article(article, published(mode, visibility))?,
    });

    if mode == SubmitMode::Submit {
        let rel = format!("{ARTICLES_DIR}/{slug}.md");
        let message = format!("Publish: {}", article.title);
        plan.push(PlanItem::Run(Step::new("git-add", "git", &["add", &rel], project)));
        // Re-publishing an unchanged article leaves nothing staged.
        plan.push(PlanItem::Run(
            Step::new("git-commit", "git", &["commit", "-m", &message, "--", &rel], project)
                .unless(&["diff", "--cached", "--quiet", "--", &rel]),
        ));
        plan.push(PlanItem::Run(Step::new("git-push", "git", &["push"], project)));
    }
    Ok(plan)
}

fn run_cli(
    article: &Article,
    args: &ZennArgs,
    mode: SubmitMode,
    visibility: Visibility,
    ctx: &Ctx,
) -> anyhow::Result<()> {
    let project = match args
        .project
        .as_deref()
        .or(ctx.config.project_for(Platform::Zenn))
    {
        Some(p) => ctx.expand(p),
        None => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&project)
        .with_context(|| format!("cannot create project dir {}", project.display()))?;

    let slug = zenn::resolve_slug(article, args.slug.as_deref())?;
    if visibility.is_private() && mode == SubmitMode::Submit {
        tracing::warn!("zenn has no private articles; saving as unpublished");
    }
    let state = CliState::inspect(&project, &slug);
    let plan = cli_plan(article, &slug, &project, &state, mode, visibility)?;

    if args.dry_run {
        return print_plan(&plan, ctx.json);
    }
    steps::run_plan(&plan)?;

    let mut outcome = PublishOutcome::new(article, Platform::Zenn, Method::Cli, mode, visibility);
    outcome.file = Some(article_path(&project, &slug));
    outcome.url = ctx
        .config
        .publish
        .zenn
        .repo
        .as_deref()
        .and_then(|repo| repo.split('/').next())
        .filter(|_| published(mode, visibility))
        .map(|user| format!("https://zenn.dev/{user}/articles/{slug}"));
    outcome.finish(article, ctx.json)
}
