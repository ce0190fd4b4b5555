use clap::Args;
use publish_core::{Method, Platform};

use crate::args::{ArticleArgs, BrowserArgs};
use crate::cmd::{browser_publish, Ctx};
use crate::sites;

#[derive(Args)]
pub struct InfoqArgs {
    #[command(flatten)]
    pub article: ArticleArgs,

    #[command(flatten)]
    pub browser: BrowserArgs,

    /// Editor URL (default: config, then the InfoQ draft editor)
    #[arg(long)]
    pub url: Option<String>,

    /// Print what would happen without opening a browser
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: InfoqArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let article = args.article.load()?;
    Platform::Infoq.check_method(ctx.config.method_for(Platform::Infoq))?;

    let visibility = ctx.config.visibility_for(args.article.visibility(), &article);
    let mode = ctx.config.mode_for(args.article.mode());
    let editor_url = args
        .url
        .as_deref()
        .or(ctx.config.publish.infoq.editor_url.as_deref());
    let site = sites::infoq::profile(editor_url);

    tracing::debug!(method = %Method::Browser, "publishing to InfoQ");
    browser_publish(
        &site,
        &article,
        &args.browser,
        ctx.config.profile_for(Platform::Infoq),
        mode,
        visibility,
        args.dry_run,
        ctx,
    )
}
