pub mod config;
pub mod doctor;
pub mod infoq;
pub mod parse;
pub mod qiita;
pub mod zenn;

use std::path::{Path, PathBuf};

use anyhow::Context;
use cdp_driver::{find_chrome, SessionOptions};
use publish_core::config::WtConfig;
use publish_core::{paths, Article, Method, SubmitMode, Visibility};

use crate::args::BrowserArgs;
use crate::browser_flow::{self, FlowOptions, SiteProfile};
use crate::output::print_json;
use crate::publish::PublishOutcome;
use crate::steps::PlanItem;

/// Loaded configuration shared by the publish commands.
pub struct Ctx {
    pub config: WtConfig,
    pub home: PathBuf,
    pub json: bool,
}

impl Ctx {
    /// Load the config and export its `env` entries.
    pub fn load(config_path: &Path, json: bool) -> anyhow::Result<Self> {
        let home = paths::home_dir()?;
        let config = WtConfig::load_from(config_path).context("failed to load config")?;
        for name in config.inject_env() {
            tracing::debug!(name, "exported from config env");
        }
        Ok(Self { config, home, json })
    }

    /// Expand a leading `~` in configured or user-supplied paths.
    pub fn expand(&self, path: &Path) -> PathBuf {
        paths::expand_home(path, &self.home)
    }
}

/// `--config` flag, else `WT_CONFIG` (handled by clap), else the default location.
pub fn resolve_config_path(flag: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match flag {
        Some(p) => Ok(p),
        None => Ok(paths::config_path(&paths::home_dir()?)),
    }
}

/// Build a current-thread runtime for the async browser flows.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

/// Run the CDP form-filling flow for `site` (or describe it with `--dry-run`).
#[allow(clippy::too_many_arguments)]
pub fn browser_publish(
    site: &SiteProfile,
    article: &Article,
    browser: &BrowserArgs,
    configured_profile: Option<&Path>,
    mode: SubmitMode,
    visibility: Visibility,
    dry_run: bool,
    ctx: &Ctx,
) -> anyhow::Result<()> {
    let platform = site.platform;
    let profile = browser_flow::profile_dir(
        browser.profile.as_deref(),
        configured_profile,
        &ctx.home,
        platform,
    );
    let port = browser
        .port
        .unwrap_or_else(|| browser_flow::default_port(platform));
    let mut session = SessionOptions::new(platform.chrome_path_env(), profile, port);
    session.headless = browser.headless;

    if dry_run {
        let chrome = find_chrome(platform.chrome_path_env())
            .map(|p| p.display().to_string())
            .unwrap_or_else(|e| {
                let first = e.to_string().lines().next().unwrap_or_default().to_string();
                format!("not found ({first})")
            });
        let plan = serde_json::json!({
            "dry_run": true,
            "platform": platform,
            "editor_url": site.editor_url,
            "profile": session.profile_dir,
            "port": port,
            "chrome": chrome,
            "mode": mode,
            "visibility": visibility,
            "title": article.title,
            "tags": article.tags,
        });
        if ctx.json {
            return print_json(&plan);
        }
        println!("Dry run: {} via browser", site.name);
        println!("  editor:  {}", site.editor_url);
        println!("  profile: {}", session.profile_dir.display());
        println!("  port:    {port}");
        println!("  chrome:  {chrome}");
        println!("  action:  {}", mode.as_str());
        println!("  access:  {}", visibility.as_str());
        return Ok(());
    }

    let mut opts = FlowOptions::new(session, mode, visibility);
    opts.close = browser.close;
    let report = runtime()?
        .block_on(browser_flow::run(site, article, &opts))
        .with_context(|| format!("{} browser publish failed", site.name))?;

    let mut outcome = PublishOutcome::new(article, platform, Method::Browser, mode, visibility);
    outcome.url = Some(report.url);
    outcome.finish(article, ctx.json)
}

/// Print a CLI-method plan for `--dry-run`.
pub fn print_plan(plan: &[PlanItem], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({ "dry_run": true, "plan": plan }));
    }
    println!("Dry run: {} step(s)", plan.len());
    for (i, item) in plan.iter().enumerate() {
        println!("{:>2}. {}", i + 1, item.describe());
    }
    Ok(())
}
