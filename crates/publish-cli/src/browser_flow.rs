//! The form-filling flow shared by every browser-based publish method.
//!
//! ```text
//! open session → navigate → wait ready → login check (wait, re-navigate)
//!   → title → body → tags → visibility → draft/submit → settle → report URL
//! ```
//!
//! Site differences live entirely in [`SiteProfile`]; the flow itself is
//! the same for every platform.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cdp_driver::login::{LoginState, LOGIN_POLL_INTERVAL, LOGIN_TIMEOUT};
use cdp_driver::script::{self, kind};
use cdp_driver::{
    BrowserSession, CdpError, Evaluator, KeyPress, Locator, LoginProbe, Page, SelectorChain,
    SessionOptions,
};
use publish_core::{paths, Article, Platform, SubmitMode, Visibility};
use serde::Serialize;

pub const READY_TIMEOUT: Duration = Duration::from_secs(30);
pub const FIELD_TIMEOUT: Duration = Duration::from_secs(15);
pub const FIELD_POLL: Duration = Duration::from_millis(500);
pub const TAG_GAP: Duration = Duration::from_millis(300);
pub const SETTLE: Duration = Duration::from_secs(2);
/// Confirmation dialogs are optional; don't wait a full field timeout for one.
pub const CONFIRM_WAIT: Duration = Duration::from_secs(2);

/// How to trigger one of the final actions (save draft / submit).
#[derive(Debug, Clone, Default)]
pub struct SiteAction {
    pub button: Option<SelectorChain>,
    /// Confirmation dialog button clicked after the main button, when present.
    pub confirm: Option<SelectorChain>,
    /// Used when no button candidate matches.
    pub shortcut: Option<KeyPress>,
}

/// Everything site-specific about a browser publish.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub platform: Platform,
    pub name: &'static str,
    pub editor_url: String,
    pub login: LoginProbe,
    pub title: SelectorChain,
    pub body: SelectorChain,
    pub tags: Option<SelectorChain>,
    /// A checkbox/switch that is on for private articles.
    pub private_toggle: Option<SelectorChain>,
    pub draft: SiteAction,
    pub submit: SiteAction,
}

#[derive(Debug, Clone)]
pub struct FlowOptions {
    pub session: SessionOptions,
    pub mode: SubmitMode,
    pub visibility: Visibility,
    pub close: bool,
    pub ready_timeout: Duration,
    pub field_timeout: Duration,
    pub field_poll: Duration,
    pub tag_gap: Duration,
    pub settle: Duration,
}

impl FlowOptions {
    pub fn new(session: SessionOptions, mode: SubmitMode, visibility: Visibility) -> Self {
        Self {
            session,
            mode,
            visibility,
            close: false,
            ready_timeout: READY_TIMEOUT,
            field_timeout: FIELD_TIMEOUT,
            field_poll: FIELD_POLL,
            tag_gap: TAG_GAP,
            settle: SETTLE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowReport {
    pub url: String,
    pub logged_in_during_run: bool,
    pub body_kind: String,
    pub tags_entered: usize,
    pub action: &'static str,
}

/// Default remote-debugging port per platform, so each profile keeps its own browser.
pub fn default_port(platform: Platform) -> u16 {
    match platform {
        Platform::Infoq => 9223,
        Platform::Zenn => 9224,
        Platform::Qiita => 9225,
    }
}

/// Profile directory: flag, then config, then `~/.claude/wt/browser-profiles/<platform>`.
pub fn profile_dir(
    flag: Option<&Path>,
    configured: Option<&Path>,
    home: &Path,
    platform: Platform,
) -> PathBuf {
    match flag.or(configured) {
        Some(p) => paths::expand_home(p, home),
        None => paths::default_profile_dir(home, platform),
    }
}

/// Open (or attach to) the browser, fill the editor, and trigger the action.
///
/// The browser stays open afterwards unless `opts.close` is set, so the
/// login session survives for the next run.
pub async fn run(
    site: &SiteProfile,
    article: &Article,
    opts: &FlowOptions,
) -> cdp_driver::Result<FlowReport> {
    let session = BrowserSession::open(&opts.session).await?;
    let report = drive(session.page(), site, article, opts).await;
    if opts.close {
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "could not close the browser");
            if report.is_ok() {
                return Err(e);
            }
        }
    } else if session.launched() {
        tracing::info!("leaving the browser open; pass --close to quit it");
    }
    report
}

pub async fn drive(
    page: &Page,
    site: &SiteProfile,
    article: &Article,
    opts: &FlowOptions,
) -> cdp_driver::Result<FlowReport> {
    page.navigate(&site.editor_url).await?;
    page.wait_until_ready(opts.ready_timeout).await?;

    let mut logged_in_during_run = false;
    if site.login.detect(page).await? == LoginState::LoginRequired {
        site.login
            .wait_for_login(page, site.name, LOGIN_TIMEOUT, LOGIN_POLL_INTERVAL)
            .await?;
        logged_in_during_run = true;
        // Login usually redirects elsewhere; go back to the editor.
        page.navigate(&site.editor_url).await?;
        page.wait_until_ready(opts.ready_timeout).await?;
    }

    tracing::info!("filling title");
    let title = site
        .title
        .resolve(page, opts.field_timeout, opts.field_poll)
        .await?;
    fill(page, &site.title, &title, &article.title).await?;

    tracing::info!("filling body");
    let body = site
        .body
        .resolve(page, opts.field_timeout, opts.field_poll)
        .await?;
    let body_kind = fill(page, &site.body, &body, &article.content).await?;

    let tags_entered = match &site.tags {
        Some(chain) if !article.tags.is_empty() => {
            tracing::info!(count = article.tags.len(), "entering tags");
            let field = chain
                .resolve(page, opts.field_timeout, opts.field_poll)
                .await?;
            for tag in &article.tags {
                enter_tag(page, chain, &field, tag).await?;
                tokio::time::sleep(opts.tag_gap).await;
            }
            article.tags.len()
        }
        _ => 0,
    };

    set_visibility(page, site, opts).await?;

    let (action, label) = match opts.mode {
        SubmitMode::Draft => (&site.draft, "draft"),
        SubmitMode::Submit => (&site.submit, "submit"),
    };
    let how = trigger(page, action, label, opts).await?;

    tokio::time::sleep(opts.settle).await;
    let url = page.current_url().await?;
    tracing::info!(url = %url, "done");

    Ok(FlowReport {
        url,
        logged_in_during_run,
        body_kind,
        tags_entered,
        action: how,
    })
}

/// Set a field's value, typing it for content-editable editors. Returns the element kind.
async fn fill(
    page: &Page,
    chain: &SelectorChain,
    field: &Locator,
    value: &str,
) -> cdp_driver::Result<String> {
    let kind = page
        .evaluate(&script::set_value(&field.find_expr(), value))
        .await?;
    let kind = kind.as_str().unwrap_or_default().to_string();
    match kind.as_str() {
        kind::INPUT | kind::CODEMIRROR => {}
        kind::EDITABLE => page.insert_text(value).await?,
        kind::MISSING => return Err(chain.not_found()),
        other => {
            return Err(CdpError::Evaluation(format!(
                "{} field matched '{field}' but it is not editable ({other})",
                chain.field
            )))
        }
    }
    tracing::debug!(field = %chain.field, kind = %kind, "filled");
    Ok(kind)
}

async fn enter_tag(
    page: &Page,
    chain: &SelectorChain,
    field: &Locator,
    tag: &str,
) -> cdp_driver::Result<()> {
    let focused = page.evaluate(&script::focus(&field.find_expr())).await?;
    if focused.as_bool() != Some(true) {
        return Err(chain.not_found());
    }
    page.insert_text(tag).await?;
    page.press_key(&KeyPress::enter()).await
}

async fn set_visibility(
    page: &Page,
    site: &SiteProfile,
    opts: &FlowOptions,
) -> cdp_driver::Result<()> {
    let want_private = opts.visibility.is_private();
    let Some(chain) = &site.private_toggle else {
        if want_private {
            tracing::warn!("{} has no visibility option; ignoring --private", site.name);
        }
        return Ok(());
    };
    let toggle = chain
        .resolve(page, opts.field_timeout, opts.field_poll)
        .await?;
    let checked = page
        .evaluate(&script::is_checked(&toggle.find_expr()))
        .await?;
    if checked.as_bool() != Some(want_private) {
        page.evaluate(&script::click(&toggle.find_expr())).await?;
    }
    Ok(())
}

async fn trigger(
    page: &Page,
    action: &SiteAction,
    label: &str,
    opts: &FlowOptions,
) -> cdp_driver::Result<&'static str> {
    if let Some(chain) = &action.button {
        match chain
            .resolve(page, opts.field_timeout, opts.field_poll)
            .await
        {
            Ok(button) => {
                tracing::info!(button = %button, "clicking {label}");
                page.evaluate(&script::click(&button.find_expr())).await?;
                if let Some(confirm) = &action.confirm {
                    let wait = opts.field_timeout.min(CONFIRM_WAIT);
                    match confirm.resolve(page, wait, opts.field_poll).await {
                        Ok(ok) => {
                            page.evaluate(&script::click(&ok.find_expr())).await?;
                        }
                        Err(CdpError::SelectorNotFound { .. }) => {
                            tracing::debug!("no {label} confirmation shown");
                        }
                        Err(e) => return Err(e),
                    }
                }
                return Ok("button");
            }
            Err(CdpError::SelectorNotFound { .. }) if action.shortcut.is_some() => {
                tracing::warn!("{label} button not found; using keyboard shortcut");
            }
            Err(e) => return Err(e),
        }
    }
    match &action.shortcut {
        Some(key) => {
            page.press_key(key).await?;
            Ok("shortcut")
        }
        None => Err(CdpError::SelectorNotFound {
            field: format!("{label} button"),
            tried: Vec::new(),
        }),
    }
}
