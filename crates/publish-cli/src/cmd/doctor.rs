use std::path::Path;

use cdp_driver::chrome::{find_chrome, is_executable};
use cdp_driver::{BrowserProfile, DevToolsEndpoint};
use publish_core::config::{WarnLevel, WtConfig};
use publish_core::{paths, Method, Platform};
use serde::Serialize;

use crate::browser_flow;
use crate::cmd::runtime;
use crate::output::{print_json, print_table};

const TOOLS: &[&str] = &["node", "npm", "npx", "git"];

#[derive(Debug, Serialize)]
struct Check {
    item: String,
    ok: bool,
    detail: String,
}

impl Check {
    fn new(item: impl Into<String>, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            ok,
            detail: detail.into(),
        }
    }
}

/// Report which browsers, tools and profiles are available. Never fails on
/// a missing tool; it only reports.
pub fn run(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let mut checks = Vec::new();

    let config = match WtConfig::load_from(config_path) {
        Ok(config) => {
            let errors = config
                .validate()
                .iter()
                .filter(|w| w.level == WarnLevel::Error)
                .count();
            let detail = if config_path.exists() {
                config_path.display().to_string()
            } else {
                format!("{} (not created; defaults)", config_path.display())
            };
            checks.push(Check::new("config", errors == 0, detail));
            config
        }
        Err(e) => {
            checks.push(Check::new("config", false, e.to_string()));
            WtConfig::default()
        }
    };

    for tool in TOOLS {
        match which::which(tool) {
            Ok(p) => checks.push(Check::new(*tool, true, p.display().to_string())),
            Err(_) => checks.push(Check::new(*tool, false, "not found on PATH")),
        }
    }

    let home = paths::home_dir()?;
    let rt = runtime()?;
    for platform in Platform::all()
        .iter()
        .filter(|p| p.supports(Method::Browser))
    {
        let env_var = platform.chrome_path_env();
        match find_chrome(env_var) {
            Ok(p) => checks.push(Check::new(
                format!("chrome ({platform})"),
                is_executable(&p),
                p.display().to_string(),
            )),
            Err(e) => checks.push(Check::new(
                format!("chrome ({platform})"),
                false,
                e.to_string().lines().next().unwrap_or_default().to_string(),
            )),
        }

        let profile = BrowserProfile::new(browser_flow::profile_dir(
            None,
            config.profile_for(*platform),
            &home,
            *platform,
        ));
        let port = browser_flow::default_port(*platform);
        let listening = rt.block_on(DevToolsEndpoint::local(port).is_listening());
        let detail = format!(
            "{}{}{}",
            profile.dir().display(),
            if profile.is_locked() { " [in use]" } else { "" },
            if listening {
                format!(" [browser on :{port}]")
            } else {
                String::new()
            }
        );
        checks.push(Check::new(format!("profile ({platform})"), true, detail));
    }

    if json {
        return print_json(&serde_json::json!({ "checks": checks }));
    }
    let rows: Vec<Vec<String>> = checks
        .iter()
        .map(|c| {
            vec![
                c.item.clone(),
                if c.ok { "ok" } else { "missing" }.to_string(),
                c.detail.clone(),
            ]
        })
        .collect();
    print_table(&["check", "status", "detail"], &rows);
    Ok(())
}
