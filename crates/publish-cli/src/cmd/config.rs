use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use publish_core::config::{WarnLevel, WtConfig};

use crate::output::print_json;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (file merged over defaults)
    Show,

    /// Print the config file location
    Path,

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(config_path: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(config_path, json),
        ConfigSubcommand::Path => path(config_path, json),
        ConfigSubcommand::Validate => validate(config_path, json),
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = WtConfig::load_from(config_path).context("failed to load config")?;
    let mut shown = config.clone();
    // Never echo secrets.
    for value in shown.env.values_mut() {
        if !value.is_empty() {
            *value = "********".into();
        }
    }

    if json {
        return print_json(&shown);
    }
    if !config_path.exists() {
        println!("# {} does not exist; showing defaults", config_path.display());
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// path
// ---------------------------------------------------------------------------

fn path(config_path: &Path, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&serde_json::json!({
            "path": config_path,
            "exists": config_path.exists(),
        }));
    }
    println!("{}", config_path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(config_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = WtConfig::load_from(config_path).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        let value = serde_json::json!({
            "path": config_path,
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}
