mod args;
mod browser_flow;
mod cmd;
mod output;
mod publish;
mod sites;
mod steps;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, infoq::InfoqArgs, qiita::QiitaArgs, zenn::ZennArgs, Ctx,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wtpub",
    about = "Publish markdown articles to InfoQ, Zenn and Qiita",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ~/.claude/wt/config.jsonc)
    #[arg(long, global = true, env = "WT_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish to InfoQ through the browser editor
    Infoq(InfoqArgs),

    /// Publish to Zenn with zenn-cli and git, or through the browser editor
    Zenn(ZennArgs),

    /// Publish to Qiita with qiita-cli or the Qiita API
    Qiita(QiitaArgs),

    /// Parse and validate a markdown file's frontmatter
    Parse {
        /// Markdown file
        path: PathBuf,
    },

    /// Inspect the configuration file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Report browsers, tools and profiles found on this machine
    Doctor,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Infoq(_) | Commands::Zenn(_) | Commands::Qiita(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = cmd::resolve_config_path(cli.config).and_then(|config_path| match cli.command {
        Commands::Infoq(args) => {
            Ctx::load(&config_path, cli.json).and_then(|ctx| cmd::infoq::run(args, &ctx))
        }
        Commands::Zenn(args) => {
            Ctx::load(&config_path, cli.json).and_then(|ctx| cmd::zenn::run(args, &ctx))
        }
        Commands::Qiita(args) => {
            Ctx::load(&config_path, cli.json).and_then(|ctx| cmd::qiita::run(args, &ctx))
        }
        Commands::Parse { path } => cmd::parse::run(&path, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, cli.json),
        Commands::Doctor => cmd::doctor::run(&config_path, cli.json),
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
