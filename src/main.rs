use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use m2u_export::browser::{ChromeDriver, ChromeOptions};
use m2u_export::config::{default_config_path, ResolvedConfig};
use m2u_export::credentials::Credentials;
use m2u_export::duration::format_duration;
use m2u_export::error::ScrapeError;
use m2u_export::session::{PortalSession, RunReport};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "m2u-export")]
#[command(about = "Export Maybank2u transaction history to QIF files")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write .qif files here instead of the configured output_dir
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Only export the named account or card (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show resolved configuration
    Config,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,chromiumoxide=warn,chromiumoxide::conn=off,chromiumoxide::handler=off")
    });
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }
}

fn config_output(config_path: &std::path::Path, config: &ResolvedConfig) -> serde_json::Value {
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "output_directory": config.output_dir.display().to_string(),
        "login_url": config.login_url,
        "browser": {
            "headless": config.browser.headless,
            "chrome_executable": config.browser.chrome_executable.as_ref().map(|p| p.display().to_string()),
            "wait_timeout": format_duration(config.browser.wait_timeout),
            "poll_interval": format_duration(config.browser.poll_interval),
        },
        "targets": config.targets.iter().map(|t| serde_json::json!({
            "name": t.name,
            "kind": t.kind,
            "days": t.lookback(),
        })).collect::<Vec<_>>(),
    })
}

fn confirm_security_image() -> Result<bool, ScrapeError> {
    dialoguer::Confirm::new()
        .with_prompt("Is the security image shown in the browser correct?")
        .default(false)
        .interact()
        .map_err(|e| ScrapeError::Aborted(format!("failed to read confirmation: {e}")))
}

fn print_report(report: &RunReport) {
    println!();
    for entry in &report.targets {
        match &entry.outcome {
            Ok(summary) => println!(
                "  ok      {} ({}): {} transactions from {} page(s) -> {}",
                entry.target.name,
                entry.target.kind,
                summary.transactions,
                summary.pages,
                summary.path.display()
            ),
            Err(err) => println!(
                "  failed  {} ({}): {err}",
                entry.target.name, entry.target.kind
            ),
        }
    }
    println!(
        "\n{} exported, {} failed",
        report.succeeded(),
        report.failed()
    );
}

async fn export(config: &ResolvedConfig) -> Result<RunReport> {
    let credentials = Credentials::prompt()?;

    info!("Launching");
    let driver = ChromeDriver::launch(&ChromeOptions {
        executable: config.browser.chrome_executable.clone(),
        headless: config.browser.headless,
        profile_dir: config.browser.profile_dir.clone(),
    })
    .await?;

    let session = PortalSession::new(&driver, config);
    let outcome = session.run(&credentials, confirm_security_image).await;
    driver.close().await;

    outcome.context("Login failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = ResolvedConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if cli.headless {
        config.browser.headless = true;
    }
    config.retain_targets(&cli.only);

    match cli.command {
        Some(Command::Config) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&config_output(&config_path, &config))?
            );
            Ok(())
        }
        None => {
            if config.targets.is_empty() {
                anyhow::bail!(
                    "No accounts or cards to export. Add [[accounts]] or [[cards]] to {}",
                    config_path.display()
                );
            }

            let report = export(&config).await?;
            print_report(&report);
            if !report.is_success() {
                anyhow::bail!("{} of {} exports failed", report.failed(), report.targets.len());
            }
            info!("Done");
            Ok(())
        }
    }
}
