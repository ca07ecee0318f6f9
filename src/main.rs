//! storecheck CLI - UI test harness for the Swag Labs storefront.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use storecheck::config::{DEFAULT_CONFIG_PATH, Settings};
use storecheck::evidence::junit;
use storecheck::session::BrowserKind;
use storecheck::suite::{Harness, HarnessOptions, scenarios};

#[derive(Parser)]
#[command(name = "storecheck")]
#[command(about = "End-to-end UI test harness for the Swag Labs storefront", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios
    Run {
        /// Override the configured browser (chrome, firefox, edge, safari)
        #[arg(short, long)]
        browser: Option<String>,

        /// Force headless mode regardless of configuration
        #[arg(long)]
        headless: bool,

        /// Override the configured worker count
        #[arg(short, long)]
        workers: Option<usize>,

        /// Only run scenarios whose name or tags match
        #[arg(short, long)]
        filter: Option<String>,

        /// JUnit XML output path
        #[arg(long)]
        junit: Option<PathBuf>,
    },

    /// List registered scenarios without running them
    List,

    /// Validate the configuration file
    Validate,

    /// Write a starter configuration file
    Init {
        /// Destination path
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            browser,
            headless,
            workers,
            filter,
            junit,
        } => {
            run_scenarios(
                &cli.config,
                browser,
                headless,
                workers,
                filter,
                junit,
                cli.verbose,
            )
            .await
        }
        Commands::List => list_scenarios(),
        Commands::Validate => validate_config(&cli.config),
        Commands::Init { path } => init_config(&path),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_scenarios(
    config_path: &Path,
    browser: Option<String>,
    headless: bool,
    workers: Option<usize>,
    filter: Option<String>,
    junit_path: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let browser = browser
        .as_deref()
        .map(str::parse::<BrowserKind>)
        .transpose()?;

    let mut overrides = Vec::new();
    if headless {
        overrides.push(("browser.headless".to_string(), "true".to_string()));
    }
    if let Some(kind) = browser {
        overrides.push(("browser.kind".to_string(), kind.name().to_string()));
    }

    let settings = Arc::new(
        Settings::load_with_overrides(config_path, &overrides)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?,
    );
    info!("loaded configuration from {}", config_path.display());

    let harness = Harness::new(
        settings,
        HarnessOptions {
            browser,
            workers,
            filter,
            verbose,
        },
    );

    let result = harness.run(scenarios::all()).await?;

    if let Some(path) = junit_path {
        let cases: Vec<_> = result.results.iter().map(|r| r.to_junit_case()).collect();
        junit::write_file(&path, "storecheck", &cases)?;
        info!("junit results written to {}", path.display());
    }

    // All workers have been joined by run(); the report flushes once.
    let report = harness.hub().flush()?;
    println!("Report: {}", report.display());

    std::process::exit(result.exit_code());
}

fn list_scenarios() -> Result<()> {
    for scenario in scenarios::all() {
        println!(
            "{:<32} [{}] {}",
            scenario.name,
            scenario.tags.join(", "),
            scenario.description
        );
    }
    Ok(())
}

fn validate_config(config_path: &Path) -> Result<()> {
    let settings = Settings::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    // Surface the typed accessors that can fail before a run does.
    settings
        .browser()
        .parse::<BrowserKind>()
        .context("browser.kind is not a supported browser")?;
    settings
        .implicit_wait()
        .context("timeouts.implicit_wait is not a valid integer")?;
    settings
        .explicit_wait()
        .context("timeouts.explicit_wait is not a valid integer")?;
    settings
        .page_load_timeout()
        .context("timeouts.page_load is not a valid integer")?;
    settings
        .retry_count()
        .context("retry.count is not a valid integer")?;
    settings
        .worker_count()
        .context("suite.workers is not a valid integer")?;
    settings
        .retry_lifetime()
        .parse::<storecheck::RetryLifetime>()
        .context("retry.lifetime must be 'fresh' or 'shared'")?;
    if settings.grid_enabled() {
        let hub = settings
            .grid_hub_url()
            .context("grid.enabled is set but grid.hub_url is missing")?;
        url::Url::parse(&hub).context("grid.hub_url is not a valid URL")?;
    }

    println!("Configuration is valid: {}", config_path.display());
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote starter configuration to {}", path.display());
    println!("Edit it, then try: storecheck validate");
    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"[app]
url = "https://www.saucedemo.com"
title = "Swag Labs"

[browser]
kind = "chrome"
headless = true

[timeouts]
implicit_wait = 10
explicit_wait = 10
page_load = 30

[grid]
enabled = false
hub_url = "http://localhost:4444/wd/hub"

[driver]
chrome = "http://localhost:9515"
firefox = "http://localhost:4444"
edge = "http://localhost:9515"
safari = "http://localhost:4445"

[retry]
count = 2
lifetime = "fresh"

[suite]
workers = 4
environment = "qa"

[evidence]
screenshot_dir = "artifacts/screenshots"
report_dir = "artifacts/reports"
report_name = "Storefront UI Regression"
report_title = "storecheck report"
theme = "standard"
retention_days = 7

[testdata]
dir = "fixtures"

[users]
standard = "standard_user"
locked = "locked_out_user"
problem = "problem_user"
performance = "performance_glitch_user"
error = "error_user"
visual = "visual_user"
password = "secret_sauce"

[mobile]
enabled = false
"#;
