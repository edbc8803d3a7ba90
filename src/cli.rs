use anyhow::{Context as _, Result};
use case_insights::api::{AnalyticsFetcher as _, BackendClient};
use case_insights::config::{AppSettings, load_app_settings};
use case_insights::insight::{DisplayVariant, TablePayload, build_table_with, render_text};
use case_insights::staging::{FetchedPayload, ResourceKey, ResourceKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "case-insights", about = "Underwriting case analytics tables")]
pub struct Cli {
    /// Settings file. Defaults to the per-user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a JSON file of rows as a table
    Render {
        /// JSON file: an array of rows, or an object with `rows`/`response` and `column_keys`
        #[arg(short, long)]
        file: PathBuf,

        /// standard, severity-comparison or large-loss-listing
        #[arg(short, long, default_value = "standard")]
        variant: DisplayVariant,

        /// Explicit column order (comma separated), overrides inference
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
    },
    /// Fetch one analytic resource for a case from the backend
    Fetch {
        /// Case identifier, e.g. C-123
        #[arg(short, long)]
        case: String,

        /// property-summary, zip-stats, severity-trend, large-losses or
        /// location-intelligence
        #[arg(short, long)]
        kind: ResourceKind,

        /// Bypass the backend cache
        #[arg(long)]
        force: bool,

        /// Backend URL, overrides settings
        #[arg(long, env = "CASE_INSIGHTS_BACKEND_URL")]
        backend_url: Option<String>,
    },
    /// Open the case dashboard window
    #[cfg(feature = "desktop")]
    Gui {
        /// Case to load on startup
        #[arg(short, long)]
        case: Option<String>,
    },
}

pub fn run_command(command: Commands, config_path: Option<PathBuf>) -> Result<()> {
    let settings = load_app_settings(config_path.as_deref())?;
    match command {
        Commands::Render {
            file,
            variant,
            keys,
        } => handle_render(&settings, file, variant, keys),
        Commands::Fetch {
            case,
            kind,
            force,
            backend_url,
        } => handle_fetch(settings, case, kind, force, backend_url),
        #[cfg(feature = "desktop")]
        Commands::Gui { case } => crate::app::run(settings, case),
    }
}

#[expect(clippy::print_stdout)]
fn handle_render(
    settings: &AppSettings,
    file: PathBuf,
    variant: DisplayVariant,
    keys: Vec<String>,
) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;
    let mut payload = TablePayload::from_json(value)
        .context("Expected an array of rows or an object with a `rows` array")?;
    if !keys.is_empty() {
        payload.explicit_keys = keys;
    }

    match build_table_with(Some(&payload), variant, &settings.policy_limits()) {
        Some(table) => print!("{}", render_text(&table)),
        None => println!("No data available."),
    }
    Ok(())
}

#[expect(clippy::print_stdout)]
fn handle_fetch(
    mut settings: AppSettings,
    case: String,
    kind: ResourceKind,
    force: bool,
    backend_url: Option<String>,
) -> Result<()> {
    if let Some(url) = backend_url {
        settings.backend_url = url;
        settings.validate()?;
    }
    let client = BackendClient::from_settings(&settings)?;
    let key = ResourceKey::new(kind, case);
    let payload: FetchedPayload = client
        .fetch(&key, force)
        .with_context(|| format!("Failed to fetch {key}"))?;

    println!("{}", kind.title());
    if let Some(summary) = &payload.summary {
        println!("{summary}");
    }
    match build_table_with(
        Some(&payload.table_payload()),
        kind.display_variant(),
        &settings.policy_limits(),
    ) {
        Some(table) => print!("{}", render_text(&table)),
        None => println!("No data available."),
    }
    println!(
        "Cached at {} (expires {})",
        payload.cached_at.format("%Y-%m-%d %H:%M:%S UTC"),
        payload.cache_expires_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}
