//! # Case Insights Entry Point
//!
//! ```text
//! main()
//!   │
//!   ├─> Initialise logging (env_logger, RUST_LOG)
//!   ├─> Parse CLI arguments (clap)
//!   │
//!   ├─> If command provided:
//!   │   └─> Execute CLI command
//!   │
//!   └─> Otherwise:
//!       ├─> desktop build: launch the case dashboard
//!       └─> otherwise: print usage
//! ```
//!
//! ```bash
//! case-insights render --file losses.json --variant large-loss-listing
//! case-insights fetch --case C-123 --kind severity-trend
//! ```

#![warn(clippy::all, rust_2018_idioms)]

#[cfg(feature = "desktop")]
mod app;
mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    case_insights::logging::init();

    let cli = cli::Cli::parse();

    if let Some(command) = cli.command {
        return cli::run_command(command, cli.config);
    }

    #[cfg(feature = "desktop")]
    {
        let settings = case_insights::config::load_app_settings(cli.config.as_deref())?;
        app::run(settings, None)
    }

    #[cfg(not(feature = "desktop"))]
    {
        use clap::CommandFactory as _;
        cli::Cli::command().print_help()?;
        Ok(())
    }
}
