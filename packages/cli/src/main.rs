#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the parking safety tools.
//!
//! Every subcommand reads the datasets from `PARKING_SAFETY_DATA_DIR` and
//! shares the cache directory (`PARKING_SAFETY_CACHE_DIR`) with the API
//! server. Running without a subcommand opens an interactive menu.

mod commands;

use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input, Select};
use parking_safety_cli_utils::MultiProgress;
use parking_safety_safety_models::ScoringStrategy;

use crate::commands::AnalyzeOptions;

#[derive(Parser)]
#[command(name = "parking_safety", about = "Parking safety analysis tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every location and summarize the results
    Analyze {
        /// Scoring strategy (`comprehensive` or `infraction_rate`)
        #[arg(long, default_value = "comprehensive")]
        strategy: ScoringStrategy,
        /// Maximum age of a cached analysis in hours
        #[arg(long)]
        max_age_hours: Option<i64>,
        /// Recompute without reading or writing the cache
        #[arg(long)]
        no_cache: bool,
        /// Number of riskiest locations to list
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Find analysed locations by name
    Search {
        /// Case-insensitive substring of the location
        term: String,
    },
    /// Estimate safety for a location without direct data
    Predict {
        /// Free-text location, e.g. "King Street"
        location: String,
    },
    /// Geocode dataset addresses missing from the geocode cache
    Geocode {
        /// Re-geocode addresses that are already cached
        #[arg(long)]
        force: bool,
    },
    /// Inspect or manage the cache directory
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Start the API server
    Serve,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show each cache document
    Status,
    /// Remove a cache document (`all`, `safety_analysis`, `geocoded_addresses`)
    Clear {
        #[arg(default_value = "all")]
        kind: String,
    },
    /// Copy the geocode cache to a timestamped backup
    Backup,
}

/// Menu entries of the interactive mode.
enum Action {
    Analyze,
    Search,
    Predict,
    Geocode,
    CacheStatus,
    CacheClear,
    CacheBackup,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Analyze,
        Self::Search,
        Self::Predict,
        Self::Geocode,
        Self::CacheStatus,
        Self::CacheClear,
        Self::CacheBackup,
        Self::Serve,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Analyze => "Analyze parking safety",
            Self::Search => "Search locations",
            Self::Predict => "Predict safety for a location",
            Self::Geocode => "Geocode addresses",
            Self::CacheStatus => "Show cache status",
            Self::CacheClear => "Clear caches",
            Self::CacheBackup => "Back up geocode cache",
            Self::Serve => "Start server",
        }
    }
}

/// Runs the server on an actix system in a blocking task so it does not
/// nest inside the tokio runtime.
async fn serve(interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(async move {
            if interactive {
                parking_safety_server::interactive::run().await
            } else {
                parking_safety_server::run_server().await
            }
        })
    })
    .await??;
    Ok(())
}

async fn interactive(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Parking Safety");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Analyze => {
            let strategies = [ScoringStrategy::Comprehensive, ScoringStrategy::InfractionRate];
            let names: Vec<String> = strategies.iter().map(ToString::to_string).collect();
            let choice = Select::new()
                .with_prompt("Scoring strategy")
                .items(&names)
                .default(0)
                .interact()?;
            let no_cache = !Confirm::new()
                .with_prompt("Use cached analysis when valid?")
                .default(true)
                .interact()?;

            commands::analyze(
                multi,
                &AnalyzeOptions {
                    strategy: strategies[choice],
                    no_cache,
                    ..AnalyzeOptions::default()
                },
            )?;
        }
        Action::Search => {
            let term: String = Input::new().with_prompt("Location").interact_text()?;
            commands::search(multi, &term)?;
        }
        Action::Predict => {
            let location: String = Input::new().with_prompt("Location").interact_text()?;
            commands::predict(&location)?;
        }
        Action::Geocode => {
            let force = Confirm::new()
                .with_prompt("Re-geocode addresses that are already cached?")
                .default(false)
                .interact()?;
            commands::geocode(multi, force).await?;
        }
        Action::CacheStatus => commands::cache_status(),
        Action::CacheClear => {
            let kinds = ["all", "safety_analysis", "geocoded_addresses"];
            let choice = Select::new()
                .with_prompt("Which cache?")
                .items(&kinds)
                .default(0)
                .interact()?;
            commands::cache_clear(commands::parse_cache_kind(kinds[choice])?)?;
        }
        Action::CacheBackup => commands::cache_backup()?,
        Action::Serve => serve(true).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = parking_safety_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive(&multi).await;
    };

    match command {
        Commands::Analyze {
            strategy,
            max_age_hours,
            no_cache,
            top,
        } => commands::analyze(
            &multi,
            &AnalyzeOptions {
                strategy,
                max_age_hours,
                no_cache,
                top,
            },
        )?,
        Commands::Search { term } => commands::search(&multi, &term)?,
        Commands::Predict { location } => commands::predict(&location)?,
        Commands::Geocode { force } => commands::geocode(&multi, force).await?,
        Commands::Cache { command } => match command {
            CacheCommands::Status => commands::cache_status(),
            CacheCommands::Clear { kind } => {
                commands::cache_clear(commands::parse_cache_kind(&kind)?)?;
            }
            CacheCommands::Backup => commands::cache_backup()?,
        },
        Commands::Serve => serve(false).await?,
    }

    Ok(())
}
