//! Point d'entrée CLI pour peta-zonasi

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;
mod export;

use cli::{resolve_locale, Commands};

/// Légende, statistiques et export stylé des plans de zonage indonésiens
#[derive(Parser)]
#[command(name = "peta-zonasi")]
#[command(author, version)]
#[command(about = "Render, summarize and export Indonesian zoning datasets (RTRW/RDTR)")]
#[command(long_about = "Drives a headless planning map over GeoJSON zoning datasets.\n\nPrints legends and land-use statistics, shows feature popups, and exports the rendered features with their computed style as GeoJSON.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Legend {
            input,
            zones,
            locale,
            cap,
            json,
        } => {
            info!(input = %input.display(), zones = %zones, "Legend");
            cli::cmd_legend(&input, &zones, resolve_locale(locale), cap, json)?;
        }
        Commands::Stats {
            input,
            locale,
            json,
        } => {
            info!(input = %input.display(), "Statistics");
            cli::cmd_stats(&input, resolve_locale(locale), json)?;
        }
        Commands::Render {
            input,
            output,
            config,
            zones,
            width,
            height,
        } => {
            info!(input = %input.display(), output = %output.display(), "Render");
            cli::cmd_render(&input, &output, config.as_deref(), &zones, (width, height))?;
        }
        Commands::Popup {
            input,
            feature,
            locale,
        } => {
            cli::cmd_popup(&input, &feature, resolve_locale(locale))?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
