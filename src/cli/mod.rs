use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use log::warn;
use rand::{SeedableRng, rngs::StdRng};
use std::{path::PathBuf, sync::Arc};

use crate::config::Config;
use crate::dataset::{Dataset, fetch};
use crate::domain::genre::GenreMapping;
use crate::domain::summary::TrackSummary;
use crate::embed::embed_url;
use crate::http::page::summary_cells;
use crate::http::server::{HttpServer, Jukebox};

#[derive(Parser)]
#[command(name = "jukebox")]
#[command(version = "0.1")]
#[command(about = "Spotify jukebox and 2D feature visualizer")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the jukebox web app
    Serve,
    /// Download the dataset
    Fetch {
        /// Download even if the file is already there
        #[arg(short, long)]
        force: bool,
    },
    /// Show dataset status
    Status,
    /// Print the coarse category of genre labels
    Classify {
        #[arg(required = true)]
        genres: Vec<String>,
    },
    /// Pick a random track
    Roll,
    /// Show the attributes of a track
    Show { track_id: String },
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;
    let mapping = cfg.genre_mapping();

    for (label, categories) in mapping.ambiguous_labels() {
        warn!(
            "genre '{label}' is listed under {}, classifying as '{}'",
            categories.join(", "),
            categories[0]
        );
    }

    match &cli.command {
        Commands::Serve => {
            println!("Loading data...");
            let dataset = Arc::new(Dataset::load(&cfg.dataset, &mapping)?);
            let jukebox = Jukebox::new(&dataset, StdRng::from_entropy())?;

            let http_server = HttpServer::new(dataset, mapping, jukebox, &cfg);

            println!(
                "HTTP server running at http://{}:{}",
                http_server.config.bind_addr, http_server.config.port
            );
            http_server.run();
        }

        Commands::Fetch { force } => {
            let path = fetch::ensure_present(&cfg.dataset, *force)?;
            println!("Dataset available at {}", path.to_string_lossy());
        }

        Commands::Status => {
            let path = &cfg.dataset.path;
            if !path.is_file() {
                println!(
                    "Dataset {} not downloaded yet. Run \"fetch\" to download it",
                    path.to_string_lossy()
                );
                return Ok(());
            }

            let modified = std::fs::metadata(path)
                .and_then(|m| m.modified())
                .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
            let dataset = Dataset::open(path, &mapping)?;
            let stats = dataset.stats(&mapping);

            println!(
                "Dataset {} was downloaded {}",
                path.to_string_lossy(),
                DateTime::<Local>::from(modified).format("%Y-%m-%d %H:%M:%S")
            );
            println!("Contains {} rows, {} tracks", stats.rows, stats.tracks);
            for (category, count) in &stats.categories {
                println!("  {category:<20} {count}");
            }
            println!("  {:<20} {}", "<uncategorized>", stats.uncategorized);
        }

        Commands::Classify { genres } => {
            for genre in genres {
                println!("{genre}: {}", describe_category(&mapping, genre));
            }
        }

        Commands::Roll => {
            let dataset = Dataset::load(&cfg.dataset, &mapping)?;
            let track_id = dataset.random_track_id(&mut StdRng::from_entropy())?;
            let summary = dataset.summarize(&track_id)?;

            println!("Your randomly chosen jukebox song is... {track_id}");
            println!("  {}", embed_url(&cfg.embed, &track_id));
            print_summary(&summary);
        }

        Commands::Show { track_id } => {
            let dataset = Dataset::load(&cfg.dataset, &mapping)?;
            let summary = dataset.summarize(track_id)?;

            println!("Track: {track_id}");
            print_summary(&summary);
        }
    }
    Ok(())
}

fn describe_category<'a>(mapping: &'a GenreMapping, genre: &str) -> &'a str {
    match mapping.classify(genre) {
        "" => "<uncategorized>",
        coarse => coarse,
    }
}

fn print_summary(summary: &TrackSummary) {
    println!("Attributes for this song:");
    for (name, value) in summary_cells(summary) {
        println!("  {name:<20} {value}");
    }
}
