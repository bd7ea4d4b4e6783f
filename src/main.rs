use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use episodic::catalog::{Catalog, TmdbClient};
use episodic::config::{self, Config};
use episodic::error::Result;
use episodic::library::{Library, scan_source_dir};
use episodic::resolve::Resolver;

#[derive(Parser)]
#[command(version, about = "Resolve TV episode identities against TMDB")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a movie by TMDB id
    Movie { id: u64 },
    /// Resolve a TV episode by TMDB show id and source numbering
    Tv {
        id: u64,
        season: u32,
        episode: u32,
        #[arg(long)]
        episode2: Option<u32>,
        /// Source file, used for its name and as remap history
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// List a show's alternate episode orderings
    Groups { show: u64 },
    /// Select an alternate ordering for a show, or clear it
    SelectGroup { show: u64, group: Option<String> },
    /// Start tracking a show in the library
    Track { show: u64 },
    /// Add an alias used to reattach unidentified files
    Alias { show: u64, alias: String },
    /// Record video files from a directory
    Scan {
        dir: PathBuf,
        /// Confirm the files as belonging to this show
        #[arg(long)]
        show: Option<u64>,
    },
    /// Attach uncategorized files that match a show's aliases or folders
    Match { show: u64 },
}

fn setup_logging() -> Result<()> {
    let data_dir = config::data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let file_appender = tracing_appender::rolling::daily(&data_dir, "episodic.log");

    let filter = EnvFilter::from_default_env()
        .add_directive("episodic=info".parse().expect("static directive parses"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .init();

    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Could not format output: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = setup_logging() {
        eprintln!("Warning: Could not set up logging: {}", e);
    }

    let cli = Cli::parse();
    let config = Config::load()?;
    let library_path = config.library_path()?;
    let mut library = Library::load_from(&library_path)?;
    info!(shows = library.shows.len(), "Loaded library");

    match cli.command {
        Command::Movie { id } => {
            let resolver = Resolver::new(TmdbClient::new(&config.catalog)?, library);
            print_json(&resolver.resolve_movie(id).await?);
        }
        Command::Tv {
            id,
            season,
            episode,
            episode2,
            source,
        } => {
            let resolver = Resolver::new(TmdbClient::new(&config.catalog)?, library);
            let resolved = resolver
                .resolve_tv(id, season, episode, episode2, source.as_deref())
                .await?;
            print_json(&resolved);
        }
        Command::Groups { show } => {
            let client = TmdbClient::new(&config.catalog)?;
            print_json(&client.get_episode_groups(show).await?);
        }
        Command::SelectGroup { show, group } => {
            library.select_episode_group(show, group)?;
            library.save_to(&library_path)?;
        }
        Command::Track { show } => {
            let client = TmdbClient::new(&config.catalog)?;
            let details = client.get_show(show).await?;
            library.track_show(details.id, &details.name, details.original_name.as_deref());
            library.save_to(&library_path)?;
            println!("Tracking {} ({})", details.name, details.id);
        }
        Command::Alias { show, alias } => {
            if !library.add_alias(show, &alias)? {
                println!("Alias already known");
            }
            library.save_to(&library_path)?;
        }
        Command::Scan { dir, show } => {
            let files = scan_source_dir(&dir)?;
            let added = library.add_files(show, files)?;
            library.save_to(&library_path)?;
            println!("Recorded {} new file(s)", added);
        }
        Command::Match { show } => {
            let ids = library.match_uncategorized_files(show)?;
            library.attach_files(show, &ids)?;
            library.save_to(&library_path)?;
            print_json(&ids);
        }
    }

    Ok(())
}
