//! photomirror CLI entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use photomirror::config::{Config, CONFIG_ENV};
use photomirror::db::Database;
use photomirror::logging;
use photomirror::source::{CatalogSource, JsonCatalog};
use photomirror::sync::{SyncOptions, SyncProgress, SyncStats, Syncer};

#[derive(Parser)]
#[command(name = "photomirror")]
#[command(version, about = "Mirror a photo library catalog into SQLite", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Database path (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the catalog into the database
    Sync {
        /// JSON export of the photo library (defaults to catalog.path in the config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Update photos even when they have not been modified
        #[arg(long)]
        force_update: bool,

        /// Number of photos per transaction
        #[arg(long)]
        batch_size: Option<usize>,

        /// Only sync the first N photos
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show library statistics
    Stats,

    /// Suggest keywords, people, albums and labels matching a query
    Search {
        query: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing goes to journald or a log file; stdout is for the user
    let _ = logging::init(None);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let mut db = Database::open(&config.db_path)?;
    db.initialize()?;

    match cli.command {
        Commands::Sync {
            catalog,
            force_update,
            batch_size,
            limit,
        } => {
            let catalog = catalog
                .or_else(|| config.catalog.path.clone())
                .context("No catalog given: pass --catalog or set catalog.path in the config")?;

            let mut options = SyncOptions::from(&config.sync);
            options.force_update = force_update;
            options.limit = limit;
            if let Some(batch_size) = batch_size {
                options.batch_size = batch_size;
            }

            cmd_sync(&mut db, &catalog, options)
        }
        Commands::Stats => cmd_stats(&db),
        Commands::Search { query } => cmd_search(&db, &query),
    }
}

fn cmd_sync(db: &mut Database, catalog: &Path, options: SyncOptions) -> Result<()> {
    let syncer = Syncer::new(options)?;

    println!("Starting photo sync...");
    let mut source = JsonCatalog::open(catalog)?;
    println!("Found {} photos in catalog", source.len());

    let stats = syncer.run(
        db,
        &mut source,
        Some(&mut |event| match event {
            SyncProgress::Progress { stats, total } => println!(
                "Progress: {}/{} (Created: {}, Updated: {}, Skipped: {}, Errors: {})",
                stats.processed, total, stats.created, stats.updated, stats.skipped, stats.errors
            ),
            SyncProgress::ItemFailed { uuid, message } => {
                println!("Error processing photo {}: {}", uuid, message)
            }
            _ => {}
        }),
    )?;

    print_summary(&stats);
    Ok(())
}

fn print_summary(stats: &SyncStats) {
    println!();
    println!("Sync completed!");
    println!("Total processed: {}", stats.processed);
    println!("Created: {}", stats.created);
    println!("Updated: {}", stats.updated);
    println!("Skipped: {}", stats.skipped);
    println!("Errors: {}", stats.errors);
}

fn cmd_stats(db: &Database) -> Result<()> {
    let stats = db.store().library_stats()?;

    println!("Photos:              {}", stats.total_photos);
    println!("Videos:              {}", stats.total_videos);
    println!("Favorites:           {}", stats.total_favorites);
    println!("People:              {}", stats.total_persons);
    println!("Albums:              {}", stats.total_albums);
    println!("Keywords:            {}", stats.total_keywords);
    println!("Labels:              {}", stats.total_labels);
    println!("With location:       {}", stats.photos_with_location);
    println!("With faces:          {}", stats.photos_with_faces);

    if !stats.top_cameras.is_empty() {
        println!("\nTop cameras:");
        for camera in &stats.top_cameras {
            println!("  {:>6}  {} {}", camera.count, camera.camera_make, camera.camera_model);
        }
    }
    if !stats.top_persons.is_empty() {
        println!("\nTop people:");
        for person in &stats.top_persons {
            println!("  {:>6}  {}", person.photo_count, person.name);
        }
    }
    if !stats.top_keywords.is_empty() {
        println!("\nTop keywords:");
        for keyword in &stats.top_keywords {
            println!("  {:>6}  {}", keyword.photo_count, keyword.name);
        }
    }

    Ok(())
}

fn cmd_search(db: &Database, query: &str) -> Result<()> {
    let suggestions = db.store().autocomplete(query)?;
    if suggestions.is_empty() {
        println!("No matches");
        return Ok(());
    }
    for suggestion in suggestions {
        println!("{:<8} {}", suggestion.kind.as_str(), suggestion.value);
    }
    Ok(())
}
