//! Pantry Manager - household pantry inventory
//!
//! Command-line front end. Every subcommand is one action against the
//! pantry; `serve` runs the JSON API instead.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use pantry_manager::config::StoreConfig;
use pantry_manager::render::format_for_terminal;
use pantry_manager::{
    open_store, Assistant, Config, InventorySnapshot, PantryError, PantrySession, PhotoOutcome,
};

/// Pantry inventory with photo recognition and recipe suggestions
#[derive(Parser, Debug)]
#[command(name = "pantry")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file (overrides PANTRY_DB)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Use the Firestore project instead of SQLite (overrides PANTRY_FIRESTORE_PROJECT)
    #[arg(long, global = true, conflicts_with = "database")]
    firestore_project: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every item with its count
    List {
        /// Only show items containing this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Add one of an item, creating it if needed
    Add { name: String },
    /// Increase an item's count by one
    Increase { key: String },
    /// Decrease an item's count by one, removing it at zero
    Decrease { key: String },
    /// Remove an item entirely
    Remove { key: String },
    /// Recognize the item in a JPEG photo and add it
    Classify { image: PathBuf },
    /// Suggest a recipe from everything in the pantry
    Recipe,
    /// Run the JSON API server
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        log::error!("{}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), PantryError> {
    let config = load_config(&args);
    config.validate()?;

    match &config.store {
        StoreConfig::Sqlite { path } => log::info!("Database path: {}", path.display()),
        StoreConfig::Firestore {
            project_id,
            collection,
            ..
        } => log::info!("Firestore project: {} ({})", project_id, collection),
    }

    let store = open_store(&config.store)?;
    let session = Arc::new(PantrySession::new(store, Assistant::from_config(&config)));

    match args.command {
        Command::List { search } => {
            session.refresh().await?;
            let snapshot = session.set_search_filter(search.as_deref().unwrap_or(""));
            print_items(&snapshot);
        }
        Command::Add { name } => {
            let snapshot = session.add_by_name(&name).await?;
            print_items(&snapshot);
        }
        Command::Increase { key } => {
            let snapshot = session.increase_count(&key).await?;
            print_items(&snapshot);
        }
        Command::Decrease { key } => {
            let snapshot = session.decrease_count(&key).await?;
            print_items(&snapshot);
        }
        Command::Remove { key } => {
            let snapshot = session.remove_item(&key).await?;
            print_items(&snapshot);
        }
        Command::Classify { image } => {
            let bytes = std::fs::read(&image).map_err(|source| PantryError::ImageUnreadable {
                path: image.clone(),
                source,
            })?;
            match session.add_by_photo(&bytes).await? {
                PhotoOutcome::Added { label, snapshot } => {
                    println!("Added: {}", label);
                    print_items(&snapshot);
                }
                PhotoOutcome::Rejected { message } => println!("{}", message),
            }
        }
        Command::Recipe => {
            let recipe = session.generate_recipe().await?;
            println!("{}", format_for_terminal(&recipe.blocks));
        }
        Command::Serve { port } => {
            if let Err(e) = pantry_manager::web::serve(session, port).await {
                log::error!("Web server error: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

/// Read configuration, letting command-line store selection win over the environment
fn load_config(args: &Args) -> Config {
    Config::from_lookup(|key| match key {
        "PANTRY_FIRESTORE_PROJECT" if args.database.is_some() => None,
        "PANTRY_FIRESTORE_PROJECT" => args
            .firestore_project
            .clone()
            .or_else(|| std::env::var(key).ok()),
        "PANTRY_DB" => args
            .database
            .as_ref()
            .map(|path| path.to_string_lossy().to_string())
            .or_else(|| std::env::var(key).ok()),
        _ => std::env::var(key).ok(),
    })
}

fn print_items(snapshot: &InventorySnapshot) {
    println!("{}", format_items(snapshot));
}

/// Visible items as aligned name/count rows
fn format_items(snapshot: &InventorySnapshot) -> String {
    if snapshot.visible.is_empty() {
        return if snapshot.search_term.is_empty() {
            "The pantry is empty.".to_string()
        } else {
            format!("No items match \"{}\".", snapshot.search_term)
        };
    }

    let width = snapshot
        .visible
        .iter()
        .map(|item| item.display_name().chars().count())
        .max()
        .unwrap_or(0);
    snapshot
        .visible
        .iter()
        .map(|item| format!("{:<width$}  {:>3}", item.display_name(), item.count, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}
