// ============================================================================
// wardrobe - command-line front end for the wardrobe catalog
// ============================================================================
// Usage:
//   wardrobe stats                              Show catalog statistics
//   wardrobe add-item --category top shirt.jpg  Add a photo to the catalog
//   wardrobe generate [--count 3] [--save]      Suggest outfits
//   wardrobe replace OUTFIT_ID ITEM_ID          Swap one piece of a saved outfit
//   wardrobe import ~/Downloads/smart-wardrobe  Bulk import category folders
//   wardrobe export --format json               Export items and outfits as JSON
// ============================================================================

use anyhow::{bail, Result};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use wardrobe_core::{
    create_category_folders, folder_stats, import_folder, import_one, CatalogStore,
    ClothingCategory, ItemUpdate, MediaLibrary, Outfit, OutfitComposer, WardrobeConfig,
    WardrobeDb, WardrobeError,
};

/// Wardrobe catalog and outfit suggestion tool
#[derive(Parser)]
#[command(name = "wardrobe", version, about = "Manage your clothing catalog and get outfit suggestions")]
struct Cli {
    /// Path to the database file (default: ~/.wardrobe/wardrobe.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Directory for stored photos (default: ~/.wardrobe/media)
    #[arg(long, global = true)]
    media_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalog statistics (items per category, saved outfits)
    Stats,

    /// List clothing items with optional category filter
    ListItems {
        /// Filter by category: coat, jacket, top, pants, long-skirt, short-skirt, shoes, accessory
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a photo to the catalog
    AddItem {
        /// Category of the item
        #[arg(long)]
        category: String,

        /// Photo file to store
        image: PathBuf,
    },

    /// Change the category of an item
    SetCategory { item_id: String, category: String },

    /// Delete an item and its stored photos
    DeleteItem { item_id: String },

    /// Suggest new outfits from the catalog
    Generate {
        /// Number of outfits to suggest
        #[arg(long, default_value = "1")]
        count: usize,

        /// Save the suggestions
        #[arg(long)]
        save: bool,
    },

    /// Swap one item of a saved outfit for another of the same category
    Replace {
        outfit_id: String,
        item_id: String,

        /// Save the new outfit alongside the original
        #[arg(long)]
        save: bool,
    },

    /// List saved outfits
    ListOutfits {
        /// Only show favorites
        #[arg(long)]
        favorites: bool,
    },

    /// Toggle the favorite flag of a saved outfit
    Favorite { outfit_id: String },

    /// Delete a saved outfit
    DeleteOutfit { outfit_id: String },

    /// Create the category folder layout used by `import`
    InitFolders { dir: PathBuf },

    /// Count photos in each category folder
    Scan { dir: PathBuf },

    /// Import every photo from the category folders
    Import { dir: PathBuf },

    /// Export items and outfits
    Export {
        /// Output format (currently only json is supported)
        #[arg(long, default_value = "json")]
        format: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("wardrobe_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_category(s: &str) -> Result<ClothingCategory> {
    Ok(s.parse::<ClothingCategory>()?)
}

fn format_timestamp(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("(invalid: {})", millis))
}

fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        debug!("No .env file loaded: {}", e);
    }

    let cli = Cli::parse();
    let catalog = || -> Result<(WardrobeConfig, WardrobeDb)> {
        let config = WardrobeConfig::resolve(cli.db_path.as_deref(), cli.media_dir.as_deref())?;
        let db = WardrobeDb::open(&config.db_path)?;
        Ok((config, db))
    };

    match &cli.command {
        // Folder layout commands never touch the catalog.
        Commands::InitFolders { dir } => cmd_init_folders(dir),
        Commands::Scan { dir } => cmd_scan(dir),
        Commands::Stats => cmd_stats(&catalog()?.1),
        Commands::ListItems { category } => cmd_list_items(&catalog()?.1, category.clone()),
        Commands::AddItem { category, image } => {
            let (config, db) = catalog()?;
            cmd_add_item(&db, &config, category, image)
        }
        Commands::SetCategory { item_id, category } => {
            cmd_set_category(&catalog()?.1, item_id, category)
        }
        Commands::DeleteItem { item_id } => {
            let (config, db) = catalog()?;
            cmd_delete_item(&db, &config, item_id)
        }
        Commands::Generate { count, save } => cmd_generate(&catalog()?.1, *count, *save),
        Commands::Replace {
            outfit_id,
            item_id,
            save,
        } => cmd_replace(&catalog()?.1, outfit_id, item_id, *save),
        Commands::ListOutfits { favorites } => cmd_list_outfits(&catalog()?.1, *favorites),
        Commands::Favorite { outfit_id } => cmd_favorite(&catalog()?.1, outfit_id),
        Commands::DeleteOutfit { outfit_id } => cmd_delete_outfit(&catalog()?.1, outfit_id),
        Commands::Import { dir } => {
            let (config, db) = catalog()?;
            cmd_import(&db, &config, dir)
        }
        Commands::Export { format } => cmd_export(&catalog()?.1, format),
    }
}

fn print_outfit(outfit: &Outfit) {
    println!(
        "{}{}  ({})",
        outfit.id,
        if outfit.is_favorite { "  ★" } else { "" },
        format_timestamp(outfit.created_at)
    );
    for item in &outfit.items {
        println!("  {:<12} {:<36}  {}", item.category.as_str(), item.id, item.image_uri);
    }
}

fn cmd_stats(db: &WardrobeDb) -> Result<()> {
    let stats = db.stats()?;

    println!("=== Wardrobe Stats ===");
    println!("Database: {}", db.path().display());
    println!();
    println!("Items:    {} total", stats.total_items);
    for (category, count) in &stats.item_counts {
        println!("  {:12} {}", category.as_str(), count);
    }
    println!("Outfits:  {} saved, {} favorites", stats.total_outfits, stats.favorite_outfits);

    Ok(())
}

fn cmd_list_items(db: &WardrobeDb, category: Option<String>) -> Result<()> {
    let items = match category.as_deref().map(parse_category).transpose()? {
        Some(category) => db.list_items_by_category(category)?,
        None => db.list_items()?,
    };

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    println!("{:<36}  {:<12}  {:<22}  {}", "ITEM ID", "CATEGORY", "ADDED AT", "IMAGE");
    println!("{}", "-".repeat(100));

    for item in &items {
        println!(
            "{:<36}  {:<12}  {:<22}  {}",
            item.id,
            item.category.as_str(),
            format_timestamp(item.added_at),
            item.image_uri
        );
    }

    println!("\nTotal: {} items", items.len());
    Ok(())
}

fn cmd_add_item(db: &WardrobeDb, config: &WardrobeConfig, category: &str, image: &Path) -> Result<()> {
    let category = parse_category(category)?;
    let media = MediaLibrary::open(&config.media_dir)?;
    let item = import_one(db, &media, image, category)?;

    println!("Added {} ({}) -> {}", item.id, item.category.label(), item.image_uri);
    Ok(())
}

fn cmd_set_category(db: &WardrobeDb, item_id: &str, category: &str) -> Result<()> {
    let category = parse_category(category)?;
    let item = db.update_item(item_id, ItemUpdate::category(category))?;

    println!("Item {} is now {}", item.id, item.category.label());
    Ok(())
}

fn cmd_delete_item(db: &WardrobeDb, config: &WardrobeConfig, item_id: &str) -> Result<()> {
    let Some(item) = db.delete_item(item_id)? else {
        return Err(WardrobeError::ItemNotFound(item_id.to_string()).into());
    };

    let media = MediaLibrary::open(&config.media_dir)?;
    let removed = media.delete(&item);
    println!("Deleted item {} ({} files removed)", item.id, removed);
    Ok(())
}

fn cmd_generate(db: &WardrobeDb, count: usize, save: bool) -> Result<()> {
    if count == 0 {
        println!("Nothing to generate: --count is 0");
        return Ok(());
    }

    let catalog = db.load_items()?;
    let history = db.load_outfit_history()?;

    let outfits = OutfitComposer::new().compose_many(&catalog, count, &history);
    if outfits.is_empty() {
        println!("Not enough clothes to build an outfit: add at least one top and one bottom (pants or skirt).");
        return Ok(());
    }

    for outfit in &outfits {
        print_outfit(outfit);
        if save {
            db.persist_outfit(outfit)?;
        }
        println!();
    }

    if save {
        println!("Saved {} outfits", outfits.len());
    }
    Ok(())
}

fn cmd_replace(db: &WardrobeDb, outfit_id: &str, item_id: &str, save: bool) -> Result<()> {
    let outfit = db
        .get_outfit(outfit_id)?
        .ok_or_else(|| WardrobeError::OutfitNotFound(outfit_id.to_string()))?;
    let Some(target) = outfit.items.iter().find(|item| item.id == item_id) else {
        bail!("Item {} is not part of outfit {}", item_id, outfit_id);
    };
    let catalog = db.load_items()?;

    match OutfitComposer::new().replace(&outfit, target, &catalog) {
        Some(replaced) => {
            print_outfit(&replaced);
            if save {
                db.persist_outfit(&replaced)?;
                println!("\nSaved outfit {}", replaced.id);
            }
        }
        None => println!(
            "Nothing else to swap to: no other {} in the catalog.",
            target.category.label().to_lowercase()
        ),
    }
    Ok(())
}

fn cmd_list_outfits(db: &WardrobeDb, favorites: bool) -> Result<()> {
    let outfits = if favorites {
        db.list_favorite_outfits()?
    } else {
        db.list_outfits()?
    };

    if outfits.is_empty() {
        println!("No outfits found.");
        return Ok(());
    }

    for outfit in &outfits {
        print_outfit(outfit);
        println!();
    }
    println!("Total: {} outfits", outfits.len());
    Ok(())
}

fn cmd_favorite(db: &WardrobeDb, outfit_id: &str) -> Result<()> {
    let favorite = db.toggle_outfit_favorite(outfit_id)?;
    println!(
        "Outfit {} {}",
        outfit_id,
        if favorite { "added to favorites" } else { "removed from favorites" }
    );
    Ok(())
}

fn cmd_delete_outfit(db: &WardrobeDb, outfit_id: &str) -> Result<()> {
    if !db.delete_outfit(outfit_id)? {
        return Err(WardrobeError::OutfitNotFound(outfit_id.to_string()).into());
    }
    println!("Deleted outfit {}", outfit_id);
    Ok(())
}

fn cmd_init_folders(dir: &Path) -> Result<()> {
    let created = create_category_folders(dir)?;
    println!("Category folders ready in {} ({} created)", dir.display(), created);
    for category in ClothingCategory::ALL {
        println!("  {:<8} {}", category.folder_name(), category.as_str());
    }
    Ok(())
}

fn cmd_scan(dir: &Path) -> Result<()> {
    let stats = folder_stats(dir)?;
    if stats.is_empty() {
        println!("No images found in {}", dir.display());
        return Ok(());
    }

    for entry in &stats {
        println!("  {:<8} {:<12} {}", entry.folder, entry.category.as_str(), entry.count);
    }
    println!("\nTotal: {} images", stats.iter().map(|s| s.count).sum::<usize>());
    Ok(())
}

fn cmd_import(db: &WardrobeDb, config: &WardrobeConfig, dir: &Path) -> Result<()> {
    let media = MediaLibrary::open(&config.media_dir)?;
    let report = import_folder(db, &media, dir)?;

    if report.imported_count() == 0 && report.failed_count() == 0 {
        println!("No images found in {}", dir.display());
        return Ok(());
    }

    println!("Imported: {}", report.imported_count());
    println!("Failed:   {}", report.failed_count());
    for failure in &report.failed {
        println!("  - {}: {}", failure.path.display(), failure.error);
    }
    Ok(())
}

fn cmd_export(db: &WardrobeDb, format: &str) -> Result<()> {
    if format != "json" {
        bail!("Unsupported format '{}'. Only 'json' is supported.", format);
    }

    let items = db.list_items()?;
    let outfits = db.list_outfits()?;
    let stats = db.stats()?;

    let export = serde_json::json!({
        "exported_at": Utc::now().to_rfc3339(),
        "stats": stats,
        "items": items,
        "outfits": outfits,
    });

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}
