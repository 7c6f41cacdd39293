// ============================================================================
// comp-db — CLI database tool for Comp Builder
// ============================================================================
// Usage:
//   comp-db stats                           Show database statistics
//   comp-db list                            List compositions, newest first
//   comp-db show <ID>                       Print one composition as JSON
//   comp-db export --format json            Export full database as JSON
//   comp-db import-catalog [--file F|--url U]  Rebuild the item catalog
//   comp-db display-name <IDENTIFIER>       Resolve an item identifier
//   comp-db delete <ID> [--password P]      Delete a composition
// ============================================================================

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use comp_core::catalog::import;
use comp_core::{item_id, CompDb, CompService, CompositionView, ServerConfig};

/// Comp Builder database tool
#[derive(Parser)]
#[command(name = "comp-db", version, about = "Inspect and manage the Comp Builder database")]
struct Cli {
    /// Path to the database file (default: ~/.comp-builder/comps.redb)
    #[arg(long, global = true)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show database statistics (compositions, locks, catalog size)
    Stats,

    /// List compositions, newest first
    List,

    /// Print one composition (admin password redacted)
    Show {
        id: String,
    },

    /// Export full database contents as JSON
    Export {
        /// Output format (currently only json is supported)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Replace the item catalog from the game-data item dump
    ImportCatalog {
        /// Read the dump from a local file
        #[arg(long, conflicts_with = "url")]
        file: Option<String>,

        /// Fetch the dump from this URL (default: COMP_CATALOG_URL or the public dump)
        #[arg(long)]
        url: Option<String>,
    },

    /// Show the catalog name an item identifier resolves to
    DisplayName {
        identifier: String,
    },

    /// Delete a composition; the admin password is required when one is set
    Delete {
        id: String,

        #[arg(long)]
        password: Option<String>,
    },
}

fn format_timestamp(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("(invalid: {})", ts))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let db = CompDb::open(cli.db_path.as_deref())?;

    match cli.command {
        Commands::Stats => cmd_stats(&db),
        Commands::List => cmd_list(db),
        Commands::Show { id } => cmd_show(&db, &id),
        Commands::Export { format } => cmd_export(&db, &format),
        Commands::ImportCatalog { file, url } => cmd_import_catalog(db, file, url),
        Commands::DisplayName { identifier } => cmd_display_name(db, &identifier),
        Commands::Delete { id, password } => cmd_delete(db, &id, password.as_deref()),
    }
}

fn cmd_stats(db: &CompDb) -> Result<()> {
    let stats = db.stats()?;

    println!("=== Comp Builder Database Stats ===");
    println!("Database: {}", db.path().display());
    println!();
    println!("Compositions: {} total", stats.total_compositions);
    println!("  {:14} {}", "edit-locked", stats.edit_locked);
    println!("  {:14} {}", "view-locked", stats.view_locked);
    println!("Player slots: {}", stats.total_slots);
    println!("Catalog:      {} items", stats.total_items);
    for (category, count) in &stats.items_by_category {
        println!("  {:14} {}", category, count);
    }

    Ok(())
}

fn cmd_list(db: CompDb) -> Result<()> {
    let service = CompService::new(db)?;
    let summaries = service.list()?;

    if summaries.is_empty() {
        println!("No compositions found.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<22}  {:<6}  {:<8}  {}",
        "ID", "CREATED AT", "SLOTS", "ACCESS", "TITLE"
    );
    println!("{}", "-".repeat(100));

    for summary in &summaries {
        let access = if summary.is_view_locked {
            "locked"
        } else if summary.is_public {
            "public"
        } else {
            "private"
        };
        let title = summary.title.chars().take(30).collect::<String>();
        println!(
            "{:<36}  {:<22}  {:<6}  {:<8}  {}",
            summary.id,
            format_timestamp(summary.created_at),
            summary.slots,
            access,
            title
        );
    }

    println!("\nTotal: {} compositions", summaries.len());
    Ok(())
}

fn cmd_show(db: &CompDb, id: &str) -> Result<()> {
    let comp = db
        .get_composition(id)?
        .ok_or_else(|| anyhow::anyhow!("Composition not found: {}", id))?;
    let view = CompositionView::from(&comp);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn cmd_export(db: &CompDb, format: &str) -> Result<()> {
    if format != "json" {
        anyhow::bail!("Unsupported format '{}'. Only 'json' is supported.", format);
    }

    let compositions: Vec<CompositionView> = db
        .list_compositions()?
        .iter()
        .map(CompositionView::from)
        .collect();
    let items = db.list_items()?;
    let stats = db.stats()?;

    let export = serde_json::json!({
        "exported_at": Utc::now().to_rfc3339(),
        "stats": stats,
        "compositions": compositions,
        "items": items,
    });

    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

fn cmd_import_catalog(db: CompDb, file: Option<String>, url: Option<String>) -> Result<()> {
    let raw = match file {
        Some(path) => {
            println!("Reading item dump from {}", path);
            import::load_dump_file(&path)?
        }
        None => {
            let url = url.unwrap_or_else(|| ServerConfig::default().catalog_url);
            println!("Fetching item dump from {}", url);
            import::fetch_dump(&url)?
        }
    };

    let mut service = CompService::new(db)?;
    let written = service.import_catalog(&raw)?;

    println!("Imported {} catalog items from {} dump entries", written, raw.len());
    for category in comp_core::ItemCategory::ALL {
        let count = service.catalog().category(category).len();
        if count > 0 {
            println!("  {:14} {}", category.as_str(), count);
        }
    }
    Ok(())
}

fn cmd_display_name(db: CompDb, identifier: &str) -> Result<()> {
    let service = CompService::new(db)?;
    let decoded = item_id::decode(identifier);

    println!("Name:    {}", service.catalog().display_name(identifier));
    println!("Tier:    {}", decoded.tier);
    println!("Enchant: {}", decoded.enchant);
    println!(
        "Base:    {}",
        if decoded.base_suffix.is_empty() {
            "-"
        } else {
            decoded.base_suffix.as_str()
        }
    );
    Ok(())
}

fn cmd_delete(db: CompDb, id: &str, password: Option<&str>) -> Result<()> {
    let service = CompService::new(db)?;
    service.delete(id, password)?;
    println!("Deleted composition {}", id);
    Ok(())
}
