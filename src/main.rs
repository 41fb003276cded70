use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use matterhub::{
    apply_admin_filter, filter_matters_by_area, filter_matters_by_status, unique_practice_areas,
    CacheConfig, CacheStore, FeedConfig, MatterFeeds, StatusFilter, SystemClock,
};

#[derive(Parser)]
#[command(
    name = "matterhub",
    about = "Fetch, merge and cache matter data from the firm's backends",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all three matter feeds, merge them, and print the result.
    Sync {
        /// Fee earner's full name, used for role attribution and the
        /// per-user feeds.
        #[arg(long)]
        user: String,
        /// Role claimed for admin visibility (e.g. "admin", "fee-earner").
        #[arg(long, default_value = "fee-earner")]
        role: String,
        /// Include everyone's matters, not just the user's (admins only).
        #[arg(long)]
        everyone: bool,
        /// Keep only matters with this status: active, closed or all.
        #[arg(long, default_value = "all")]
        status: String,
        /// Keep only matters in this practice area.
        #[arg(long, default_value = "All")]
        area: String,
        /// Emit the full normalized records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Cache housekeeping.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Remove stale and corrupt cache entries.
    Clean,
    /// Remove every cache entry.
    Clear,
}

fn parse_status(raw: &str) -> anyhow::Result<StatusFilter> {
    match raw.to_lowercase().as_str() {
        "active" => Ok(StatusFilter::Active),
        "closed" => Ok(StatusFilter::Closed),
        "all" => Ok(StatusFilter::All),
        other => anyhow::bail!("unknown status filter '{other}' (expected active, closed or all)"),
    }
}

fn open_cache() -> anyhow::Result<CacheStore> {
    let config = CacheConfig::resolve().context("resolving cache configuration")?;
    let ttl_ms = config.ttl_ms();
    let store = CacheStore::new(config.dir, Arc::new(SystemClock)).with_ttl_ms(ttl_ms);
    store.init().context("initializing cache store")?;
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Sync {
            user,
            role,
            everyone,
            status,
            area,
            json,
        } => {
            let status = parse_status(&status)?;
            let cache = open_cache()?;
            let feeds = MatterFeeds::new(FeedConfig::resolve().context("resolving feed configuration")?)
                .context("building feed client")?;

            let merged = feeds.sync_matters(&cache, &user).await;
            let visible = apply_admin_filter(&merged, everyone, &user, &role);
            let visible = filter_matters_by_status(&visible, status);
            let visible = filter_matters_by_area(&visible, &area);

            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else {
                for matter in &visible {
                    println!(
                        "{:<14} {:<10} {:<12} {:<28} {}",
                        matter.display_number,
                        matter.status.as_str(),
                        matter.role.as_str(),
                        matter.client_name,
                        matter.description
                    );
                }
                println!(
                    "{} of {} matters shown (areas: {})",
                    visible.len(),
                    merged.len(),
                    unique_practice_areas(&merged).join(", ")
                );
            }
        }
        Command::Cache { command } => {
            let cache = open_cache()?;
            match command {
                CacheCommand::Clean => {
                    println!("removed {} stale entries", cache.cleanup_old_cache());
                }
                CacheCommand::Clear => {
                    println!("removed {} entries", cache.clear_all_cache());
                }
            }
        }
    }

    Ok(())
}
