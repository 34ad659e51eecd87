//! Nearest-POI enrichment for rental listings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kvartal::io::{read_json, write_json_atomic};
use kvartal::models::{Listing, Park, Poi};
use kvartal::neighbors::{EnrichStats, NearestFinder};
use kvartal::parks::parks_to_pois;
use kvartal::Config;

#[derive(Parser, Debug)]
#[command(name = "nearest")]
#[command(about = "Attach the nearest POIs per category to every listing")]
struct Args {
    /// Listings JSON file
    #[arg(short, long)]
    listings: PathBuf,

    /// POI JSON file
    #[arg(short, long)]
    objects: PathBuf,

    /// Park outlines to search as points at their centroid (optional)
    #[arg(short, long)]
    parks: Option<PathBuf>,

    /// TOML config file (optional, built-in defaults otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file; defaults to rewriting the listings file
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = Config::load_or_default(args.config.as_ref()).context("Failed to load config")?;

    let mut listings: Vec<Listing> = read_json(&args.listings)
        .with_context(|| format!("Failed to load listings from {}", args.listings.display()))?;
    let mut pois: Vec<Poi> = read_json(&args.objects)
        .with_context(|| format!("Failed to load objects from {}", args.objects.display()))?;
    info!("Loaded {} listings and {} objects", listings.len(), pois.len());

    if let Some(path) = &args.parks {
        let parks: Vec<Park> = read_json(path)
            .with_context(|| format!("Failed to load parks from {}", path.display()))?;
        pois.extend(parks_to_pois(&parks, &config.parks).pois);
    }

    let finder = NearestFinder::new(&pois, &config.nearest);

    let pb = ProgressBar::new(listings.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut stats = EnrichStats::default();
    for listing in listings.iter_mut() {
        finder.enrich_one(listing, &mut stats);
        pb.inc(1);
    }
    pb.finish_with_message("done");
    info!(
        "Enriched {} listings, skipped {} without coordinates",
        stats.enriched, stats.skipped
    );

    let out = args.out.as_ref().unwrap_or(&args.listings);
    write_json_atomic(out, &listings)
        .with_context(|| format!("Failed to save listings to {}", out.display()))?;

    Ok(())
}
