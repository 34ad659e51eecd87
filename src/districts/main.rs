//! District aggregation pipeline.
//!
//! Deduplicates POIs, assigns POIs and parks to districts, prints the
//! statistics report and writes statistics and ratings.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use kvartal::io::{load_districts, read_json, write_json_atomic};
use kvartal::models::{Park, Poi, StatisticsDocument};
use kvartal::pipeline::{run_districts, RunSummary};
use kvartal::report::StatisticsReport;
use kvartal::Config;

#[derive(Parser, Debug)]
#[command(name = "districts")]
#[command(about = "Count POIs per district and rate districts")]
struct Args {
    /// POI JSON file; rewritten in place without duplicates
    #[arg(short, long)]
    objects: PathBuf,

    /// Park outlines JSON file (optional)
    #[arg(short, long)]
    parks: Option<PathBuf>,

    /// District boundaries (GeoJSON FeatureCollection)
    #[arg(short, long)]
    districts: PathBuf,

    /// TOML config file (optional, built-in defaults otherwise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file for per-district category counts
    #[arg(long, default_value = "district_statistics.json")]
    stats_out: PathBuf,

    /// Output file for district ratings
    #[arg(long, default_value = "district_ratings.json")]
    ratings_out: PathBuf,

    /// Also export the per-district table as CSV
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Write a JSON run summary
    #[arg(long)]
    summary_out: Option<PathBuf>,

    /// Do not rewrite the POI file after deduplication
    #[arg(long)]
    keep_objects: bool,
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

    info!("Kvartal district statistics");
    info!("Objects: {}", args.objects.display());
    info!("Districts: {}", args.districts.display());

    let config = Config::load_or_default(args.config.as_ref()).context("Failed to load config")?;

    // Load every input before writing anything
    let pois: Vec<Poi> = read_json(&args.objects)
        .with_context(|| format!("Failed to load objects from {}", args.objects.display()))?;
    info!("Loaded {} objects", pois.len());

    let parks: Vec<Park> = match &args.parks {
        Some(path) => read_json(path)
            .with_context(|| format!("Failed to load parks from {}", path.display()))?,
        None => Vec::new(),
    };
    info!("Loaded {} parks", parks.len());

    let districts = load_districts(&args.districts, &config.districts.name_property)
        .with_context(|| format!("Failed to load districts from {}", args.districts.display()))?;
    if districts.districts.is_empty() {
        anyhow::bail!("No district polygons in {}", args.districts.display());
    }

    let run = run_districts(pois, &parks, districts, &config);

    if !args.keep_objects {
        write_json_atomic(&args.objects, &run.deduplicated.pois)
            .context("Failed to save deduplicated objects")?;
    }

    let report = StatisticsReport::new(&run.assignment);
    println!("{}", report.render());

    write_json_atomic(
        &args.stats_out,
        &StatisticsDocument {
            district_statistics: run.assignment.statistics.clone(),
        },
    )
    .context("Failed to save district statistics")?;

    write_json_atomic(&args.ratings_out, &run.ratings).context("Failed to save ratings")?;

    if let Some(path) = &args.csv_out {
        report.save_csv(path).context("Failed to export CSV")?;
    }

    if let Some(path) = &args.summary_out {
        write_json_atomic(path, &RunSummary::new(&run)).context("Failed to save run summary")?;
    }

    info!("Done");
    Ok(())
}
