//! Inspect GeoJSON layers before deploying them.
//!
//! Prints feature counts, a geometry type histogram, the bounding box and any
//! invalid polygons of each file. Load errors are reported instead of degrading to empty layers.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use hashbrown::HashMap;
use rayon::prelude::*;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use vigia::models::{CollectionKind, FeatureCollection};
use vigia::store::read_collection;

#[derive(Parser, Debug)]
#[command(name = "inspect")]
#[command(about = "Summarize GeoJSON hazard layers")]
struct Args {
    /// GeoJSON files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let results: Vec<_> = args
        .files
        .par_iter()
        .map(|path| (path, read_collection(path, CollectionKind::HazardZones)))
        .collect();

    let mut failed = 0;
    for (path, result) in results {
        match result {
            Ok(collection) => print_summary(&path.display().to_string(), &collection),
            Err(e) => {
                error!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} file(s) could not be read", failed);
    }

    Ok(())
}

fn print_summary(name: &str, collection: &FeatureCollection) {
    let mut types: HashMap<&'static str, usize> = HashMap::new();
    let mut invalid = Vec::new();
    for feature in collection.iter() {
        *types.entry(feature.geometry_type()).or_default() += 1;
        if let Some(reason) = feature.defect() {
            invalid.push((feature.position(), reason));
        }
    }

    let mut types: Vec<_> = types.into_iter().collect();
    types.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    println!("{} ({} features)", name, collection.len());
    println!("  Geometry types:");
    for (geometry_type, count) in types {
        println!("    {}: {}", geometry_type, count);
    }

    match collection.bounds() {
        Some(rect) => println!(
            "  Bounds: lon {:.6}..{:.6}, lat {:.6}..{:.6}",
            rect.min().x,
            rect.max().x,
            rect.min().y,
            rect.max().y
        ),
        None => println!("  Bounds: none"),
    }

    if !invalid.is_empty() {
        println!("  Invalid polygons: {}", invalid.len());
        for (position, reason) in invalid {
            println!("    #{}: {}", position, reason);
        }
    }
}
