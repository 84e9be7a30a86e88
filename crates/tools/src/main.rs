use std::env;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foundation::geo::LngLat;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Court district polygon tooling")]
struct Args {
    /// Map config JSON; `COURTMAP_*` variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the outer ring of a WKT polygon as JSON
    Parse {
        /// WKT text, or `-` to read stdin
        wkt: String,
        #[arg(long)]
        strict: bool,
    },

    /// Print the bounding box and center of a WKT polygon
    Bounds {
        /// WKT text, or `-` to read stdin
        wkt: String,
        #[arg(long)]
        strict: bool,
    },

    /// Turn a court-find response into the colored GeoJSON the map shows
    Features {
        /// Response body file, or `-` for stdin
        results: String,
        #[arg(long)]
        strict: bool,
    },

    /// Print the court-find URL for a marker position
    QueryUrl {
        /// Comma separated judicial ids
        #[arg(long)]
        courts: String,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let config = tools::load_config(args.config.as_deref())?;
    let config = tools::apply_env_overrides(config, |key| env::var(key).ok())?;

    match args.command {
        Command::Parse { wkt, strict } => {
            let ring = tools::parse_ring(&read_arg(&wkt)?, tools::policy_for(strict, &config))?;
            print_json(&ring)
        }
        Command::Bounds { wkt, strict } => {
            let report = tools::bounds_report(&read_arg(&wkt)?, tools::policy_for(strict, &config))?;
            print_json(&report)
        }
        Command::Features { results, strict } => {
            let raw = if results == "-" {
                read_stdin()?
            } else {
                fs::read_to_string(&results).map_err(|e| format!("read {results:?}: {e}"))?
            };
            let report = tools::features_from_results(&raw, tools::policy_for(strict, &config))?;
            info!(
                features = report.collection.len(),
                dropped = report.dropped,
                "feature collection built"
            );
            eprintln!("{} features, {} dropped", report.collection.len(), report.dropped);
            print_json(&report.collection)
        }
        Command::QueryUrl { courts, lng, lat } => {
            println!("{}", tools::find_url(&config, &courts, LngLat::new(lng, lat))?);
            Ok(())
        }
    }
}

fn read_arg(value: &str) -> Result<String, String> {
    if value == "-" {
        read_stdin()
    } else {
        Ok(value.to_string())
    }
}

fn read_stdin() -> Result<String, String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("read stdin: {e}"))?;
    Ok(buf)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let payload = serde_json::to_string_pretty(value).map_err(|e| format!("json: {e}"))?;
    println!("{payload}");
    Ok(())
}
