mod cache;
mod catalog;
mod clock;
mod config;
mod error;
mod footprint;
mod propagation;
mod resolver;
mod service;
mod visibility;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config::Config;
use crate::propagation::Observer;
use crate::service::TrackingService;

#[derive(Parser)]
#[command(name = "orbitwatch")]
#[command(about = "Orbital object catalog, positions, passes and footprints")]
struct Cli {
    /// YAML config file; defaults apply when omitted
    #[arg(long)]
    config: Option<String>,
    /// Freeze "now" at this RFC 3339 instant
    #[arg(long)]
    at: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and summarize the merged catalog
    Catalog {
        /// Print every object instead of the summary
        #[arg(long)]
        full: bool,
    },
    /// Resolve the current position of an object
    Position {
        id: String,
        /// Observer as "lat,lon"
        #[arg(long, allow_hyphen_values = true, default_value = "0,0")]
        observer: String,
    },
    /// Predict visible passes over an observer
    Passes {
        id: String,
        /// Observer as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        observer: String,
        /// Observer altitude in meters
        #[arg(long)]
        altitude: Option<f64>,
    },
    /// Ground visibility footprint of an object, or around a fixed point
    Footprint {
        #[arg(required_unless_present = "point")]
        id: Option<String>,
        /// Static mode center as "lat,lon"
        #[arg(long, allow_hyphen_values = true, conflicts_with = "id")]
        point: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSummary {
    fetched_at: Option<DateTime<Utc>>,
    total: usize,
    regimes: std::collections::BTreeMap<catalog::OrbitRegime, usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    }
    .with_env();

    let clock: Arc<dyn Clock> = match &cli.at {
        Some(at) => match DateTime::parse_from_rfc3339(at) {
            Ok(t) => Arc::new(FixedClock::new(t.with_timezone(&Utc))),
            Err(e) => {
                eprintln!("Invalid --at time {}: {}", at, e);
                return ExitCode::FAILURE;
            }
        },
        None => Arc::new(SystemClock),
    };

    let service = match TrackingService::from_config(config, clock) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Startup error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Catalog { full } => catalog(&service, full).await,
        Commands::Position { id, observer } => position(&service, &id, &observer).await,
        Commands::Passes {
            id,
            observer,
            altitude,
        } => passes(&service, &id, &observer, altitude).await,
        Commands::Footprint { id, point } => footprint(&service, id.as_deref(), point.as_deref()).await,
    }
}

async fn catalog(service: &TrackingService, full: bool) -> ExitCode {
    let catalog = service.catalog().await;
    if full {
        return print_json(&catalog.objects());
    }
    print_json(&CatalogSummary {
        fetched_at: catalog.fetched_at(),
        total: catalog.len(),
        regimes: catalog.regime_counts(),
    })
}

async fn position(service: &TrackingService, id: &str, observer: &str) -> ExitCode {
    let Some(observer) = parse_observer(observer, None) else {
        return ExitCode::FAILURE;
    };
    match service
        .position(id, observer.latitude_deg, observer.longitude_deg)
        .await
    {
        Ok(record) => print_json(&record),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn passes(service: &TrackingService, id: &str, observer: &str, altitude: Option<f64>) -> ExitCode {
    let Some(observer) = parse_observer(observer, altitude) else {
        return ExitCode::FAILURE;
    };
    match service.passes(id, &observer).await {
        Ok(passes) => print_json(&*passes),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn footprint(service: &TrackingService, id: Option<&str>, point: Option<&str>) -> ExitCode {
    let result = match (id, point) {
        (Some(id), _) => match service.footprint(id, None).await {
            Ok(footprint) => footprint,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        (None, Some(point)) => {
            let Some(center) = parse_observer(point, None) else {
                return ExitCode::FAILURE;
            };
            service.static_footprint(center.latitude_deg, center.longitude_deg)
        }
        (None, None) => None,
    };
    // null is a valid answer: the object could not be propagated
    print_json(&result.as_deref())
}

fn parse_observer(coordinates: &str, altitude_m: Option<f64>) -> Option<Observer> {
    let observer = Observer::from_coordinates(coordinates, altitude_m);
    if observer.is_none() {
        eprintln!("Invalid coordinates {:?}, expected \"lat,lon\"", coordinates);
    }
    observer
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}
