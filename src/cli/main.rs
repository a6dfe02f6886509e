//! Command-line lookups against the bundled region data.
//!
//! Every subcommand prints JSON to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geotool_cn::coords;
use geotool_cn::{AdminTreeBuilder, GeoTool, GeoToolConfig, SearchOptions};

#[derive(Parser, Debug)]
#[command(name = "geotool")]
#[command(about = "Offline Chinese administrative region lookups")]
struct Args {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a WGS-84 coordinate to province/city/district
    Reverse {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
    },
    /// Search regions by name or GB code
    Search {
        query: String,
        #[arg(long)]
        level: Option<String>,
        #[arg(long)]
        province: Option<String>,
        #[arg(long)]
        city: Option<String>,
        /// Only exact name matches
        #[arg(long)]
        exact: bool,
    },
    /// Look up one region by GB code
    Region { code: String },
    /// List all regions of a level
    List { level: String },
    /// Resolve a 6-digit adcode
    Adcode { adcode: String },
    /// Print the province → city → district tree
    Tree,
    /// Convert a coordinate between datums
    Convert {
        #[arg(value_enum)]
        from: Datum,
        #[arg(value_enum)]
        to: Datum,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Datum {
    Wgs84,
    Gcj02,
    Bd09,
}

fn convert(from: Datum, to: Datum, lng: f64, lat: f64) -> (f64, f64) {
    let (lng, lat) = match from {
        Datum::Wgs84 => (lng, lat),
        Datum::Gcj02 => coords::gcj02_to_wgs84(lng, lat),
        Datum::Bd09 => coords::bd09_to_wgs84(lng, lat),
    };
    match to {
        Datum::Wgs84 => (lng, lat),
        Datum::Gcj02 => coords::wgs84_to_gcj02(lng, lat),
        Datum::Bd09 => coords::wgs84_to_bd09(lng, lat),
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GeoToolConfig::load_from_file(path)?,
        None => GeoToolConfig::from_env()?,
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    let pretty = args.pretty;

    // Tree and datum conversion don't need the boundary layers
    match args.command {
        Command::Tree => {
            let tree = AdminTreeBuilder::new(config.admin_path()).get()?;
            return print_json(tree.as_ref(), pretty);
        }
        Command::Convert { from, to, lng, lat } => {
            let (lng, lat) = convert(from, to, lng, lat);
            return print_json(&[lng, lat], pretty);
        }
        _ => {}
    }

    let geo = GeoTool::new(&config).context("Failed to load boundary data")?;

    match args.command {
        Command::Reverse { lat, lng } => print_json(&geo.reverse(lat, lng), pretty),
        Command::Search {
            query,
            level,
            province,
            city,
            exact,
        } => {
            let options = SearchOptions {
                level,
                province,
                city,
                fuzzy: !exact,
            };
            print_json(&geo.search(&query, &options)?, pretty)
        }
        Command::Region { code } => print_json(&geo.get_region(&code), pretty),
        Command::List { level } => print_json(&geo.list_regions(&level)?, pretty),
        Command::Adcode { adcode } => print_json(&geo.lookup_adcode(&adcode), pretty),
        Command::Tree | Command::Convert { .. } => Ok(()),
    }
}
