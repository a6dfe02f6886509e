//! Query server for offline region lookups.
//!
//! Provides an HTTP API for reverse geocoding, forward search, adcode
//! lookup and the administrative cascader tree.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geotool_cn::{AdminTreeBuilder, GeoTool, GeoToolConfig, GeoToolError, Region, ReverseResult};

mod params;
use params::{ContainsParams, RegionsParams, ReverseParams, SearchQueryParams};

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Offline region lookup server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    geo: GeoTool,
    admin_tree: AdminTreeBuilder,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

fn api_error(e: GeoToolError) -> (StatusCode, String) {
    match e {
        GeoToolError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        _ => {
            tracing::error!("Request failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("GeoToolCN Query Server");

    let mut config = match &args.config {
        Some(path) => GeoToolConfig::load_from_file(path)?,
        None => GeoToolConfig::from_env()?,
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    let geo = GeoTool::new(&config).context("Failed to load boundary data")?;
    let admin_tree = AdminTreeBuilder::new(config.admin_path());
    match admin_tree.get() {
        Ok(tree) => info!("Admin tree ready with {} provinces", tree.len()),
        Err(e) => warn!("Admin tree unavailable, retrying on request: {}", e),
    }

    let state = Arc::new(AppState { geo, admin_tree });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/reverse", get(reverse_handler))
        .route("/v1/reverse/batch", post(reverse_batch_handler))
        .route("/v1/search", get(search_handler))
        .route("/v1/regions", get(regions_handler))
        .route("/v1/regions/{code}", get(region_handler))
        .route("/v1/adcode/{adcode}", get(adcode_handler))
        .route("/v1/contains", get(contains_handler))
        .route("/v1/admin-tree", get(admin_tree_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    regions: usize,
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        regions: state.geo.catalog().len(),
    })
}

/// Reverse geocoding
async fn reverse_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReverseParams>,
) -> Json<ReverseResult> {
    Json(state.geo.reverse(params.lat, params.lng))
}

/// Batch reverse geocoding; body is `[[lat, lng], ...]`
async fn reverse_batch_handler(
    State(state): State<Arc<AppState>>,
    Json(coords): Json<Vec<[f64; 2]>>,
) -> Json<Vec<ReverseResult>> {
    let coords: Vec<(f64, f64)> = coords.into_iter().map(|[lat, lng]| (lat, lng)).collect();
    Json(state.geo.reverse_batch(&coords))
}

/// Forward search by name or GB code
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> ApiResult<Vec<Region>> {
    let (text, options) = params.into_search();
    state.geo.search(&text, &options).map(Json).map_err(api_error)
}

async fn regions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RegionsParams>,
) -> ApiResult<Vec<Region>> {
    state.geo.list_regions(&params.level).map(Json).map_err(api_error)
}

async fn region_handler(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> ApiResult<Region> {
    state
        .geo
        .get_region(&code)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("unknown region code {}", code)))
}

async fn adcode_handler(
    State(state): State<Arc<AppState>>,
    Path(adcode): Path<String>,
) -> ApiResult<ReverseResult> {
    state
        .geo
        .lookup_adcode(&adcode)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("unknown adcode {}", adcode)))
}

#[derive(Serialize)]
struct ContainsResponse {
    contains: bool,
}

async fn contains_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ContainsParams>,
) -> ApiResult<ContainsResponse> {
    state
        .geo
        .is_in_region(params.lat, params.lng, &params.adcode)
        .map(|contains| Json(ContainsResponse { contains }))
        .map_err(api_error)
}

/// Cascader tree, built at startup; a failed build is retried off the async workers
async fn admin_tree_handler(State(state): State<Arc<AppState>>) -> Result<Response, (StatusCode, String)> {
    let tree = tokio::task::spawn_blocking(move || state.admin_tree.get())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(api_error)?;
    Ok(Json(tree.as_slice()).into_response())
}
