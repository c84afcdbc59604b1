//! Cluster transition simulator
//!
//! Reads geographic points from a CSV file, clusters them for two zoom levels of
//! the same viewport and writes the transitions between the two cluster sets.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use csv::{ReaderBuilder, WriterBuilder};
use log::{debug, info};

use rust_mapcluster::cluster::engine::DEFAULT_PIXEL_DISTANCE;
use rust_mapcluster::{
    CancelToken, ClusterConfig, ClusteringEngine, InputPoint, LatLng, LatLngBounds,
    MercatorProjection, Projection, TransitionPlan, diff,
};


#[derive(Parser)]
#[command(name = "rust_mapcluster")]
#[command(about = "Map point clustering transition simulator", long_about = None)]
struct Args {
    /// Input CSV file with latitude,longitude columns
    #[arg(short, long, default_value = "points.csv")]
    input: PathBuf,

    /// Output CSV file with transitions (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Zoom level the map starts at
    #[arg(long, default_value_t = 10.0)]
    from_zoom: f64,

    /// Zoom level the map ends at
    #[arg(long, default_value_t = 12.0)]
    to_zoom: f64,

    /// Viewport center as "lat,lng" (default: center of the points)
    #[arg(short, long, value_parser = parse_lat_lng)]
    center: Option<LatLng>,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1080.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 1920.0)]
    height: f64,

    /// Pixel distance under which points join a cluster
    #[arg(short, long, default_value_t = DEFAULT_PIXEL_DISTANCE)]
    radius: f64,

    /// Only cluster points within the viewport grown by this factor
    #[arg(long)]
    viewport_filter: Option<f64>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let points = read_points(&args.input)
        .with_context(|| format!("reading points from {:?}", args.input))?;
    if points.is_empty() {
        bail!("no points found in {:?}", args.input);
    }
    debug!("read {} points from {:?}", points.len(), args.input);

    let center = match args.center {
        Some(center) => center,
        None => LatLngBounds::covering(points.iter().map(|p| p.position))
            .map(|b| b.center())
            .unwrap_or_default(),
    };
    let from = MercatorProjection::new(center, args.from_zoom, args.width, args.height)?;
    let to = from.with_zoom(args.to_zoom)?;
    let engine = ClusteringEngine::new(ClusterConfig::new(args.radius, args.viewport_filter)?);

    let plan = simulate(&engine, &points, from, to)?;
    info!(
        "zoom {} -> {}: {} clusters -> {} clusters, {} destroyed",
        args.from_zoom,
        args.to_zoom,
        plan.previous().map_or(0, |p| p.len()),
        plan.current().len(),
        plan.destroyed().len()
    );

    match args.output {
        None => write_transitions(io::stdout().lock(), &plan)?,
        Some(output_file) => {
            let file = File::create(&output_file)
                .with_context(|| format!("creating {:?}", output_file))?;
            write_transitions(file, &plan)?;
            debug!("transitions written to {:?}", output_file);
        }
    }
    Ok(())
}

fn parse_lat_lng(s: &str) -> Result<LatLng, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got {:?}", s))?;
    let lat = lat.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let lng = lng.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(LatLng::new(lat, lng))
}

/// Reads points from a CSV file
///
/// Expected format: `latitude,longitude` (header row is optional, further
/// columns are ignored). Rows that do not parse are skipped. Point ids are the
/// data row indices.
fn read_points(filename: &Path) -> anyhow::Result<Vec<InputPoint>> {
    let file = File::open(filename)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut points = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() < 2 {
            continue;
        }
        let lat = record[0].trim().parse::<f64>();
        let lng = record[1].trim().parse::<f64>();
        match (lat, lng) {
            (Ok(lat), Ok(lng)) if lat.is_finite() && lng.is_finite() => {
                points.push(InputPoint::new(row as u64, LatLng::new(lat, lng)))
            }
            // Header
            _ if row == 0 => continue,
            _ => debug!("skipping unparsable row {}", row),
        }
    }
    Ok(points)
}

/// Clusters `points` for both projections and diffs the results
fn simulate(
    engine: &ClusteringEngine,
    points: &[InputPoint],
    from: MercatorProjection,
    to: MercatorProjection,
) -> anyhow::Result<TransitionPlan> {
    let cancel = CancelToken::new();
    let (previous, current) = rayon::join(
        || engine.cluster(points, &from, &cancel),
        || engine.cluster(points, &to, &cancel),
    );
    let previous = previous.context("clustering cancelled")?;
    let current = current.context("clustering cancelled")?;

    let projection: Arc<dyn Projection> = Arc::new(to);
    diff(Some(Arc::new(previous)), Arc::new(current), projection, &cancel)
        .context("transition building cancelled")
}

/// Writes one row per (transition, source) pair, then one per destroyed cluster
///
/// Format: `kind,size,source_lat,source_lng,dest_lat,dest_lng`. Created rows
/// have no source; destroyed rows have no destination.
fn write_transitions<W: Write>(writer: W, plan: &TransitionPlan) -> csv::Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record([
        "kind",
        "size",
        "source_lat",
        "source_lng",
        "dest_lat",
        "dest_lng",
    ])?;

    for transition in plan.transitions() {
        let size = plan.current().clusters()[transition.destination].size().to_string();
        let dest = transition.destination_position;
        let sources: Vec<Option<LatLng>> = if transition.source_positions.is_empty() {
            vec![None]
        } else {
            transition.source_positions.iter().copied().map(Some).collect()
        };
        for source in sources {
            writer.write_record([
                transition.kind.as_str().to_string(),
                size.clone(),
                source.map(|s| s.lat.to_string()).unwrap_or_default(),
                source.map(|s| s.lng.to_string()).unwrap_or_default(),
                dest.lat.to_string(),
                dest.lng.to_string(),
            ])?;
        }
    }

    if let Some(previous) = plan.previous() {
        for &index in plan.destroyed() {
            let cluster = &previous.clusters()[index];
            let at = cluster.map_position();
            writer.write_record([
                "destroyed".to_string(),
                cluster.size().to_string(),
                at.lat.to_string(),
                at.lng.to_string(),
                String::new(),
                String::new(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}
