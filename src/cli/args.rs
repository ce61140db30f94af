use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "s2series",
    version,
    about = "Select a regular Sentinel-2 time series over an AOI"
)]
pub struct CliArgs {
    /// AOI GeoJSON file (Polygon, MultiPolygon, Feature or FeatureCollection)
    #[arg(short, long)]
    pub aoi: Option<PathBuf>,

    /// Saved STAC item pages (FeatureCollection or JSON array); repeatable
    #[arg(short, long = "catalog", num_args = 1..)]
    pub catalog: Vec<PathBuf>,

    /// Directory receiving the CSV tables and run_summary.json
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// JSON parameter preset; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep scenes with cloud cover strictly below this percentage
    #[arg(long)]
    pub cloud_cover_max: Option<f64>,

    /// Maximum number of scenes ingested from the catalog
    #[arg(long)]
    pub max_items: Option<usize>,

    /// Coverage fraction counted as full cover (0, 1]
    #[arg(long)]
    pub full_cover_threshold: Option<f64>,

    /// Only consider single tiles, never unions
    #[arg(long, default_value_t = false)]
    pub no_union: bool,

    /// Maximum number of tiles in a union (capped at 6)
    #[arg(long)]
    pub max_union_tiles: Option<usize>,

    /// Number of anchor dates over the period
    #[arg(long)]
    pub n_anchors: Option<usize>,

    /// Width of the search window around each anchor, in days
    #[arg(long)]
    pub window_days: Option<u32>,

    /// First day of the period (YYYY-MM-DD); defaults to one year before the end
    #[arg(long)]
    pub date_start: Option<NaiveDate>,

    /// Last day of the period (YYYY-MM-DD); defaults to today (UTC)
    #[arg(long)]
    pub date_end: Option<NaiveDate>,

    /// Per-anchor search budget in milliseconds
    #[arg(long)]
    pub anchor_timeout_ms: Option<u64>,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
