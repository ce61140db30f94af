//! High-level, ergonomic library API: run a selection in memory, run it from
//! files to an output directory, or rank the candidates of a single anchor.
//! Prefer these entrypoints over the low-level `core::selection` modules when
//! integrating s2series.
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geo::MultiPolygon;
use tracing::info;

use crate::core::geometry::AreaOfInterest;
use crate::core::params::SelectionParams;
use crate::core::selection::{
    CoverageAnalyzer, SceneSelector, SelectionOutput, TileUnionSelector,
};
use crate::error::{Error, Result};
use crate::io::writers::{OutputPaths, write_all};
use crate::io::{SceneCatalog, StacItemFiles, load_aoi_geometry};
use crate::types::{Anchor, SceneRecord, UnionCandidate};

/// Outcome of a file-to-directory run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub paths: OutputPaths,
    pub scenes: usize,
    pub timestamps: usize,
    pub full_cover_timestamps: usize,
    pub anchors_requested: usize,
    pub anchors_selected: usize,
    pub output: SelectionOutput,
}

/// Build an AOI from a lon/lat geometry
pub fn aoi_from_geodetic(geometry: MultiPolygon<f64>) -> Result<AreaOfInterest> {
    Ok(AreaOfInterest::from_geodetic(geometry)?)
}

/// Select a regular time series from scenes already in memory (no disk I/O)
pub fn select_time_series(
    aoi: &AreaOfInterest,
    scenes: &[SceneRecord],
    params: &SelectionParams,
) -> Result<SelectionOutput> {
    SceneSelector::new(aoi.clone(), params)?.run(scenes)
}

/// Rank the per-instant union candidates for one anchor date, best first.
/// Exhausting `anchor_timeout_ms` is reported as [`Error::AnchorTimedOut`].
pub fn rank_candidates_for_anchor(
    aoi: &AreaOfInterest,
    scenes: &[SceneRecord],
    params: &SelectionParams,
    anchor_date: NaiveDate,
    top_k: usize,
) -> Result<Vec<UnionCandidate>> {
    params.validate()?;
    let table = CoverageAnalyzer::new(aoi, params).analyze(scenes);
    let anchor = Anchor {
        index: 0,
        target_date: anchor_date,
        window_days: params.window_days,
    };
    TileUnionSelector::new(&table, params)
        .rank_candidates(&anchor, top_k)
        .ok_or(Error::AnchorTimedOut { anchor_date })
}

/// Query `catalog`, select, and write every table into `output_dir`
pub fn run_catalog_to_dir<C: SceneCatalog + ?Sized>(
    aoi: &AreaOfInterest,
    catalog: &C,
    output_dir: &Path,
    params: &SelectionParams,
) -> Result<RunReport> {
    let selector = SceneSelector::new(aoi.clone(), params)?;
    let params = selector.params();

    let scenes = catalog.search(&params.catalog_query())?;
    info!("Raw scenes found: {}", scenes.len());

    let output = selector.run(&scenes)?;
    let paths = write_all(output_dir, params, &scenes, &output)?;

    Ok(RunReport {
        paths,
        scenes: scenes.len(),
        timestamps: output.coverage.len(),
        full_cover_timestamps: output.full_cover_count(),
        anchors_requested: output.anchors.len(),
        anchors_selected: output.time_series.len(),
        output,
    })
}

/// Load the AOI GeoJSON and saved STAC item pages, select, and write tables
pub fn run_files_to_dir(
    aoi_path: &Path,
    catalog_pages: &[PathBuf],
    output_dir: &Path,
    params: &SelectionParams,
) -> Result<RunReport> {
    params.validate()?;
    let aoi = aoi_from_geodetic(load_aoi_geometry(aoi_path)?)?;
    info!("AOI {:?}: {:.3} km²", aoi_path, aoi.area() / 1.0e6);
    run_catalog_to_dir(&aoi, &StacItemFiles::new(catalog_pages), output_dir, params)
}
