//! CSV tables consumed by the downstream manifest and mosaicking steps.
//!
//! Every table is written with its header even when it has no rows, so consumers
//! can always rely on the file and its columns being present.
use std::path::Path;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::types::{CoverageResult, SceneRecord, SelectedScene, TimeSeriesRow};

pub const SCENES_CATALOG_CSV: &str = "scenes_catalog.csv";
pub const COVERAGE_CSV: &str = "timestamps_coverage.csv";
pub const SELECTED_CSV: &str = "scenes_selected.csv";
pub const TIME_SERIES_CSV: &str = "time_serie.csv";

pub const SCENES_CATALOG_HEADER: [&str; 7] = [
    "id",
    "datetime",
    "cloud_cover",
    "tile_id",
    "platform",
    "constellation",
    "collection",
];
pub const COVERAGE_HEADER: [&str; 7] = [
    "acq_datetime",
    "coverage_frac",
    "coverage_area",
    "tiles_count",
    "min_cloud",
    "max_cloud",
    "has_full_cover",
];
pub const SELECTED_HEADER: [&str; 8] = [
    "anchor_date",
    "acq_datetime",
    "id",
    "tile_id",
    "datetime",
    "cloud_cover",
    "coverage_frac_union",
    "coverage_area_union",
];
pub const TIME_SERIES_HEADER: [&str; 7] = [
    "anchor_date",
    "acq_datetime",
    "tile_ids",
    "tiles_count",
    "cloud_score",
    "coverage_frac",
    "coverage_area",
];

/// RFC 3339 in UTC with a `Z` suffix, seconds precision unless sub-second
/// digits are present.
pub fn format_instant<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[derive(Serialize)]
struct CatalogRow<'a> {
    id: &'a str,
    datetime: String,
    cloud_cover: f64,
    tile_id: &'a str,
    platform: Option<&'a str>,
    constellation: Option<&'a str>,
    collection: Option<&'a str>,
}

#[derive(Serialize)]
struct CoverageRow {
    acq_datetime: String,
    coverage_frac: f64,
    coverage_area: f64,
    tiles_count: usize,
    min_cloud: f64,
    max_cloud: f64,
    has_full_cover: bool,
}

#[derive(Serialize)]
struct SelectedRow<'a> {
    anchor_date: String,
    acq_datetime: String,
    id: &'a str,
    tile_id: &'a str,
    datetime: String,
    cloud_cover: f64,
    coverage_frac_union: f64,
    coverage_area_union: f64,
}

#[derive(Serialize)]
struct TimeSeriesCsvRow<'a> {
    anchor_date: String,
    acq_datetime: String,
    tile_ids: &'a str,
    tiles_count: usize,
    cloud_score: f64,
    coverage_frac: f64,
    coverage_area: f64,
}

fn write_table<R, I>(path: &Path, header: &[&str], rows: I) -> Result<usize>
where
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;
    info!("Wrote {} row(s) => {:?}", count, path);
    Ok(count)
}

/// Raw ingested catalog, sorted by datetime then cloud cover.
pub fn write_scene_catalog(path: &Path, scenes: &[SceneRecord]) -> Result<usize> {
    let mut sorted: Vec<&SceneRecord> = scenes.iter().collect();
    sorted.sort_by(|a, b| {
        a.instant()
            .cmp(&b.instant())
            .then_with(|| a.cloud_cover.total_cmp(&b.cloud_cover))
            .then_with(|| a.id.cmp(&b.id))
    });
    write_table(
        path,
        &SCENES_CATALOG_HEADER,
        sorted.into_iter().map(|s| CatalogRow {
            id: &s.id,
            datetime: format_instant(&s.datetime),
            cloud_cover: s.cloud_cover,
            tile_id: &s.tile_id,
            platform: s.platform.as_deref(),
            constellation: s.constellation.as_deref(),
            collection: s.collection.as_deref(),
        }),
    )
}

pub fn write_coverage(path: &Path, rows: &[CoverageResult]) -> Result<usize> {
    write_table(
        path,
        &COVERAGE_HEADER,
        rows.iter().map(|r| CoverageRow {
            acq_datetime: format_instant(&r.instant),
            coverage_frac: r.coverage_frac,
            coverage_area: r.coverage_area,
            tiles_count: r.tiles_count,
            min_cloud: r.min_cloud,
            max_cloud: r.max_cloud,
            has_full_cover: r.has_full_cover,
        }),
    )
}

pub fn write_selected_scenes(path: &Path, rows: &[SelectedScene]) -> Result<usize> {
    write_table(
        path,
        &SELECTED_HEADER,
        rows.iter().map(|r| SelectedRow {
            anchor_date: r.anchor_date.to_string(),
            acq_datetime: format_instant(&r.acq_datetime),
            id: &r.id,
            tile_id: &r.tile_id,
            datetime: format_instant(&r.datetime),
            cloud_cover: r.cloud_cover,
            coverage_frac_union: r.coverage_frac_union,
            coverage_area_union: r.coverage_area_union,
        }),
    )
}

pub fn write_time_series(path: &Path, rows: &[TimeSeriesRow]) -> Result<usize> {
    write_table(
        path,
        &TIME_SERIES_HEADER,
        rows.iter().map(|r| TimeSeriesCsvRow {
            anchor_date: r.anchor_date.to_string(),
            acq_datetime: format_instant(&r.acq_datetime),
            tile_ids: &r.tile_ids,
            tiles_count: r.tiles_count,
            cloud_score: r.cloud_score,
            coverage_frac: r.coverage_frac,
            coverage_area: r.coverage_area,
        }),
    )
}
