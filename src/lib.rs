#![doc = r#"
s2series: regular Sentinel-2 time series from irregular scene catalogs.

This crate turns a catalog of overlapping, partially-covering acquisitions into one
best tile combination per regularly spaced anchor date. It computes per-instant AOI
coverage from tile footprints, schedules anchors over a period, searches bounded
same-instant tile unions, and selects a winner per anchor by cloud score, coverage,
temporal distance and union size. It powers the s2series CLI and can be embedded in
your own Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve as the
crate stabilizes. Breaking changes can occur.

Add dependency
--------------
```toml
[dependencies]
s2series = "0.1"
```

Quick start: files to tables
----------------------------
```rust,no_run
use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use s2series::{run_files_to_dir, SelectionParams};

fn main() -> s2series::Result<()> {
    let params = SelectionParams {
        n_anchors: 24,
        window_days: 21,
        full_cover_threshold: 0.999,
        max_union_tiles: 2,
        date_start: NaiveDate::from_ymd_opt(2021, 1, 1),
        date_end: NaiveDate::from_ymd_opt(2021, 12, 31),
        ..Default::default()
    };

    let report = run_files_to_dir(
        Path::new("aoi/EL522_Thessaloniki.geojson"),
        &[PathBuf::from("catalog/items_page1.json")],
        Path::new("outputs/tables"),
        &params,
    )?;

    println!(
        "anchors requested={} selected={}",
        report.anchors_requested, report.anchors_selected
    );
    Ok(())
}
```

In-memory selection
-------------------
```rust,no_run
use s2series::{aoi_from_geodetic, select_time_series, SceneRecord, SelectionParams};
use geo::{coord, MultiPolygon, Rect};

fn run(scenes: &[SceneRecord]) -> s2series::Result<()> {
    let aoi = aoi_from_geodetic(MultiPolygon::new(vec![
        Rect::new(coord! { x: 22.8, y: 40.5 }, coord! { x: 23.1, y: 40.7 }).to_polygon(),
    ]))?;
    let output = select_time_series(&aoi, scenes, &SelectionParams::default())?;
    for row in &output.time_series {
        println!("{} -> {} ({} tiles)", row.anchor_date, row.tile_ids, row.tiles_count);
    }
    Ok(())
}
```

Error handling
--------------
All public functions return `s2series::Result<T>`. Invalid parameters fail with
`Error::InvalidConfiguration` before any processing; conditions that only limit the
result (empty catalog, anchors without candidates, unusable footprints) are reported
as [`Diagnostic`] values in the output and in `run_summary.json`.

Useful modules
--------------
- [`api`]: high-level, ergonomic entry points.
- [`core`]: parameters, geometry and the selection engine.
- [`io`]: catalog/AOI readers and table writers.
- [`types`]: records shared across the crate.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use core::geometry::{AreaOfInterest, GeometryError};
pub use core::params::SelectionParams;
pub use error::{Error, Result};
pub use types::{
    Anchor, CoverageResult, Diagnostic, SceneRecord, SelectedScene, TileRef, TimeSeriesRow,
    UnionCandidate,
};

// Engine
pub use core::selection::{
    AnchorOutcome, CoverageAnalyzer, CoverageTable, MAX_UNION_TILES_CEILING, SceneSelector,
    SelectionOutput, TileUnionSelector, compare_candidates, schedule_anchors,
};

// Readers and writers
pub use io::writers::{OutputPaths, RunSummary, write_all};
pub use io::{CatalogError, CatalogQuery, InMemoryCatalog, SceneCatalog, StacItemFiles};

// High-level API re-exports
pub use api::{
    RunReport, aoi_from_geodetic, rank_candidates_for_anchor, run_catalog_to_dir,
    run_files_to_dir, select_time_series,
};
