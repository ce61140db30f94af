//! Output assembly: the four CSV tables and the JSON run summary.
pub mod summary;
pub mod tables;

use std::path::{Path, PathBuf};

use crate::core::params::SelectionParams;
use crate::core::selection::SelectionOutput;
use crate::error::Result;
use crate::types::SceneRecord;

pub use summary::{RUN_SUMMARY_JSON, RunSummary, Spread, write_run_summary};
pub use tables::{
    COVERAGE_CSV, SCENES_CATALOG_CSV, SELECTED_CSV, TIME_SERIES_CSV, write_coverage,
    write_scene_catalog, write_selected_scenes, write_time_series,
};

/// Paths of everything written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub scenes_catalog: PathBuf,
    pub coverage: PathBuf,
    pub selected: PathBuf,
    pub time_series: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            scenes_catalog: dir.join(SCENES_CATALOG_CSV),
            coverage: dir.join(COVERAGE_CSV),
            selected: dir.join(SELECTED_CSV),
            time_series: dir.join(TIME_SERIES_CSV),
            summary: dir.join(RUN_SUMMARY_JSON),
        }
    }
}

/// Write every table (empty ones included) and the summary into `dir`.
pub fn write_all(
    dir: &Path,
    params: &SelectionParams,
    scenes: &[SceneRecord],
    output: &SelectionOutput,
) -> Result<OutputPaths> {
    std::fs::create_dir_all(dir)?;
    let paths = OutputPaths::in_dir(dir);
    write_scene_catalog(&paths.scenes_catalog, scenes)?;
    write_coverage(&paths.coverage, &output.coverage)?;
    write_selected_scenes(&paths.selected, &output.selected)?;
    write_time_series(&paths.time_series, &output.time_series)?;
    write_run_summary(&paths.summary, &RunSummary::new(params, scenes.len(), output))?;
    Ok(paths)
}
