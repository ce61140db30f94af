use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::core::params::SelectionParams;
use crate::core::selection::SelectionOutput;
use crate::error::Result;
use crate::types::{Anchor, Diagnostic};

pub const RUN_SUMMARY_JSON: &str = "run_summary.json";

/// min / median / max of a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl Spread {
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut v: Vec<f64> = values.into_iter().filter(|x| x.is_finite()).collect();
        if v.is_empty() {
            return None;
        }
        v.sort_by(f64::total_cmp);
        let mid = v.len() / 2;
        let median = if v.len() % 2 == 0 {
            (v[mid - 1] + v[mid]) / 2.0
        } else {
            v[mid]
        };
        Some(Self {
            min: v[0],
            median,
            max: v[v.len() - 1],
        })
    }
}

/// JSON sidecar describing one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub params: SelectionParams,
    pub scenes: usize,
    pub timestamps: usize,
    pub full_cover_timestamps: usize,
    pub anchors_requested: usize,
    pub anchors_selected: usize,
    pub anchors: Vec<Anchor>,
    pub coverage_frac: Option<Spread>,
    pub cloud_score: Option<Spread>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn new(params: &SelectionParams, scenes: usize, output: &SelectionOutput) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            params: params.clone(),
            scenes,
            timestamps: output.coverage.len(),
            full_cover_timestamps: output.full_cover_count(),
            anchors_requested: output.anchors.len(),
            anchors_selected: output.time_series.len(),
            anchors: output.anchors.clone(),
            coverage_frac: Spread::of(output.time_series.iter().map(|r| r.coverage_frac)),
            cloud_score: Spread::of(output.time_series.iter().map(|r| r.cloud_score)),
            diagnostics: output.diagnostics.clone(),
        }
    }
}

pub fn write_run_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json_string = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json_string)?;
    info!("Created run summary: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_of_even_and_odd_columns() {
        assert_eq!(Spread::of(Vec::<f64>::new()), None);
        let s = Spread::of([3.0, 1.0, 2.0]).unwrap();
        assert_eq!((s.min, s.median, s.max), (1.0, 2.0, 3.0));
        let s = Spread::of([4.0, 1.0, 2.0, 3.0, f64::NAN]).unwrap();
        assert_eq!((s.min, s.median, s.max), (1.0, 2.5, 4.0));
    }

    #[test]
    fn summary_serializes_diagnostics_with_kind_tags() {
        let output = SelectionOutput {
            diagnostics: vec![Diagnostic::EmptyCatalog],
            ..Default::default()
        };
        let summary = RunSummary::new(&SelectionParams::default(), 0, &output);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["diagnostics"][0]["kind"], "empty_catalog");
        assert_eq!(value["anchors_selected"], 0);
        assert!(value["coverage_frac"].is_null());
    }
}
