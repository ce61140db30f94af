use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::core::geometry::AreaOfInterest;
use crate::core::params::SelectionParams;
use crate::core::selection::anchors::schedule_anchors;
use crate::core::selection::coverage::CoverageAnalyzer;
use crate::core::selection::union::{AnchorOutcome, TileUnionSelector};
use crate::error::Result;
use crate::types::{
    Anchor, CoverageResult, Diagnostic, SceneRecord, SelectedScene, TimeSeriesRow, UnionCandidate,
};

/// Everything a selection run derives from its inputs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionOutput {
    pub anchors: Vec<Anchor>,
    pub coverage: Vec<CoverageResult>,
    pub selected: Vec<SelectedScene>,
    pub time_series: Vec<TimeSeriesRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl SelectionOutput {
    pub fn full_cover_count(&self) -> usize {
        self.coverage.iter().filter(|c| c.has_full_cover).count()
    }
}

/// Orchestrates coverage analysis and per-anchor union search.
///
/// Holds an immutable, validated copy of the parameters with the period ends
/// resolved, so repeated runs over the same scenes give the same output.
#[derive(Debug, Clone)]
pub struct SceneSelector {
    aoi: AreaOfInterest,
    params: SelectionParams,
    date_start: NaiveDate,
    date_end: NaiveDate,
}

impl SceneSelector {
    pub fn new(aoi: AreaOfInterest, params: &SelectionParams) -> Result<Self> {
        params.validate()?;
        let params = params.resolved();
        let (date_start, date_end) = params.period();
        Ok(Self {
            aoi,
            params,
            date_start,
            date_end,
        })
    }

    pub fn params(&self) -> &SelectionParams {
        &self.params
    }

    pub fn aoi(&self) -> &AreaOfInterest {
        &self.aoi
    }

    pub fn anchors(&self) -> Result<Vec<Anchor>> {
        schedule_anchors(
            self.date_start,
            self.date_end,
            self.params.n_anchors,
            self.params.window_days,
        )
    }

    /// Run the full selection over `scenes`.
    pub fn run(&self, scenes: &[SceneRecord]) -> Result<SelectionOutput> {
        let anchors = self.anchors()?;
        let mut output = SelectionOutput {
            anchors: anchors.clone(),
            ..Default::default()
        };

        for anchor in anchors.iter().filter(|a| a.target_date > self.date_end) {
            output.diagnostics.push(Diagnostic::AnchorBeyondPeriod {
                anchor_date: anchor.target_date,
                date_end: self.date_end,
            });
        }

        if scenes.is_empty() {
            warn!("Scene catalog is empty; writing empty tables");
            output.diagnostics.push(Diagnostic::EmptyCatalog);
            return Ok(output);
        }

        let table = CoverageAnalyzer::new(&self.aoi, &self.params).analyze(scenes);
        output.coverage = table.results().cloned().collect();
        output.diagnostics.extend_from_slice(table.diagnostics());

        let full_cover = table.full_cover_count();
        info!(
            "Timestamps with coverage: {} (>= {:.3}: {})",
            table.len(),
            self.params.full_cover_threshold,
            full_cover
        );
        if full_cover == 0 {
            warn!(
                "No acquisition reaches full_cover_threshold={}; selection tables will be empty",
                self.params.full_cover_threshold
            );
            output.diagnostics.push(Diagnostic::NoFullCoverageTimestamp {
                threshold: self.params.full_cover_threshold,
            });
            return Ok(output);
        }

        let union_selector = TileUnionSelector::new(&table, &self.params);
        let outcomes: Vec<(Anchor, AnchorOutcome)> = anchors
            .par_iter()
            .map(|anchor| (*anchor, union_selector.select(anchor)))
            .collect();

        for (anchor, outcome) in outcomes {
            match outcome {
                AnchorOutcome::Selected(winner) => {
                    push_rows(&mut output, &anchor, &winner);
                }
                AnchorOutcome::NoCandidate => {
                    info!("No eligible acquisition for anchor {}", anchor.target_date);
                    output.diagnostics.push(Diagnostic::NoCandidateForAnchor {
                        anchor_date: anchor.target_date,
                    });
                }
                AnchorOutcome::TimedOut => {
                    warn!("Union search for anchor {} timed out", anchor.target_date);
                    output.diagnostics.push(Diagnostic::AnchorTimedOut {
                        anchor_date: anchor.target_date,
                    });
                }
            }
        }

        output.selected.sort_by(|a, b| {
            a.anchor_date
                .cmp(&b.anchor_date)
                .then_with(|| a.tile_id.cmp(&b.tile_id))
                .then_with(|| a.id.cmp(&b.id))
        });
        output.time_series.sort_by(|a, b| a.anchor_date.cmp(&b.anchor_date));

        info!(
            "Anchors requested: {}, anchors with selection: {}",
            self.params.n_anchors,
            output.time_series.len()
        );
        Ok(output)
    }
}

fn push_rows(output: &mut SelectionOutput, anchor: &Anchor, winner: &UnionCandidate) {
    for tile in &winner.tiles {
        output.selected.push(SelectedScene {
            anchor_date: anchor.target_date,
            acq_datetime: winner.instant,
            id: tile.id.clone(),
            tile_id: tile.tile_id.clone(),
            datetime: tile.datetime,
            cloud_cover: tile.cloud_cover,
            coverage_frac_union: winner.coverage_frac,
            coverage_area_union: winner.coverage_area,
        });
    }
    output.time_series.push(TimeSeriesRow {
        anchor_date: anchor.target_date,
        acq_datetime: winner.instant,
        tile_ids: winner.joined_ids(),
        tiles_count: winner.tiles_count(),
        cloud_score: winner.cloud_score,
        coverage_frac: winner.coverage_frac,
        coverage_area: winner.coverage_area,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::selection::test_support::{aoi_10x10, scene};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn params() -> SelectionParams {
        SelectionParams {
            full_cover_threshold: 0.95,
            n_anchors: 4,
            window_days: 42,
            date_start: Some(date(2021, 1, 1)),
            date_end: Some(date(2021, 12, 31)),
            ..Default::default()
        }
    }

    #[test]
    fn rejects_invalid_configuration_before_processing() {
        let bad = SelectionParams {
            n_anchors: 0,
            ..params()
        };
        assert!(SceneSelector::new(aoi_10x10(), &bad).is_err());
    }

    #[test]
    fn empty_catalog_is_not_an_error() {
        let selector = SceneSelector::new(aoi_10x10(), &params()).unwrap();
        let out = selector.run(&[]).unwrap();
        assert!(out.coverage.is_empty());
        assert!(out.selected.is_empty());
        assert!(out.time_series.is_empty());
        assert_eq!(out.anchors.len(), 4);
        assert_eq!(out.diagnostics, vec![Diagnostic::EmptyCatalog]);
    }

    #[test]
    fn one_row_per_anchor_and_per_union_tile() {
        let scenes = vec![
            // Near the first anchor (2021-02-15): two-tile union
            scene("B2", "T34TFL", "2021-02-10T09:00:00Z", 7.0, (4.5, 10.0)),
            scene("A2", "T34TFK", "2021-02-10T09:00:00Z", 5.0, (0.0, 6.0)),
            // Near the third anchor (2021-08-17): single tile
            scene("C8", "T34TFK", "2021-08-20T09:00:00Z", 3.0, (0.0, 10.0)),
        ];
        let selector = SceneSelector::new(aoi_10x10(), &params()).unwrap();
        let out = selector.run(&scenes).unwrap();

        assert_eq!(out.time_series.len(), 2);
        assert_eq!(out.time_series[0].anchor_date, date(2021, 2, 15));
        assert_eq!(out.time_series[0].tile_ids, "A2;B2");
        assert_eq!(out.time_series[0].tiles_count, 2);
        assert_eq!(out.time_series[0].cloud_score, 7.0);
        assert_eq!(out.time_series[1].anchor_date, date(2021, 8, 17));

        let ids: Vec<&str> = out.selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A2", "B2", "C8"]);

        let missing: Vec<_> = out
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::NoCandidateForAnchor { .. }))
            .collect();
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn no_full_cover_without_unions_yields_empty_selection() {
        let scenes = vec![
            scene("a", "A", "2021-02-10T09:00:00Z", 1.0, (0.0, 8.0)),
            scene("b", "B", "2021-02-10T09:00:00Z", 1.0, (2.0, 10.0)),
            scene("c", "A", "2021-05-10T09:00:00Z", 1.0, (0.0, 8.0)),
        ];
        let p = SelectionParams {
            allow_union: false,
            ..params()
        };
        let out = SceneSelector::new(aoi_10x10(), &p).unwrap().run(&scenes).unwrap();
        assert_eq!(out.coverage.len(), 2);
        assert!(out.coverage.iter().all(|c| !c.has_full_cover));
        assert!(out.selected.is_empty());
        assert!(out.time_series.is_empty());
        assert!(out.diagnostics.contains(&Diagnostic::NoFullCoverageTimestamp { threshold: 0.95 }));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let scenes: Vec<_> = (0..30)
            .map(|i| {
                // Pairs of tiles share a pass; together they cover the AOI.
                let day = 1 + (i / 2 * 23) % 360;
                let dt = date(2021, 1, 1) + chrono::Duration::days(day as i64);
                let span = if i % 2 == 0 { (0.0, 6.0) } else { (4.5, 10.0) };
                scene(
                    &format!("S{i:02}"),
                    &format!("T{}", i % 2),
                    &format!("{}T09:30:00Z", dt),
                    (i * 7 % 19) as f64,
                    span,
                )
            })
            .collect();
        let selector = SceneSelector::new(aoi_10x10(), &params()).unwrap();
        let first = selector.run(&scenes).unwrap();
        let second = selector.run(&scenes).unwrap();
        assert!(!first.time_series.is_empty());
        assert_eq!(first, second);
    }
}
