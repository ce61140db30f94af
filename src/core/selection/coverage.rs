use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;

use chrono::{DateTime, Utc};
use geo::{Area, MultiPolygon};
use tracing::{debug, warn};

use crate::core::geometry::{AreaOfInterest, union_all};
use crate::core::params::SelectionParams;
use crate::types::{CoverageResult, Diagnostic, SceneRecord};

/// A scene whose footprint has been clipped to the AOI in equal-area space.
#[derive(Debug, Clone)]
pub struct ClippedTile {
    pub scene: SceneRecord,
    pub clipped: MultiPolygon<f64>,
    pub coverage_frac: f64,
}

/// Scenes sharing one acquisition instant, ordered by `tile_id` then `id`.
#[derive(Debug, Clone)]
pub struct TimestampGroup {
    pub instant: DateTime<Utc>,
    pub tiles: Vec<ClippedTile>,
}

#[derive(Debug, Clone)]
pub struct CoverageEntry {
    pub group: TimestampGroup,
    pub result: CoverageResult,
}

/// Read-only per-instant coverage table shared by all anchor searches.
#[derive(Debug, Clone, Default)]
pub struct CoverageTable {
    aoi_area: f64,
    entries: BTreeMap<DateTime<Utc>, CoverageEntry>,
    diagnostics: Vec<Diagnostic>,
}

impl CoverageTable {
    pub fn aoi_area(&self) -> f64 {
        self.aoi_area
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coverage rows in ascending instant order
    pub fn results(&self) -> impl Iterator<Item = &CoverageResult> {
        self.entries.values().map(|e| &e.result)
    }

    pub fn get(&self, instant: &DateTime<Utc>) -> Option<&CoverageEntry> {
        self.entries.get(instant)
    }

    pub fn full_cover_count(&self) -> usize {
        self.results().filter(|r| r.has_full_cover).count()
    }

    /// Full-cover groups with `start <= instant < end`
    pub fn eligible_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &TimestampGroup> {
        self.entries
            .range((Bound::Included(start), Bound::Excluded(end)))
            .map(|(_, e)| e)
            .filter(|e| e.result.has_full_cover)
            .map(|e| &e.group)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Group scenes by exact acquisition instant. Scene ids seen before (for
/// example repeated across catalog pages) are dropped; the first one wins.
pub fn group_by_instant(scenes: &[SceneRecord]) -> BTreeMap<DateTime<Utc>, Vec<&SceneRecord>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut groups: BTreeMap<DateTime<Utc>, Vec<&SceneRecord>> = BTreeMap::new();
    for scene in scenes {
        if !seen.insert(scene.id.as_str()) {
            debug!("Dropping duplicate scene id {}", scene.id);
            continue;
        }
        groups.entry(scene.instant()).or_default().push(scene);
    }
    for members in groups.values_mut() {
        members.sort_by(|a, b| a.tile_id.cmp(&b.tile_id).then_with(|| a.id.cmp(&b.id)));
    }
    groups
}

/// Computes per-instant coverage of the AOI.
pub struct CoverageAnalyzer<'a> {
    aoi: &'a AreaOfInterest,
    full_cover_threshold: f64,
    allow_union: bool,
    min_intersection_frac: f64,
}

impl<'a> CoverageAnalyzer<'a> {
    pub fn new(aoi: &'a AreaOfInterest, params: &SelectionParams) -> Self {
        Self {
            aoi,
            full_cover_threshold: params.full_cover_threshold,
            allow_union: params.allow_union,
            min_intersection_frac: params.min_intersection_frac,
        }
    }

    pub fn analyze(&self, scenes: &[SceneRecord]) -> CoverageTable {
        let mut table = CoverageTable {
            aoi_area: self.aoi.area(),
            ..Default::default()
        };

        for (instant, members) in group_by_instant(scenes) {
            let mut tiles = Vec::with_capacity(members.len());
            let mut excluded = 0usize;

            for scene in members {
                match self.aoi.clip(&scene.footprint) {
                    Ok(clipped) => {
                        let frac = self.aoi.fraction_of(clipped.unsigned_area());
                        if frac < self.min_intersection_frac || frac <= 0.0 {
                            debug!("Scene {} does not intersect the AOI (frac={:.2e})", scene.id, frac);
                            continue;
                        }
                        tiles.push(ClippedTile {
                            scene: scene.clone(),
                            clipped,
                            coverage_frac: frac,
                        });
                    }
                    Err(e) => {
                        warn!("Excluding footprint of {}: {}", scene.id, e);
                        excluded += 1;
                        table.diagnostics.push(Diagnostic::GeometryFailure {
                            scene_id: scene.id.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            if tiles.is_empty() {
                debug!("No footprint of {} contributes to the AOI", instant);
                continue;
            }

            let result = self.summarize(instant, &tiles, excluded);
            debug!(
                "{} | cov={:.4} tiles={} full={}",
                instant, result.coverage_frac, result.tiles_count, result.has_full_cover
            );
            table.entries.insert(
                instant,
                CoverageEntry {
                    group: TimestampGroup { instant, tiles },
                    result,
                },
            );
        }

        table
    }

    fn summarize(&self, instant: DateTime<Utc>, tiles: &[ClippedTile], excluded: usize) -> CoverageResult {
        // Without unions the reachable coverage is that of the best single tile.
        let coverage_area = if self.allow_union {
            union_all(tiles.iter().map(|t| &t.clipped)).unsigned_area()
        } else {
            tiles
                .iter()
                .map(|t| t.clipped.unsigned_area())
                .fold(0.0, f64::max)
        };
        let coverage_frac = self.aoi.fraction_of(coverage_area);

        let min_cloud = tiles
            .iter()
            .map(|t| t.scene.cloud_cover)
            .fold(f64::INFINITY, f64::min);
        let max_cloud = tiles
            .iter()
            .map(|t| t.scene.cloud_cover)
            .fold(f64::NEG_INFINITY, f64::max);

        CoverageResult {
            instant,
            coverage_frac,
            coverage_area,
            tiles_count: tiles.len(),
            min_cloud,
            max_cloud,
            has_full_cover: coverage_frac >= self.full_cover_threshold,
            excluded_tiles: excluded,
        }
    }
}
