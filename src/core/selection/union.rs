//! Bounded tile-union search for a single anchor.
//!
//! For every full-cover acquisition instant inside the anchor window, subsets of
//! that instant's tiles are enumerated by increasing size. The first size at which
//! some subset reaches the coverage threshold ends the search for that instant, so
//! a smaller union always beats a larger one from the same pass. The per-instant
//! winners are then ranked with [`compare_candidates`].
use std::cmp::Ordering;
use std::time::{Duration, Instant};

use geo::Area;
use tracing::{debug, warn};

use crate::core::geometry::union_all;
use crate::core::params::SelectionParams;
use crate::core::selection::coverage::{CoverageTable, TimestampGroup};
use crate::types::{Anchor, TileRef, UnionCandidate};

/// Hard ceiling on union size, whatever the configuration asks for.
pub const MAX_UNION_TILES_CEILING: usize = 6;

/// Strict total order on candidates: lowest cloud score, then highest coverage,
/// then closest to the anchor, then fewest tiles. Remaining ties fall back to the
/// earlier instant and the lexicographically smaller scene id list.
pub fn compare_candidates(a: &UnionCandidate, b: &UnionCandidate) -> Ordering {
    a.cloud_score
        .total_cmp(&b.cloud_score)
        .then_with(|| b.coverage_frac.total_cmp(&a.coverage_frac))
        .then_with(|| a.distance_days.total_cmp(&b.distance_days))
        .then_with(|| a.tiles.len().cmp(&b.tiles.len()))
        .then_with(|| a.instant.cmp(&b.instant))
        .then_with(|| a.scene_ids().cmp(&b.scene_ids()))
}

/// Lexicographic k-combinations of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    indices: Vec<usize>,
    first: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            first: true,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.indices.len();
        if k == 0 || k > self.n {
            return None;
        }
        if self.first {
            self.first = false;
            return Some(self.indices.clone());
        }
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < self.n - k + i {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return Some(self.indices.clone());
            }
        }
        None
    }
}

/// Result of searching one anchor window
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorOutcome {
    Selected(UnionCandidate),
    NoCandidate,
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
struct Budget {
    deadline: Option<Instant>,
}

impl Budget {
    fn exhausted(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

struct OutOfTime;

/// Searches tile unions against a shared coverage table.
pub struct TileUnionSelector<'a> {
    table: &'a CoverageTable,
    full_cover_threshold: f64,
    max_union: usize,
    timeout: Option<Duration>,
}

impl<'a> TileUnionSelector<'a> {
    pub fn new(table: &'a CoverageTable, params: &SelectionParams) -> Self {
        let max_union = if params.allow_union {
            params.max_union_tiles.clamp(1, MAX_UNION_TILES_CEILING)
        } else {
            1
        };
        Self {
            table,
            full_cover_threshold: params.full_cover_threshold,
            max_union,
            timeout: params.anchor_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Largest subset size this selector will ever form
    pub fn max_union(&self) -> usize {
        self.max_union
    }

    /// Pick the single best union for `anchor`.
    pub fn select(&self, anchor: &Anchor) -> AnchorOutcome {
        match self.candidates(anchor) {
            Ok(candidates) => match candidates.into_iter().min_by(compare_candidates) {
                Some(best) => AnchorOutcome::Selected(best),
                None => AnchorOutcome::NoCandidate,
            },
            Err(OutOfTime) => AnchorOutcome::TimedOut,
        }
    }

    /// Per-instant candidates for `anchor`, best first, at most `top_k` of them.
    /// Returns `None` when the search runs out of time.
    pub fn rank_candidates(&self, anchor: &Anchor, top_k: usize) -> Option<Vec<UnionCandidate>> {
        match self.candidates(anchor) {
            Ok(mut candidates) => {
                candidates.sort_by(compare_candidates);
                candidates.truncate(top_k);
                Some(candidates)
            }
            Err(OutOfTime) => {
                warn!("Ranking for anchor {} ran out of time", anchor.target_date);
                None
            }
        }
    }

    fn candidates(&self, anchor: &Anchor) -> Result<Vec<UnionCandidate>, OutOfTime> {
        let budget = Budget {
            // A budget too large to represent is no budget at all.
            deadline: self.timeout.and_then(|t| Instant::now().checked_add(t)),
        };
        let (start, end) = anchor.window();
        let mut candidates = Vec::new();
        for group in self.table.eligible_between(start, end) {
            if let Some(candidate) = self.best_union_for_group(group, anchor, budget)? {
                candidates.push(candidate);
            }
        }
        debug!(
            "Anchor {} window [{}, {}): {} candidate(s)",
            anchor.target_date,
            start,
            end,
            candidates.len()
        );
        Ok(candidates)
    }

    /// Smallest satisfying union of one instant, or None if no subset within
    /// the size limit reaches the threshold.
    fn best_union_for_group(
        &self,
        group: &TimestampGroup,
        anchor: &Anchor,
        budget: Budget,
    ) -> Result<Option<UnionCandidate>, OutOfTime> {
        let n = group.tiles.len();
        let max_size = self.max_union.min(n);
        let aoi_area = self.table.aoi_area();

        for size in 1..=max_size {
            // (cloud_score, coverage_frac, coverage_area, indices)
            let mut best: Option<(f64, f64, f64, Vec<usize>)> = None;

            for subset in Combinations::new(n, size) {
                if budget.exhausted() {
                    return Err(OutOfTime);
                }
                let cloud_score = subset
                    .iter()
                    .map(|&i| group.tiles[i].scene.cloud_cover)
                    .fold(f64::NEG_INFINITY, f64::max);
                if let Some((best_cloud, ..)) = &best {
                    // Cannot win at this size; skip the geometry work.
                    if cloud_score > *best_cloud {
                        continue;
                    }
                }

                let area = if size == 1 {
                    group.tiles[subset[0]].clipped.unsigned_area()
                } else {
                    union_all(subset.iter().map(|&i| &group.tiles[i].clipped)).unsigned_area()
                };
                let frac = area / aoi_area;
                if frac < self.full_cover_threshold {
                    continue;
                }

                let better = match &best {
                    None => true,
                    Some((best_cloud, best_frac, ..)) => {
                        cloud_score < *best_cloud
                            || (cloud_score == *best_cloud && frac > *best_frac)
                    }
                };
                if better {
                    best = Some((cloud_score, frac, area, subset));
                }
            }

            if let Some((cloud_score, coverage_frac, coverage_area, subset)) = best {
                let tiles: Vec<TileRef> = subset
                    .iter()
                    .map(|&i| TileRef::from(&group.tiles[i].scene))
                    .collect();
                return Ok(Some(UnionCandidate {
                    instant: group.instant,
                    tiles,
                    coverage_frac,
                    coverage_area,
                    cloud_score,
                    distance_days: anchor.distance_days(group.instant),
                }));
            }
        }

        debug!(
            "{}: no union of at most {} tile(s) reaches {}",
            group.instant, max_size, self.full_cover_threshold
        );
        Ok(None)
    }
}
