//! Shared records used across s2series: the ingested `SceneRecord`, the derived
//! `CoverageResult`, `Anchor`, `UnionCandidate`, the output rows
//! (`SelectedScene`, `TimeSeriesRow`) and run `Diagnostic`s.
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// One satellite overpass product over one footprint at one acquisition instant.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
    pub id: String,
    pub datetime: DateTime<FixedOffset>,
    /// Scene-level cloud percentage in [0, 100]
    pub cloud_cover: f64,
    pub tile_id: String,
    /// Lon/lat footprint (EPSG:4326)
    pub footprint: MultiPolygon<f64>,
    pub platform: Option<String>,
    pub constellation: Option<String>,
    pub collection: Option<String>,
}

impl SceneRecord {
    /// Acquisition instant used as grouping key
    pub fn instant(&self) -> DateTime<Utc> {
        self.datetime.with_timezone(&Utc)
    }
}

/// Lightweight reference to a scene inside a union (no geometry).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileRef {
    pub id: String,
    pub tile_id: String,
    pub datetime: DateTime<FixedOffset>,
    pub cloud_cover: f64,
}

impl From<&SceneRecord> for TileRef {
    fn from(scene: &SceneRecord) -> Self {
        Self {
            id: scene.id.clone(),
            tile_id: scene.tile_id.clone(),
            datetime: scene.datetime,
            cloud_cover: scene.cloud_cover,
        }
    }
}

/// Full-union coverage diagnostics for one acquisition instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
    pub instant: DateTime<Utc>,
    /// Not clamped; only compared against the threshold
    pub coverage_frac: f64,
    /// m² of AOI covered
    pub coverage_area: f64,
    pub tiles_count: usize,
    pub min_cloud: f64,
    pub max_cloud: f64,
    pub has_full_cover: bool,
    /// Footprints dropped because their geometry was unusable
    pub excluded_tiles: usize,
}

/// One slot of the regular output series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub index: usize,
    pub target_date: NaiveDate,
    pub window_days: u32,
}

impl Anchor {
    /// Midnight UTC of the target date
    pub fn center(&self) -> DateTime<Utc> {
        self.target_date.and_time(NaiveTime::MIN).and_utc()
    }

    /// Half-open `[start, end)` acceptance window, clamped to the representable
    /// range so very wide windows simply accept everything.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let half = Duration::hours(i64::from(self.window_days) * 12);
        let center = self.center();
        (
            center
                .checked_sub_signed(half)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            center
                .checked_add_signed(half)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let (start, end) = self.window();
        start <= instant && instant < end
    }

    /// Absolute distance to the anchor centre in fractional days
    pub fn distance_days(&self, instant: DateTime<Utc>) -> f64 {
        (instant - self.center()).num_seconds().abs() as f64 / 86_400.0
    }
}

/// A tile combination from a single acquisition instant that covers the AOI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionCandidate {
    pub instant: DateTime<Utc>,
    /// Ordered by `tile_id`, then `id`
    pub tiles: Vec<TileRef>,
    pub coverage_frac: f64,
    pub coverage_area: f64,
    /// Worst cloud cover among the tiles
    pub cloud_score: f64,
    pub distance_days: f64,
}

impl UnionCandidate {
    pub fn tiles_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn scene_ids(&self) -> Vec<&str> {
        self.tiles.iter().map(|t| t.id.as_str()).collect()
    }

    /// Scene ids joined with `;` in tile order
    pub fn joined_ids(&self) -> String {
        self.scene_ids().join(";")
    }
}

/// One row per tile of a winning union
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedScene {
    pub anchor_date: NaiveDate,
    pub acq_datetime: DateTime<Utc>,
    pub id: String,
    pub tile_id: String,
    pub datetime: DateTime<FixedOffset>,
    pub cloud_cover: f64,
    pub coverage_frac_union: f64,
    pub coverage_area_union: f64,
}

/// One row per anchor with a winner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesRow {
    pub anchor_date: NaiveDate,
    pub acq_datetime: DateTime<Utc>,
    pub tile_ids: String,
    pub tiles_count: usize,
    pub cloud_score: f64,
    pub coverage_frac: f64,
    pub coverage_area: f64,
}

/// Non-fatal conditions met during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    EmptyCatalog,
    NoFullCoverageTimestamp { threshold: f64 },
    NoCandidateForAnchor { anchor_date: NaiveDate },
    AnchorTimedOut { anchor_date: NaiveDate },
    AnchorBeyondPeriod { anchor_date: NaiveDate, date_end: NaiveDate },
    GeometryFailure { scene_id: String, reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::EmptyCatalog => write!(f, "catalog is empty"),
            Diagnostic::NoFullCoverageTimestamp { threshold } => {
                write!(f, "no acquisition reaches coverage threshold {threshold}")
            }
            Diagnostic::NoCandidateForAnchor { anchor_date } => {
                write!(f, "no eligible acquisition for anchor {anchor_date}")
            }
            Diagnostic::AnchorTimedOut { anchor_date } => {
                write!(f, "union search for anchor {anchor_date} ran out of time")
            }
            Diagnostic::AnchorBeyondPeriod {
                anchor_date,
                date_end,
            } => write!(f, "anchor {anchor_date} shifted past period end {date_end}"),
            Diagnostic::GeometryFailure { scene_id, reason } => {
                write!(f, "footprint of {scene_id} excluded: {reason}")
            }
        }
    }
}
