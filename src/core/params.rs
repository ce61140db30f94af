use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::CatalogQuery;

/// Default STAC collection queried by the catalog ingest
pub const DEFAULT_COLLECTION: &str = "sentinel-2-l2a";

/// Length of the default period when no start date is given
pub const DEFAULT_PERIOD_DAYS: u64 = 365;

/// Selection parameters suitable for config files and CLI presets.
///
/// A value of this type is the whole configuration of a run: the selector never
/// consults environment or global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    pub collection: String,
    /// Scenes must have cloud cover strictly below this percentage
    pub cloud_cover_max: f64,
    /// Upper bound on ingested scenes
    pub max_items: usize,
    /// Coverage fraction in (0, 1] counted as full cover
    pub full_cover_threshold: f64,
    /// If false, only single tiles are considered
    pub allow_union: bool,
    pub max_union_tiles: usize,
    pub n_anchors: usize,
    pub window_days: u32,
    /// None means `date_end` minus one year
    pub date_start: Option<NaiveDate>,
    /// None means today (UTC)
    pub date_end: Option<NaiveDate>,
    /// Footprints covering less than this fraction of the AOI are ignored
    pub min_intersection_frac: f64,
    /// Per-anchor search budget; exceeding it leaves the anchor empty
    pub anchor_timeout_ms: Option<u64>,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            cloud_cover_max: 20.0,
            max_items: 5000,
            full_cover_threshold: 0.999,
            allow_union: true,
            max_union_tiles: 2,
            n_anchors: 24,
            window_days: 21,
            date_start: None,
            date_end: None,
            min_intersection_frac: 1e-6,
            anchor_timeout_ms: None,
        }
    }
}

impl SelectionParams {
    /// Reject configurations the selector cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.n_anchors == 0 {
            return Err(Error::invalid_config("n_anchors", self.n_anchors));
        }
        if self.window_days == 0 {
            return Err(Error::invalid_config("window_days", self.window_days));
        }
        if self.max_union_tiles == 0 {
            return Err(Error::invalid_config("max_union_tiles", self.max_union_tiles));
        }
        if self.max_items == 0 {
            return Err(Error::invalid_config("max_items", self.max_items));
        }
        if !(self.full_cover_threshold > 0.0 && self.full_cover_threshold <= 1.0) {
            return Err(Error::invalid_config(
                "full_cover_threshold",
                self.full_cover_threshold,
            ));
        }
        if !(0.0..=100.0).contains(&self.cloud_cover_max) {
            return Err(Error::invalid_config("cloud_cover_max", self.cloud_cover_max));
        }
        if !(self.min_intersection_frac >= 0.0 && self.min_intersection_frac < 1.0) {
            return Err(Error::invalid_config(
                "min_intersection_frac",
                self.min_intersection_frac,
            ));
        }
        let (start, end) = self.period();
        if end < start {
            return Err(Error::invalid_config(
                "date_start",
                format!("{start} is after date_end {end}"),
            ));
        }
        Ok(())
    }

    /// Resolve the inclusive `[date_start, date_end]` period.
    pub fn period(&self) -> (NaiveDate, NaiveDate) {
        let end = self.date_end.unwrap_or_else(|| Utc::now().date_naive());
        let start = self
            .date_start
            .unwrap_or_else(|| {
                end.checked_sub_days(Days::new(DEFAULT_PERIOD_DAYS))
                    .unwrap_or(NaiveDate::MIN)
            });
        (start, end)
    }

    /// Same parameters with both period ends fixed, so later calls to
    /// [`SelectionParams::period`] cannot drift with the clock.
    pub fn resolved(&self) -> Self {
        let (start, end) = self.period();
        Self {
            date_start: Some(start),
            date_end: Some(end),
            ..self.clone()
        }
    }

    pub fn catalog_query(&self) -> CatalogQuery {
        let (date_start, date_end) = self.period();
        CatalogQuery {
            collection: self.collection.clone(),
            date_start,
            date_end,
            cloud_cover_max: self.cloud_cover_max,
            max_items: self.max_items,
        }
    }
}
