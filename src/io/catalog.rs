//! Scene catalog ingest.
//!
//! The remote STAC search lives outside this crate; what reaches the selector is an
//! already-materialized list of items. `StacItemFiles` reads such lists from disk
//! (one file per result page) and applies the same cloud, date and size limits the
//! remote search would.
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate};
use geo::MultiPolygon;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::geometry::GeometryError;
use crate::io::geojson::geometry_from_value;
use crate::types::SceneRecord;

/// Property keys tried, in order, for scene-level cloud cover
pub const CLOUD_KEYS: [&str; 2] = ["eo:cloud_cover", "cloud_cover"];

/// Property keys tried, in order, for the tile / grid identifier
pub const TILE_KEYS: [&str; 3] = ["s2:mgrs_tile", "tile_id", "grid:code"];

/// Errors encountered when reading catalog or AOI inputs
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported catalog format: {0}")]
    Format(String),
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// Search constraints handed to a catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub collection: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    /// Strict upper bound on cloud cover
    pub cloud_cover_max: f64,
    pub max_items: usize,
}

impl CatalogQuery {
    /// An empty `collection` matches everything, as does a scene without one.
    pub fn accepts(&self, scene: &SceneRecord) -> bool {
        let day = scene.instant().date_naive();
        let collection_ok = self.collection.is_empty()
            || scene
                .collection
                .as_deref()
                .is_none_or(|c| c == self.collection);
        collection_ok
            && day >= self.date_start
            && day <= self.date_end
            && scene.cloud_cover < self.cloud_cover_max
    }

    /// Accepted scenes in input order, first occurrence of each id only, at most
    /// `max_items` of them.
    pub fn select<I>(&self, scenes: I) -> Vec<SceneRecord>
    where
        I: IntoIterator<Item = SceneRecord>,
    {
        let mut seen: HashSet<String> = HashSet::new();
        scenes
            .into_iter()
            .filter(|s| self.accepts(s))
            .filter(|s| {
                let fresh = seen.insert(s.id.clone());
                if !fresh {
                    debug!("Dropping duplicate scene id {}", s.id);
                }
                fresh
            })
            .take(self.max_items)
            .collect()
    }
}

/// Source of scene records for one run.
pub trait SceneCatalog {
    fn search(&self, query: &CatalogQuery) -> Result<Vec<SceneRecord>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct StacItem {
    id: String,
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    collection: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemPage {
    Collection { features: Vec<StacItem> },
    Items(Vec<StacItem>),
}

fn string_prop(props: &Map<String, Value>, key: &str) -> Option<String> {
    props.get(key).and_then(Value::as_str).map(str::to_string)
}

fn number_prop(props: &Map<String, Value>, key: &str) -> Option<f64> {
    match props.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z").ok())
}

/// Convert one STAC item into a scene record.
///
/// Returns `None` for items without a usable datetime. A missing or unreadable
/// footprint is kept as an empty geometry so the coverage analysis can report it.
fn scene_from_item(item: StacItem) -> Option<SceneRecord> {
    let props = &item.properties;
    let Some(datetime) = props
        .get("datetime")
        .and_then(Value::as_str)
        .and_then(parse_datetime)
    else {
        warn!("Skipping item {} without a valid datetime", item.id);
        return None;
    };

    let cloud_cover = CLOUD_KEYS
        .iter()
        .find_map(|k| number_prop(props, k))
        .unwrap_or_else(|| {
            debug!("Item {} has no cloud cover; assuming 100", item.id);
            100.0
        });

    let tile_id = TILE_KEYS
        .iter()
        .find_map(|k| string_prop(props, k))
        .unwrap_or_else(|| item.id.clone());

    let footprint = match item.geometry.as_ref().filter(|g| !g.is_null()) {
        Some(g) => geometry_from_value(g).unwrap_or_else(|e| {
            warn!("Item {} has an unreadable footprint: {}", item.id, e);
            MultiPolygon::new(Vec::new())
        }),
        None => {
            warn!("Item {} has no footprint", item.id);
            MultiPolygon::new(Vec::new())
        }
    };

    Some(SceneRecord {
        platform: string_prop(props, "platform"),
        constellation: string_prop(props, "constellation"),
        collection: item.collection.clone().or_else(|| string_prop(props, "collection")),
        id: item.id,
        datetime,
        cloud_cover,
        tile_id,
        footprint,
    })
}

/// Parse a page of items: a GeoJSON `FeatureCollection` or a bare JSON array.
pub fn parse_item_page(text: &str) -> Result<Vec<SceneRecord>, CatalogError> {
    let page: ItemPage = serde_json::from_str(text)?;
    let items = match page {
        ItemPage::Collection { features } => features,
        ItemPage::Items(items) => items,
    };
    Ok(items.into_iter().filter_map(scene_from_item).collect())
}

/// Catalog backed by one or more saved STAC result pages.
#[derive(Debug, Clone)]
pub struct StacItemFiles {
    pages: Vec<PathBuf>,
}

impl StacItemFiles {
    pub fn new<P: AsRef<Path>>(pages: &[P]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    /// All items across pages, in page order, without filtering.
    pub fn read_all(&self) -> Result<Vec<SceneRecord>, CatalogError> {
        let mut scenes = Vec::new();
        for page in &self.pages {
            if !page.exists() {
                return Err(CatalogError::NotFound(page.clone()));
            }
            let text = fs::read_to_string(page)?;
            let items = parse_item_page(&text)?;
            debug!("Read {} item(s) from {:?}", items.len(), page);
            scenes.extend(items);
        }
        Ok(scenes)
    }
}

impl SceneCatalog for StacItemFiles {
    fn search(&self, query: &CatalogQuery) -> Result<Vec<SceneRecord>, CatalogError> {
        let all = self.read_all()?;
        let total = all.len();
        let scenes = query.select(all);
        info!(
            "Catalog: {} of {} item(s) match {} {}..{} cloud<{} (max {})",
            scenes.len(),
            total,
            query.collection,
            query.date_start,
            query.date_end,
            query.cloud_cover_max,
            query.max_items
        );
        Ok(scenes)
    }
}

/// Catalog over records already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    pub scenes: Vec<SceneRecord>,
}

impl SceneCatalog for InMemoryCatalog {
    fn search(&self, query: &CatalogQuery) -> Result<Vec<SceneRecord>, CatalogError> {
        Ok(query.select(self.scenes.iter().cloned()))
    }
}
