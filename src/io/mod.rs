//! I/O layer: STAC item catalogs and GeoJSON AOIs on the way in, CSV tables and
//! a JSON run summary on the way out.
pub mod catalog;
pub use catalog::{CatalogError, CatalogQuery, InMemoryCatalog, SceneCatalog, StacItemFiles};

pub mod geojson;
pub use geojson::load_aoi_geometry;

pub mod writers;
