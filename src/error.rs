//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, catalog, geometry, JSON and CSV errors, and provides a
//! semantic variant for configuration validation. Conditions that do not stop a run
//! (empty catalog, anchors without candidates, rejected footprints) are reported as
//! [`crate::types::Diagnostic`] values instead.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::io::CatalogError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] crate::core::geometry::GeometryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {param}={value}")]
    InvalidConfiguration { param: &'static str, value: String },

    #[error("Union search for anchor {anchor_date} ran out of time")]
    AnchorTimedOut { anchor_date: chrono::NaiveDate },
}

impl Error {
    pub fn invalid_config<V: std::fmt::Display>(param: &'static str, value: V) -> Self {
        Error::InvalidConfiguration {
            param,
            value: value.to_string(),
        }
    }
}
