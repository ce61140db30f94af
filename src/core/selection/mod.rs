//! Temporal scene selection: per-instant coverage analysis, anchor scheduling,
//! bounded tile-union search and the orchestrating `SceneSelector`.
pub mod anchors;
pub mod coverage;
pub mod selector;
pub mod union;

pub use anchors::schedule_anchors;
pub use coverage::{CoverageAnalyzer, CoverageTable, TimestampGroup};
pub use selector::{SceneSelector, SelectionOutput};
pub use union::{AnchorOutcome, MAX_UNION_TILES_CEILING, TileUnionSelector, compare_candidates};
