//! Core building blocks: run parameters, footprint geometry and the temporal
//! selection engine. These are internal primitives consumed by the high-level
//! `api` module.
pub mod geometry;
pub mod params;
pub mod selection;
