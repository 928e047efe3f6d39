//! RoadTiles - Kerala PWD road network tiles
//!
//! This library fetches Mapbox Vector Tiles from the Kerala Public Works
//! Department road network, caches them in a tiered cache, decodes them for
//! diagnostics and matches geographic points to the nearest road. It also
//! looks up the officials responsible for a road section.
//!
//! The tile core lives in [`composite`] and [`matcher`]; [`service`] wraps it
//! with per-client rate limiting and configuration.

pub mod cache;
pub mod composite;
pub mod config;
pub mod coord;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod mvt;
pub mod officials;
pub mod provider;
pub mod rate_limit;
pub mod service;

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
