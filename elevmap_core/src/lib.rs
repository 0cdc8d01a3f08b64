//! Elevation Map Core - Probabilistic 2.5D Terrain Mapping
//!
//! Maintains a probabilistic 2.5D elevation map around a mobile robot: a
//! raw per-cell Kalman-style estimator (`RawMap`) and a spatially-fused
//! view (`FusedMap`) that accounts for horizontal positional uncertainty
//! of neighboring cells. Three algorithms operate over the pair:
//! point-cloud integration, uncertainty propagation, and Gaussian-weighted
//! spatial fusion, orchestrated by `MapEngine`.

pub mod clamp;
pub mod engine;
pub mod error;
pub mod fused_map;
pub mod fuser;
pub mod grid;
pub mod integrator;
pub mod message;
pub mod params;
pub mod pose;
pub mod propagator;
pub mod raw_map;

pub use engine::MapEngine;
pub use error::MapError;
pub use fused_map::FusedMap;
pub use fuser::FusionReport;
pub use grid::{CircularGrid, GridSize, Layer, LogicalIndex};
pub use integrator::IntegrationReport;
pub use message::{FusedMapMessage, GridGeometry, PointSample, RawMapMessage};
pub use params::EngineParams;
pub use pose::position_3d_in_parent_frame;
pub use raw_map::RawMap;
