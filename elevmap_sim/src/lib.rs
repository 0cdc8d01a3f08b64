//! Deterministic synthetic-terrain harness for the elevation mapping
//! engine.
//!
//! Generates seeded synthetic point clouds over a closed-form terrain and
//! drives a `MapEngine` through many integrate/propagate/fuse cycles. All
//! entropy derives from a single 64-bit seed, so a run is fully
//! reproducible.

pub mod generator;
pub mod runner;
pub mod terrain;

pub use generator::{motion_noise_deltas, PointCloudGenerator};
pub use runner::{run, RunConfig, RunSummary};
pub use terrain::SyntheticTerrain;
