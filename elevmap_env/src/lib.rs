//! Environment Abstraction Layer for the elevation mapping engine.
//!
//! This crate provides the "Sans-IO" abstraction allowing `elevmap_core`'s
//! `MapEngine` to be driven by production I/O or a deterministic
//! simulation harness without either depending on the other.
//!
//! # External collaborators
//!
//! - [`PointCloudSource`] / [`MapPublisher`]: point-cloud transport in,
//!   map messages out.
//! - [`FrameLookup`]: coordinate-frame transforms for the pose accessor.
//! - [`Clock`]: timing/profiling.
//! - [`ConfigSource`]: configuration loading.

mod clock;
mod config;
mod error;
mod frame;
mod io;

pub use clock::{Clock, SystemClock, Timer};
pub use config::{ConfigSource, EngineConfig, TomlFileConfig};
pub use error::EnvError;
pub use frame::{FrameLookup, StaticFrameLookup};
pub use io::{
    map_publish_channel, point_cloud_channel, ChannelMapPublisher, ChannelPointCloudSender,
    ChannelPointCloudSource, MapPublisher, PointCloudBatch, PointCloudSource,
};
