//! Wire-format structs for the engine's in-process boundary.
//!
//! These are assembled from a grid in *logical* order; the rolling
//! `start_index` never leaks to a consumer.

use serde::{Deserialize, Serialize};

use crate::fused_map::FusedMap;
use crate::grid::GridSize;
use crate::raw_map::RawMap;

/// One point from an inbound point cloud: world-frame `(x, y, z)` plus a
/// packed RGB color. Paired with an external, parallel variance vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rgb: u32,
}

/// Outbound grid geometry, shared by raw and fused messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub size: GridSize,
    pub resolution: f32,
    pub center: (f32, f32),
    pub start_index: (usize, usize),
}

/// A raw map snapshot in wire format: per-layer dense matrices in logical
/// row-major order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMapMessage {
    pub frame_id: String,
    pub geometry: GridGeometry,
    pub timestamp: u64,
    pub elevation: Vec<f32>,
    pub variance: Vec<f32>,
    pub h_var_x: Vec<f32>,
    pub h_var_y: Vec<f32>,
    pub color: Vec<u32>,
}

/// A fused map snapshot in wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedMapMessage {
    pub frame_id: String,
    pub geometry: GridGeometry,
    pub timestamp: u64,
    pub elevation: Vec<f32>,
    pub variance: Vec<f32>,
    pub color: Vec<u32>,
}

fn logical_order(size: GridSize) -> impl Iterator<Item = (usize, usize)> {
    let (rows, cols) = size;
    (0..rows).flat_map(move |r| (0..cols).map(move |c| (r, c)))
}

impl RawMapMessage {
    pub fn from_raw(raw: &RawMap, frame_id: impl Into<String>) -> Self {
        let grid = raw.grid();
        let size = grid.size();
        let mut elevation = Vec::with_capacity(size.0 * size.1);
        let mut variance = Vec::with_capacity(size.0 * size.1);
        let mut h_var_x = Vec::with_capacity(size.0 * size.1);
        let mut h_var_y = Vec::with_capacity(size.0 * size.1);
        let mut color = Vec::with_capacity(size.0 * size.1);
        for idx in logical_order(size) {
            elevation.push(raw.elevation(idx));
            variance.push(raw.variance(idx));
            h_var_x.push(raw.h_var_x(idx));
            h_var_y.push(raw.h_var_y(idx));
            color.push(raw.color(idx));
        }
        Self {
            frame_id: frame_id.into(),
            geometry: GridGeometry {
                size,
                resolution: grid.resolution(),
                center: (grid.center().x, grid.center().y),
                start_index: grid.start_index(),
            },
            timestamp: raw.timestamp,
            elevation,
            variance,
            h_var_x,
            h_var_y,
            color,
        }
    }
}

impl FusedMapMessage {
    pub fn from_fused(fused: &FusedMap, frame_id: impl Into<String>) -> Self {
        let grid = fused.grid();
        let size = grid.size();
        let mut elevation = Vec::with_capacity(size.0 * size.1);
        let mut variance = Vec::with_capacity(size.0 * size.1);
        let mut color = Vec::with_capacity(size.0 * size.1);
        for idx in logical_order(size) {
            elevation.push(fused.elevation(idx));
            variance.push(fused.variance(idx));
            color.push(fused.color(idx));
        }
        Self {
            frame_id: frame_id.into(),
            geometry: GridGeometry {
                size,
                resolution: grid.resolution(),
                center: (grid.center().x, grid.center().y),
                start_index: grid.start_index(),
            },
            timestamp: fused.timestamp,
            elevation,
            variance,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector2;

    #[test]
    fn raw_message_is_in_logical_row_major_order_after_rotation() {
        let mut raw = RawMap::new((2, 2), 0.1, Vector2::new(0.0, 0.0));
        raw.mov(Vector2::new(0.1, 0.0)); // rotate start_index so physical != logical
        *raw.grid_mut().at_mut(crate::grid::Layer::Elevation, (1, 0)) = 7.0;

        let msg = RawMapMessage::from_raw(&raw, "map");
        // Message is row-major over logical (r, c): index 1*cols + 0 = 2.
        assert_eq!(msg.elevation[2], 7.0);
        assert_eq!(msg.geometry.start_index, raw.grid().start_index());
    }
}
