//! `FusedMap` - the spatially-fused view of `RawMap`.

use nalgebra::Vector2;

use crate::grid::{CircularGrid, GridSize, Layer, LogicalIndex};

const CLEAR_LAYERS: [Layer; 2] = [Layer::Elevation, Layer::Variance];

/// The fused elevation estimate. `timestamp` doubles as a staleness marker:
/// consumers (and the Fuser itself) must treat a `FusedMap` as stale
/// whenever `timestamp != RawMap::timestamp`.
#[derive(Debug, Clone)]
pub struct FusedMap {
    grid: CircularGrid,
    pub timestamp: u64,
}

impl FusedMap {
    pub fn new(size: GridSize, resolution: f32, center: Vector2<f32>) -> Self {
        Self {
            grid: CircularGrid::new(size, resolution, center, &[Layer::Elevation, Layer::Variance], true),
            timestamp: 0,
        }
    }

    pub fn grid(&self) -> &CircularGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut CircularGrid {
        &mut self.grid
    }

    pub fn elevation(&self, idx: LogicalIndex) -> f32 {
        self.grid.at(Layer::Elevation, idx)
    }

    pub fn variance(&self, idx: LogicalIndex) -> f32 {
        self.grid.at(Layer::Variance, idx)
    }

    pub fn color(&self, idx: LogicalIndex) -> u32 {
        self.grid.color_at(idx)
    }

    pub fn is_valid(&self, idx: LogicalIndex) -> bool {
        self.elevation(idx).is_finite() && self.variance(idx).is_finite()
    }

    pub fn set_cell(&mut self, idx: LogicalIndex, elevation: f32, variance: f32, color: u32) {
        *self.grid.at_mut(Layer::Elevation, idx) = elevation;
        *self.grid.at_mut(Layer::Variance, idx) = variance;
        *self.grid.color_at_mut(idx) = color;
    }

    /// `clear_all` on a fused map additionally zeroes `color`.
    pub fn clear_all(&mut self) {
        self.grid.clear_all(&CLEAR_LAYERS, true);
        self.timestamp = 0;
    }

    pub fn mov(&mut self, new_center: Vector2<f32>) {
        self.grid.mov(new_center, &CLEAR_LAYERS, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_all_zeroes_color_and_resets_timestamp() {
        let mut m = FusedMap::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        m.set_cell((0, 0), 1.0, 0.1, 0xFF0000);
        m.timestamp = 42;
        m.clear_all();
        assert!(m.elevation((0, 0)).is_nan());
        assert_eq!(m.color((0, 0)), 0);
        assert_eq!(m.timestamp, 0);
    }
}
