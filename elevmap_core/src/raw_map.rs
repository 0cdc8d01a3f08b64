//! `RawMap` - the per-cell Kalman-style estimator.

use nalgebra::Vector2;

use crate::clamp::clamp_layer;
use crate::grid::{CircularGrid, GridSize, Layer, LogicalIndex};
use crate::params::EngineParams;

const CLEAR_LAYERS: [Layer; 2] = [Layer::Elevation, Layer::Variance];

/// The raw elevation estimate: one Kalman-filtered cell per grid cell, plus
/// horizontal variance and color which are not cleared by `clear_all`/`mov`.
#[derive(Debug, Clone)]
pub struct RawMap {
    grid: CircularGrid,
    /// Timestamp (nanoseconds) of the last mutation, from the point cloud
    /// or propagation input that produced it.
    pub timestamp: u64,
}

impl RawMap {
    pub fn new(size: GridSize, resolution: f32, center: Vector2<f32>) -> Self {
        Self {
            grid: CircularGrid::new(
                size,
                resolution,
                center,
                &[
                    Layer::Elevation,
                    Layer::Variance,
                    Layer::HorizontalVarianceX,
                    Layer::HorizontalVarianceY,
                ],
                true,
            ),
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

    pub fn h_var_x(&self, idx: LogicalIndex) -> f32 {
        self.grid.at(Layer::HorizontalVarianceX, idx)
    }

    pub fn h_var_y(&self, idx: LogicalIndex) -> f32 {
        self.grid.at(Layer::HorizontalVarianceY, idx)
    }

    pub fn color(&self, idx: LogicalIndex) -> u32 {
        self.grid.color_at(idx)
    }

    /// A cell is valid iff its elevation and variance are both finite.
    pub fn is_valid(&self, idx: LogicalIndex) -> bool {
        self.elevation(idx).is_finite() && self.variance(idx).is_finite()
    }

    /// Resets `elevation`/`variance` to `NaN` and `timestamp` to 0;
    /// horizontal variance and color are left untouched.
    pub fn clear_all(&mut self) {
        self.grid.clear_all(&CLEAR_LAYERS, false);
        self.timestamp = 0;
    }

    /// Rigid translation. Only `elevation`/`variance` are cleared on the
    /// swept-in strip; horizontal variance and color carry over whatever
    /// was left by the prior occupant of that logical slot.
    pub fn mov(&mut self, new_center: Vector2<f32>) {
        self.grid.mov(new_center, &CLEAR_LAYERS, false);
    }

    /// Deep value copy, used by the Fuser to decouple its read-heavy
    /// compute phase from the writer-side `raw_lock`.
    pub fn snapshot(&self) -> RawMap {
        self.clone()
    }

    /// Applies the clamp rule to `variance`, `h_var_x` and
    /// `h_var_y`. Called by `Integrator`/`Propagator` after every mutation.
    pub fn clamp_variance_layers(&mut self, params: &EngineParams) {
        clamp_layer(
            self.grid.layer_values_mut(Layer::Variance),
            params.min_variance,
            params.max_variance,
        );
        clamp_layer(
            self.grid.layer_values_mut(Layer::HorizontalVarianceX),
            params.min_horizontal_variance,
            params.max_horizontal_variance,
        );
        clamp_layer(
            self.grid.layer_values_mut(Layer::HorizontalVarianceY),
            params.min_horizontal_variance,
            params.max_horizontal_variance,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_raw_map_is_all_invalid() {
        let m = RawMap::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        for r in 0..3 {
            for c in 0..3 {
                assert!(!m.is_valid((r, c)));
            }
        }
    }

    #[test]
    fn clear_all_leaves_horizontal_variance_and_color_untouched() {
        let mut m = RawMap::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        let idx = (1, 1);
        *m.grid_mut().at_mut(Layer::Elevation, idx) = 1.0;
        *m.grid_mut().at_mut(Layer::Variance, idx) = 0.01;
        *m.grid_mut().at_mut(Layer::HorizontalVarianceX, idx) = 5.0;
        *m.grid_mut().color_at_mut(idx) = 0xABCDEF;

        m.clear_all();

        assert!(m.elevation(idx).is_nan());
        assert!(m.variance(idx).is_nan());
        assert_eq!(m.h_var_x(idx), 5.0);
        assert_eq!(m.color(idx), 0xABCDEF);
    }

    #[test]
    fn clear_all_resets_timestamp() {
        let mut m = RawMap::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        m.timestamp = 42;
        m.clear_all();
        assert_eq!(m.timestamp, 0);
    }
}
