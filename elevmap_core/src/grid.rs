//! The "GRID" Engine - Rolling-Origin Dense Storage
//!
//! A `CircularGrid` is a fixed-size dense 2D array of named layers, addressed
//! through a rolling `start_index` so that a rigid translation of the map
//! (the robot driving forward) is O(size of the swept-in strip) rather than
//! O(size of the whole grid).
//!
//! Both `RawMap` and `FusedMap` are thin typed wrappers around one of these.

use nalgebra::Vector2;
use std::collections::HashMap;

/// `(rows, cols)` in cells.
pub type GridSize = (usize, usize);

/// A position in the grid's own rolling coordinate frame: `(row, col)`,
/// always in `0..rows` / `0..cols` regardless of where `start_index` points.
pub type LogicalIndex = (usize, usize);

/// Named scalar layers a `CircularGrid` can carry. `Color` is stored
/// separately (`u32`, not variance-bearing) rather than as a `Layer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Elevation,
    Variance,
    HorizontalVarianceX,
    HorizontalVarianceY,
}

/// Dense, rolling-origin, multi-layer 2D grid.
///
/// Physical storage index for logical `(r, c)` is
/// `((r + r0) mod rows, (c + c0) mod cols)`, flattened row-major. This is
/// the only place in the crate that does modular index arithmetic; every
/// other component goes through `at`/`at_mut`/`color_at` and never touches
/// `start_index` directly.
#[derive(Debug, Clone)]
pub struct CircularGrid {
    rows: usize,
    cols: usize,
    resolution: f32,
    center: Vector2<f32>,
    start_index: (usize, usize),
    scalars: HashMap<Layer, Vec<f32>>,
    color: Option<Vec<u32>>,
}

impl CircularGrid {
    /// Allocates a new grid. `layers` lists the scalar layers this grid
    /// carries; all cells start invalid (`NaN`). If `with_color` is set, a
    /// `color` layer is allocated and zero-filled.
    pub fn new(
        size: GridSize,
        resolution: f32,
        center: Vector2<f32>,
        layers: &[Layer],
        with_color: bool,
    ) -> Self {
        let (rows, cols) = size;
        let len = rows * cols;
        let mut scalars = HashMap::with_capacity(layers.len());
        for &layer in layers {
            scalars.insert(layer, vec![f32::NAN; len]);
        }
        Self {
            rows,
            cols,
            resolution,
            center,
            start_index: (0, 0),
            scalars,
            color: with_color.then(|| vec![0u32; len]),
        }
    }

    pub fn size(&self) -> GridSize {
        (self.rows, self.cols)
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn center(&self) -> Vector2<f32> {
        self.center
    }

    pub fn start_index(&self) -> (usize, usize) {
        self.start_index
    }

    /// World-space position of the corner at logical `(0, 0)`.
    fn footprint_origin(&self) -> Vector2<f32> {
        let half = Vector2::new(
            self.cols as f32 * self.resolution / 2.0,
            self.rows as f32 * self.resolution / 2.0,
        );
        self.center - half
    }

    /// Translates a world position into a logical index, or `None` if it
    /// falls outside the current footprint.
    pub fn get_index(&self, world: Vector2<f32>) -> Option<LogicalIndex> {
        let origin = self.footprint_origin();
        let offset = world - origin;
        let col = (offset.x / self.resolution).floor();
        let row = (offset.y / self.resolution).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some((row, col))
    }

    /// World-space position of the center of logical cell `(r, c)`.
    pub fn get_position(&self, index: LogicalIndex) -> Vector2<f32> {
        let origin = self.footprint_origin();
        let (row, col) = index;
        origin
            + Vector2::new(
                (col as f32 + 0.5) * self.resolution,
                (row as f32 + 0.5) * self.resolution,
            )
    }

    fn physical(&self, index: LogicalIndex) -> usize {
        let (row, col) = index;
        let pr = (row + self.start_index.0) % self.rows;
        let pc = (col + self.start_index.1) % self.cols;
        pr * self.cols + pc
    }

    pub fn at(&self, layer: Layer, index: LogicalIndex) -> f32 {
        let phys = self.physical(index);
        self.scalars[&layer][phys]
    }

    pub fn at_mut(&mut self, layer: Layer, index: LogicalIndex) -> &mut f32 {
        let phys = self.physical(index);
        self.scalars.get_mut(&layer).expect("layer not allocated on this grid").get_mut(phys).unwrap()
    }

    pub fn color_at(&self, index: LogicalIndex) -> u32 {
        let phys = self.physical(index);
        self.color.as_ref().expect("grid has no color layer")[phys]
    }

    pub fn color_at_mut(&mut self, index: LogicalIndex) -> &mut u32 {
        let phys = self.physical(index);
        self.color.as_mut().expect("grid has no color layer").get_mut(phys).unwrap()
    }

    /// The full backing storage for a scalar layer, in physical (not
    /// logical) order. Only meaningful for order-independent element-wise
    /// operations such as the variance clamp rule.
    pub fn layer_values_mut(&mut self, layer: Layer) -> &mut [f32] {
        self.scalars
            .get_mut(&layer)
            .expect("layer not allocated on this grid")
            .as_mut_slice()
    }

    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    /// Resets the listed scalar layers to `NaN` over the whole grid.
    /// `clear_color` additionally zero-fills the color layer, if present.
    pub fn clear_all(&mut self, layers: &[Layer], clear_color: bool) {
        for &layer in layers {
            if let Some(v) = self.scalars.get_mut(&layer) {
                v.fill(f32::NAN);
            }
        }
        if clear_color {
            if let Some(c) = self.color.as_mut() {
                c.fill(0);
            }
        }
    }

    /// Rigid translation to (approximately) `new_center`.
    ///
    /// Computes an integer cell shift `(dr, dc)` such that the residual
    /// shift is under one cell, advances `start_index` by that shift
    /// (mod grid size), and clears the strip of cells that newly entered
    /// the footprint on the listed layers. The grid's actual center is the
    /// quantized `old_center + shift * resolution`, which may differ from
    /// the requested `new_center` by up to half a cell.
    pub fn mov(&mut self, new_center: Vector2<f32>, clear_layers: &[Layer], clear_color: bool) {
        let delta = new_center - self.center;
        let dcol = (delta.x / self.resolution).round() as i64;
        let drow = (delta.y / self.resolution).round() as i64;

        self.center += Vector2::new(dcol as f32, drow as f32) * self.resolution;

        if dcol == 0 && drow == 0 {
            return;
        }

        self.start_index = (
            rem_euclid(self.start_index.0 as i64 + drow, self.rows as i64),
            rem_euclid(self.start_index.1 as i64 + dcol, self.cols as i64),
        );

        // Sweep the strips that newly entered the footprint. A positive
        // shift in a direction invalidates the far edge in that direction;
        // a negative shift invalidates the near edge.
        if drow != 0 {
            let n = drow.unsigned_abs() as usize;
            let top = if drow > 0 { self.rows.saturating_sub(n) } else { 0 };
            self.clear_rect((top, 0), (n.min(self.rows), self.cols), clear_layers, clear_color);
        }
        if dcol != 0 {
            let n = dcol.unsigned_abs() as usize;
            let left = if dcol > 0 { self.cols.saturating_sub(n) } else { 0 };
            self.clear_rect((0, left), (self.rows, n.min(self.cols)), clear_layers, clear_color);
        }
    }

    fn clear_rect(
        &mut self,
        top_left: LogicalIndex,
        size: GridSize,
        layers: &[Layer],
        clear_color: bool,
    ) {
        for index in self.submap_indices(top_left, size) {
            for &layer in layers {
                if self.scalars.contains_key(&layer) {
                    *self.at_mut(layer, index) = f32::NAN;
                }
            }
            if clear_color && self.color.is_some() {
                *self.color_at_mut(index) = 0;
            }
        }
    }

    /// Every logical index in the rectangle `top_left..top_left+size`,
    /// clipped to the grid's valid logical range. Returned as an owned
    /// `Vec` (rather than a borrowing iterator) so callers can mutate the
    /// same grid while walking the indices, which every caller of this
    /// method does. Each index is translated to its physical storage slot
    /// internally by `at`/`at_mut`; callers never see `start_index`.
    pub fn submap_indices(&self, top_left: LogicalIndex, size: GridSize) -> Vec<LogicalIndex> {
        let row_end = (top_left.0 + size.0).min(self.rows);
        let col_end = (top_left.1 + size.1).min(self.cols);
        let row_start = top_left.0.min(row_end);
        let col_start = top_left.1.min(col_end);
        let mut out = Vec::with_capacity((row_end - row_start) * (col_end - col_start));
        for r in row_start..row_end {
            for c in col_start..col_end {
                out.push((r, c));
            }
        }
        out
    }

    /// Resolves a world-space `(center, length)` region to a clipped
    /// logical rectangle, the "same submap-information routine" used by
    /// both the sweep in `mov` and the Fuser's neighborhood window.
    pub fn submap_for_region(&self, center: Vector2<f32>, length: Vector2<f32>) -> (LogicalIndex, GridSize) {
        let origin = self.footprint_origin();
        let half = length / 2.0;
        let min_world = center - half;
        let max_world = center + half;

        let col_min = ((min_world.x - origin.x) / self.resolution).floor();
        let col_max = ((max_world.x - origin.x) / self.resolution).floor();
        let row_min = ((min_world.y - origin.y) / self.resolution).floor();
        let row_max = ((max_world.y - origin.y) / self.resolution).floor();

        let clip = |v: f32, max: usize| -> Option<i64> {
            if v.is_nan() {
                return None;
            }
            Some((v as i64).clamp(0, max as i64 - 1))
        };

        let (Some(col_min), Some(col_max), Some(row_min), Some(row_max)) = (
            clip(col_min, self.cols),
            clip(col_max, self.cols),
            clip(row_min, self.rows),
            clip(row_max, self.rows),
        ) else {
            return ((0, 0), (0, 0));
        };

        if col_max < col_min || row_max < row_min || self.rows == 0 || self.cols == 0 {
            return ((0, 0), (0, 0));
        }

        let top_left = (row_min as usize, col_min as usize);
        let size = ((row_max - row_min + 1) as usize, (col_max - col_min + 1) as usize);
        (top_left, size)
    }
}

fn rem_euclid(v: i64, m: i64) -> usize {
    v.rem_euclid(m) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> CircularGrid {
        CircularGrid::new(
            (5, 5),
            0.1,
            Vector2::new(0.0, 0.0),
            &[Layer::Elevation, Layer::Variance],
            false,
        )
    }

    #[test]
    fn new_grid_starts_all_invalid() {
        let g = grid();
        for r in 0..5 {
            for c in 0..5 {
                assert!(g.at(Layer::Elevation, (r, c)).is_nan());
            }
        }
    }

    #[test]
    fn get_index_roundtrips_through_get_position() {
        let g = grid();
        let idx = g.get_index(Vector2::new(0.0, 0.0)).unwrap();
        let pos = g.get_position(idx);
        assert!((pos.x).abs() < 0.1);
        assert!((pos.y).abs() < 0.1);
    }

    #[test]
    fn get_index_outside_footprint_is_none() {
        let g = grid();
        assert!(g.get_index(Vector2::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn mov_preserves_data_and_clears_swept_strip() {
        let mut g = grid();
        let center_idx = g.get_index(Vector2::new(0.0, 0.0)).unwrap();
        *g.at_mut(Layer::Elevation, center_idx) = 1.23;
        let world_before = g.get_position(center_idx);

        // Shift by exactly 2 cells along x (0.2m at 0.1m resolution).
        g.mov(Vector2::new(0.2, 0.0), &[Layer::Elevation, Layer::Variance], false);

        // start_index advanced by 2 columns.
        assert_eq!(g.start_index().1, 2);

        // The originally populated cell now lives 2 columns earlier in
        // logical space but at the same world position.
        let shifted_idx = (center_idx.0, center_idx.1 - 2);
        assert_eq!(g.at(Layer::Elevation, shifted_idx), 1.23);
        let world_after = g.get_position(shifted_idx);
        assert!((world_after.x - world_before.x).abs() < 1e-5);

        // Newly swept-in column is NaN.
        assert!(g.at(Layer::Elevation, (center_idx.0, 4)).is_nan());
    }

    #[test]
    fn clear_all_resets_scalar_layers_only() {
        let mut g = grid();
        let idx = (0, 0);
        *g.at_mut(Layer::Elevation, idx) = 5.0;
        *g.at_mut(Layer::Variance, idx) = 0.1;
        g.clear_all(&[Layer::Elevation, Layer::Variance], false);
        assert!(g.at(Layer::Elevation, idx).is_nan());
        assert!(g.at(Layer::Variance, idx).is_nan());
    }

    #[test]
    fn submap_for_region_clips_to_grid_bounds() {
        let g = grid();
        let (top_left, size) = g.submap_for_region(Vector2::new(0.0, 0.0), Vector2::new(100.0, 100.0));
        assert_eq!(top_left, (0, 0));
        assert_eq!(size, (5, 5));
    }

    #[test]
    fn submap_for_region_small_window_is_single_cell() {
        let g = grid();
        let (_, size) = g.submap_for_region(Vector2::new(0.0, 0.0), Vector2::new(0.01, 0.01));
        assert_eq!(size, (1, 1));
    }
}
