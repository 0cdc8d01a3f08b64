//! `Propagator` - additive update of variance layers from externally
//! computed deltas (e.g. robot motion uncertainty).

use nalgebra::DMatrix;

use crate::error::MapError;
use crate::grid::Layer;
use crate::params::EngineParams;
use crate::raw_map::RawMap;

/// Adds `delta_v`, `delta_hx`, `delta_hy` element-wise (logical row-major
/// order) to the corresponding layers of `raw`, then clamps and stamps the
/// timestamp. Each matrix must have exactly the grid's shape.
pub fn propagate(
    raw: &mut RawMap,
    delta_v: &DMatrix<f32>,
    delta_hx: &DMatrix<f32>,
    delta_hy: &DMatrix<f32>,
    t: u64,
    params: &EngineParams,
) -> Result<(), MapError> {
    let expected = raw.grid().size();
    for m in [delta_v, delta_hx, delta_hy] {
        let actual = (m.nrows(), m.ncols());
        if actual != expected {
            return Err(MapError::SizeMismatch { expected, actual });
        }
    }

    let (rows, cols) = expected;
    for r in 0..rows {
        for c in 0..cols {
            *raw.grid_mut().at_mut(Layer::Variance, (r, c)) += delta_v[(r, c)];
            *raw.grid_mut().at_mut(Layer::HorizontalVarianceX, (r, c)) += delta_hx[(r, c)];
            *raw.grid_mut().at_mut(Layer::HorizontalVarianceY, (r, c)) += delta_hy[(r, c)];
        }
    }

    raw.clamp_variance_layers(params);
    raw.timestamp = t;
    Ok(())
}
