//! `Integrator` - folds a point cloud with per-point variance into `RawMap`.

use crate::error::MapError;
use crate::message::PointSample;
use crate::params::EngineParams;
use crate::raw_map::RawMap;

/// Per-cloud summary returned alongside the mutation, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegrationReport {
    pub points_in: usize,
    pub points_out_of_map: usize,
    pub cells_initialized: usize,
    pub cells_updated: usize,
    pub cells_rejected_outlier: usize,
}

/// Folds `points` (with parallel `variances`, one per point, `> 0`) into
/// `raw` at timestamp `t`. Points outside the grid footprint are skipped.
pub fn integrate(
    raw: &mut RawMap,
    points: &[PointSample],
    variances: &[f32],
    t: u64,
    params: &EngineParams,
) -> Result<IntegrationReport, MapError> {
    if points.len() != variances.len() {
        return Err(MapError::LengthMismatch {
            points: points.len(),
            variances: variances.len(),
        });
    }

    let mut report = IntegrationReport {
        points_in: points.len(),
        ..Default::default()
    };

    for (p, &var_p) in points.iter().zip(variances) {
        let idx = match raw
            .grid()
            .get_index(nalgebra::Vector2::new(p.x, p.y))
        {
            Some(idx) => idx,
            None => {
                report.points_out_of_map += 1;
                continue;
            }
        };

        if !raw.is_valid(idx) {
            *raw.grid_mut().at_mut(crate::grid::Layer::Elevation, idx) = p.z;
            *raw.grid_mut().at_mut(crate::grid::Layer::Variance, idx) = var_p;
            *raw.grid_mut().at_mut(crate::grid::Layer::HorizontalVarianceX, idx) =
                params.min_horizontal_variance;
            *raw.grid_mut().at_mut(crate::grid::Layer::HorizontalVarianceY, idx) =
                params.min_horizontal_variance;
            *raw.grid_mut().color_at_mut(idx) = p.rgb;
            report.cells_initialized += 1;
            continue;
        }

        let elevation = raw.elevation(idx);
        let variance = raw.variance(idx);
        let d = ((p.z - elevation).powi(2) / variance).sqrt();

        if d < params.mahalanobis_threshold {
            let new_elevation =
                (variance * p.z + var_p * elevation) / (variance + var_p);
            let new_variance = (var_p * variance) / (var_p + variance);
            *raw.grid_mut().at_mut(crate::grid::Layer::Elevation, idx) = new_elevation;
            *raw.grid_mut().at_mut(crate::grid::Layer::Variance, idx) = new_variance;
            // TODO: blend with the existing color instead of overwriting it.
            *raw.grid_mut().color_at_mut(idx) = p.rgb;
            report.cells_updated += 1;
        } else {
            *raw.grid_mut().at_mut(crate::grid::Layer::Variance, idx) =
                variance + params.multi_height_noise;
            *raw.grid_mut().at_mut(crate::grid::Layer::HorizontalVarianceX, idx) =
                params.min_horizontal_variance;
            *raw.grid_mut().at_mut(crate::grid::Layer::HorizontalVarianceY, idx) =
                params.min_horizontal_variance;
            report.cells_rejected_outlier += 1;
        }
    }

    raw.clamp_variance_layers(params);
    raw.timestamp = t;
    Ok(report)
}
