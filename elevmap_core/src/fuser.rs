//! `Fuser` - Gaussian-weighted spatial fusion of a `RawMap` snapshot into
//! `FusedMap`.
//!
//! A fused cell blends every raw neighbor whose horizontal-variance
//! footprint could plausibly overlap it, weighted by how much of that
//! neighbor's probability mass actually lands on the center cell.

use nalgebra::Vector2;
use statrs::function::erf::erfc;
use tracing::error;

use crate::fused_map::FusedMap;
use crate::grid::{GridSize, Layer, LogicalIndex};
use crate::raw_map::RawMap;

/// Per-fusion summary, used for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FusionReport {
    pub cells_requested: usize,
    pub cells_skipped_already_fused: usize,
    pub cells_skipped_raw_invalid: usize,
    pub cells_copied_verbatim: usize,
    pub cells_fused: usize,
    pub cells_degenerate: usize,
}

/// Gaussian CDF `Φ(x; 0, s)`.
fn gaussian_cdf(x: f32, s: f32) -> f32 {
    0.5 * erfc((-x / (s * std::f64::consts::SQRT_2)) as f64) as f32
}

/// Probability mass of a Gaussian(0, s) falling within `[d - r/2, d + r/2]`.
fn axis_weight(d: f32, r: f32, s: f32) -> f32 {
    gaussian_cdf(d + r / 2.0, s) - gaussian_cdf(d - r / 2.0, s)
}

/// Fuses `raw` (a snapshot, already decoupled from the writer-side lock)
/// into `fused` over the logical rectangle `top_left..top_left+size`.
///
/// If `fused.timestamp != raw.timestamp`, the fused map
/// is cleared first (fusion always starts from a clean image whenever raw
/// has advanced). After the loop, `fused.timestamp` is set to
/// `raw.timestamp`.
pub fn fuse(
    fused: &mut FusedMap,
    raw: &RawMap,
    top_left: LogicalIndex,
    size: GridSize,
) -> FusionReport {
    let mut report = FusionReport::default();

    if fused.timestamp != raw.timestamp {
        fused.clear_all();
    }

    let resolution = raw.grid().resolution();
    let targets = fused.grid().submap_indices(top_left, size);
    report.cells_requested = targets.len();

    for c in targets {
        if fused.is_valid(c) {
            report.cells_skipped_already_fused += 1;
            continue;
        }
        if !raw.is_valid(c) {
            report.cells_skipped_raw_invalid += 1;
            continue;
        }

        let center_pos = raw.grid().get_position(c);
        let h_var_x_c = raw.h_var_x(c);
        let h_var_y_c = raw.h_var_y(c);
        let window_len = Vector2::new(4.0 * h_var_x_c.sqrt(), 4.0 * h_var_y_c.sqrt());
        let (win_top_left, win_size) = raw.grid().submap_for_region(center_pos, window_len);

        let mut sum_w = 0.0f32;
        let mut sum_w_mu = 0.0f32;
        let mut sum_w_sigma2_plus_mu2 = 0.0f32;

        for n in raw.grid().submap_indices(win_top_left, win_size) {
            if !raw.is_valid(n) {
                continue;
            }
            let mu_n = raw.elevation(n);
            let sigma2_n = raw.variance(n);
            if !sigma2_n.is_finite() {
                continue;
            }

            let pos_n = raw.grid().get_position(n);
            let d = pos_n - center_pos;
            let s_x = raw.h_var_x(n).sqrt();
            let s_y = raw.h_var_y(n).sqrt();
            let w = axis_weight(d.x.abs(), resolution, s_x) * axis_weight(d.y.abs(), resolution, s_y);

            if w <= 0.0 {
                continue;
            }
            sum_w += w;
            sum_w_mu += w * mu_n;
            sum_w_sigma2_plus_mu2 += w * (sigma2_n + mu_n * mu_n);
        }

        if sum_w <= 0.0 {
            fused.set_cell(c, raw.elevation(c), raw.variance(c), raw.color(c));
            report.cells_copied_verbatim += 1;
            continue;
        }

        let mu_bar = sum_w_mu / sum_w;
        let sigma2_bar = sum_w_sigma2_plus_mu2 / sum_w - mu_bar * mu_bar;

        if !mu_bar.is_finite() || !sigma2_bar.is_finite() {
            error!(?c, mu_bar, sigma2_bar, "degenerate fusion result, skipping cell");
            report.cells_degenerate += 1;
            continue;
        }

        fused.set_cell(c, mu_bar, sigma2_bar, raw.color(c));
        report.cells_fused += 1;
    }

    fused.timestamp = raw.timestamp;
    report
}
