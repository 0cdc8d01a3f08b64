//! Synthetic ground-truth terrain: a closed-form heightfield the point
//! cloud generator samples from, so a simulated run has a known answer to
//! compare fused output against.

use nalgebra::Vector2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// A few superposed sinusoids plus a random per-run phase, giving rolling
/// terrain that is still analytically evaluable at any `(x, y)`.
#[derive(Debug, Clone)]
pub struct SyntheticTerrain {
    amplitude_m: f64,
    wavelength_m: f64,
    phase_x: f64,
    phase_y: f64,
}

impl SyntheticTerrain {
    /// Builds terrain seeded from `rng`, so a given master seed always
    /// produces the same ground truth.
    pub fn new(rng: &mut ChaCha8Rng, amplitude_m: f64, wavelength_m: f64) -> Self {
        Self {
            amplitude_m,
            wavelength_m,
            phase_x: rng.gen_range(0.0..std::f64::consts::TAU),
            phase_y: rng.gen_range(0.0..std::f64::consts::TAU),
        }
    }

    /// True elevation at world position `(x, y)`.
    pub fn height(&self, pos: Vector2<f64>) -> f64 {
        let k = std::f64::consts::TAU / self.wavelength_m;
        self.amplitude_m
            * 0.5
            * ((k * pos.x + self.phase_x).sin() + (k * pos.y + self.phase_y).cos())
    }
}
