//! Runtime parameters for the mapping engine.
//!
//! Set once at startup (via `MapEngine::set_parameters`); instance state,
//! not global state. An engine built for a different robot can carry a
//! different `EngineParams` in the same process.

/// Recognized parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    /// Floor of the clamp band for vertical variance.
    pub min_variance: f32,
    /// Ceiling of the clamp band for vertical variance; values above this
    /// become `+inf` rather than being capped.
    pub max_variance: f32,
    /// Floor of the clamp band for horizontal variance (both axes).
    pub min_horizontal_variance: f32,
    /// Ceiling of the clamp band for horizontal variance (both axes).
    pub max_horizontal_variance: f32,
    /// Mahalanobis-distance accept/reject boundary in integration.
    pub mahalanobis_threshold: f32,
    /// Non-negative additive variance penalty applied to outlier cells.
    pub multi_height_noise: f32,
    /// Opaque string propagated into outbound map messages.
    pub frame_id: String,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            min_variance: 1e-4,
            max_variance: 10.0,
            min_horizontal_variance: 1e-4,
            max_horizontal_variance: 0.5,
            mahalanobis_threshold: 2.0,
            multi_height_noise: 0.0015,
            frame_id: "map".to_string(),
        }
    }
}
