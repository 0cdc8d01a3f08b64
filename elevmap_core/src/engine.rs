//! `MapEngine` - orchestration, locking discipline and geometry changes
//! over the `RawMap` / `FusedMap` pair.

use std::sync::{Mutex, TryLockError};

use nalgebra::{DMatrix, Isometry3, Point3, Vector2};
use tracing::{debug, warn};

use crate::error::MapError;
use crate::fused_map::FusedMap;
use crate::fuser::{self, FusionReport};
use crate::grid::{GridSize, LogicalIndex};
use crate::integrator::{self, IntegrationReport};
use crate::message::{FusedMapMessage, PointSample, RawMapMessage};
use crate::params::EngineParams;
use crate::propagator;
use crate::raw_map::RawMap;

/// The probabilistic 2.5D elevation map engine.
///
/// Owns two independent locks, `raw_lock` and `fused_lock`.
/// Both are plain `std::sync::Mutex`: the engine's public API is
/// synchronous and CPU-bound, so there is no async runtime to hand control
/// back to while waiting, and `Mutex::try_lock` already gives `move` the
/// non-blocking probe it needs on the fused side.
pub struct MapEngine {
    raw_lock: Mutex<RawMap>,
    fused_lock: Mutex<FusedMap>,
    params: Mutex<EngineParams>,
    pose: Mutex<Isometry3<f64>>,
}

impl MapEngine {
    /// Allocates both grids with the given geometry; all cells start
    /// invalid.
    pub fn new(size: GridSize, resolution: f32, center: Vector2<f32>) -> Self {
        Self {
            raw_lock: Mutex::new(RawMap::new(size, resolution, center)),
            fused_lock: Mutex::new(FusedMap::new(size, resolution, center)),
            params: Mutex::new(EngineParams::default()),
            pose: Mutex::new(Isometry3::identity()),
        }
    }

    /// Replaces the engine's runtime parameters. Takes effect
    /// on the next `integrate`/`propagate` call.
    pub fn set_parameters(&self, params: EngineParams) {
        *self.params.lock().unwrap() = params;
    }

    pub fn parameters(&self) -> EngineParams {
        self.params.lock().unwrap().clone()
    }

    /// Sets the grid-to-parent-frame pose used by
    /// `position_3d_in_parent_frame`.
    pub fn set_pose(&self, pose: Isometry3<f64>) {
        *self.pose.lock().unwrap() = pose;
    }

    pub fn pose(&self) -> Isometry3<f64> {
        *self.pose.lock().unwrap()
    }

    /// Reallocates both grids with new geometry. All cells start invalid.
    pub fn set_geometry(&self, size: GridSize, resolution: f32, center: Vector2<f32>) {
        let mut raw = self.raw_lock.lock().unwrap();
        let mut fused = self.fused_lock.lock().unwrap();
        *raw = RawMap::new(size, resolution, center);
        *fused = FusedMap::new(size, resolution, center);
    }

    /// Folds a point cloud (with parallel per-point variances) into the
    /// raw map. Acquires `raw_lock` for the whole operation.
    pub fn integrate(
        &self,
        points: &[PointSample],
        variances: &[f32],
        timestamp: u64,
    ) -> Result<IntegrationReport, MapError> {
        let params = self.parameters();
        let mut raw = self.raw_lock.lock().unwrap();
        integrator::integrate(&mut raw, points, variances, timestamp, &params)
    }

    /// Transforms `index`'s cell (its grid-frame position and elevation)
    /// into the parent frame, using the pose set by `set_pose`.
    pub fn position_3d_in_parent_frame(&self, index: LogicalIndex) -> Point3<f64> {
        let pose = self.pose();
        let raw = self.raw_lock.lock().unwrap();
        let pos = raw.grid().get_position(index);
        let elevation = raw.elevation(index);
        crate::pose::position_3d_in_parent_frame(&pose, pos.x, pos.y, elevation)
    }

    /// Applies externally computed variance deltas to the raw map.
    /// Acquires `raw_lock` for the whole operation.
    pub fn propagate(
        &self,
        delta_v: &DMatrix<f32>,
        delta_hx: &DMatrix<f32>,
        delta_hy: &DMatrix<f32>,
        timestamp: u64,
    ) -> Result<(), MapError> {
        let params = self.parameters();
        let mut raw = self.raw_lock.lock().unwrap();
        propagator::propagate(&mut raw, delta_v, delta_hx, delta_hy, timestamp, &params)
    }

    /// Fuses the whole grid.
    pub fn fuse_all(&self) -> FusionReport {
        let mut fused = self.fused_lock.lock().unwrap();
        let size = fused.grid().size();
        let snapshot = self.snapshot_raw();
        fuser::fuse(&mut fused, &snapshot, (0, 0), size)
    }

    /// Fuses only the world-space window `center ± length/2`.
    pub fn fuse_area(&self, center: Vector2<f32>, length: Vector2<f32>) -> FusionReport {
        let mut fused = self.fused_lock.lock().unwrap();
        let (top_left, size) = fused.grid().submap_for_region(center, length);
        if size.0 == 0 || size.1 == 0 {
            debug!("fuse_area requested with zero-area window, no-op");
            return FusionReport::default();
        }
        let snapshot = self.snapshot_raw();
        fuser::fuse(&mut fused, &snapshot, top_left, size)
    }

    /// Takes a deep-value-copy snapshot of the raw map under a brief
    /// `raw_lock` acquisition, then releases it. Fusion's compute phase
    /// runs unlocked against this snapshot so integration/propagation are
    /// never starved by a large fusion.
    fn snapshot_raw(&self) -> RawMap {
        self.raw_lock.lock().unwrap().snapshot()
    }

    /// Clears both maps (`elevation`/`variance` to `NaN`, fused `color` to
    /// zero). Acquires `raw_lock`, then `fused_lock`, in that order.
    pub fn reset(&self) {
        let mut raw = self.raw_lock.lock().unwrap();
        let mut fused = self.fused_lock.lock().unwrap();
        raw.clear_all();
        fused.clear_all();
    }

    /// Rigid translation of both grids to (approximately) `new_center`.
    ///
    /// The only operation that may silently downgrade: it always moves
    /// the raw map, but only *tries* to move the fused map. If fusion is
    /// in progress and holding `fused_lock`, the fused map is left
    /// un-moved for this call; the next `fuse*` will observe the
    /// resulting timestamp mismatch (or geometry drift) and fully
    /// re-clear before refilling, so no stale fused data survives.
    pub fn mov(&self, new_center: Vector2<f32>) {
        {
            let mut raw = self.raw_lock.lock().unwrap();
            raw.mov(new_center);
        }
        match self.fused_lock.try_lock() {
            Ok(mut fused) => fused.mov(new_center),
            Err(TryLockError::WouldBlock) => {
                warn!("fused map busy during move; deferring to next fusion");
            }
            Err(TryLockError::Poisoned(e)) => panic!("fused_lock poisoned: {e}"),
        }
    }

    pub fn raw_snapshot(&self, frame_id: &str) -> RawMapMessage {
        RawMapMessage::from_raw(&self.raw_lock.lock().unwrap(), frame_id)
    }

    pub fn fused_snapshot(&self, frame_id: &str) -> FusedMapMessage {
        FusedMapMessage::from_fused(&self.fused_lock.lock().unwrap(), frame_id)
    }

    pub fn time_of_last_update(&self) -> u64 {
        self.raw_lock.lock().unwrap().timestamp
    }

    pub fn time_of_last_fusion(&self) -> u64 {
        self.fused_lock.lock().unwrap().timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f32, y: f32, z: f32, rgb: u32) -> PointSample {
        PointSample { x, y, z, rgb }
    }

    #[test]
    fn integrate_then_fuse_round_trip() {
        let engine = MapEngine::new((5, 5), 0.1, Vector2::new(0.0, 0.0));
        engine.integrate(&[sample(0.0, 0.0, 1.0, 0xAABBCC)], &[0.01], 1).unwrap();
        assert_eq!(engine.time_of_last_update(), 1);

        engine.fuse_all();
        assert_eq!(engine.time_of_last_fusion(), 1);

        let msg = engine.fused_snapshot("map");
        assert_eq!(msg.frame_id, "map");
    }

    #[test]
    fn fuse_after_further_integration_reflects_snapshot_timestamp() {
        let engine = MapEngine::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        engine.integrate(&[sample(0.0, 0.0, 1.0, 0)], &[0.01], 1).unwrap();
        engine.fuse_all();
        assert_eq!(engine.time_of_last_fusion(), 1);

        engine.integrate(&[sample(0.0, 0.0, 1.1, 0)], &[0.01], 2).unwrap();
        assert_eq!(engine.time_of_last_fusion(), 1, "stale fuse time until re-fused");

        engine.fuse_all();
        assert_eq!(engine.time_of_last_fusion(), 2);
    }

    #[test]
    fn fused_timestamp_never_exceeds_raw_timestamp() {
        let engine = MapEngine::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        for t in 1..=5u64 {
            engine.integrate(&[sample(0.0, 0.0, 1.0 + t as f32 * 0.01, 0)], &[0.01], t).unwrap();
            if t % 2 == 0 {
                engine.fuse_all();
            }
            assert!(engine.time_of_last_fusion() <= engine.time_of_last_update());
        }
    }

    #[test]
    fn reset_clears_both_maps() {
        let engine = MapEngine::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        engine.integrate(&[sample(0.0, 0.0, 1.0, 0)], &[0.01], 1).unwrap();
        engine.fuse_all();
        engine.reset();
        assert_eq!(engine.time_of_last_update(), 0);
        let msg = engine.raw_snapshot("map");
        assert!(msg.elevation.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn mov_degrades_gracefully_when_fused_lock_is_held() {
        let engine = MapEngine::new((5, 5), 0.1, Vector2::new(0.0, 0.0));
        engine.integrate(&[sample(0.0, 0.0, 1.0, 0)], &[0.01], 1).unwrap();

        let fused_guard = engine.fused_lock.lock().unwrap();
        engine.mov(Vector2::new(0.2, 0.0));
        drop(fused_guard);

        // Raw map moved regardless; fused map was left alone for this call.
        assert_eq!(engine.raw_lock.lock().unwrap().grid().center(), Vector2::new(0.2, 0.0));
    }

    #[test]
    fn integrate_rejects_mismatched_lengths() {
        let engine = MapEngine::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        let err = engine
            .integrate(&[sample(0.0, 0.0, 1.0, 0), sample(0.1, 0.1, 1.0, 0)], &[0.01], 1)
            .unwrap_err();
        assert_eq!(
            err,
            MapError::LengthMismatch {
                points: 2,
                variances: 1,
            }
        );
    }

    #[test]
    fn position_3d_in_parent_frame_applies_stored_pose() {
        let engine = MapEngine::new((3, 3), 0.1, Vector2::new(0.0, 0.0));
        engine.integrate(&[sample(0.0, 0.0, 1.0, 0)], &[0.01], 1).unwrap();
        engine.set_pose(Isometry3::translation(1.0, 2.0, 3.0));

        let idx = (1, 1);
        let p = engine.position_3d_in_parent_frame(idx);
        assert!((p.z - 4.0).abs() < 1e-9);
        assert!((p.x - 1.0).abs() < 1e-9);
        assert!((p.y - 2.0).abs() < 1e-9);
    }
}
