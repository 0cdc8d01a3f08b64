//! Frame lookup abstraction for coordinate transforms between named frames.

use nalgebra::Isometry3;

use crate::error::EnvError;

/// Resolves the rigid transform from one named frame to another.
///
/// Production: a single static transform configured at startup (no
/// tf-tree); a real deployment would swap this for a lookup against a
/// transform tree library without the engine noticing.
pub trait FrameLookup: Send + Sync {
    fn lookup(&self, from: &str, to: &str) -> Result<Isometry3<f64>, EnvError>;
}

/// A fixed single-transform `FrameLookup`: resolves exactly one
/// `(from, to)` pair, typically `(grid, map)` or `(grid, odom)`.
pub struct StaticFrameLookup {
    from: String,
    to: String,
    transform: Isometry3<f64>,
}

impl StaticFrameLookup {
    pub fn new(from: impl Into<String>, to: impl Into<String>, transform: Isometry3<f64>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            transform,
        }
    }
}

impl FrameLookup for StaticFrameLookup {
    fn lookup(&self, from: &str, to: &str) -> Result<Isometry3<f64>, EnvError> {
        if from == self.from && to == self.to {
            Ok(self.transform)
        } else if from == self.to && to == self.from {
            Ok(self.transform.inverse())
        } else {
            Err(EnvError::UnknownFrame(format!("{from} -> {to}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pair_resolves_both_directions() {
        let lookup = StaticFrameLookup::new("grid", "map", Isometry3::identity());
        assert!(lookup.lookup("grid", "map").is_ok());
        assert!(lookup.lookup("map", "grid").is_ok());
    }

    #[test]
    fn unknown_pair_errors() {
        let lookup = StaticFrameLookup::new("grid", "map", Isometry3::identity());
        assert!(matches!(
            lookup.lookup("grid", "odom"),
            Err(EnvError::UnknownFrame(_))
        ));
    }
}
