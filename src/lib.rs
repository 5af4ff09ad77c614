//! Kinetica - fixed-step 2D physics core
//!
//! Core modules:
//! - `sim`: bodies, broad phase, time-of-impact collisions and the stepping driver
//! - `settings`: step size, speed multiplier and broad-phase selection
//!
//! Angles follow a compass convention throughout: zero points north (+y) and
//! angles increase clockwise.

pub mod settings;
pub mod sim;

pub use settings::{BroadPhaseKind, ConfigError, SimConfig};

use glam::DVec2;
use std::f64::consts::TAU;

/// Simulation constants
pub mod consts {
    /// Default simulated time per physics frame (milliseconds)
    pub const DEFAULT_STEP_MS: u64 = 17;
    /// Default ratio of simulated time to wall-clock time
    pub const DEFAULT_SPEED_MULTIPLIER: f64 = 1.0;
    /// Precision of the impact-time bisection (seconds)
    pub const COLLISION_TIME_PRECISION: f64 = 1e-6;
    /// Precision of the penetration bisection, as a fraction of the search segment
    pub const PENETRATION_PRECISION: f64 = 1e-6;
    /// Boundary samples used to find the contact edge (one per degree, both ends inclusive)
    pub const EDGE_SAMPLES: usize = 361;
    /// Smallest edge sampling circle radius, as a fraction of the collider's centre-to-contact distance
    pub const MIN_EDGE_CIRCLE_FRACTION: f64 = 1e-3;
    pub const MILLISECOND_TO_SECOND: f64 = 0.001;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds up to TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert (magnitude, direction) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(magnitude: f64, direction: f64) -> DVec2 {
    DVec2::new(magnitude * direction.sin(), magnitude * direction.cos())
}

/// Convert cartesian (x, y) to (magnitude, direction)
#[inline]
pub fn cartesian_to_polar(v: DVec2) -> (f64, f64) {
    (v.length(), normalize_angle(v.x.atan2(v.y)))
}
