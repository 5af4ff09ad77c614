//! Pose: where a body is, where it is heading, and how it is turned

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::vector::VectorExt;

/// Position, velocity, orientation and spin of a body
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// World position of the body origin (m)
    pub position: DVec2,
    /// Linear velocity (m/s)
    pub velocity: DVec2,
    /// Orientation (radians, clockwise from north)
    pub angle: f64,
    /// Angular velocity (radians/s, clockwise positive)
    pub angular_velocity: f64,
}

impl Pose {
    pub fn new(position: DVec2, velocity: DVec2) -> Self {
        Self {
            position,
            velocity,
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }

    /// Same pose with the given orientation and spin
    pub fn with_rotation(mut self, angle: f64, angular_velocity: f64) -> Self {
        self.angle = angle;
        self.angular_velocity = angular_velocity;
        self
    }

    /// Local body coordinates to world coordinates
    #[inline]
    pub fn to_world(&self, local: DVec2) -> DVec2 {
        self.position + local.rotated(self.angle)
    }

    /// World coordinates to local body coordinates (exact inverse of [`Pose::to_world`])
    #[inline]
    pub fn to_local(&self, world: DVec2) -> DVec2 {
        (world - self.position).rotated(-self.angle)
    }

    /// Pose after `dt` seconds of free motion (constant velocity and spin)
    pub fn propagated(&self, dt: f64) -> Self {
        Self {
            position: self.position + self.velocity * dt,
            velocity: self.velocity,
            angle: self.angle + self.angular_velocity * dt,
            angular_velocity: self.angular_velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    #[test]
    fn test_to_world_rotates_then_translates() {
        let pose = Pose::new(DVec2::new(10.0, 5.0), DVec2::ZERO).with_rotation(PI / 2.0, 0.0);
        // A point one metre "ahead" (north) of the body ends up east of it
        let world = pose.to_world(DVec2::new(0.0, 1.0));
        assert!((world - DVec2::new(11.0, 5.0)).length() < 1e-12);
    }

    #[test]
    fn test_to_local_identity_pose() {
        let pose = Pose::default();
        let p = DVec2::new(-2.5, 7.0);
        assert_eq!(pose.to_local(p), p);
        assert_eq!(pose.to_world(p), p);
    }

    #[test]
    fn test_propagated() {
        let pose = Pose::new(DVec2::new(1.0, 1.0), DVec2::new(2.0, -1.0)).with_rotation(0.5, 0.25);
        let next = pose.propagated(2.0);
        assert!((next.position - DVec2::new(5.0, -1.0)).length() < 1e-12);
        assert_eq!(next.velocity, pose.velocity);
        assert!((next.angle - 1.0).abs() < 1e-12);
        assert_eq!(next.angular_velocity, 0.25);

        // Zero time is the identity
        assert_eq!(pose.propagated(0.0), pose);
    }

    proptest! {
        #[test]
        fn local_world_round_trip(
            px in -1.0e3f64..1.0e3,
            py in -1.0e3f64..1.0e3,
            angle in -20.0f64..20.0,
            lx in -1.0e2f64..1.0e2,
            ly in -1.0e2f64..1.0e2,
        ) {
            let pose = Pose::new(DVec2::new(px, py), DVec2::ZERO).with_rotation(angle, 0.0);
            let local = DVec2::new(lx, ly);
            let back = pose.to_local(pose.to_world(local));
            prop_assert!((back - local).length() < 1e-9);
        }
    }
}
