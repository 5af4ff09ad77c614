//! Read-only views of committed state
//!
//! The driver publishes a fresh [`WorldSnapshot`] after every frame. Readers
//! hold an `Arc` to it for as long as they like without blocking stepping.

use glam::DVec2;
use serde::Serialize;

use super::body::{BodyId, Collidable};
use super::pose::Pose;

/// Committed pose and geometry of one collidable
#[derive(Debug, Clone, Serialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub pose: Pose,
    pub radius: f64,
    /// Sample points in world coordinates
    pub outline: Vec<DVec2>,
}

impl BodySnapshot {
    pub fn capture(id: BodyId, body: &dyn Collidable) -> Self {
        let pose = *body.current();
        Self {
            id,
            pose,
            radius: body.radius(),
            outline: body
                .sample_points()
                .iter()
                .map(|&local| pose.to_world(local))
                .collect(),
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorldSnapshot {
    /// Frames stepped when this was taken
    pub frame: u64,
    /// Simulated seconds stepped when this was taken
    pub sim_time: f64,
    pub bodies: Vec<BodySnapshot>,
    /// Number of registered steppables
    pub steppables: usize,
}

impl WorldSnapshot {
    pub fn body(&self, id: BodyId) -> Option<&BodySnapshot> {
        self.bodies.iter().find(|body| body.id == id)
    }

    /// Sum of squared speeds over all bodies (a unit-mass kinetic energy proxy)
    pub fn speed_squared_sum(&self) -> f64 {
        self.bodies
            .iter()
            .map(|body| body.pose.velocity.length_squared())
            .sum()
    }
}
