//! Ready-made bodies
//!
//! - `Disc`: circle sampled at evenly spaced boundary points
//! - `Rect`: box sampled at its corners and edge midpoints
//! - `PointMass`: force-driven particle that never collides

use glam::DVec2;

use super::body::{Collidable, CollisionEvent, Kinematics, Steppable};
use super::pose::Pose;
use super::vector::VectorExt;

/// Boundary samples on a disc
pub const DISC_SAMPLE_COUNT: usize = 32;

/// Collision flags plus a record of what the body has hit
#[derive(Debug, Clone)]
struct ContactLog {
    collisions_enabled: bool,
    resolution_enabled: bool,
    count: u64,
    last: Option<CollisionEvent>,
}

impl Default for ContactLog {
    fn default() -> Self {
        Self {
            collisions_enabled: true,
            resolution_enabled: true,
            count: 0,
            last: None,
        }
    }
}

impl ContactLog {
    fn record(&mut self, event: &CollisionEvent) {
        self.count += 1;
        self.last = Some(*event);
    }
}

/// A solid circle
#[derive(Debug, Clone)]
pub struct Disc {
    kinematics: Kinematics,
    radius: f64,
    samples: Vec<DVec2>,
    contacts: ContactLog,
}

impl Disc {
    pub fn new(radius: f64, pose: Pose) -> Self {
        let samples = (0..DISC_SAMPLE_COUNT)
            .map(|i| {
                let theta = i as f64 * std::f64::consts::TAU / DISC_SAMPLE_COUNT as f64;
                DVec2::from_polar(radius, theta)
            })
            .collect();
        Self {
            kinematics: Kinematics::new(pose),
            radius,
            samples,
            contacts: ContactLog::default(),
        }
    }

    /// Builder: enable or disable collision detection
    pub fn with_collisions(mut self, enabled: bool) -> Self {
        self.contacts.collisions_enabled = enabled;
        self
    }

    /// Builder: detect collisions but leave velocities alone when `false`
    pub fn with_resolution(mut self, enabled: bool) -> Self {
        self.contacts.resolution_enabled = enabled;
        self
    }

    pub fn set_collisions_enabled(&mut self, enabled: bool) {
        self.contacts.collisions_enabled = enabled;
    }

    /// Number of collisions this disc has been notified of
    pub fn collision_count(&self) -> u64 {
        self.contacts.count
    }

    pub fn last_collision(&self) -> Option<&CollisionEvent> {
        self.contacts.last.as_ref()
    }
}

impl Collidable for Disc {
    fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.kinematics
    }

    fn radius(&self) -> f64 {
        self.radius
    }

    fn sample_points(&self) -> &[DVec2] {
        &self.samples
    }

    fn contains(&self, local: DVec2) -> bool {
        local.length_squared() < self.radius * self.radius
    }

    fn collisions_enabled(&self) -> bool {
        self.contacts.collisions_enabled
    }

    fn resolution_enabled(&self) -> bool {
        self.contacts.resolution_enabled
    }

    fn on_collision(&mut self, event: &CollisionEvent) {
        self.contacts.record(event);
    }
}

/// A solid box centred on its origin
#[derive(Debug, Clone)]
pub struct Rect {
    kinematics: Kinematics,
    half_extents: DVec2,
    samples: Vec<DVec2>,
    contacts: ContactLog,
}

impl Rect {
    pub fn new(width: f64, height: f64, pose: Pose) -> Self {
        let h = DVec2::new(width / 2.0, height / 2.0);
        let samples = vec![
            DVec2::new(-h.x, h.y),
            DVec2::new(0.0, h.y),
            DVec2::new(h.x, h.y),
            DVec2::new(h.x, 0.0),
            DVec2::new(h.x, -h.y),
            DVec2::new(0.0, -h.y),
            DVec2::new(-h.x, -h.y),
            DVec2::new(-h.x, 0.0),
        ];
        Self {
            kinematics: Kinematics::new(pose),
            half_extents: h,
            samples,
            contacts: ContactLog::default(),
        }
    }

    pub fn with_collisions(mut self, enabled: bool) -> Self {
        self.contacts.collisions_enabled = enabled;
        self
    }

    pub fn with_resolution(mut self, enabled: bool) -> Self {
        self.contacts.resolution_enabled = enabled;
        self
    }

    pub fn half_extents(&self) -> DVec2 {
        self.half_extents
    }

    pub fn collision_count(&self) -> u64 {
        self.contacts.count
    }

    pub fn last_collision(&self) -> Option<&CollisionEvent> {
        self.contacts.last.as_ref()
    }
}

impl Collidable for Rect {
    fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.kinematics
    }

    fn radius(&self) -> f64 {
        self.half_extents.length()
    }

    fn sample_points(&self) -> &[DVec2] {
        &self.samples
    }

    fn contains(&self, local: DVec2) -> bool {
        local.x.abs() < self.half_extents.x && local.y.abs() < self.half_extents.y
    }

    fn collisions_enabled(&self) -> bool {
        self.contacts.collisions_enabled
    }

    fn resolution_enabled(&self) -> bool {
        self.contacts.resolution_enabled
    }

    fn on_collision(&mut self, event: &CollisionEvent) {
        self.contacts.record(event);
    }
}

/// A particle with mass that integrates the forces applied to it
#[derive(Debug, Clone)]
pub struct PointMass {
    pub mass: f64,
    pub position: DVec2,
    pub velocity: DVec2,
    forces: Vec<DVec2>,
    steps: u64,
}

impl PointMass {
    pub fn new(mass: f64, position: DVec2, velocity: DVec2) -> Self {
        Self {
            mass,
            position,
            velocity,
            forces: Vec::new(),
            steps: 0,
        }
    }

    /// Queue a force (N) for the next step only
    pub fn apply_force(&mut self, force: DVec2) {
        self.forces.push(force);
    }

    /// Steps taken so far
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Steppable for PointMass {
    fn step(&mut self, dt: f64) {
        let total: DVec2 = self.forces.drain(..).sum();
        let acceleration = total / self.mass;

        // Semi-implicit Euler: velocity first, then position
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
        self.steps += 1;
    }
}
