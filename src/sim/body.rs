//! Contracts for things the driver advances
//!
//! - [`Steppable`]: advanced once per frame, never collides
//! - [`Collidable`]: proposes and commits poses, exposes geometry for
//!   collision detection, and is notified when it hits something

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::contract_violation;
use super::pose::Pose;

/// Handle of a registered body (stable for the lifetime of its registration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that propagates in time but takes no part in collisions
pub trait Steppable: Send {
    /// Advance by `dt` seconds. Called exactly once per physics frame.
    fn step(&mut self, dt: f64);
}

/// What a body is told after taking part in a confirmed collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// The other participant
    pub other: BodyId,
    /// Whether velocities were actually updated
    pub resolved: bool,
    /// World-space contact point
    pub contact: DVec2,
}

/// Committed pose plus the proposed pose for the frame being worked on
#[derive(Debug, Clone, Default)]
pub struct Kinematics {
    current: Pose,
    proposed: Option<Proposal>,
}

#[derive(Debug, Clone, Copy)]
struct Proposal {
    /// Time past `current` this pose was computed for
    dt: f64,
    pose: Pose,
}

impl Kinematics {
    pub fn new(current: Pose) -> Self {
        Self {
            current,
            proposed: None,
        }
    }

    /// The committed pose
    #[inline]
    pub fn current(&self) -> &Pose {
        &self.current
    }

    /// Mutable access to the committed pose. Drops any proposal, which was
    /// computed from the old value.
    pub fn current_mut(&mut self) -> &mut Pose {
        self.proposed = None;
        &mut self.current
    }

    /// Compute the proposed pose `dt` seconds after the committed one
    pub fn propose(&mut self, dt: f64) {
        self.proposed = Some(Proposal {
            dt,
            pose: self.current.propagated(dt),
        });
    }

    /// Store an externally computed proposal (for bodies with custom motion)
    pub fn propose_pose(&mut self, dt: f64, pose: Pose) {
        self.proposed = Some(Proposal { dt, pose });
    }

    /// The proposed pose. Reading it before [`Kinematics::propose`] is a
    /// contract violation.
    #[track_caller]
    pub fn proposed(&self) -> &Pose {
        match &self.proposed {
            Some(proposal) => &proposal.pose,
            None => contract_violation("proposed state read before it was computed"),
        }
    }

    /// Time offset of the current proposal, if there is one
    pub fn proposed_dt(&self) -> Option<f64> {
        self.proposed.map(|p| p.dt)
    }

    /// Move the proposed pose into the committed slot
    #[track_caller]
    pub fn commit(&mut self) {
        match self.proposed.take() {
            Some(proposal) => self.current = proposal.pose,
            None => contract_violation("commit called without a proposed state"),
        }
    }
}

/// A body taking part in collision detection.
///
/// Implementors supply geometry and flags; pose bookkeeping comes from the
/// provided methods over [`Kinematics`]. Override [`Collidable::propose`]
/// for motion that is not free flight.
pub trait Collidable: Send {
    fn kinematics(&self) -> &Kinematics;

    fn kinematics_mut(&mut self) -> &mut Kinematics;

    /// Radius of the smallest circle around the body origin enclosing the body
    fn radius(&self) -> f64;

    /// Points (local coordinates) that can penetrate other bodies
    fn sample_points(&self) -> &[DVec2];

    /// Whether a point given in local coordinates lies inside the body
    fn contains(&self, local: DVec2) -> bool;

    /// Whether collision detection applies to this body at all
    fn collisions_enabled(&self) -> bool {
        true
    }

    /// Whether collisions should change this body's velocity, or only notify it
    fn resolution_enabled(&self) -> bool {
        true
    }

    /// Called for every confirmed collision, resolved or not
    fn on_collision(&mut self, _event: &CollisionEvent) {}

    fn current(&self) -> &Pose {
        self.kinematics().current()
    }

    fn proposed(&self) -> &Pose {
        self.kinematics().proposed()
    }

    fn propose(&mut self, dt: f64) {
        self.kinematics_mut().propose(dt);
    }

    fn commit(&mut self) {
        self.kinematics_mut().commit();
    }
}

/// Owned collidable as stored by the driver
pub type BodyBox = Box<dyn Collidable>;

/// Owned steppable as stored by the driver
pub type SteppableBox = Box<dyn Steppable>;

#[cfg(test)]
mod tests {
    use super::*;

    fn moving() -> Kinematics {
        Kinematics::new(Pose::new(DVec2::ZERO, DVec2::new(1.0, 2.0)))
    }

    #[test]
    fn test_propose_then_commit() {
        let mut k = moving();
        k.propose(0.5);
        assert_eq!(k.proposed_dt(), Some(0.5));
        assert!((k.proposed().position - DVec2::new(0.5, 1.0)).length() < 1e-12);
        // Current is untouched until commit
        assert_eq!(k.current().position, DVec2::ZERO);

        k.commit();
        assert!((k.current().position - DVec2::new(0.5, 1.0)).length() < 1e-12);
        assert_eq!(k.proposed_dt(), None);
    }

    #[test]
    fn test_repropose_overwrites() {
        let mut k = moving();
        k.propose(1.0);
        k.propose(0.25);
        k.commit();
        assert!((k.current().position.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_custom_proposal_commits_as_given() {
        let mut k = moving();
        let target = Pose::new(DVec2::new(-3.0, 4.0), DVec2::new(0.0, -1.0));
        k.propose_pose(0.1, target);
        assert_eq!(k.proposed_dt(), Some(0.1));
        assert_eq!(k.proposed().position, target.position);
        assert_eq!(k.current().position, DVec2::ZERO);

        k.commit();
        assert_eq!(k.current().position, target.position);
        assert_eq!(k.current().velocity, target.velocity);
    }

    #[test]
    #[should_panic(expected = "proposed state read before it was computed")]
    fn test_proposed_before_propose_panics() {
        let k = moving();
        let _ = k.proposed();
    }

    #[test]
    #[should_panic(expected = "proposed state read before it was computed")]
    fn test_proposed_after_commit_panics() {
        let mut k = moving();
        k.propose(1.0);
        k.commit();
        let _ = k.proposed();
    }

    #[test]
    #[should_panic(expected = "commit called without a proposed state")]
    fn test_commit_without_proposal_panics() {
        let mut k = moving();
        k.commit();
    }

    #[test]
    fn test_current_mut_invalidates_proposal() {
        let mut k = moving();
        k.propose(1.0);
        k.current_mut().velocity = DVec2::ZERO;
        assert_eq!(k.proposed_dt(), None);
    }

    #[test]
    fn test_body_id_display() {
        assert_eq!(BodyId(7).to_string(), "#7");
    }
}
