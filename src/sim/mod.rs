//! Physics core
//!
//! Everything that moves lives here:
//! - Two-slot body state (committed and proposed poses)
//! - Broad-phase candidate search over bounding circles
//! - Time-of-impact search and velocity-reflection response
//! - The fixed-step driver and its read-only snapshots
//!
//! The driver's thread is the only mutator of body state. Readers go through
//! [`WorldSnapshot`].

pub mod body;
pub mod broad_phase;
pub mod collision;
pub mod error;
pub mod pose;
pub mod registry;
pub mod shapes;
pub mod snapshot;
pub mod stats;
pub mod system;
pub mod vector;
pub mod world;

pub use body::{BodyBox, BodyId, Collidable, CollisionEvent, Kinematics, Steppable, SteppableBox};
pub use broad_phase::{AxisSweep, BroadPhase, BruteForce, CandidatePair};
pub use collision::{Collision, Impact, Outcome, Rejection};
pub use error::SimError;
pub use pose::Pose;
pub use registry::Registry;
pub use shapes::{Disc, PointMass, Rect};
pub use snapshot::{BodySnapshot, WorldSnapshot};
pub use stats::{FrameStats, RollingAverage};
pub use system::PhysicsSystem;
pub use vector::{Vector, VectorExt};
pub use world::{StepReport, World};

/// Log and abort on a broken invariant.
///
/// Reaching this is a programming error, never an expected runtime condition.
#[track_caller]
pub(crate) fn contract_violation(message: &str) -> ! {
    log::error!("{message}");
    panic!("{message}");
}
