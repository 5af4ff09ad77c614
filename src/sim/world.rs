//! Body registries and the per-frame stepping algorithm
//!
//! [`World`] is single-threaded and owns everything it steps. The threaded
//! driver in [`super::system`] wraps it behind a lock.

use super::body::{BodyBox, BodyId, Collidable, Steppable, SteppableBox};
use super::broad_phase::{AxisSweep, BroadPhase};
use super::collision::Collision;
use super::contract_violation;
use super::error::SimError;
use super::registry::Registry;
use super::snapshot::{BodySnapshot, WorldSnapshot};

/// What happened during one call to [`World::step`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Confirmed collisions handled (resolved or notify-only)
    pub collisions: u32,
    /// Confirmed collisions whose velocities were updated
    pub resolved: u32,
    /// Candidates dropped as false positives or start-of-frame overlaps
    pub rejected: u32,
    /// Passes of the collision loop, including the final empty one
    pub iterations: u32,
}

/// Registered bodies, the broad-phase strategy and the simulation clock
pub struct World {
    collidables: Registry<BodyBox>,
    steppables: Registry<SteppableBox>,
    broad_phase: Box<dyn BroadPhase>,
    next_id: u64,
    frame: u64,
    sim_time: f64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Box::new(AxisSweep))
    }
}

impl World {
    pub fn new(broad_phase: Box<dyn BroadPhase>) -> Self {
        Self {
            collidables: Registry::new(),
            steppables: Registry::new(),
            broad_phase,
            next_id: 0,
            frame: 0,
            sim_time: 0.0,
        }
    }

    fn allocate_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Keep generated ids clear of ones supplied by callers
    fn reserve_id(&mut self, id: BodyId) {
        self.next_id = self.next_id.max(id.0.saturating_add(1));
    }

    /// Register a collidable under a fresh id
    pub fn add_collidable<C: Collidable + 'static>(&mut self, body: C) -> BodyId {
        let id = self.allocate_id();
        // Fresh ids are never registered
        let _ = self.collidables.insert(id, Box::new(body));
        id
    }

    /// Register a boxed collidable under a caller-chosen id
    pub fn insert_collidable(&mut self, id: BodyId, body: BodyBox) -> Result<(), SimError> {
        self.collidables.insert(id, body)?;
        self.reserve_id(id);
        Ok(())
    }

    pub fn remove_collidable(&mut self, id: BodyId) -> Option<BodyBox> {
        self.collidables.remove(id)
    }

    pub fn clear_collidables(&mut self) {
        self.collidables.clear();
    }

    pub fn collidable(&self, id: BodyId) -> Option<&dyn Collidable> {
        self.collidables.get(id).map(|body| &**body)
    }

    pub fn collidable_count(&self) -> usize {
        self.collidables.len()
    }

    /// Register a steppable under a fresh id
    pub fn add_steppable<S: Steppable + 'static>(&mut self, steppable: S) -> BodyId {
        let id = self.allocate_id();
        let _ = self.steppables.insert(id, Box::new(steppable));
        id
    }

    pub fn insert_steppable(&mut self, id: BodyId, steppable: SteppableBox) -> Result<(), SimError> {
        self.steppables.insert(id, steppable)?;
        self.reserve_id(id);
        Ok(())
    }

    pub fn remove_steppable(&mut self, id: BodyId) -> Option<SteppableBox> {
        self.steppables.remove(id)
    }

    pub fn clear_steppables(&mut self) {
        self.steppables.clear();
    }

    pub fn steppable_count(&self) -> usize {
        self.steppables.len()
    }

    pub fn set_broad_phase(&mut self, broad_phase: Box<dyn BroadPhase>) {
        log::info!(
            "broad phase switched from {} to {}",
            self.broad_phase.name(),
            broad_phase.name()
        );
        self.broad_phase = broad_phase;
    }

    pub fn broad_phase_name(&self) -> &'static str {
        self.broad_phase.name()
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds stepped so far
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// Advance everything by `dt` seconds.
    ///
    /// Collidables move in sub-steps between successive earliest impacts so
    /// every body is committed at the same instant before each resolution.
    /// Steppables are advanced once with the full `dt` afterwards.
    pub fn step(&mut self, dt: f64) -> StepReport {
        let mut report = StepReport::default();
        let mut remaining = dt;

        let (ids, bodies) = self.collidables.split_mut();
        loop {
            report.iterations += 1;
            propose_all(bodies, remaining);

            let candidates = self.broad_phase.find_candidates(bodies, remaining);
            let mut earliest: Option<&Collision> = None;
            for candidate in &candidates {
                if !candidate.is_confirmed() {
                    report.rejected += 1;
                    continue;
                }
                // Strict comparison keeps the first of equal impacts
                if earliest.is_none_or(|best| candidate.impact_time() < best.impact_time()) {
                    earliest = Some(candidate);
                }
            }
            let Some(collision) = earliest else {
                break;
            };

            let t = collision.impact_time();
            if t <= 0.0 {
                contract_violation("collision loop made no progress: zero impact time");
            }
            advance_all(bodies, t);
            remaining -= t;

            report.collisions += 1;
            if collision.resolve(bodies, ids) {
                report.resolved += 1;
            }
        }
        advance_all(bodies, remaining.max(0.0));

        for steppable in self.steppables.items_mut() {
            steppable.step(dt);
        }

        self.frame += 1;
        self.sim_time += dt;
        report
    }

    /// Committed state of every collidable
    pub fn snapshot(&self) -> WorldSnapshot {
        let bodies = self
            .collidables
            .iter()
            .map(|(id, body)| BodySnapshot::capture(id, &**body))
            .collect();
        WorldSnapshot {
            frame: self.frame,
            sim_time: self.sim_time,
            bodies,
            steppables: self.steppables.len(),
        }
    }
}

fn propose_all(bodies: &mut [BodyBox], dt: f64) {
    for body in bodies.iter_mut() {
        body.propose(dt);
    }
}

/// Propose and commit every body `dt` ahead
fn advance_all(bodies: &mut [BodyBox], dt: f64) {
    for body in bodies.iter_mut() {
        body.propose(dt);
        body.commit();
    }
}
