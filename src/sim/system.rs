//! Threaded fixed-step driver
//!
//! [`PhysicsSystem`] owns a [`World`] and steps it on a dedicated `physics`
//! thread. Separate locks guard:
//! - the world (registries and broad-phase strategy), held for a whole frame
//! - timing (step size, speed multiplier), never held while stepping
//! - lifecycle flags, paired with a condvar for the end-of-frame and pause waits
//! - the published snapshot and the frame statistics
//!
//! The end-of-frame wait is the only place the loop blocks, and the only
//! place a stop or pause request cuts in.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};

use super::body::{BodyBox, BodyId, Collidable, Steppable, SteppableBox};
use super::broad_phase::BroadPhase;
use super::error::SimError;
use super::snapshot::WorldSnapshot;
use super::stats::FrameStats;
use super::world::{StepReport, World};
use crate::consts::MILLISECOND_TO_SECOND;
use crate::settings::SimConfig;

/// Frames averaged for the step-time statistic
const STATS_WINDOW: usize = 60;

/// Step size and speed multiplier
#[derive(Debug, Clone, Copy)]
struct Timing {
    step_ms: u64,
    speed_multiplier: f64,
}

impl Timing {
    /// Simulated seconds per frame
    fn step_seconds(&self) -> f64 {
        self.step_ms as f64 * MILLISECOND_TO_SECOND
    }

    /// Wall-clock time per frame
    fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.step_seconds() / self.speed_multiplier).unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Default)]
struct Control {
    running: bool,
    paused: bool,
}

struct Shared {
    world: Mutex<World>,
    timing: Mutex<Timing>,
    control: Mutex<Control>,
    wake: Condvar,
    snapshot: RwLock<Arc<WorldSnapshot>>,
    stats: Mutex<FrameStats>,
}

impl Shared {
    fn publish(&self, world: &World) {
        let snapshot = Arc::new(world.snapshot());
        *self.snapshot.write() = snapshot;
    }

    fn step(&self, dt: f64) -> StepReport {
        let mut world = self.world.lock();
        let report = world.step(dt);
        self.publish(&world);
        report
    }
}

/// Clears the running flag however the loop exits
struct RunningGuard<'a>(&'a Shared);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.control.lock().running = false;
        self.0.wake.notify_all();
    }
}

fn run(shared: &Shared) {
    let _guard = RunningGuard(shared);

    loop {
        {
            let mut control = shared.control.lock();
            while control.running && control.paused {
                shared.wake.wait(&mut control);
            }
            if !control.running {
                break;
            }
        }

        let timing = *shared.timing.lock();
        let period = timing.period();
        let started = Instant::now();
        let report = shared.step(timing.step_seconds());
        shared.stats.lock().record(&report, started.elapsed(), period);

        let mut control = shared.control.lock();
        match started.checked_add(period) {
            Some(deadline) => {
                while control.running && !control.paused && Instant::now() < deadline {
                    shared.wake.wait_until(&mut control, deadline);
                }
            }
            None => {
                if control.running && !control.paused {
                    shared.wake.wait(&mut control);
                }
            }
        }
    }
    log::info!("physics loop exited");
}

/// Fixed-step physics driver with its own thread
pub struct PhysicsSystem {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl PhysicsSystem {
    pub fn new(config: &SimConfig) -> Self {
        let defaults = SimConfig::default();
        let step_ms = if config.step_ms == 0 {
            log::warn!("step size of 0 ms ignored, using {} ms", defaults.step_ms);
            defaults.step_ms
        } else {
            config.step_ms
        };
        let speed_multiplier = if valid_multiplier(config.speed_multiplier) {
            config.speed_multiplier
        } else {
            log::warn!(
                "speed multiplier {} ignored, using {}",
                config.speed_multiplier,
                defaults.speed_multiplier
            );
            defaults.speed_multiplier
        };

        let world = World::new(config.broad_phase.build());
        let snapshot = Arc::new(world.snapshot());
        Self {
            shared: Arc::new(Shared {
                world: Mutex::new(world),
                timing: Mutex::new(Timing {
                    step_ms,
                    speed_multiplier,
                }),
                control: Mutex::new(Control::default()),
                wake: Condvar::new(),
                snapshot: RwLock::new(snapshot),
                stats: Mutex::new(FrameStats::new(STATS_WINDOW)),
            }),
            thread: Mutex::new(None),
        }
    }

    /// Builder: replace the configured broad-phase strategy
    pub fn with_broad_phase(self, broad_phase: Box<dyn BroadPhase>) -> Self {
        self.set_broad_phase(broad_phase);
        self
    }

    pub fn set_broad_phase(&self, broad_phase: Box<dyn BroadPhase>) {
        self.shared.world.lock().set_broad_phase(broad_phase);
    }

    /// Run `f` against the world and republish the snapshot
    fn mutate<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        let mut world = self.shared.world.lock();
        let result = f(&mut world);
        self.shared.publish(&world);
        result
    }

    pub fn add_collidable<C: Collidable + 'static>(&self, body: C) -> BodyId {
        self.mutate(|world| world.add_collidable(body))
    }

    pub fn insert_collidable(&self, id: BodyId, body: BodyBox) -> Result<(), SimError> {
        self.mutate(|world| world.insert_collidable(id, body))
    }

    pub fn remove_collidable(&self, id: BodyId) -> Option<BodyBox> {
        self.mutate(|world| world.remove_collidable(id))
    }

    pub fn clear_collidables(&self) {
        self.mutate(World::clear_collidables);
    }

    pub fn add_steppable<S: Steppable + 'static>(&self, steppable: S) -> BodyId {
        self.mutate(|world| world.add_steppable(steppable))
    }

    pub fn insert_steppable(&self, id: BodyId, steppable: SteppableBox) -> Result<(), SimError> {
        self.mutate(|world| world.insert_steppable(id, steppable))
    }

    pub fn remove_steppable(&self, id: BodyId) -> Option<SteppableBox> {
        self.mutate(|world| world.remove_steppable(id))
    }

    pub fn clear_steppables(&self) {
        self.mutate(World::clear_steppables);
    }

    pub fn collidable_count(&self) -> usize {
        self.shared.world.lock().collidable_count()
    }

    pub fn steppable_count(&self) -> usize {
        self.shared.world.lock().steppable_count()
    }

    /// Step once on the calling thread, outside the loop's schedule
    pub fn step(&self, dt: f64) -> StepReport {
        self.shared.step(dt)
    }

    /// Spawn the physics thread
    pub fn start(&self) -> Result<(), SimError> {
        let mut thread_slot = self.thread.lock();
        {
            let mut control = self.shared.control.lock();
            if control.running {
                return Err(SimError::AlreadyRunning);
            }
            control.running = true;
        }

        // A previous loop has already exited; reap it
        if let Some(finished) = thread_slot.take() {
            reap(finished);
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("physics".into())
            .spawn(move || run(&shared));
        match spawned {
            Ok(handle) => {
                *thread_slot = Some(handle);
                log::info!("physics loop started");
                Ok(())
            }
            Err(err) => {
                self.shared.control.lock().running = false;
                Err(SimError::Spawn(err))
            }
        }
    }

    /// Ask the loop to stop and wait for the thread to finish its frame
    pub fn stop(&self) {
        let handle = self.thread.lock().take();
        let was_running = {
            let mut control = self.shared.control.lock();
            let was_running = control.running;
            control.running = false;
            control.paused = false;
            was_running
        };
        self.shared.wake.notify_all();

        if let Some(handle) = handle {
            reap(handle);
        }
        if was_running {
            log::info!("physics loop stopped");
        }
    }

    pub fn pause(&self) {
        let mut control = self.shared.control.lock();
        if !control.paused {
            control.paused = true;
            log::info!("physics paused");
        }
        self.shared.wake.notify_all();
    }

    pub fn resume(&self) {
        let mut control = self.shared.control.lock();
        if control.paused {
            control.paused = false;
            log::info!("physics resumed");
        }
        self.shared.wake.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.shared.control.lock().running
    }

    pub fn is_paused(&self) -> bool {
        self.shared.control.lock().paused
    }

    /// Simulated milliseconds per frame. Zero is rejected.
    pub fn set_step_ms(&self, step_ms: u64) {
        if step_ms == 0 {
            log::warn!("rejected step size of 0 ms");
            return;
        }
        self.shared.timing.lock().step_ms = step_ms;
    }

    pub fn step_ms(&self) -> u64 {
        self.shared.timing.lock().step_ms
    }

    /// Ratio of simulated to wall-clock time. Must be positive and finite.
    pub fn set_speed_multiplier(&self, multiplier: f64) {
        if !valid_multiplier(multiplier) {
            log::warn!("rejected speed multiplier {multiplier}");
            return;
        }
        self.shared.timing.lock().speed_multiplier = multiplier;
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.shared.timing.lock().speed_multiplier
    }

    /// Latest published view of committed state
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.shared.snapshot.read())
    }

    pub fn stats(&self) -> FrameStats {
        self.shared.stats.lock().clone()
    }
}

fn valid_multiplier(multiplier: f64) -> bool {
    multiplier.is_finite() && multiplier > 0.0
}

fn reap(handle: JoinHandle<()>) {
    if handle.thread().id() == thread::current().id() {
        return;
    }
    if handle.join().is_err() {
        log::error!("physics thread panicked");
    }
}

impl fmt::Display for PhysicsSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timing = *self.shared.timing.lock();
        let (running, paused) = {
            let control = self.shared.control.lock();
            (control.running, control.paused)
        };
        let world = self.shared.world.lock();
        let state = match (running, paused) {
            (false, _) => "stopped",
            (true, true) => "paused",
            (true, false) => "running",
        };
        write!(
            f,
            "physics {state}: step {} ms, speed x{}, {} collidables, {} steppables, broad phase {}",
            timing.step_ms,
            timing.speed_multiplier,
            world.collidable_count(),
            world.steppable_count(),
            world.broad_phase_name()
        )
    }
}

impl Drop for PhysicsSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
