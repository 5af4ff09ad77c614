//! Kinetica headless demo
//!
//! Usage: `kinetica [config-path] [seconds] [seed]`
//!
//! Builds a walled arena full of discs, runs the physics thread for a while
//! and prints one JSON status line every half second.

use std::thread;
use std::time::{Duration, Instant};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use kinetica::SimConfig;
use kinetica::sim::{Disc, PhysicsSystem, PointMass, Pose, Rect, VectorExt};

const ARENA_WIDTH: f64 = 40.0;
const ARENA_HEIGHT: f64 = 30.0;
const WALL_THICKNESS: f64 = 1.0;
const DISC_RADIUS: f64 = 0.6;
const GRID_SPACING: f64 = 3.0;
const MAX_SPEED: f64 = 6.0;
const STATUS_INTERVAL: Duration = Duration::from_millis(500);

/// Static box walls around the origin-centred arena
fn build_walls(system: &PhysicsSystem) {
    let (w, h, t) = (ARENA_WIDTH, ARENA_HEIGHT, WALL_THICKNESS);
    let walls = [
        (DVec2::new(0.0, (h + t) / 2.0), w + 2.0 * t, t),
        (DVec2::new(0.0, -(h + t) / 2.0), w + 2.0 * t, t),
        (DVec2::new((w + t) / 2.0, 0.0), t, h),
        (DVec2::new(-(w + t) / 2.0, 0.0), t, h),
    ];
    for (centre, width, height) in walls {
        system.add_collidable(Rect::new(width, height, Pose::new(centre, DVec2::ZERO)));
    }
}

/// Discs on a jittered grid, each heading off in a random direction
fn scatter_discs(system: &PhysicsSystem, rng: &mut Pcg32) -> usize {
    let jitter = (GRID_SPACING - 2.0 * DISC_RADIUS) / 2.0 - 0.05;
    let columns = ((ARENA_WIDTH - GRID_SPACING) / GRID_SPACING) as i32;
    let rows = ((ARENA_HEIGHT - GRID_SPACING) / GRID_SPACING) as i32;

    let mut count = 0;
    for row in 0..rows {
        for column in 0..columns {
            let cell = DVec2::new(
                (column as f64 - (columns - 1) as f64 / 2.0) * GRID_SPACING,
                (row as f64 - (rows - 1) as f64 / 2.0) * GRID_SPACING,
            );
            let offset = DVec2::new(
                rng.random_range(-jitter..jitter),
                rng.random_range(-jitter..jitter),
            );
            let velocity = DVec2::from_polar(
                rng.random_range(0.5..MAX_SPEED),
                rng.random_range(0.0..std::f64::consts::TAU),
            );
            system.add_collidable(Disc::new(DISC_RADIUS, Pose::new(cell + offset, velocity)));
            count += 1;
        }
    }
    count
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(&path).unwrap_or_else(|err| {
            log::error!("{err}; using default settings");
            SimConfig::default()
        }),
        None => SimConfig::default(),
    };
    let seconds: f64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(5.0);
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(0x5EED);

    log::info!("Kinetica starting: {config:?}, {seconds} s, seed {seed}");

    let system = PhysicsSystem::new(&config);
    let mut rng = Pcg32::seed_from_u64(seed);
    build_walls(&system);
    let discs = scatter_discs(&system, &mut rng);
    system.add_steppable(PointMass::new(1.0, DVec2::ZERO, DVec2::new(1.0, 0.0)));
    log::info!("arena ready with {discs} discs");

    if let Err(err) = system.start() {
        log::error!("could not start physics: {err}");
        std::process::exit(1);
    }

    let run_for = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::ZERO);
    let started = Instant::now();
    while started.elapsed() < run_for {
        thread::sleep(STATUS_INTERVAL.min(run_for.saturating_sub(started.elapsed())));

        let snapshot = system.snapshot();
        let stats = system.stats();
        let status = serde_json::json!({
            "frame": snapshot.frame,
            "sim_time": snapshot.sim_time,
            "bodies": snapshot.bodies.len(),
            "energy": 0.5 * snapshot.speed_squared_sum(),
            "collisions": stats.collisions,
            "step_us": stats.step_micros.average(),
            "overruns": stats.overruns,
        });
        println!("{status}");
    }

    system.stop();
    log::info!("{system}");
}
