//! Continuous collision detection and response
//!
//! A [`Collision`] is built for one broad-phase candidate and immediately
//! searches for the first instant within the time budget at which a sample
//! point of one body lies inside the other. Confirmed collisions can then be
//! resolved once.
//!
//! The response reflects both velocities about the contact normal. Mass,
//! restitution and angular impulse are not modelled.

use glam::DVec2;

use super::body::{BodyBox, BodyId, Collidable, CollisionEvent};
use super::broad_phase::CandidatePair;
use super::contract_violation;
use super::vector::VectorExt;
use crate::consts::{
    COLLISION_TIME_PRECISION, EDGE_SAMPLES, MIN_EDGE_CIRCLE_FRACTION, PENETRATION_PRECISION,
};

/// Why a candidate did not become a collision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The bodies already intersect at the start of the interval
    OverlappingAtStart,
    /// The bodies do not intersect at the end of the interval (broad-phase false positive)
    Miss,
}

/// A confirmed first contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impact {
    /// Time past the start of the interval (seconds), just after first
    /// contact. Always strictly between zero and the budget.
    pub time: f64,
    /// World-space position of the penetrating sample point
    pub contact: DVec2,
    /// Index of the body whose sample point penetrated
    pub collider: usize,
    /// Index of the body that was penetrated
    pub collidee: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Confirmed(Impact),
    Rejected(Rejection),
}

/// One candidate pair and the result of its time-of-impact search
#[derive(Debug, Clone)]
pub struct Collision {
    pair: CandidatePair,
    budget: f64,
    outcome: Outcome,
}

impl Collision {
    /// Run the time-of-impact search for `pair` over `[0, budget]`.
    ///
    /// Leaves both participants holding some intermediate proposal; callers
    /// re-propose before reading proposed poses again.
    pub fn detect(bodies: &mut [BodyBox], pair: CandidatePair, budget: f64) -> Self {
        let outcome = find_impact(bodies, pair, budget);
        Self {
            pair,
            budget,
            outcome,
        }
    }

    pub fn pair(&self) -> CandidatePair {
        self.pair
    }

    /// Time budget the search ran over
    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.outcome, Outcome::Confirmed(_))
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self.outcome {
            Outcome::Rejected(reason) => Some(reason),
            Outcome::Confirmed(_) => None,
        }
    }

    /// The confirmed impact. Asking a rejected candidate is a contract violation.
    #[track_caller]
    pub fn impact(&self) -> &Impact {
        match &self.outcome {
            Outcome::Confirmed(impact) => impact,
            Outcome::Rejected(_) => contract_violation("tried to read the impact of a rejected collision"),
        }
    }

    #[track_caller]
    pub fn impact_time(&self) -> f64 {
        self.impact().time
    }

    /// Resolve against the committed poses and notify both participants.
    ///
    /// The caller must have committed every body at the impact time first.
    /// Velocities change only when both bodies opt in to resolution. Returns
    /// whether they did.
    #[track_caller]
    pub fn resolve(&self, bodies: &mut [BodyBox], ids: &[BodyId]) -> bool {
        let Outcome::Confirmed(impact) = self.outcome else {
            contract_violation("tried to resolve a collision that was never confirmed");
        };

        let (first, second) = pair_mut(bodies, self.pair);
        let resolved = first.resolution_enabled() && second.resolution_enabled();
        if resolved {
            let (collider, collidee) = if impact.collider == self.pair.a {
                (&mut *first, &mut *second)
            } else {
                (&mut *second, &mut *first)
            };

            let normal = contact_normal(&**collider, &**collidee, impact.contact);
            for body in [collider, collidee] {
                let pose = body.kinematics_mut().current_mut();
                pose.velocity = pose.velocity.reflect_across(normal);
            }
            log::debug!(
                "resolved {} -> {} at t={:.6}, normal={:?}",
                ids[impact.collider],
                ids[impact.collidee],
                impact.time,
                normal
            );
        }

        first.on_collision(&CollisionEvent {
            other: ids[self.pair.b],
            resolved,
            contact: impact.contact,
        });
        second.on_collision(&CollisionEvent {
            other: ids[self.pair.a],
            resolved,
            contact: impact.contact,
        });
        resolved
    }
}

/// Both bodies of a pair, mutably
fn pair_mut(bodies: &mut [BodyBox], pair: CandidatePair) -> (&mut BodyBox, &mut BodyBox) {
    debug_assert!(pair.a < pair.b, "candidate pair must be ordered");
    let (head, tail) = bodies.split_at_mut(pair.b);
    (&mut head[pair.a], &mut tail[0])
}

/// Where first contact was found at a sampled time
#[derive(Debug, Clone, Copy)]
struct Contact {
    point: DVec2,
    collider: usize,
    collidee: usize,
}

/// First sample point of `collider` that lies inside `collidee` (proposed poses)
fn penetrating_point(collider: &dyn Collidable, collidee: &dyn Collidable) -> Option<DVec2> {
    let from = collider.proposed();
    let into = collidee.proposed();
    collider
        .sample_points()
        .iter()
        .map(|&local| from.to_world(local))
        .find(|&world| collidee.contains(into.to_local(world)))
}

/// Propose both bodies at `t` and test for intersection in either direction
fn contact_at(bodies: &mut [BodyBox], pair: CandidatePair, t: f64) -> Option<Contact> {
    let (first, second) = pair_mut(bodies, pair);
    first.propose(t);
    second.propose(t);

    if let Some(point) = penetrating_point(&**first, &**second) {
        return Some(Contact {
            point,
            collider: pair.a,
            collidee: pair.b,
        });
    }
    penetrating_point(&**second, &**first).map(|point| Contact {
        point,
        collider: pair.b,
        collidee: pair.a,
    })
}

fn find_impact(bodies: &mut [BodyBox], pair: CandidatePair, budget: f64) -> Outcome {
    if contact_at(bodies, pair, 0.0).is_some() {
        // Guessing a negative impact time would be worse than skipping
        log::debug!("bodies {} and {} started the step intersecting", pair.a, pair.b);
        return Outcome::Rejected(Rejection::OverlappingAtStart);
    }

    let Some(mut contact) = contact_at(bodies, pair, budget) else {
        log::trace!("near miss between {} and {}", pair.a, pair.b);
        return Outcome::Rejected(Rejection::Miss);
    };

    let mut left = 0.0;
    let mut right = budget;
    while right - left > COLLISION_TIME_PRECISION {
        let mid = (left + right) / 2.0;
        match contact_at(bodies, pair, mid) {
            Some(found) => {
                right = mid;
                contact = found;
            }
            None => left = mid,
        }
    }

    // Right end of the interval: the bodies are just barely intersecting.
    // Contact in the last sliver of the budget still reports a time below it.
    let time = if right < budget {
        right
    } else {
        budget * (1.0 - f64::EPSILON)
    };
    Outcome::Confirmed(Impact {
        time,
        contact: contact.point,
        collider: contact.collider,
        collidee: contact.collidee,
    })
}

/// Parameter in `[0, 1]` of the boundary crossing on the segment `from -> to`,
/// taken on the inside side. Exactly one end must be inside.
fn boundary_crossing(inside: &impl Fn(DVec2) -> bool, from: DVec2, to: DVec2) -> f64 {
    let from_inside = inside(from);
    // `near` stays on the side of `from`, `far` on the side of `to`
    let (mut near, mut far) = (0.0, 1.0);
    while far - near > PENETRATION_PRECISION {
        let mid = (near + far) / 2.0;
        if inside(from.lerp(to, mid)) == from_inside {
            near = mid;
        } else {
            far = mid;
        }
    }
    if from_inside { near } else { far }
}

/// Unit normal of the collidee's boundary at the contact, pointing out of the
/// collidee towards the collider. Uses committed poses.
fn contact_normal(collider: &dyn Collidable, collidee: &dyn Collidable, contact: DVec2) -> DVec2 {
    let origin = collider.current().position;
    let into = *collidee.current();
    let inside = |world: DVec2| collidee.contains(into.to_local(world));
    let collider_r = contact - origin;

    // Boundary crossing on the segment from the collider centre to the contact
    let edge = if inside(origin) {
        contact
    } else {
        origin.lerp(contact, boundary_crossing(&inside, origin, contact))
    };

    // The sampling circle must resolve the edge found above, yet stay clear of
    // the far side of thin bodies
    let penetration = contact.distance(edge);
    let floor = collider_r.length() * MIN_EDGE_CIRCLE_FRACTION;
    let reach = 2.0 * collidee.radius();
    let exit = edge + collider_r.normalize_or_zero() * reach;
    let depth = reach * boundary_crossing(&inside, edge, exit);
    let circle_radius = penetration.max(floor).min(depth / 2.0);

    // Walk a full turn around the edge point and keep the first two places
    // where containment flips; they bound the local contact edge
    let mut toggles: Vec<DVec2> = Vec::with_capacity(2);
    let mut previous: Option<bool> = None;
    for i in 0..EDGE_SAMPLES {
        let direction = i as f64 * std::f64::consts::TAU / (EDGE_SAMPLES - 1) as f64;
        let point = edge + DVec2::from_polar(circle_radius, direction);
        let hit = inside(point);
        if previous.is_some_and(|last| last != hit) {
            toggles.push(point);
            if toggles.len() == 2 {
                break;
            }
        }
        previous = Some(hit);
    }
    let &[p1, p2] = toggles.as_slice() else {
        contract_violation("could not find the contact edge direction");
    };

    let normal = (p1 - p2).perp().normalize();
    if normal.dot(-collider_r) < 0.0 { -normal } else { normal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pose::Pose;
    use crate::sim::shapes::{Disc, Rect};

    fn disc(radius: f64, x: f64, y: f64, vx: f64, vy: f64) -> BodyBox {
        Box::new(Disc::new(radius, Pose::new(DVec2::new(x, y), DVec2::new(vx, vy))))
    }

    /// Commit every body at the impact time, as the driver does
    fn commit_at(bodies: &mut [BodyBox], t: f64) {
        for body in bodies.iter_mut() {
            body.propose(t);
            body.commit();
        }
    }

    #[test]
    fn test_head_on_impact_time() {
        // Combined radius 1, closing at 2 m/s from 3 m apart: contact at t = 1
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 2.0, 0.0), disc(0.5, 3.0, 0.0, 0.0, 0.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 1.2);

        assert!(collision.is_confirmed());
        assert_eq!(collision.budget(), 1.2);
        let impact = collision.impact();
        assert!(
            impact.time > 1.0 && impact.time - 1.0 < COLLISION_TIME_PRECISION,
            "t = {}",
            impact.time
        );
        assert_eq!(impact.collider, 0);
        assert_eq!(impact.collidee, 1);
        assert!((impact.contact - DVec2::new(2.5, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_impact_time_strictly_inside_budget() {
        let mut bodies = vec![disc(1.0, 0.0, 0.0, 0.0, 0.0), disc(1.0, 0.0, 5.0, 0.0, -10.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 0.35);
        let t = collision.impact_time();
        assert!(t > 0.0 && t < 0.35);
        assert!((t - 0.3).abs() < COLLISION_TIME_PRECISION);
    }

    #[test]
    fn test_overlapping_at_start_is_rejected() {
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 1.0, 0.0), disc(0.5, 0.8, 0.0, 0.0, 0.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 1.0);
        assert_eq!(collision.rejection(), Some(Rejection::OverlappingAtStart));
    }

    #[test]
    fn test_near_miss_is_rejected() {
        // Passing each other with 0.1 m to spare
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 1.0, 0.0), disc(0.5, 1.0, 1.1, 0.0, 0.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 2.0);
        assert_eq!(collision.rejection(), Some(Rejection::Miss));
    }

    #[test]
    #[should_panic(expected = "rejected collision")]
    fn test_impact_time_of_rejection_panics() {
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 0.0, 0.0), disc(0.5, 5.0, 0.0, 0.0, 0.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 1.0);
        let _ = collision.impact_time();
    }

    #[test]
    #[should_panic(expected = "never confirmed")]
    fn test_resolving_rejection_panics() {
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 0.0, 0.0), disc(0.5, 5.0, 0.0, 0.0, 0.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 1.0);
        collision.resolve(&mut bodies, &[BodyId(0), BodyId(1)]);
    }

    #[test]
    fn test_resolve_head_on_reflects() {
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 2.0, 0.0), disc(0.5, 3.0, 0.0, -1.0, 0.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 0.8);
        commit_at(&mut bodies, collision.impact_time());

        assert!(collision.resolve(&mut bodies, &[BodyId(10), BodyId(11)]));

        let v0 = bodies[0].current().velocity;
        let v1 = bodies[1].current().velocity;
        assert!(v0.x < -1.99 && v0.y.abs() < 0.1, "v0 = {v0:?}");
        assert!(v1.x > 0.99 && v1.y.abs() < 0.1, "v1 = {v1:?}");
        // Reflection keeps each speed
        assert!((v0.length() - 2.0).abs() < 1e-9);
        assert!((v1.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_against_static_wall() {
        // Disc falling onto the top face of a wide box
        let wall: BodyBox = Box::new(Rect::new(10.0, 1.0, Pose::default()));
        let mut bodies = vec![wall, disc(0.5, 0.3, 3.0, 0.0, -4.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 0.6);
        // Gap of 2 m at 4 m/s
        assert!((collision.impact_time() - 0.5).abs() < COLLISION_TIME_PRECISION);
        commit_at(&mut bodies, collision.impact_time());

        assert!(collision.resolve(&mut bodies, &[BodyId(0), BodyId(1)]));
        let v = bodies[1].current().velocity;
        assert!(v.y > 3.99 && v.x.abs() < 0.1, "v = {v:?}");
        assert_eq!(bodies[0].current().velocity, DVec2::ZERO);
    }

    #[test]
    fn test_contact_at_end_of_budget_stays_inside_it() {
        // First touch 5e-7 s before the end, inside the last bisection interval
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 1.0, 0.0), disc(0.5, 2.0 - 5e-7, 0.0, 0.0, 0.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 1.0);
        let t = collision.impact_time();
        assert!(t < 1.0, "t = {t}");
        assert!(t > 1.0 - 2.0 * COLLISION_TIME_PRECISION, "t = {t}");
    }

    #[test]
    fn test_resolve_against_thin_wall() {
        let wall: BodyBox = Box::new(Rect::new(100.0, 0.02, Pose::default()));
        // Still inside the wall at the end of the budget
        let mut bodies = vec![wall, disc(0.5, 0.3, 1.51, 0.0, -4.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 0.252);
        assert!((collision.impact_time() - 0.25).abs() < COLLISION_TIME_PRECISION);
        commit_at(&mut bodies, collision.impact_time());

        assert!(collision.resolve(&mut bodies, &[BodyId(0), BodyId(1)]));
        let v = bodies[1].current().velocity;
        assert!(v.y > 3.99 && v.x.abs() < 0.1, "v = {v:?}");
    }

    #[test]
    fn test_large_disc_against_thin_wall() {
        // Sampling circle is bounded by the wall's thickness, not the disc's size
        let wall: BodyBox = Box::new(Rect::new(1000.0, 0.02, Pose::default()));
        let mut bodies = vec![wall, disc(50.0, 0.3, 51.01, 0.0, -4.0)];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 0.5);
        assert_eq!(collision.impact().collider, 1);
        commit_at(&mut bodies, collision.impact_time());

        assert!(collision.resolve(&mut bodies, &[BodyId(0), BodyId(1)]));
        let v = bodies[1].current().velocity;
        assert!(v.y > 3.99 && v.x.abs() < 0.2, "v = {v:?}");
    }

    #[test]
    fn test_resolution_disabled_only_notifies() {
        let passive: BodyBox = Box::new(
            Disc::new(0.5, Pose::new(DVec2::new(3.0, 0.0), DVec2::ZERO)).with_resolution(false),
        );
        let mut bodies = vec![disc(0.5, 0.0, 0.0, 2.0, 0.0), passive];
        let collision = Collision::detect(&mut bodies, CandidatePair::new(0, 1), 1.2);
        commit_at(&mut bodies, collision.impact_time());

        assert!(!collision.resolve(&mut bodies, &[BodyId(0), BodyId(1)]));
        assert_eq!(bodies[0].current().velocity, DVec2::new(2.0, 0.0));
    }

    #[test]
    fn test_normal_points_from_collidee_to_collider() {
        let collidee = Disc::new(1.0, Pose::default());
        let collider = Disc::new(0.5, Pose::new(DVec2::new(-1.49, 0.0), DVec2::ZERO));
        // Contact just inside the collidee's west side
        let normal = contact_normal(&collider, &collidee, DVec2::new(-0.99, 0.0));
        assert!((normal - DVec2::new(-1.0, 0.0)).length() < 0.05, "normal = {normal:?}");
        assert!((normal.length() - 1.0).abs() < 1e-12);
    }
}
