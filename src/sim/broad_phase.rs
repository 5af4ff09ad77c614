//! Broad-phase candidate search
//!
//! Fast, over-approximate search for pairs of bodies whose proposed bounding
//! circles may overlap. Both strategies read `Collidable::proposed`, so every
//! body must have been proposed for the frame before the search runs.
//!
//! A strategy may report pairs that turn out not to touch, but must never
//! miss a pair whose bounding circles do overlap.

use super::body::{BodyBox, Collidable};
use super::collision::Collision;

/// Two bodies, by index into the slice handed to the strategy (`a < b`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidatePair {
    pub a: usize,
    pub b: usize,
}

impl CandidatePair {
    pub fn new(first: usize, second: usize) -> Self {
        Self {
            a: first.min(second),
            b: first.max(second),
        }
    }
}

/// A pluggable broad-phase strategy. Implementations keep no state between calls.
pub trait BroadPhase: Send {
    /// Short name for logs and status output
    fn name(&self) -> &'static str;

    /// Candidate pairs among collision-enabled bodies
    fn find_pairs(&self, bodies: &[BodyBox]) -> Vec<CandidatePair>;

    /// Candidate pairs with their time-of-impact search already run over `dt`
    fn find_candidates(&self, bodies: &mut [BodyBox], dt: f64) -> Vec<Collision> {
        self.find_pairs(bodies)
            .into_iter()
            .map(|pair| Collision::detect(bodies, pair, dt))
            .collect()
    }
}

/// O(n²) reference: every enabled pair is tested directly
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForce;

impl BroadPhase for BruteForce {
    fn name(&self) -> &'static str {
        "brute_force"
    }

    fn find_pairs(&self, bodies: &[BodyBox]) -> Vec<CandidatePair> {
        let mut pairs = Vec::new();
        for (i, first) in bodies.iter().enumerate() {
            if !first.collisions_enabled() {
                continue;
            }
            let pos1 = first.proposed().position;
            let radius1 = first.radius();
            for (j, second) in bodies.iter().enumerate().skip(i + 1) {
                if !second.collisions_enabled() {
                    continue;
                }
                let reach = radius1 + second.radius();
                if pos1.distance(second.proposed().position) < reach {
                    pairs.push(CandidatePair::new(i, j));
                }
            }
        }
        pairs
    }
}

/// O(n log n + k) sweep along X, with a Y-extent test for active bodies.
///
/// Bodies spread out along X make this fastest.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisSweep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Enter,
    Exit,
}

/// One end of a body's X interval
#[derive(Debug, Clone, Copy)]
struct Bound {
    value: f64,
    index: usize,
    edge: Edge,
}

impl BroadPhase for AxisSweep {
    fn name(&self) -> &'static str {
        "axis_sweep"
    }

    fn find_pairs(&self, bodies: &[BodyBox]) -> Vec<CandidatePair> {
        let mut bounds = Vec::with_capacity(bodies.len() * 2);
        for (index, body) in bodies.iter().enumerate() {
            if !body.collisions_enabled() {
                continue;
            }
            let x = body.proposed().position.x;
            let radius = body.radius();
            bounds.push(Bound {
                value: x - radius,
                index,
                edge: Edge::Enter,
            });
            bounds.push(Bound {
                value: x + radius,
                index,
                edge: Edge::Exit,
            });
        }

        // Enter sorts before Exit at equal positions so touching intervals
        // still meet (over-reporting is allowed, missing is not)
        bounds.sort_by(|l, r| {
            l.value
                .total_cmp(&r.value)
                .then_with(|| (l.edge == Edge::Exit).cmp(&(r.edge == Edge::Exit)))
        });

        let mut pairs = Vec::new();
        let mut active: Vec<usize> = Vec::new();
        for bound in bounds {
            match bound.edge {
                Edge::Enter => {
                    let entering = &bodies[bound.index];
                    let y = entering.proposed().position.y;
                    let radius = entering.radius();
                    for &other in &active {
                        let reach = radius + bodies[other].radius();
                        if (y - bodies[other].proposed().position.y).abs() < reach {
                            pairs.push(CandidatePair::new(other, bound.index));
                        }
                    }
                    active.push(bound.index);
                }
                Edge::Exit => {
                    if let Some(slot) = active.iter().position(|&i| i == bound.index) {
                        active.swap_remove(slot);
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pose::Pose;
    use crate::sim::shapes::Disc;
    use glam::DVec2;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn disc_at(x: f64, y: f64, radius: f64) -> BodyBox {
        let mut disc: BodyBox = Box::new(Disc::new(radius, Pose::new(DVec2::new(x, y), DVec2::ZERO)));
        disc.propose(0.0);
        disc
    }

    fn sorted(mut pairs: Vec<CandidatePair>) -> Vec<CandidatePair> {
        pairs.sort();
        pairs
    }

    #[test]
    fn test_candidate_pair_orders_indices() {
        assert_eq!(CandidatePair::new(4, 1), CandidatePair { a: 1, b: 4 });
    }

    #[test]
    fn test_brute_force_overlap() {
        let bodies = vec![
            disc_at(0.0, 0.0, 1.0),
            disc_at(1.5, 0.0, 1.0),
            disc_at(10.0, 0.0, 1.0),
        ];
        assert_eq!(BruteForce.find_pairs(&bodies), vec![CandidatePair::new(0, 1)]);
    }

    #[test]
    fn test_sweep_reports_y_overlap_only() {
        let bodies = vec![
            disc_at(0.0, 0.0, 1.0),
            // Overlaps in X but far apart in Y
            disc_at(0.5, 5.0, 1.0),
            // Overlaps body 0 in both X and Y extents
            disc_at(1.5, 1.5, 1.0),
        ];
        let pairs = sorted(AxisSweep.find_pairs(&bodies));
        assert_eq!(pairs, vec![CandidatePair::new(0, 2)]);
    }

    #[test]
    fn test_sweep_false_positive_is_allowed() {
        // Bounding boxes overlap at the corner, circles do not
        let bodies = vec![disc_at(0.0, 0.0, 1.0), disc_at(1.6, 1.6, 1.0)];
        assert!(BruteForce.find_pairs(&bodies).is_empty());
        assert_eq!(AxisSweep.find_pairs(&bodies), vec![CandidatePair::new(0, 1)]);
    }

    #[test]
    fn test_disabled_bodies_never_candidates() {
        let mut ghost = Disc::new(1.0, Pose::default()).with_collisions(false);
        ghost.propose(0.0);
        let bodies = vec![disc_at(0.0, 0.0, 1.0), Box::new(ghost) as BodyBox, disc_at(0.5, 0.0, 1.0)];

        for strategy in [&BruteForce as &dyn BroadPhase, &AxisSweep] {
            let pairs = strategy.find_pairs(&bodies);
            assert_eq!(pairs, vec![CandidatePair::new(0, 2)], "{}", strategy.name());
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert!(AxisSweep.find_pairs(&[]).is_empty());
        assert!(BruteForce.find_pairs(&[disc_at(0.0, 0.0, 1.0)]).is_empty());
    }

    proptest! {
        #[test]
        fn sweep_is_superset_of_brute_force(
            specs in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0, 0.1f64..8.0), 0..40)
        ) {
            let bodies: Vec<BodyBox> = specs.iter().map(|&(x, y, r)| disc_at(x, y, r)).collect();
            let sweep: BTreeSet<_> = AxisSweep.find_pairs(&bodies).into_iter().collect();
            for pair in BruteForce.find_pairs(&bodies) {
                prop_assert!(sweep.contains(&pair), "sweep missed {:?}", pair);
            }
        }
    }
}
