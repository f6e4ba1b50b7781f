// broadphase/mod.rs
//
// Finding which balls are close enough to be worth handing to the contact
// resolver. The resolver itself does the exact distance and closing-speed
// tests, so a broad-phase may over-report but must never miss a pair.

#[cfg(feature = "physics")]
pub mod rapier;

#[cfg(feature = "physics")]
pub use rapier::RapierBroadPhase;

use crate::core::ball::BallState;

/// Source of candidate ball pairs for one substep.
pub trait BroadPhase {
    /// Fill `out` with index pairs `(i, j)`, `i < j`, whose centres are within `gate`
    /// of each other. `out` is cleared first. Pairs come out sorted so that
    /// replaying the same input resolves contacts in the same order.
    fn candidate_pairs(&mut self, balls: &[BallState], gate: f32, out: &mut Vec<(usize, usize)>);
}

/// Sort-and-sweep along the x axis. No state is kept between calls.
#[derive(Debug, Default)]
pub struct SweepPairs {
    order: Vec<usize>,
}

impl SweepPairs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for SweepPairs {
    fn candidate_pairs(&mut self, balls: &[BallState], gate: f32, out: &mut Vec<(usize, usize)>) {
        out.clear();
        self.order.clear();
        self.order.extend(0..balls.len());
        self.order
            .sort_by(|&a, &b| balls[a].position.x.total_cmp(&balls[b].position.x));

        let gate_sq = gate * gate;
        for (k, &i) in self.order.iter().enumerate() {
            let pi = balls[i].position;
            for &j in &self.order[k + 1..] {
                let pj = balls[j].position;
                if pj.x - pi.x > gate {
                    break;
                }
                if pi.distance_squared(pj) <= gate_sq {
                    out.push((i.min(j), i.max(j)));
                }
            }
        }
        out.sort_unstable();
    }
}
