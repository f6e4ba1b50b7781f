//! Aim-line prediction.
//!
//! A `Trajectory` is a recipe, not a buffer: every call to `iter()` replays the
//! integrator from the same starting state, so the sequence can be walked as
//! many times as needed without storing it.

use glam::Vec2;

use crate::core::ball::{BallState, Phase};
use crate::core::config::PhysicsConfig;
use crate::core::rails::Rails;
use crate::physics::{cushion, integrator};

/// One sampled point on a predicted path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub position: Vec2,
    pub phase: Phase,
}

/// A finite, restartable prediction of a single ball's path.
#[derive(Debug, Clone)]
pub struct Trajectory {
    start: BallState,
    dt: f32,
    max_steps: usize,
    config: PhysicsConfig,
    rails: Option<Rails>,
}

/// Predict a ball's free path for `duration` seconds, sampling every `dt`.
///
/// No ball or cushion contacts are considered. Non-positive `dt` or `duration`
/// yields an empty sequence; a ball already below the stop speed yields its
/// current position only.
pub fn predict(ball: &BallState, duration: f32, dt: f32, config: &PhysicsConfig) -> Trajectory {
    Trajectory::new(*ball, duration, dt, *config, None)
}

/// Like [`predict`], but bounces the ball off `rails` with the cushion model.
pub fn predict_with_rails(
    ball: &BallState,
    duration: f32,
    dt: f32,
    config: &PhysicsConfig,
    rails: &Rails,
) -> Trajectory {
    Trajectory::new(*ball, duration, dt, *config, Some(*rails))
}

impl Trajectory {
    fn new(start: BallState, duration: f32, dt: f32, config: PhysicsConfig, rails: Option<Rails>) -> Self {
        let max_steps = if dt > 0.0 && duration > 0.0 && dt.is_finite() && duration.is_finite() {
            (duration / dt).ceil() as usize
        } else {
            0
        };
        Self {
            start,
            dt,
            max_steps,
            config,
            rails,
        }
    }

    pub fn iter(&self) -> TrajectoryIter<'_> {
        TrajectoryIter {
            trajectory: self,
            ball: self.start,
            remaining: self.max_steps,
        }
    }

    /// Upper bound on the number of points.
    pub fn max_len(&self) -> usize {
        self.max_steps
    }

    /// Where the ball comes to rest, or where it is when time runs out.
    pub fn end(&self) -> Option<TrajectoryPoint> {
        self.iter().last()
    }
}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = TrajectoryPoint;
    type IntoIter = TrajectoryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazily steps a private copy of the starting state.
pub struct TrajectoryIter<'a> {
    trajectory: &'a Trajectory,
    ball: BallState,
    remaining: usize,
}

impl Iterator for TrajectoryIter<'_> {
    type Item = TrajectoryPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let config = &self.trajectory.config;
        let point = TrajectoryPoint {
            position: self.ball.position,
            phase: self.ball.phase,
        };

        if self.ball.speed() < config.thresholds.velocity_stop {
            self.remaining = 0;
            return Some(point);
        }
        self.remaining -= 1;

        if let Some(rails) = &self.trajectory.rails {
            bounce(&mut self.ball, rails, config);
        }
        integrator::advance(&mut self.ball, self.trajectory.dt, config);
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::from(self.remaining > 0), Some(self.remaining))
    }
}

/// Resolve any rail contact before the next integrator step, as the table does.
fn bounce(ball: &mut BallState, rails: &Rails, config: &PhysicsConfig) {
    let radius = config.ball.radius;
    // A corner can overlap two rails at once
    for _ in 0..2 {
        let Some(hit) = rails.crossing(ball.position, radius) else {
            return;
        };
        let speed = ball.speed();
        cushion::rebound(ball, hit.normal, speed, config);
        ball.position += hit.normal * hit.depth;
    }
}
