//! Per-ball kinematic state.
//!
//! Coordinate system (y-up, right-handed):
//! - X, Z: the table plane. `position` stores them in a `Vec2` as `(x, z)`.
//! - Y: vertical. Owned by the host rigid-body engine; carried but never changed here.
//!
//! Angular velocity components:
//! - ωx, ωz: rolling axes (top/back-spin)
//! - ωy: vertical axis (side-spin, "English")

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Motion phase of a ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Stationary,
    Sliding,
    Rolling,
}

impl Phase {
    /// Wire encoding used by the snapshot buffer.
    pub fn as_f32(self) -> f32 {
        match self {
            Phase::Stationary => 0.0,
            Phase::Sliding => 1.0,
            Phase::Rolling => 2.0,
        }
    }
}

/// Complete kinematic state of one ball.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    /// Position on the table plane `(x, z)` (m).
    pub position: Vec2,
    /// Linear velocity `(vx, vy, vz)` (m/s).
    pub velocity: Vec3,
    /// Angular velocity `(ωx, ωy, ωz)` (rad/s).
    pub angular_velocity: Vec3,
    pub phase: Phase,
    /// Seconds since the last phase transition.
    pub phase_time: f32,
}

impl BallState {
    /// A ball at rest, as created at spawn.
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            phase: Phase::Stationary,
            phase_time: 0.0,
        }
    }

    /// Put the ball back on the table at rest (after a pot).
    pub fn respot(&mut self, position: Vec2) {
        *self = Self::at_rest(position);
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    /// Planar velocity `(vx, vz)`.
    pub fn planar_velocity(&self) -> Vec2 {
        Vec2::new(self.velocity.x, self.velocity.z)
    }

    /// Overwrite `(vx, vz)`, leaving `vy` alone.
    pub fn set_planar_velocity(&mut self, v: Vec2) {
        self.velocity.x = v.x;
        self.velocity.z = v.y;
    }

    /// Rolling-plane spin `(ωx, ωz)`.
    pub fn roll_spin(&self) -> Vec2 {
        Vec2::new(self.angular_velocity.x, self.angular_velocity.z)
    }

    /// Overwrite `(ωx, ωz)`, leaving ωy alone.
    pub fn set_roll_spin(&mut self, w: Vec2) {
        self.angular_velocity.x = w.x;
        self.angular_velocity.z = w.y;
    }

    /// Side-spin ωy.
    pub fn side_spin(&self) -> f32 {
        self.angular_velocity.y
    }

    pub fn speed(&self) -> f32 {
        self.planar_velocity().length()
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_velocity.length()
    }

    /// Contact-point velocity induced by rotation: `(ωz·R, −ωx·R)`.
    pub fn surface_velocity(&self, radius: f32) -> Vec2 {
        Vec2::new(self.angular_velocity.z * radius, -self.angular_velocity.x * radius)
    }

    /// Linear velocity minus surface velocity. Zero exactly when rolling without slipping.
    pub fn slip_velocity(&self, radius: f32) -> Vec2 {
        self.planar_velocity() - self.surface_velocity(radius)
    }

    pub fn slip_speed(&self, radius: f32) -> f32 {
        self.slip_velocity(radius).length()
    }

    pub fn is_rolling(&self, radius: f32, slip_threshold: f32) -> bool {
        self.slip_speed(radius) < slip_threshold
    }

    pub fn is_stationary(&self) -> bool {
        self.phase == Phase::Stationary
    }

    /// Switch phase, resetting the phase clock only on an actual transition.
    pub(crate) fn enter_phase(&mut self, phase: Phase) {
        if self.phase != phase {
            log::trace!("phase {:?} -> {:?} after {:.3}s", self.phase, phase, self.phase_time);
            self.phase = phase;
            self.phase_time = 0.0;
        }
    }

    /// Mark the ball as just disturbed by a contact.
    pub(crate) fn mark_contact(&mut self) {
        self.phase = Phase::Sliding;
        self.phase_time = 0.0;
    }
}

impl Default for BallState {
    fn default() -> Self {
        Self::at_rest(Vec2::ZERO)
    }
}

/// Rolling-plane spin `(ωx, ωz)` for rolling without slip at planar velocity `v`.
pub fn natural_roll(v: Vec2, radius: f32) -> Vec2 {
    Vec2::new(-v.y / radius, v.x / radius)
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: f32 = 0.028575;

    #[test]
    fn at_rest_is_stationary() {
        let ball = BallState::at_rest(Vec2::new(0.5, -0.2));
        assert_eq!(ball.phase, Phase::Stationary);
        assert_eq!(ball.speed(), 0.0);
        assert_eq!(ball.angular_speed(), 0.0);
        assert_eq!(ball.phase_time, 0.0);
    }

    #[test]
    fn natural_roll_has_zero_slip() {
        let v = Vec2::new(1.2, -0.7);
        let ball = BallState::at_rest(Vec2::ZERO)
            .with_velocity(Vec3::new(v.x, 0.0, v.y))
            .with_angular_velocity({
                let w = natural_roll(v, R);
                Vec3::new(w.x, 0.0, w.y)
            });
        assert!(ball.slip_speed(R) < 1e-5, "slip = {}", ball.slip_speed(R));
        assert!(ball.is_rolling(R, 0.01));
    }

    #[test]
    fn stun_ball_slips_at_full_speed() {
        let ball = BallState::at_rest(Vec2::ZERO).with_velocity(Vec3::new(2.0, 0.0, 0.0));
        assert!((ball.slip_speed(R) - 2.0).abs() < 1e-6);
        assert!(!ball.is_rolling(R, 0.01));
    }

    #[test]
    fn planar_setters_leave_vertical_alone() {
        let mut ball = BallState::at_rest(Vec2::ZERO)
            .with_velocity(Vec3::new(0.0, -0.3, 0.0))
            .with_angular_velocity(Vec3::new(0.0, 5.0, 0.0));
        ball.set_planar_velocity(Vec2::new(1.0, 2.0));
        ball.set_roll_spin(Vec2::new(3.0, 4.0));
        assert_eq!(ball.velocity, Vec3::new(1.0, -0.3, 2.0));
        assert_eq!(ball.angular_velocity, Vec3::new(3.0, 5.0, 4.0));
    }

    #[test]
    fn enter_phase_resets_clock_only_on_change() {
        let mut ball = BallState::at_rest(Vec2::ZERO).with_phase(Phase::Rolling);
        ball.phase_time = 1.5;
        ball.enter_phase(Phase::Rolling);
        assert_eq!(ball.phase_time, 1.5);
        ball.enter_phase(Phase::Sliding);
        assert_eq!(ball.phase_time, 0.0);
    }

    #[test]
    fn respot_clears_motion() {
        let mut ball = BallState::at_rest(Vec2::ZERO)
            .with_velocity(Vec3::new(1.0, 0.0, 1.0))
            .with_phase(Phase::Sliding);
        ball.respot(Vec2::new(0.3, 0.0));
        assert_eq!(ball, BallState::at_rest(Vec2::new(0.3, 0.0)));
    }
}
