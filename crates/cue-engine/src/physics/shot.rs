use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::core::ball::{natural_roll, BallState};
use crate::core::config::PhysicsConfig;

/// A cue strike.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Shot {
    /// Fraction of `ShotConfig::max_speed`, clamped to `[0, 1]`.
    pub power: f32,
    /// Direction of travel on the table plane (radians, from +X toward +Z).
    pub angle: f32,
    /// Horizontal tip offset, `[-1, 1]`. Positive is right English.
    pub spin_x: f32,
    /// Vertical tip offset, `[-1, 1]`. Positive is follow, negative is draw.
    pub spin_y: f32,
}

impl Shot {
    pub fn new(power: f32, angle: f32) -> Self {
        Self {
            power,
            angle,
            ..Default::default()
        }
    }

    pub fn with_spin(mut self, spin_x: f32, spin_y: f32) -> Self {
        self.spin_x = spin_x;
        self.spin_y = spin_y;
        self
    }

    fn clamped(&self) -> Self {
        Self {
            power: self.power.clamp(0.0, 1.0),
            angle: self.angle,
            spin_x: self.spin_x.clamp(-1.0, 1.0),
            spin_y: self.spin_y.clamp(-1.0, 1.0),
        }
    }
}

/// Overwrite the ball's velocity and spin with the result of a cue strike.
///
/// A dead-centre strike (`spin_y` exactly `0.0`) picks up a small forward-roll
/// bias that any non-zero `spin_y` does not, so the response is discontinuous
/// at zero. Set `ShotConfig::center_roll_bias` to `0.0` to remove it.
pub fn apply_shot(ball: &mut BallState, shot: &Shot, config: &PhysicsConfig) {
    let gains = &config.shot;
    let shot = shot.clamped();
    if !shot.angle.is_finite() {
        log::warn!("ignoring shot with non-finite angle {}", shot.angle);
        return;
    }

    let dir = Vec2::new(shot.angle.cos(), shot.angle.sin());
    let velocity = dir * shot.power * gains.max_speed;
    let speed = velocity.length();
    let natural = speed / config.ball.radius;

    let mut roll_multiple = shot.spin_y * gains.roll_spin_gain;
    if shot.spin_y == 0.0 {
        roll_multiple += gains.center_roll_bias;
    }
    // Unit axis for forward roll along `dir`
    let roll_axis = natural_roll(dir, 1.0);

    ball.set_planar_velocity(velocity);
    ball.set_roll_spin(roll_axis * natural * roll_multiple);
    ball.angular_velocity.y = shot.spin_x * speed * gains.side_spin_gain;
    ball.mark_contact();

    log::debug!(
        "shot: speed={:.2} m/s angle={:.3} spin=({:.2}, {:.2})",
        speed,
        shot.angle,
        shot.spin_x,
        shot.spin_y
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ball::Phase;
    use crate::physics::energy::{describe_spin, English, RollKind};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn power_and_angle_set_velocity() {
        let cfg = PhysicsConfig::default();
        let mut ball = BallState::default();
        apply_shot(&mut ball, &Shot::new(0.5, FRAC_PI_2), &cfg);

        assert!(ball.velocity.x.abs() < 1e-5);
        assert!((ball.velocity.z - 4.0).abs() < 1e-5);
        assert_eq!(ball.phase, Phase::Sliding);
        assert_eq!(ball.phase_time, 0.0);
    }

    #[test]
    fn inputs_are_clamped() {
        let cfg = PhysicsConfig::default();
        let mut ball = BallState::default();
        apply_shot(&mut ball, &Shot::new(3.0, 0.0).with_spin(5.0, 0.0), &cfg);

        assert!((ball.speed() - cfg.shot.max_speed).abs() < 1e-5);
        assert!((ball.side_spin() - cfg.shot.max_speed * cfg.shot.side_spin_gain).abs() < 1e-3);
    }

    #[test]
    fn centre_strike_carries_roll_bias() {
        let cfg = PhysicsConfig::default();
        let mut centre = BallState::default();
        apply_shot(&mut centre, &Shot::new(0.25, 0.0), &cfg);
        let desc = describe_spin(&centre, &cfg);
        assert!((desc.roll_ratio - 0.4).abs() < 1e-4, "ratio = {}", desc.roll_ratio);

        // The bias disappears as soon as spin_y leaves zero
        let mut nudged = BallState::default();
        apply_shot(&mut nudged, &Shot::new(0.25, 0.0).with_spin(0.0, 0.0001), &cfg);
        let nudged_ratio = describe_spin(&nudged, &cfg).roll_ratio;
        assert!(nudged_ratio < 0.01, "ratio = {nudged_ratio}");

        let mut flat = cfg;
        flat.shot.center_roll_bias = 0.0;
        let mut stun = BallState::default();
        apply_shot(&mut stun, &Shot::new(0.25, 0.0), &flat);
        assert_eq!(describe_spin(&stun, &flat).roll, RollKind::Stun);
    }

    #[test]
    fn draw_and_follow_scale_with_natural_roll() {
        let cfg = PhysicsConfig::default();
        let mut draw = BallState::default();
        apply_shot(&mut draw, &Shot::new(0.4, 1.0).with_spin(0.0, -0.5), &cfg);
        let desc = describe_spin(&draw, &cfg);
        assert_eq!(desc.roll, RollKind::Backspin);
        assert!((desc.roll_ratio + 1.25).abs() < 1e-3);

        let mut follow = BallState::default();
        apply_shot(&mut follow, &Shot::new(0.4, 1.0).with_spin(0.0, 1.0), &cfg);
        assert_eq!(describe_spin(&follow, &cfg).roll, RollKind::Topspin);
    }

    #[test]
    fn side_offset_sets_english() {
        let cfg = PhysicsConfig::default();
        let mut ball = BallState::default();
        apply_shot(&mut ball, &Shot::new(0.25, 0.0).with_spin(-0.5, 0.2), &cfg);
        assert!((ball.side_spin() + 0.5 * 2.0 * 8.0).abs() < 1e-4);
        assert_eq!(describe_spin(&ball, &cfg).english, English::Left);
    }

    #[test]
    fn position_and_vertical_velocity_are_kept() {
        let cfg = PhysicsConfig::default();
        let mut ball = BallState::at_rest(Vec2::new(0.3, -0.4));
        ball.velocity.y = -0.1;
        apply_shot(&mut ball, &Shot::new(1.0, 2.0), &cfg);
        assert_eq!(ball.position, Vec2::new(0.3, -0.4));
        assert_eq!(ball.velocity.y, -0.1);
    }
}
