//! Phase integrator: advances one ball by one timestep.
//!
//! Each call picks exactly one of two regimes from the current slip:
//!
//! ```text
//!   slip > threshold  →  Sliding: Coulomb friction, spin driven toward natural roll
//!   otherwise         →  Rolling: constant rolling resistance, spin locked to v / R
//! ```
//!
//! Side-spin decay, swerve and nap drag are applied on top of either regime,
//! then position is integrated with explicit Euler. Balls never see each other
//! here; contacts go through `collision` and `cushion`.

use glam::Vec2;

use crate::core::ball::{natural_roll, BallState, Phase};
use crate::core::config::PhysicsConfig;

/// Advance `ball` by `dt` seconds.
///
/// A non-finite or non-positive `dt` leaves the state unchanged.
pub fn advance(ball: &mut BallState, dt: f32, config: &PhysicsConfig) {
    if !(dt.is_finite() && dt > 0.0) {
        log::warn!("advance: ignoring dt = {}", dt);
        return;
    }

    let thresholds = &config.thresholds;
    if ball.speed() < thresholds.velocity_stop && ball.angular_speed() < thresholds.angular_stop {
        stop(ball, dt);
        return;
    }

    let radius = config.ball.radius;
    if ball.slip_speed(radius) > thresholds.slip_threshold {
        ball.enter_phase(Phase::Sliding);
        slide(ball, dt, config);
    } else {
        ball.enter_phase(Phase::Rolling);
        roll(ball, dt, config);
    }

    decay_side_spin(ball, dt, config);
    swerve(ball, dt, config);
    nap_drag(ball, dt, config);

    // Swerve and nap only touch linear velocity; keep a rolling ball exactly no-slip.
    if ball.phase == Phase::Rolling {
        ball.set_roll_spin(natural_roll(ball.planar_velocity(), radius));
    }

    ball.position += ball.planar_velocity() * dt;
    ball.phase_time += dt;
}

/// The only terminal state: everything exactly zero.
fn stop(ball: &mut BallState, dt: f32) {
    ball.velocity = glam::Vec3::ZERO;
    ball.angular_velocity = glam::Vec3::ZERO;
    if ball.phase == Phase::Stationary {
        ball.phase_time += dt;
    } else {
        ball.enter_phase(Phase::Stationary);
    }
}

fn slide(ball: &mut BallState, dt: f32, config: &PhysicsConfig) {
    let radius = config.ball.radius;
    let g = config.gravity;
    let mu = config.cloth.slide_friction;
    let partition = &config.friction_partition;

    // Linear loss: only a share of the friction impulse; the rest goes into torque.
    let slip = ball.slip_velocity(radius);
    let slip_speed = slip.length();
    if slip_speed > 0.0 {
        let decel = mu * g * dt * partition.linear_share;
        let v = ball.planar_velocity() - slip / slip_speed * decel;
        ball.set_planar_velocity(v);
    }

    // Spin-up toward natural roll for the (new) linear velocity.
    let target = natural_roll(ball.planar_velocity(), radius);
    let gap = target - ball.roll_spin();
    let gap_len = gap.length();
    if gap_len > partition.min_spin_correction {
        let spec = &config.ball;
        let angular_accel = mu * spec.mass * g * radius / spec.inertia();
        let step = (angular_accel * dt * partition.spin_gain).min(gap_len);
        ball.set_roll_spin(ball.roll_spin() + gap / gap_len * step);
    }
}

fn roll(ball: &mut BallState, dt: f32, config: &PhysicsConfig) {
    let decel = config.cloth.roll_friction * config.gravity * dt;
    scale_speed_by(ball, decel);
    ball.set_roll_spin(natural_roll(ball.planar_velocity(), config.ball.radius));
}

/// Remove `decel` from the planar speed, clamped at zero, keeping direction.
fn scale_speed_by(ball: &mut BallState, decel: f32) {
    let v = ball.planar_velocity();
    let speed = v.length();
    if speed <= 0.0 {
        return;
    }
    let new_speed = (speed - decel).max(0.0);
    ball.set_planar_velocity(v * (new_speed / speed));
}

/// Geometric decay of ωy, normalized per second so results do not depend on frame rate.
fn decay_side_spin(ball: &mut BallState, dt: f32, config: &PhysicsConfig) {
    let retention = config.cloth.side_spin_retention_per_second.powf(dt);
    ball.angular_velocity.y *= retention;
}

/// Grip multiplier for swerve at a given pace.
///
/// Gaussian around the optimal speed, faded in from rest, and damped at high pace.
pub fn swerve_grip(speed: f32, config: &PhysicsConfig) -> f32 {
    let s = &config.swerve;
    let z = (speed - s.optimal_speed) / s.spread;
    let bell = (-z * z).exp();
    let ramp = (speed / s.ramp_speed).min(1.0);
    let damping = 1.0 / (1.0 + speed * s.high_speed_damping);
    bell * ramp * damping
}

/// Lateral push from side-spin, along ω × v (perpendicular to travel).
fn swerve(ball: &mut BallState, dt: f32, config: &PhysicsConfig) {
    let side_spin = ball.side_spin();
    let speed = ball.speed();
    if side_spin.abs() <= config.swerve.min_side_spin || speed <= config.swerve.min_speed {
        return;
    }
    let v = ball.planar_velocity();
    // (0, ωy, 0) × (vx, 0, vz) = (ωy·vz, 0, −ωy·vx)
    let lateral = Vec2::new(v.y, -v.x) / speed;
    let accel = side_spin * config.swerve.coefficient * swerve_grip(speed, config);
    ball.set_planar_velocity(v + lateral * accel * dt);
}

/// Extra drag when running against the cloth nap at low pace.
fn nap_drag(ball: &mut BallState, dt: f32, config: &PhysicsConfig) {
    let cloth = &config.cloth;
    let speed = ball.speed();
    if speed <= cloth.nap_min_speed || speed >= cloth.nap_max_speed {
        return;
    }
    let nap = cloth.nap_direction.normalize_or_zero();
    let alignment = (ball.planar_velocity() / speed).dot(nap);
    if alignment < -cloth.nap_opposition_threshold {
        let opposition = -alignment;
        scale_speed_by(ball, cloth.nap_drift_factor * opposition * dt);
    }
}
