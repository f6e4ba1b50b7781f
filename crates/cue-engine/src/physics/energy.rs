//! Read-only diagnostics: energy bookkeeping and a human-readable spin summary.
//!
//! Nothing here feeds back into the simulation except the energy ceiling used
//! by the contact models.

use std::fmt;

use glam::Vec2;

use crate::core::ball::BallState;
use crate::core::config::{BallSpec, PhysicsConfig};

/// Translational kinetic energy on the table plane (J).
pub fn kinetic_energy(ball: &BallState, spec: &BallSpec) -> f32 {
    0.5 * spec.mass * ball.planar_velocity().length_squared()
}

/// Rotational kinetic energy (J).
pub fn rotational_energy(ball: &BallState, spec: &BallSpec) -> f32 {
    0.5 * spec.inertia() * ball.angular_velocity.length_squared()
}

pub fn total_energy(ball: &BallState, spec: &BallSpec) -> f32 {
    kinetic_energy(ball, spec) + rotational_energy(ball, spec)
}

/// Relative slack allowed before the energy ceiling kicks in.
const ENERGY_TOLERANCE: f32 = 1e-6;

/// Keep a single ball's energy at or below `budget` by scaling velocity and spin uniformly.
pub(crate) fn cap_single(ball: &mut BallState, spec: &BallSpec, budget: f32) {
    let after = total_energy(ball, spec);
    if after <= budget * (1.0 + ENERGY_TOLERANCE) || after <= 0.0 {
        return;
    }
    let k = (budget.max(0.0) / after).sqrt();
    log::debug!("energy ceiling (single): {:.5} J > {:.5} J, scaling by {:.4}", after, budget, k);
    ball.set_planar_velocity(ball.planar_velocity() * k);
    ball.angular_velocity *= k;
}

/// Keep a pair's total energy at or below `budget` without touching total momentum.
///
/// Spin is reduced first, since it carries no linear momentum. If linear energy
/// alone is still over budget, velocities relative to the centre of mass are
/// scaled down.
pub(crate) fn cap_pair(a: &mut BallState, b: &mut BallState, spec: &BallSpec, budget: f32) {
    let linear = kinetic_energy(a, spec) + kinetic_energy(b, spec);
    let rotational = rotational_energy(a, spec) + rotational_energy(b, spec);
    let after = linear + rotational;
    if after <= budget * (1.0 + ENERGY_TOLERANCE) || after <= 0.0 {
        return;
    }

    if linear <= budget {
        let k = ((budget - linear) / rotational).sqrt();
        log::debug!("energy ceiling (pair): spin scaled by {:.4}", k);
        a.angular_velocity *= k;
        b.angular_velocity *= k;
        return;
    }

    a.angular_velocity = glam::Vec3::ZERO;
    b.angular_velocity = glam::Vec3::ZERO;
    let va = a.planar_velocity();
    let vb = b.planar_velocity();
    let v_cm = (va + vb) * 0.5;
    let cm_energy = spec.mass * v_cm.length_squared();
    let relative = linear - cm_energy;
    if relative <= 0.0 {
        return;
    }
    let k = ((budget - cm_energy).max(0.0) / relative).sqrt();
    log::debug!("energy ceiling (pair): relative velocity scaled by {:.4}", k);
    a.set_planar_velocity(v_cm + (va - v_cm) * k);
    b.set_planar_velocity(v_cm + (vb - v_cm) * k);
}

/// Top/back-spin relative to natural roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollKind {
    /// Not moving.
    None,
    /// No forward spin at all.
    Stun,
    /// Spinning backward relative to travel.
    Backspin,
    /// Forward spin short of natural roll.
    PartialRoll,
    NaturalRoll,
    /// Forward spin beyond natural roll.
    Topspin,
}

/// Side-spin direction. Positive ωy reads as right English, matching `Shot::spin_x > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum English {
    None,
    Left,
    Right,
}

/// Summary of a ball's spin for UI and logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinDescription {
    pub roll: RollKind,
    /// Forward spin as a multiple of natural roll (0 when not moving).
    pub roll_ratio: f32,
    pub english: English,
    /// |ωy| (rad/s).
    pub side_spin: f32,
}

/// Side-spin below this (rad/s) is not worth mentioning.
const ENGLISH_THRESHOLD: f32 = 0.5;

/// Classify a ball's spin relative to its direction of travel.
pub fn describe_spin(ball: &BallState, config: &PhysicsConfig) -> SpinDescription {
    let radius = config.ball.radius;
    let speed = ball.speed();
    let side_spin = ball.side_spin();
    let english = if side_spin > ENGLISH_THRESHOLD {
        English::Right
    } else if side_spin < -ENGLISH_THRESHOLD {
        English::Left
    } else {
        English::None
    };

    if speed < config.thresholds.velocity_stop {
        return SpinDescription {
            roll: RollKind::None,
            roll_ratio: 0.0,
            english,
            side_spin: side_spin.abs(),
        };
    }

    let dir = ball.planar_velocity() / speed;
    // Unit spin axis for forward roll along `dir`
    let roll_axis = Vec2::new(-dir.y, dir.x);
    let natural = speed / radius;
    let roll_ratio = ball.roll_spin().dot(roll_axis) / natural;

    let roll = if roll_ratio.abs() < 0.05 {
        RollKind::Stun
    } else if roll_ratio < 0.0 {
        RollKind::Backspin
    } else if roll_ratio < 0.95 {
        RollKind::PartialRoll
    } else if roll_ratio <= 1.05 {
        RollKind::NaturalRoll
    } else {
        RollKind::Topspin
    };

    SpinDescription {
        roll,
        roll_ratio,
        english,
        side_spin: side_spin.abs(),
    }
}

impl fmt::Display for SpinDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roll = match self.roll {
            RollKind::None => "no roll",
            RollKind::Stun => "stun",
            RollKind::Backspin => "backspin",
            RollKind::PartialRoll => "partial roll",
            RollKind::NaturalRoll => "natural roll",
            RollKind::Topspin => "topspin",
        };
        write!(f, "{}", roll)?;
        if self.roll != RollKind::None {
            write!(f, " ({:.2}x)", self.roll_ratio)?;
        }
        match self.english {
            English::None => Ok(()),
            English::Left => write!(f, ", left english {:.1} rad/s", self.side_spin),
            English::Right => write!(f, ", right english {:.1} rad/s", self.side_spin),
        }
    }
}
