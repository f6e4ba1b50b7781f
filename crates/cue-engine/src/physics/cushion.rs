//! Cushion (rail) rebound.
//!
//! The coefficient of restitution depends on the incidence angle, measured from
//! the rail normal (0° = dead-on, 90° = grazing):
//!
//! ```text
//!  CoR
//!   │                       ┌──────── glancing
//!   │               ╭───────╯
//!   │        ╭──────╯ mid
//!   │   ╭────╯ perpendicular
//!   │ ╭─╯ floor
//!   └─┴───┴──────────┴──────────┴──── angle
//!     0   8          30         60
//! ```
//!
//! Each segment is eased with a half-cosine so the curve has no kinks at the
//! joins. A speed-dependent compression loss is subtracted afterwards.

use std::f32::consts::PI;

use glam::Vec2;

use crate::core::ball::BallState;
use crate::core::config::{CushionConfig, PhysicsConfig};
use crate::physics::energy;

const SHALLOW_DEG: f32 = 8.0;
const MID_DEG: f32 = 30.0;
const GLANCING_DEG: f32 = 60.0;

/// Guards divisions by the normal speed.
const MIN_NORMAL_SPEED: f32 = 1e-4;

/// Outcome of one cushion strike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReboundReport {
    /// Angle between the incoming velocity and the rail normal (degrees).
    pub incidence_deg: f32,
    /// Coefficient of restitution actually applied.
    pub restitution: f32,
    /// Normal speed into the rail before the strike (m/s).
    pub normal_speed: f32,
}

/// Half-cosine blend from `a` to `b` as `t` goes 0 → 1.
fn smooth(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * (1.0 - (PI * t).cos()) * 0.5
}

/// Angle-only part of the CoR curve, before compression loss and clamping.
fn restitution_curve(incidence_deg: f32, cushion: &CushionConfig) -> f32 {
    let perpendicular = cushion.restitution_perpendicular;
    let glancing = cushion.restitution_glancing;
    let mid = perpendicular + (glancing - perpendicular) * cushion.mid_blend;
    let angle = incidence_deg.max(0.0);

    if angle < SHALLOW_DEG {
        let floor = perpendicular * cushion.shallow_floor_ratio;
        smooth(floor, perpendicular, angle / SHALLOW_DEG)
    } else if angle < MID_DEG {
        smooth(perpendicular, mid, (angle - SHALLOW_DEG) / (MID_DEG - SHALLOW_DEG))
    } else if angle < GLANCING_DEG {
        smooth(mid, glancing, (angle - MID_DEG) / (GLANCING_DEG - MID_DEG))
    } else {
        glancing
    }
}

/// Effective coefficient of restitution for a strike at `incidence_deg` and `impact_speed` (m/s).
pub fn effective_restitution(incidence_deg: f32, impact_speed: f32, cushion: &CushionConfig) -> f32 {
    let compression = (impact_speed.max(0.0) / cushion.compression_speed).min(1.0) * cushion.compression_factor;
    (restitution_curve(incidence_deg, cushion) - compression)
        .clamp(cushion.min_restitution, cushion.max_restitution)
}

/// Share of tangential velocity kept through the strike.
fn tangential_retention(incidence_deg: f32, cushion: &CushionConfig) -> f32 {
    if incidence_deg < SHALLOW_DEG {
        smooth(
            cushion.shallow_retention_floor,
            cushion.retention,
            incidence_deg.max(0.0) / SHALLOW_DEG,
        )
    } else {
        cushion.retention
    }
}

/// Bounce `ball` off a rail whose normal `rail_normal` points into the playing area.
///
/// `impact_speed` drives the compression loss; hosts normally pass the ball's
/// speed at the moment the crossing was detected. Returns `None`, leaving the
/// ball unchanged, when it is already moving away from the rail or the normal
/// is degenerate.
pub fn rebound(
    ball: &mut BallState,
    rail_normal: Vec2,
    impact_speed: f32,
    config: &PhysicsConfig,
) -> Option<ReboundReport> {
    let cushion = &config.cushion;
    let radius = config.ball.radius;

    let n = rail_normal.try_normalize()?;
    let t = n.perp();
    let v = ball.planar_velocity();
    let v_n = v.dot(n);
    if v_n >= 0.0 {
        return None;
    }
    let v_t = v.dot(t);

    let energy_before = energy::total_energy(ball, &config.ball);

    let incidence_deg = v_t.abs().atan2(v_n.abs()).to_degrees();
    let restitution = effective_restitution(incidence_deg, impact_speed, cushion);

    // English pushes the ball along the rail, opposite to the spin's surface speed
    let spin_term = -cushion.side_spin_throw * ball.side_spin() * radius;

    // Top/back-spin about the tangent axis changes how the nose of the cushion grips
    let roll_ratio = -ball.roll_spin().dot(t) * radius / v_n.abs().max(MIN_NORMAL_SPEED);
    let grip = 1.0 - cushion.grip_gain * cushion.contact_lever() * roll_ratio.abs().min(1.0);

    let retention = tangential_retention(incidence_deg, cushion);
    let new_n = -v_n * restitution;
    let new_t = v_t * retention * grip + spin_term;
    ball.set_planar_velocity(n * new_n + t * new_t);

    ball.angular_velocity.y *= cushion.side_spin_damping;
    let roll = ball.roll_spin() * cushion.roll_spin_damping;
    ball.set_roll_spin(roll);
    ball.mark_contact();

    energy::cap_single(ball, &config.ball, energy_before);

    log::debug!(
        "cushion: incidence={:.1}° cor={:.3} v_n={:.3} -> {:.3}",
        incidence_deg,
        restitution,
        -v_n,
        new_n
    );

    Some(ReboundReport {
        incidence_deg,
        restitution,
        normal_speed: -v_n,
    })
}
