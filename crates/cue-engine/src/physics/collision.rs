//! Ball-ball contact resolver.
//!
//! Impulse-based, equal masses. On top of the normal impulse the model adds a
//! Coulomb-limited tangential impulse ("throw") driven by the relative
//! tangential velocity and the striker's side-spin, and sets the struck ball
//! up close to natural roll.
//!
//! ```text
//!        t ↑
//!          │
//!    A ●───┼───● B      n = (B − A) / |B − A|
//!          │            t = n rotated +90° on the table plane
//! ```

use glam::Vec2;

use crate::core::ball::{natural_roll, BallState};
use crate::core::config::PhysicsConfig;
use crate::physics::energy;

/// Below this center distance (m) the contact normal is undefined.
const MIN_DISTANCE: f32 = 1e-6;

/// What happened during one resolved contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactReport {
    /// Deviation of the struck ball from the line of centres, in degrees.
    pub throw_angle_deg: f32,
    /// Normal impulse (N·s).
    pub normal_impulse: f32,
    /// Signed tangential impulse along `t` applied to the struck ball (N·s).
    pub tangential_impulse: f32,
    /// Approach speed along the normal (m/s).
    pub closing_speed: f32,
}

/// Resolve a contact between striker `a` and struck ball `b`.
///
/// Returns `None`, leaving both balls unchanged, when the pair is beyond the
/// gating distance, coincident, or already separating.
///
/// The pair never leaves with more energy than it brought in. The struck
/// ball's roll is set to `struck_roll_fraction` of natural roll first, and
/// the ceiling then trims spin before anything else. On a stun shot, where
/// the striker carries no spin to pay for it, the struck ball ends up with
/// roughly a third of natural roll instead.
pub fn resolve(a: &mut BallState, b: &mut BallState, config: &PhysicsConfig) -> Option<ContactReport> {
    let spec = &config.ball;
    let contact = &config.collision;
    let radius = spec.radius;
    let mass = spec.mass;

    let delta = b.position - a.position;
    let distance = delta.length();
    if distance < MIN_DISTANCE || distance > contact.gating_radii * radius {
        return None;
    }
    let n = delta / distance;

    let va = a.planar_velocity();
    let vb = b.planar_velocity();
    let v_n = (va - vb).dot(n);
    if v_n <= 0.0 {
        return None;
    }

    let energy_before = energy::total_energy(a, spec) + energy::total_energy(b, spec);

    // 1. Penetration correction
    let contact_distance = 2.0 * radius;
    if distance < contact_distance {
        let overlap = contact_distance + contact.separation_margin - distance;
        let (speed_a, speed_b) = (va.length(), vb.length());
        let total = speed_a + speed_b;
        // Faster ball moves less
        let share_a = if total > 1e-6 { speed_b / total } else { 0.5 };
        a.position -= n * overlap * share_a;
        b.position += n * overlap * (1.0 - share_a);
    }

    // 2. Normal impulse, equal masses
    let j_n = (1.0 + contact.restitution) * mass * v_n / 2.0;

    // 3. Tangential impulse. Relative slip of A's contact point against B's,
    //    including A's side-spin surface speed (ω × r along t is −ωy·R).
    let t = Vec2::new(-n.y, n.x);
    let slip_t = (va - vb).dot(t) - a.side_spin() * radius;
    let speed_factor = (contact.slow_impact_gain / (v_n + contact.slow_impact_offset)).min(1.0);
    // Slow contacts last longer and accumulate relatively more friction
    let coulomb = contact.friction * j_n * contact.friction_accumulation * speed_factor;
    // Friction can at most bring the contact points to a common tangential speed
    let sticking = mass * slip_t.abs() / 2.0;
    let j_t = slip_t.signum() * coulomb.min(sticking);

    // 4. Equal and opposite impulses
    let impulse = n * j_n + t * j_t;
    a.set_planar_velocity(va - impulse / mass);
    b.set_planar_velocity(vb + impulse / mass);

    // 5. Spin transfer
    let delta_spin = j_t * radius / spec.inertia();
    a.angular_velocity.y = a.angular_velocity.y * contact.side_spin_damping + contact.side_spin_coupling * delta_spin;
    b.angular_velocity.y += contact.struck_side_spin_share * delta_spin;

    // 6. Struck ball leaves close to natural roll
    let roll = natural_roll(b.planar_velocity(), radius) * contact.struck_roll_fraction;
    b.set_roll_spin(roll);

    a.mark_contact();
    b.mark_contact();

    energy::cap_pair(a, b, spec, energy_before);

    // 7. Throw angle
    let throw_angle_deg = j_t.abs().atan2(j_n).to_degrees();
    log::debug!(
        "ball contact: v_n={:.3} m/s J_n={:.5} J_t={:.5} throw={:.2}°",
        v_n,
        j_n,
        j_t,
        throw_angle_deg
    );

    Some(ContactReport {
        throw_angle_deg,
        normal_impulse: j_n,
        tangential_impulse: j_t,
        closing_speed: v_n,
    })
}

/// A resolved contact between two balls of a slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairContact {
    pub striker: usize,
    pub struck: usize,
    pub report: ContactReport,
}

/// Resolve balls `i` and `j` of a slice, treating the faster one as the striker.
pub fn resolve_pair(
    balls: &mut [BallState],
    i: usize,
    j: usize,
    config: &PhysicsConfig,
) -> Option<PairContact> {
    if i == j || i >= balls.len() || j >= balls.len() {
        return None;
    }
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let (head, tail) = balls.split_at_mut(hi);
    let (first, second) = (&mut head[lo], &mut tail[0]);
    let (striker, struck, report) = if first.speed() >= second.speed() {
        (lo, hi, resolve(first, second, config)?)
    } else {
        (hi, lo, resolve(second, first, config)?)
    };
    Some(PairContact { striker, struck, report })
}
