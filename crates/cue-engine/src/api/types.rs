use bytemuck::{Pod, Zeroable};

use crate::core::ball::BallState;
use crate::physics::collision::ContactReport;
use crate::physics::cushion::ReboundReport;

/// Index of a ball on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BallId(pub u32);

impl BallId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-ball state as seen by TypeScript via SharedArrayBuffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BallSnapshot {
    pub x: f32,
    pub z: f32,
    pub vx: f32,
    pub vz: f32,
    pub wx: f32,
    pub wy: f32,
    pub wz: f32,
    /// `Phase::as_f32`.
    pub phase: f32,
}

impl BallSnapshot {
    pub const FLOATS: usize = 8;
}

impl From<&BallState> for BallSnapshot {
    fn from(ball: &BallState) -> Self {
        Self {
            x: ball.position.x,
            z: ball.position.y,
            vx: ball.velocity.x,
            vz: ball.velocity.z,
            wx: ball.angular_velocity.x,
            wy: ball.angular_velocity.y,
            wz: ball.angular_velocity.z,
            phase: ball.phase.as_f32(),
        }
    }
}

/// Something physically notable that happened during a tick.
/// `kind` identifies the event, `a/b/value` carry payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct ContactEvent {
    pub kind: f32,
    pub a: f32,
    pub b: f32,
    pub value: f32,
}

impl ContactEvent {
    pub const FLOATS: usize = 4;

    /// Ball-ball contact. `a` striker, `b` struck ball, `value` throw angle (degrees).
    pub const BALL: f32 = 1.0;
    /// Cushion strike. `a` ball, `b` normal speed (m/s), `value` incidence angle (degrees).
    pub const CUSHION: f32 = 2.0;
    /// Cue strike. `a` ball, `b` unused, `value` launch speed (m/s).
    pub const SHOT: f32 = 3.0;
    /// Every ball has come to rest.
    pub const SETTLED: f32 = 4.0;

    pub fn ball(striker: BallId, struck: BallId, report: &ContactReport) -> Self {
        Self {
            kind: Self::BALL,
            a: striker.0 as f32,
            b: struck.0 as f32,
            value: report.throw_angle_deg,
        }
    }

    pub fn cushion(ball: BallId, report: &ReboundReport) -> Self {
        Self {
            kind: Self::CUSHION,
            a: ball.0 as f32,
            b: report.normal_speed,
            value: report.incidence_deg,
        }
    }

    pub fn shot(ball: BallId, speed: f32) -> Self {
        Self {
            kind: Self::SHOT,
            a: ball.0 as f32,
            b: 0.0,
            value: speed,
        }
    }

    pub fn settled() -> Self {
        Self {
            kind: Self::SETTLED,
            ..Default::default()
        }
    }
}
