//! SharedArrayBuffer layout.
//! Must stay in sync with TypeScript `protocol.ts`.
//!
//! Layout (all values in f32 / 4 bytes):
//! ```text
//! [Header: 16 floats]
//! [Balls: max_balls × 8 floats]
//! [Events: max_events × 4 floats]
//! [Trajectory: max_trajectory_points × 3 floats]
//! ```
//!
//! Capacities are written once into the header at init.
//! TypeScript reads them from the header to compute offsets dynamically.

use crate::api::types::{BallSnapshot, ContactEvent};
use crate::core::ball::BallState;
use crate::physics::trajectory::Trajectory;

/// Number of floats in the header section.
pub const HEADER_FLOATS: usize = 16;

/// Header field indices.
pub const HEADER_LOCK: usize = 0;
pub const HEADER_FRAME_COUNTER: usize = 1;
pub const HEADER_MAX_BALLS: usize = 2;
pub const HEADER_BALL_COUNT: usize = 3;
pub const HEADER_MAX_EVENTS: usize = 4;
pub const HEADER_EVENT_COUNT: usize = 5;
pub const HEADER_MAX_TRAJECTORY_POINTS: usize = 6;
pub const HEADER_TRAJECTORY_POINT_COUNT: usize = 7;
pub const HEADER_TABLE_WIDTH: usize = 8;
pub const HEADER_TABLE_LENGTH: usize = 9;
pub const HEADER_BALL_RADIUS: usize = 10;
pub const HEADER_ALL_STATIONARY: usize = 11;
pub const HEADER_PROTOCOL_VERSION: usize = 12;

/// Protocol version written into the header.
pub const PROTOCOL_VERSION: f32 = 1.0;

/// Floats per ball snapshot. Fixed by the wire format.
pub const BALL_FLOATS: usize = BallSnapshot::FLOATS;

/// Floats per contact event: kind, a, b, value. Fixed by the wire format.
pub const EVENT_FLOATS: usize = ContactEvent::FLOATS;

/// Floats per trajectory point: x, z, phase.
pub const TRAJECTORY_POINT_FLOATS: usize = 3;

pub const DEFAULT_MAX_BALLS: usize = 22;
pub const DEFAULT_MAX_EVENTS: usize = 64;
pub const DEFAULT_MAX_TRAJECTORY_POINTS: usize = 512;

/// Runtime-computed buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolLayout {
    pub max_balls: usize,
    /// Maximum contact events per frame.
    pub max_events: usize,
    pub max_trajectory_points: usize,

    /// Size of ball data section in floats.
    pub ball_data_floats: usize,
    /// Size of event data section in floats.
    pub event_data_floats: usize,
    /// Size of trajectory data section in floats.
    pub trajectory_data_floats: usize,

    /// Offset (in floats) where ball data begins.
    pub ball_data_offset: usize,
    /// Offset (in floats) where event data begins.
    pub event_data_offset: usize,
    /// Offset (in floats) where trajectory data begins.
    pub trajectory_data_offset: usize,

    /// Total buffer size in floats.
    pub buffer_total_floats: usize,
    /// Total buffer size in bytes.
    pub buffer_total_bytes: usize,
}

impl ProtocolLayout {
    /// Compute layout from raw capacity values.
    pub fn new(max_balls: usize, max_events: usize, max_trajectory_points: usize) -> Self {
        let ball_data_floats = max_balls * BALL_FLOATS;
        let event_data_floats = max_events * EVENT_FLOATS;
        let trajectory_data_floats = max_trajectory_points * TRAJECTORY_POINT_FLOATS;

        let ball_data_offset = HEADER_FLOATS;
        let event_data_offset = ball_data_offset + ball_data_floats;
        let trajectory_data_offset = event_data_offset + event_data_floats;

        let buffer_total_floats = trajectory_data_offset + trajectory_data_floats;
        let buffer_total_bytes = buffer_total_floats * 4;

        Self {
            max_balls,
            max_events,
            max_trajectory_points,
            ball_data_floats,
            event_data_floats,
            trajectory_data_floats,
            ball_data_offset,
            event_data_offset,
            trajectory_data_offset,
            buffer_total_floats,
            buffer_total_bytes,
        }
    }

    /// A zeroed buffer of the right size with capacities already in the header.
    pub fn allocate(&self) -> Vec<f32> {
        let mut buf = vec![0.0; self.buffer_total_floats];
        buf[HEADER_MAX_BALLS] = self.max_balls as f32;
        buf[HEADER_MAX_EVENTS] = self.max_events as f32;
        buf[HEADER_MAX_TRAJECTORY_POINTS] = self.max_trajectory_points as f32;
        buf[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        buf
    }

    /// Copy ball snapshots in, truncating at capacity. Returns the count written.
    pub fn write_balls(&self, buf: &mut [f32], balls: &[BallState]) -> usize {
        let count = balls.len().min(self.max_balls);
        let section = &mut buf[self.ball_data_offset..self.event_data_offset];
        for (slot, ball) in section.chunks_exact_mut(BALL_FLOATS).zip(&balls[..count]) {
            let snapshot = BallSnapshot::from(ball);
            slot.copy_from_slice(bytemuck::cast_slice(std::slice::from_ref(&snapshot)));
        }
        buf[HEADER_BALL_COUNT] = count as f32;
        count
    }

    /// Copy events in, truncating at capacity. Returns the count written.
    pub fn write_events(&self, buf: &mut [f32], events: &[ContactEvent]) -> usize {
        let count = events.len().min(self.max_events);
        if events.len() > count {
            log::warn!("protocol: dropping {} contact events over capacity", events.len() - count);
        }
        let floats: &[f32] = bytemuck::cast_slice(&events[..count]);
        buf[self.event_data_offset..self.event_data_offset + floats.len()].copy_from_slice(floats);
        buf[HEADER_EVENT_COUNT] = count as f32;
        count
    }

    /// Sample `trajectory` into the buffer, truncating at capacity. Returns the point count.
    pub fn write_trajectory(&self, buf: &mut [f32], trajectory: &Trajectory) -> usize {
        let section = &mut buf[self.trajectory_data_offset..self.buffer_total_floats];
        let mut count = 0;
        for (slot, point) in section.chunks_exact_mut(TRAJECTORY_POINT_FLOATS).zip(trajectory) {
            slot[0] = point.position.x;
            slot[1] = point.position.y;
            slot[2] = point.phase.as_f32();
            count += 1;
        }
        buf[HEADER_TRAJECTORY_POINT_COUNT] = count as f32;
        count
    }
}

impl Default for ProtocolLayout {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BALLS, DEFAULT_MAX_EVENTS, DEFAULT_MAX_TRAJECTORY_POINTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ball::Phase;
    use crate::core::config::PhysicsConfig;
    use crate::physics::trajectory::predict;
    use glam::{Vec2, Vec3};

    #[test]
    fn offsets_are_contiguous() {
        let layout = ProtocolLayout::new(16, 32, 100);

        assert_eq!(layout.ball_data_offset, HEADER_FLOATS);
        assert_eq!(layout.event_data_offset, layout.ball_data_offset + 16 * 8);
        assert_eq!(layout.trajectory_data_offset, layout.event_data_offset + 32 * 4);
        assert_eq!(layout.buffer_total_floats, layout.trajectory_data_offset + 100 * 3);
        assert_eq!(layout.buffer_total_bytes, layout.buffer_total_floats * 4);
    }

    #[test]
    fn allocate_writes_capacities() {
        let layout = ProtocolLayout::default();
        let buf = layout.allocate();
        assert_eq!(buf.len(), layout.buffer_total_floats);
        assert_eq!(buf[HEADER_MAX_BALLS], DEFAULT_MAX_BALLS as f32);
        assert_eq!(buf[HEADER_MAX_EVENTS], DEFAULT_MAX_EVENTS as f32);
        assert_eq!(buf[HEADER_MAX_TRAJECTORY_POINTS], DEFAULT_MAX_TRAJECTORY_POINTS as f32);
        assert_eq!(buf[HEADER_PROTOCOL_VERSION], PROTOCOL_VERSION);
    }

    #[test]
    fn balls_are_packed_and_truncated() {
        let layout = ProtocolLayout::new(2, 4, 4);
        let mut buf = layout.allocate();
        let balls = [
            BallState::at_rest(Vec2::new(0.1, 0.2)),
            BallState::at_rest(Vec2::new(0.3, 0.4))
                .with_velocity(Vec3::new(1.0, 0.0, -1.0))
                .with_phase(Phase::Sliding),
            BallState::at_rest(Vec2::new(9.0, 9.0)),
        ];
        assert_eq!(layout.write_balls(&mut buf, &balls), 2);
        assert_eq!(buf[HEADER_BALL_COUNT], 2.0);

        let second = &buf[layout.ball_data_offset + BALL_FLOATS..layout.event_data_offset];
        assert_eq!(second, &[0.3, 0.4, 1.0, -1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn events_are_packed_and_truncated() {
        let layout = ProtocolLayout::new(1, 2, 4);
        let mut buf = layout.allocate();
        let events = vec![ContactEvent::settled(); 3];
        assert_eq!(layout.write_events(&mut buf, &events), 2);
        assert_eq!(buf[layout.event_data_offset], ContactEvent::SETTLED);
        assert_eq!(buf[layout.event_data_offset + EVENT_FLOATS], ContactEvent::SETTLED);
        assert_eq!(buf[layout.trajectory_data_offset], 0.0);
    }

    #[test]
    fn trajectory_fills_up_to_capacity() {
        let cfg = PhysicsConfig::default();
        let layout = ProtocolLayout::new(1, 1, 10);
        let mut buf = layout.allocate();
        let ball = BallState::at_rest(Vec2::ZERO)
            .with_velocity(Vec3::new(1.0, 0.0, 0.0))
            .with_phase(Phase::Sliding);

        let count = layout.write_trajectory(&mut buf, &predict(&ball, 5.0, 1.0 / 120.0, &cfg));
        assert_eq!(count, 10);
        assert_eq!(buf[HEADER_TRAJECTORY_POINT_COUNT], 10.0);
        assert_eq!(buf[layout.trajectory_data_offset + 2], 1.0);

        let resting = BallState::at_rest(Vec2::new(0.5, 0.25));
        let count = layout.write_trajectory(&mut buf, &predict(&resting, 5.0, 1.0 / 120.0, &cfg));
        assert_eq!(count, 1);
        assert_eq!(&buf[layout.trajectory_data_offset..layout.trajectory_data_offset + 3], &[0.5, 0.25, 0.0]);
    }
}
