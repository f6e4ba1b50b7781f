use cue_engine::bridge::protocol::{
    HEADER_ALL_STATIONARY, HEADER_BALL_RADIUS, HEADER_FRAME_COUNTER, HEADER_TABLE_LENGTH,
    HEADER_TABLE_WIDTH,
};
use cue_engine::{BallId, BroadPhase, ProtocolLayout, Shot, SweepPairs, Table, TableConfig};
use cue_engine::glam::Vec2;

/// Drives a `Table` and mirrors it into one flat f32 buffer for TypeScript.
///
/// wasm-bindgen cannot export generic structs, so `lib.rs` keeps a single
/// runner in a `thread_local!` and exposes free functions over it.
pub struct TableRunner<B: BroadPhase = SweepPairs> {
    table: Table<B>,
    config: TableConfig,
    layout: ProtocolLayout,
    buffer: Vec<f32>,
    frame: u32,
}

impl TableRunner<SweepPairs> {
    pub fn new(config: TableConfig) -> Self {
        Self::with_table(Table::new(&config), config)
    }
}

impl<B: BroadPhase> TableRunner<B> {
    pub fn with_table(table: Table<B>, config: TableConfig) -> Self {
        let layout = ProtocolLayout::default();
        let mut buffer = layout.allocate();
        buffer[HEADER_TABLE_WIDTH] = config.width;
        buffer[HEADER_TABLE_LENGTH] = config.length;
        buffer[HEADER_BALL_RADIUS] = config.physics.ball.radius;
        buffer[HEADER_ALL_STATIONARY] = 1.0;
        Self {
            table,
            config,
            layout,
            buffer,
            frame: 0,
        }
    }

    pub fn table(&self) -> &Table<B> {
        &self.table
    }

    /// Add a ball at rest. Returns its index, or `None` when the buffer is full.
    pub fn add_ball(&mut self, x: f32, z: f32) -> Option<u32> {
        if self.table.balls().len() >= self.layout.max_balls {
            log::warn!("runner: ball capacity {} reached", self.layout.max_balls);
            return None;
        }
        let id = self.table.add_ball(Vec2::new(x, z));
        self.publish();
        Some(id.0)
    }

    pub fn shoot(&mut self, index: u32, shot: Shot) -> bool {
        let ok = self.table.shoot(BallId(index), &shot);
        self.publish();
        ok
    }

    pub fn respot(&mut self, index: u32, x: f32, z: f32) -> bool {
        let ok = self.table.respot(BallId(index), Vec2::new(x, z));
        self.publish();
        ok
    }

    /// Run one frame and refresh the buffer.
    pub fn tick(&mut self, dt: f32) -> u32 {
        let steps = self.table.tick(dt);
        self.frame = self.frame.wrapping_add(1);
        self.publish();
        steps
    }

    /// Write the aim line for a ball into the trajectory section. Returns the point count.
    pub fn predict(&mut self, index: u32, duration: f32) -> u32 {
        let Some(trajectory) = self.table.predict(BallId(index), duration) else {
            return 0;
        };
        self.layout.write_trajectory(&mut self.buffer, &trajectory) as u32
    }

    /// Flattened `(x, z, phase)` triples for one aim line, outside the shared buffer.
    pub fn trajectory_points(&self, index: u32, duration: f32) -> Vec<f32> {
        self.table
            .predict(BallId(index), duration)
            .map(|trajectory| {
                trajectory
                    .iter()
                    .flat_map(|p| [p.position.x, p.position.y, p.phase.as_f32()])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn describe_spin(&self, index: u32) -> String {
        self.table
            .describe_spin(BallId(index))
            .map(|desc| desc.to_string())
            .unwrap_or_default()
    }

    fn publish(&mut self) {
        self.layout.write_balls(&mut self.buffer, self.table.balls());
        self.layout.write_events(&mut self.buffer, self.table.events());
        self.buffer[HEADER_FRAME_COUNTER] = self.frame as f32;
        self.buffer[HEADER_ALL_STATIONARY] = if self.table.all_stationary() { 1.0 } else { 0.0 };
    }

    // ---- Pointer accessors for SharedArrayBuffer reads ----

    pub fn buffer_ptr(&self) -> *const f32 {
        self.buffer.as_ptr()
    }

    pub fn balls_ptr(&self) -> *const f32 {
        self.buffer[self.layout.ball_data_offset..].as_ptr()
    }

    pub fn events_ptr(&self) -> *const f32 {
        self.buffer[self.layout.event_data_offset..].as_ptr()
    }

    pub fn trajectory_ptr(&self) -> *const f32 {
        self.buffer[self.layout.trajectory_data_offset..].as_ptr()
    }

    pub fn ball_count(&self) -> u32 {
        self.table.balls().len().min(self.layout.max_balls) as u32
    }

    pub fn event_count(&self) -> u32 {
        self.table.events().len().min(self.layout.max_events) as u32
    }

    pub fn all_stationary(&self) -> bool {
        self.table.all_stationary()
    }

    pub fn table_width(&self) -> f32 {
        self.config.width
    }

    pub fn table_length(&self) -> f32 {
        self.config.length
    }

    // ---- Capacity accessors (read by TypeScript via wasm_bindgen exports) ----

    pub fn max_balls(&self) -> u32 {
        self.layout.max_balls as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn max_trajectory_points(&self) -> u32 {
        self.layout.max_trajectory_points as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }
}
