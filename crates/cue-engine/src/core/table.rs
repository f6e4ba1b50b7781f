//! Reference host loop: a rectangle of rails, a set of balls, fixed substeps.
//!
//! Per substep the order is
//! 1. ball-ball contacts (broad-phase pairs → resolver),
//! 2. cushion strikes,
//! 3. the phase integrator for every ball,
//!
//! so friction always acts on post-contact velocities.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::{BallId, ContactEvent};
use crate::broadphase::{BroadPhase, SweepPairs};
use crate::core::ball::BallState;
use crate::core::config::{ConfigError, PhysicsConfig};
use crate::core::rails::Rails;
use crate::core::time::FixedTimestep;
use crate::physics::energy::{self, SpinDescription};
use crate::physics::shot::{apply_shot, Shot};
use crate::physics::trajectory::{predict_with_rails, Trajectory};
use crate::physics::{collision, cushion, integrator};

/// Table geometry and stepping parameters, plus the physics tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Playing area along x (m).
    pub width: f32,
    /// Playing area along z (m).
    pub length: f32,
    /// Fixed substep (s).
    pub substep: f32,
    /// Substeps allowed per frame before time is dropped.
    pub max_substeps: u32,
    /// Sampling step for aim-line prediction (s).
    pub prediction_dt: f32,
    pub physics: PhysicsConfig,
}

impl Default for TableConfig {
    fn default() -> Self {
        let rails = Rails::nine_foot().size();
        Self {
            width: rails.x,
            length: rails.y,
            substep: 1.0 / 240.0,
            max_substeps: 16,
            prediction_dt: 1.0 / 120.0,
            physics: PhysicsConfig::default(),
        }
    }
}

impl TableConfig {
    /// Parse from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        log::info!("table config loaded from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let diameter = 2.0 * self.physics.ball.radius;
        if !(self.width > diameter && self.length > diameter) {
            return Err(ConfigError::Invalid("width", "table must be wider than a ball"));
        }
        if !(self.substep.is_finite() && self.substep > 0.0) {
            return Err(ConfigError::Invalid("substep", "must be positive"));
        }
        if !(self.prediction_dt.is_finite() && self.prediction_dt > 0.0) {
            return Err(ConfigError::Invalid("prediction_dt", "must be positive"));
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid("max_substeps", "must be at least 1"));
        }
        self.physics.validate()
    }

    pub fn rails(&self) -> Rails {
        Rails::new(self.width, self.length)
    }
}

/// A table of balls stepped with fixed substeps.
pub struct Table<B: BroadPhase = SweepPairs> {
    balls: Vec<BallState>,
    config: PhysicsConfig,
    rails: Rails,
    timestep: FixedTimestep,
    prediction_dt: f32,
    broad_phase: B,
    /// Scratch buffer reused by the broad-phase every substep.
    pairs: Vec<(usize, usize)>,
    events: Vec<ContactEvent>,
    /// How many of `events` were already visible after the last tick.
    reported: usize,
    moving: bool,
}

impl Table<SweepPairs> {
    pub fn new(config: &TableConfig) -> Self {
        Self::with_broad_phase(config, SweepPairs::new())
    }
}

impl<B: BroadPhase> Table<B> {
    pub fn with_broad_phase(config: &TableConfig, broad_phase: B) -> Self {
        let rails = config.rails();
        log::info!(
            "table: {:.2} × {:.2} m, substep {:.5} s (max {} per frame)",
            config.width,
            config.length,
            config.substep,
            config.max_substeps
        );
        Self {
            balls: Vec::new(),
            config: config.physics,
            rails,
            timestep: FixedTimestep::new(config.substep).with_max_steps(config.max_substeps),
            prediction_dt: config.prediction_dt,
            broad_phase,
            pairs: Vec::new(),
            events: Vec::new(),
            reported: 0,
            moving: false,
        }
    }

    /// Place a new ball at rest. The position is clamped onto the table.
    pub fn add_ball(&mut self, position: Vec2) -> BallId {
        let id = BallId(self.balls.len() as u32);
        let position = self.rails.clamp_inside(position, self.config.ball.radius);
        self.balls.push(BallState::at_rest(position));
        log::debug!("table: ball {} at ({:.3}, {:.3})", id.0, position.x, position.y);
        id
    }

    pub fn balls(&self) -> &[BallState] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&BallState> {
        self.balls.get(id.index())
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn rails(&self) -> &Rails {
        &self.rails
    }

    pub fn substep(&self) -> f32 {
        self.timestep.dt()
    }

    /// Events from the last `tick`, plus any shots taken since.
    pub fn events(&self) -> &[ContactEvent] {
        &self.events
    }

    /// Put a ball back at rest at `position`. Returns `false` for an unknown id.
    pub fn respot(&mut self, id: BallId, position: Vec2) -> bool {
        let position = self.rails.clamp_inside(position, self.config.ball.radius);
        match self.balls.get_mut(id.index()) {
            Some(ball) => {
                ball.respot(position);
                true
            }
            None => false,
        }
    }

    /// Strike a ball with the cue. Returns `false` for an unknown id.
    ///
    /// When the table was at rest the partial substep left in the accumulator
    /// is dropped, so the outcome does not depend on how long the table idled.
    pub fn shoot(&mut self, id: BallId, shot: &Shot) -> bool {
        let Some(ball) = self.balls.get_mut(id.index()) else {
            log::warn!("table: shot at unknown ball {}", id.0);
            return false;
        };
        apply_shot(ball, shot, &self.config);
        self.events.push(ContactEvent::shot(id, ball.speed()));
        if !self.moving {
            // A shot from rest starts on a substep boundary
            self.timestep.reset();
        }
        self.moving = true;
        true
    }

    pub fn all_stationary(&self) -> bool {
        self.balls.iter().all(BallState::is_stationary)
    }

    /// Kinetic plus rotational energy of every ball (J).
    pub fn total_energy(&self) -> f32 {
        self.balls
            .iter()
            .map(|ball| energy::total_energy(ball, &self.config.ball))
            .sum()
    }

    pub fn describe_spin(&self, id: BallId) -> Option<SpinDescription> {
        self.ball(id).map(|ball| energy::describe_spin(ball, &self.config))
    }

    /// Aim line for a ball, bouncing off this table's rails.
    pub fn predict(&self, id: BallId, duration: f32) -> Option<Trajectory> {
        let ball = self.ball(id)?;
        Some(predict_with_rails(ball, duration, self.prediction_dt, &self.config, &self.rails))
    }

    /// Advance by one frame of `frame_dt` seconds. Returns the number of substeps run.
    pub fn tick(&mut self, frame_dt: f32) -> u32 {
        self.events.drain(..self.reported);
        let steps = self.timestep.accumulate(frame_dt);
        let dt = self.timestep.dt();
        for _ in 0..steps {
            self.step(dt);
        }

        let resting = self.all_stationary();
        if self.moving && resting {
            log::debug!("table: all balls at rest");
            self.events.push(ContactEvent::settled());
        }
        self.moving = !resting;
        self.reported = self.events.len();
        steps
    }

    /// Run one substep of `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.resolve_contacts();
        self.resolve_cushions();
        for ball in &mut self.balls {
            integrator::advance(ball, dt, &self.config);
        }
    }

    fn resolve_contacts(&mut self) {
        // Balls touch at 2R; the resolver's wider gate only rejects stale pairs
        let gate = 2.0 * self.config.ball.radius;
        self.broad_phase
            .candidate_pairs(&self.balls, gate, &mut self.pairs);
        for &(i, j) in &self.pairs {
            if let Some(contact) = collision::resolve_pair(&mut self.balls, i, j, &self.config) {
                self.events.push(ContactEvent::ball(
                    BallId(contact.striker as u32),
                    BallId(contact.struck as u32),
                    &contact.report,
                ));
            }
        }
    }

    fn resolve_cushions(&mut self) {
        let radius = self.config.ball.radius;
        for (index, ball) in self.balls.iter_mut().enumerate() {
            // A corner can overlap two rails at once
            for _ in 0..2 {
                let Some(hit) = self.rails.crossing(ball.position, radius) else {
                    break;
                };
                let speed = ball.speed();
                if let Some(report) = cushion::rebound(ball, hit.normal, speed, &self.config) {
                    self.events.push(ContactEvent::cushion(BallId(index as u32), &report));
                }
                ball.position += hit.normal * hit.depth;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ball::Phase;
    use std::f32::consts::FRAC_PI_2;

    const FRAME: f32 = 1.0 / 60.0;

    fn run_until_settled<B: BroadPhase>(table: &mut Table<B>, max_frames: usize) -> Vec<ContactEvent> {
        let mut all = Vec::new();
        for _ in 0..max_frames {
            table.tick(FRAME);
            all.extend_from_slice(table.events());
            if table.all_stationary() {
                break;
            }
        }
        all
    }

    #[test]
    fn config_json_overrides_geometry_and_physics() {
        let cfg = TableConfig::from_json(
            r#"{ "width": 1.0, "length": 2.0, "physics": { "collision": { "restitution": 0.9 } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.rails(), Rails::new(1.0, 2.0));
        assert_eq!(cfg.physics.collision.restitution, 0.9);
        assert_eq!(cfg.substep, 1.0 / 240.0);

        assert!(TableConfig::from_json(r#"{ "substep": 0.0 }"#).is_err());
        assert!(TableConfig::from_json(r#"{ "width": 0.01 }"#).is_err());
    }

    #[test]
    fn add_ball_clamps_onto_table() {
        let mut table = Table::new(&TableConfig::default());
        let id = table.add_ball(Vec2::new(10.0, 0.0));
        let ball = table.ball(id).unwrap();
        assert!(table.rails().contains(ball.position, table.config().ball.radius * 0.99));
        assert_eq!(ball.phase, Phase::Stationary);
    }

    #[test]
    fn idle_table_stays_put() {
        let mut table = Table::new(&TableConfig::default());
        table.add_ball(Vec2::new(0.0, -0.5));
        table.add_ball(Vec2::new(0.1, 0.5));
        let before = table.balls().to_vec();
        for _ in 0..30 {
            table.tick(FRAME);
        }
        assert_eq!(table.balls()[0].position, before[0].position);
        assert_eq!(table.balls()[1].position, before[1].position);
        assert!(table.events().is_empty());
    }

    #[test]
    fn shot_runs_until_settled() {
        let mut table = Table::new(&TableConfig::default());
        let cue = table.add_ball(Vec2::new(0.0, -0.6));
        assert!(table.shoot(cue, &Shot::new(0.3, FRAC_PI_2)));
        assert_eq!(table.events()[0].kind, ContactEvent::SHOT);

        let events = run_until_settled(&mut table, 60 * 60);
        assert!(table.all_stationary());
        assert_eq!(events.last().map(|e| e.kind), Some(ContactEvent::SETTLED));
        let radius = table.config().ball.radius;
        assert!(table.rails().contains(table.balls()[0].position, radius * 0.5));
    }

    #[test]
    fn straight_shot_transfers_to_object_ball() {
        let mut table = Table::new(&TableConfig::default());
        let cue = table.add_ball(Vec2::new(0.0, -0.5));
        let object = table.add_ball(Vec2::new(0.0, 0.0));
        table.shoot(cue, &Shot::new(0.25, FRAC_PI_2));

        let mut contact = None;
        for _ in 0..120 {
            table.tick(FRAME);
            if let Some(ev) = table.events().iter().find(|e| e.kind == ContactEvent::BALL) {
                contact = Some(*ev);
                break;
            }
        }
        let contact = contact.expect("cue ball should reach the object ball");
        assert_eq!(contact.a, 0.0);
        assert_eq!(contact.b, 1.0);

        let obj = table.ball(object).unwrap();
        let cue_ball = table.ball(cue).unwrap();
        assert!(obj.velocity.z > 1.0, "object ball {:?}", obj.velocity);
        assert!(cue_ball.speed() < obj.speed());
    }

    #[test]
    fn cushion_bounce_reverses_and_reports() {
        let mut table = Table::new(&TableConfig::default());
        let id = table.add_ball(Vec2::new(0.0, 1.0));
        table.shoot(id, &Shot::new(0.3, FRAC_PI_2));

        let mut bounced = false;
        for _ in 0..120 {
            table.tick(FRAME);
            if table.events().iter().any(|e| e.kind == ContactEvent::CUSHION) {
                bounced = true;
                break;
            }
        }
        assert!(bounced);
        let ball = table.ball(id).unwrap();
        assert!(ball.velocity.z < 0.0, "velocity {:?}", ball.velocity);
    }

    #[test]
    fn replay_is_deterministic() {
        let run = || {
            let mut table = Table::new(&TableConfig::default());
            let cue = table.add_ball(Vec2::new(0.0, -0.9));
            for k in 0..5 {
                table.add_ball(Vec2::new(k as f32 * 0.06 - 0.12, 0.3));
            }
            table.shoot(cue, &Shot::new(0.8, 1.5).with_spin(-0.2, 0.3));
            for i in 0..300 {
                // Uneven frame times
                table.tick(if i % 3 == 0 { 1.0 / 50.0 } else { 1.0 / 70.0 });
            }
            table.balls().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn shot_from_rest_ignores_idle_frames() {
        let run = |idle: &[f32]| {
            let mut table = Table::new(&TableConfig::default());
            let cue = table.add_ball(Vec2::new(0.0, -0.5));
            table.add_ball(Vec2::new(0.02, 0.1));
            for &dt in idle {
                table.tick(dt);
            }
            table.shoot(cue, &Shot::new(0.4, FRAC_PI_2));
            for _ in 0..90 {
                table.tick(FRAME);
            }
            table
                .balls()
                .iter()
                .map(|b| (b.position, b.velocity, b.angular_velocity, b.phase))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(&[]), run(&[0.001, 0.0107, 0.0023]));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut table = Table::new(&TableConfig::default());
        assert!(!table.shoot(BallId(3), &Shot::new(1.0, 0.0)));
        assert!(!table.respot(BallId(0), Vec2::ZERO));
        assert!(table.predict(BallId(0), 1.0).is_none());
        assert!(table.describe_spin(BallId(0)).is_none());
    }

    fn racked(table: &mut Table<impl BroadPhase>) -> BallId {
        let spacing = 2.0 * table.config().ball.radius + 0.001;
        let cue = table.add_ball(Vec2::new(0.0, -0.7));
        for row in 0..5 {
            for k in 0..=row {
                let x = (k as f32 - row as f32 * 0.5) * spacing;
                let z = 0.5 + row as f32 * spacing * 0.866;
                table.add_ball(Vec2::new(x, z));
            }
        }
        cue
    }

    #[test]
    fn break_shot_scatters_the_rack_and_settles() {
        let mut table = Table::new(&TableConfig::default());
        let cue = racked(&mut table);
        let start: Vec<Vec2> = table.balls().iter().map(|b| b.position).collect();
        table.shoot(cue, &Shot::new(0.9, FRAC_PI_2));

        let events = run_until_settled(&mut table, 60 * 60);
        assert!(table.all_stationary());
        assert!(events.iter().any(|e| e.kind == ContactEvent::BALL));
        assert!(events.iter().any(|e| e.kind == ContactEvent::CUSHION));
        assert_eq!(table.total_energy(), 0.0);

        let radius = table.config().ball.radius;
        let moved = table.balls()[1..]
            .iter()
            .zip(&start[1..])
            .filter(|(b, p)| b.position.distance(**p) > radius)
            .count();
        assert!(moved >= 5, "only {moved} object balls moved");
        for ball in table.balls() {
            assert!(table.rails().contains(ball.position, radius * 0.5), "{:?}", ball.position);
        }
    }

    #[cfg(feature = "physics")]
    #[test]
    fn rapier_broad_phase_drives_a_break() {
        use crate::broadphase::RapierBroadPhase;

        let mut table = Table::with_broad_phase(&TableConfig::default(), RapierBroadPhase::new());
        let cue = racked(&mut table);
        table.shoot(cue, &Shot::new(0.9, FRAC_PI_2));

        let events = run_until_settled(&mut table, 60 * 60);
        assert!(table.all_stationary());
        let first = events
            .iter()
            .find(|e| e.kind == ContactEvent::BALL)
            .expect("cue ball should hit the rack");
        assert_eq!(first.a, 0.0);
    }

    #[test]
    fn prediction_matches_resting_ball() {
        let mut table = Table::new(&TableConfig::default());
        let id = table.add_ball(Vec2::new(0.2, 0.2));
        let path: Vec<_> = table.predict(id, 3.0).unwrap().iter().collect();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].position, table.ball(id).unwrap().position);
    }
}
