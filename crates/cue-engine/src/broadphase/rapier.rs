use std::collections::BTreeSet;
use std::sync::Mutex;

use rapier2d::prelude::*;

use super::BroadPhase;
use crate::core::ball::BallState;

// ---------------------------------------------------------------------------
// WASM-safe event collector (no crossbeam)
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        match self.collisions.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        match self.collisions.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
        // Sensors never produce contact forces.
    }
}

// ---------------------------------------------------------------------------
// RapierBroadPhase
// ---------------------------------------------------------------------------

/// Broad-phase backed by a Rapier world.
///
/// Each ball is mirrored as a kinematic body carrying a sensor disc of radius
/// `gate / 2`, so two sensors intersect exactly when the centres are within
/// `gate`. Positions are pushed into Rapier before every query; Rapier never
/// moves the balls itself. Pairs are tracked from intersection start/stop
/// events.
pub struct RapierBroadPhase {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
    /// Body per ball index.
    handles: Vec<RigidBodyHandle>,
    /// Sensor radius the current colliders were built with.
    sensor_radius: f32,
    active: BTreeSet<(usize, usize)>,
}

impl RapierBroadPhase {
    pub fn new() -> Self {
        Self {
            gravity: nalgebra::Vector2::zeros(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            handles: Vec::new(),
            sensor_radius: 0.0,
            active: BTreeSet::new(),
        }
    }

    /// Number of balls mirrored into the Rapier world.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn add_body(&mut self, index: usize, ball: &BallState) {
        let rb = RigidBodyBuilder::kinematic_position_based()
            .translation(nalgebra::Vector2::new(ball.position.x, ball.position.y))
            .user_data(index as u128)
            .build();
        let body_handle = self.bodies.insert(rb);

        let collider = ColliderBuilder::ball(self.sensor_radius)
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_collision_types(ActiveCollisionTypes::default() | ActiveCollisionTypes::KINEMATIC_KINEMATIC)
            .build();
        self.colliders
            .insert_with_parent(collider, body_handle, &mut self.bodies);
        self.handles.push(body_handle);
    }

    /// Drop every mirrored body, e.g. after the gate distance changes.
    fn clear(&mut self) {
        for handle in self.handles.drain(..) {
            self.bodies.remove(
                handle,
                &mut self.island_manager,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        }
        self.active.clear();
        // Stale start/stop events refer to removed colliders
        self.event_collector.drain_collisions();
    }

    fn sync(&mut self, balls: &[BallState], gate: f32) {
        let radius = gate * 0.5;
        if (radius - self.sensor_radius).abs() > f32::EPSILON || balls.len() < self.handles.len() {
            log::debug!("rapier broad-phase: rebuilding {} sensors (r={:.4})", balls.len(), radius);
            self.clear();
            self.sensor_radius = radius;
        }
        for (index, ball) in balls.iter().enumerate().skip(self.handles.len()) {
            self.add_body(index, ball);
        }
        for (handle, ball) in self.handles.iter().zip(balls) {
            if let Some(rb) = self.bodies.get_mut(*handle) {
                rb.set_translation(nalgebra::Vector2::new(ball.position.x, ball.position.y), true);
            }
        }
    }

    fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            let (Some(a), Some(b)) = (self.collider_to_index(h1), self.collider_to_index(h2)) else {
                continue;
            };
            let pair = (a.min(b), a.max(b));
            if started {
                self.active.insert(pair);
            } else {
                self.active.remove(&pair);
            }
        }
    }

    fn collider_to_index(&self, collider_handle: ColliderHandle) -> Option<usize> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        Some(body.user_data as usize)
    }
}

impl Default for RapierBroadPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadPhase for RapierBroadPhase {
    fn candidate_pairs(&mut self, balls: &[BallState], gate: f32, out: &mut Vec<(usize, usize)>) {
        out.clear();
        self.sync(balls, gate);
        self.step();
        // BTreeSet iteration is already sorted
        out.extend(self.active.iter().copied().filter(|&(_, j)| j < balls.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const GATE: f32 = 0.07;

    fn at(x: f32, z: f32) -> BallState {
        BallState::at_rest(Vec2::new(x, z))
    }

    #[test]
    fn mirrors_one_body_per_ball() {
        let mut rapier = RapierBroadPhase::new();
        let mut pairs = Vec::new();
        rapier.candidate_pairs(&[at(0.0, 0.0), at(1.0, 0.0)], GATE, &mut pairs);
        assert_eq!(rapier.body_count(), 2);
        assert!(pairs.is_empty());

        rapier.candidate_pairs(&[at(0.0, 0.0), at(1.0, 0.0), at(0.5, 0.5)], GATE, &mut pairs);
        assert_eq!(rapier.body_count(), 3);
    }

    #[test]
    fn reports_pair_while_balls_are_close() {
        let mut rapier = RapierBroadPhase::new();
        let mut pairs = Vec::new();
        let mut balls = vec![at(0.0, 0.0), at(0.3, 0.0), at(0.0, 0.5)];
        rapier.candidate_pairs(&balls, GATE, &mut pairs);
        assert!(pairs.is_empty());

        // Walk ball 1 toward ball 0
        let mut seen = false;
        for _ in 0..30 {
            balls[1].position.x -= 0.01;
            rapier.candidate_pairs(&balls, GATE, &mut pairs);
            if pairs.contains(&(0, 1)) {
                seen = true;
                break;
            }
        }
        assert!(seen, "never reported (0, 1)");
        assert!(balls[1].position.x <= GATE + 0.011);

        // And away again
        balls[1].position.x = 0.5;
        for _ in 0..3 {
            rapier.candidate_pairs(&balls, GATE, &mut pairs);
        }
        assert!(!pairs.contains(&(0, 1)), "stale pair {pairs:?}");
    }

    #[test]
    fn agrees_with_sweep_on_a_rack() {
        use crate::broadphase::SweepPairs;

        let mut balls = Vec::new();
        for row in 0..5 {
            for k in 0..=row {
                let x = row as f32 * 0.0495;
                let z = (k as f32 - row as f32 * 0.5) * 0.0575;
                balls.push(at(x, z));
            }
        }
        let mut rapier_pairs = Vec::new();
        let mut sweep_pairs = Vec::new();
        let mut rapier = RapierBroadPhase::new();
        rapier.candidate_pairs(&balls, GATE, &mut rapier_pairs);
        rapier.candidate_pairs(&balls, GATE, &mut rapier_pairs);
        SweepPairs::new().candidate_pairs(&balls, GATE, &mut sweep_pairs);
        assert_eq!(rapier_pairs, sweep_pairs);
    }
}
