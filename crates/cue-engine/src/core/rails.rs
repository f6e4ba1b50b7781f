use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned playing area bounded by four cushions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rails {
    /// Corner with the smallest `(x, z)`.
    pub min: Vec2,
    /// Corner with the largest `(x, z)`.
    pub max: Vec2,
}

/// A ball overlapping one cushion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailHit {
    /// Unit normal pointing back into the playing area.
    pub normal: Vec2,
    /// How far the ball's edge is past the cushion nose (m).
    pub depth: f32,
}

impl Rails {
    /// Playing area of `width` (x) by `length` (z), centred on the origin.
    pub fn new(width: f32, length: f32) -> Self {
        let half = Vec2::new(width, length).abs() * 0.5;
        Self { min: -half, max: half }
    }

    /// A 9-foot pool table's playing surface.
    pub fn nine_foot() -> Self {
        Self::new(1.27, 2.54)
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn contains(&self, position: Vec2, radius: f32) -> bool {
        self.crossing(position, radius).is_none()
    }

    /// The deepest rail a ball of `radius` at `position` has crossed, if any.
    pub fn crossing(&self, position: Vec2, radius: f32) -> Option<RailHit> {
        let candidates = [
            (Vec2::X, self.min.x + radius - position.x),
            (Vec2::NEG_X, position.x + radius - self.max.x),
            (Vec2::Y, self.min.y + radius - position.y),
            (Vec2::NEG_Y, position.y + radius - self.max.y),
        ];
        candidates
            .into_iter()
            .filter(|&(_, depth)| depth > 0.0)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(normal, depth)| RailHit { normal, depth })
    }

    /// Clamp `position` so a ball of `radius` lies fully inside.
    pub fn clamp_inside(&self, position: Vec2, radius: f32) -> Vec2 {
        let lo = self.min + Vec2::splat(radius);
        let hi = (self.max - Vec2::splat(radius)).max(lo);
        position.clamp(lo, hi)
    }
}

impl Default for Rails {
    fn default() -> Self {
        Self::nine_foot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: f32 = 0.028575;

    #[test]
    fn centred_rectangle() {
        let rails = Rails::new(1.0, 2.0);
        assert_eq!(rails.min, Vec2::new(-0.5, -1.0));
        assert_eq!(rails.max, Vec2::new(0.5, 1.0));
        assert_eq!(rails.size(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn inside_ball_crosses_nothing() {
        let rails = Rails::new(1.0, 2.0);
        assert!(rails.crossing(Vec2::ZERO, R).is_none());
        assert!(rails.contains(Vec2::new(0.5 - 2.0 * R, 0.0), R));
    }

    #[test]
    fn reports_inward_normal_and_depth() {
        let rails = Rails::new(1.0, 2.0);
        let hit = rails.crossing(Vec2::new(0.49, 0.0), R).unwrap();
        assert_eq!(hit.normal, Vec2::NEG_X);
        assert!((hit.depth - (0.49 + R - 0.5)).abs() < 1e-6);

        let hit = rails.crossing(Vec2::new(0.0, -1.0), R).unwrap();
        assert_eq!(hit.normal, Vec2::Y);
    }

    #[test]
    fn corner_reports_deepest_rail() {
        let rails = Rails::new(1.0, 2.0);
        let hit = rails.crossing(Vec2::new(0.495, 0.99), R).unwrap();
        assert_eq!(hit.normal, Vec2::NEG_X);
    }

    #[test]
    fn clamp_keeps_ball_on_table() {
        let rails = Rails::new(1.0, 2.0);
        let p = rails.clamp_inside(Vec2::new(3.0, -3.0), R);
        assert_eq!(p, Vec2::new(0.5 - R, -1.0 + R));
    }
}
