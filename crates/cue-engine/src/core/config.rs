//! Physical constants for the billiards model.
//!
//! Everything is grouped by the effect it tunes. Most of the empirical values
//! were fitted against reference footage of real tables, so they are kept as
//! exact numbers rather than derived from first principles.
//!
//! All units are SI: meters, seconds, kilograms, radians.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// A value is outside its physical range. Carries the field path and a reason.
    Invalid(&'static str, &'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "JSON parse error: {}", e),
            ConfigError::Invalid(field, reason) => write!(f, "invalid `{}`: {}", field, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// Ball mass and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSpec {
    /// Mass (kg).
    pub mass: f32,
    /// Radius (m).
    pub radius: f32,
}

impl BallSpec {
    /// Moment of inertia of a solid sphere: I = 2/5 · m · R².
    pub fn inertia(&self) -> f32 {
        0.4 * self.mass * self.radius * self.radius
    }
}

impl Default for BallSpec {
    fn default() -> Self {
        Self {
            mass: 0.17,
            radius: 0.028575,
        }
    }
}

/// Cloth friction, side-spin decay and nap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothConfig {
    /// Sliding friction coefficient between ball and cloth.
    pub slide_friction: f32,
    /// Rolling resistance coefficient.
    pub roll_friction: f32,
    /// Fraction of side-spin left after one second of travel.
    pub side_spin_retention_per_second: f32,
    /// Extra deceleration (m/s²) at full opposition to the nap.
    pub nap_drift_factor: f32,
    /// Direction the nap runs in, on the table plane (x, z).
    pub nap_direction: Vec2,
    /// Opposition (negative dot product) needed before nap drag applies.
    pub nap_opposition_threshold: f32,
    /// Nap drag only acts inside this speed band (m/s).
    pub nap_min_speed: f32,
    pub nap_max_speed: f32,
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            slide_friction: 0.2,
            roll_friction: 0.01,
            side_spin_retention_per_second: 0.4,
            nap_drift_factor: 0.05,
            nap_direction: Vec2::X,
            nap_opposition_threshold: 0.3,
            nap_min_speed: 0.05,
            nap_max_speed: 0.5,
        }
    }
}

/// How sliding friction work is split between linear loss and spin-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionPartition {
    /// Share of the sliding friction impulse that reaches linear velocity.
    pub linear_share: f32,
    /// Gain on the friction torque that drives spin toward natural roll.
    pub spin_gain: f32,
    /// Spin gaps below this (rad/s) are left alone.
    pub min_spin_correction: f32,
}

impl Default for FrictionPartition {
    fn default() -> Self {
        Self {
            linear_share: 0.15,
            spin_gain: 3.0,
            min_spin_correction: 0.01,
        }
    }
}

/// Spin-curved ("swerve") motion from side-spin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwerveConfig {
    /// Side-spin (rad/s) below which the ball runs straight.
    pub min_side_spin: f32,
    /// Speed (m/s) below which the ball runs straight.
    pub min_speed: f32,
    /// Lateral acceleration per rad/s of side-spin at peak grip.
    pub coefficient: f32,
    /// Speed (m/s) at which the cloth grips the spin best.
    pub optimal_speed: f32,
    /// Width (m/s) of the Gaussian grip curve around `optimal_speed`.
    pub spread: f32,
    /// Swerve fades in linearly from zero up to this speed (m/s).
    pub ramp_speed: f32,
    /// `k` in the high-speed damping factor `1 / (1 + speed · k)`.
    pub high_speed_damping: f32,
}

impl Default for SwerveConfig {
    fn default() -> Self {
        Self {
            min_side_spin: 0.5,
            min_speed: 0.02,
            coefficient: 0.01,
            optimal_speed: 1.5,
            spread: 1.0,
            ramp_speed: 0.3,
            high_speed_damping: 0.5,
        }
    }
}

/// Ball-ball contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallContactConfig {
    /// Coefficient of restitution between two balls.
    pub restitution: f32,
    /// Ball-ball friction coefficient.
    pub friction: f32,
    /// Friction accumulated over the ~0.2 ms contact, as a multiplier on the Coulomb limit.
    pub friction_accumulation: f32,
    /// Slow impacts: `speed_factor = min(1, slow_impact_gain / (v_n + slow_impact_offset))`.
    pub slow_impact_gain: f32,
    pub slow_impact_offset: f32,
    /// Pairs further apart than this many radii are not resolved.
    pub gating_radii: f32,
    /// Gap (m) left between balls after penetration correction.
    pub separation_margin: f32,
    /// Striking ball side-spin multiplier on contact.
    pub side_spin_damping: f32,
    /// Share of the friction spin change fed back into the striker's side-spin.
    pub side_spin_coupling: f32,
    /// Share of the friction spin change the struck ball keeps as side-spin.
    pub struck_side_spin_share: f32,
    /// Struck ball leaves with this fraction of natural roll.
    pub struck_roll_fraction: f32,
}

impl Default for BallContactConfig {
    fn default() -> Self {
        Self {
            restitution: 0.95,
            friction: 0.06,
            friction_accumulation: 1.2,
            slow_impact_gain: 2.0,
            slow_impact_offset: 0.5,
            gating_radii: 2.5,
            separation_margin: 0.0001,
            side_spin_damping: 0.90,
            side_spin_coupling: 0.25,
            struck_side_spin_share: 0.15,
            struck_roll_fraction: 0.92,
        }
    }
}

/// Cushion (rail) rebound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CushionConfig {
    /// CoR anchor reached at 8° incidence.
    pub restitution_perpendicular: f32,
    /// CoR anchor for strikes at 60° and beyond.
    pub restitution_glancing: f32,
    /// CoR at dead-on (0°) incidence, as a fraction of the perpendicular anchor.
    pub shallow_floor_ratio: f32,
    /// Where the 30° value sits between the two anchors.
    pub mid_blend: f32,
    /// CoR lost to cushion compression at full `compression_speed`.
    pub compression_factor: f32,
    /// Impact speed (m/s) at which compression loss saturates.
    pub compression_speed: f32,
    /// Height of the cushion nose as a fraction of ball diameter.
    pub contact_height_ratio: f32,
    pub min_restitution: f32,
    pub max_restitution: f32,
    /// Tangential speed gained per unit of side-spin surface speed.
    pub side_spin_throw: f32,
    /// How strongly top/back-spin changes tangential grip.
    pub grip_gain: f32,
    /// Tangential retention for strikes at 8° and beyond.
    pub retention: f32,
    /// Tangential retention at dead-on incidence.
    pub shallow_retention_floor: f32,
    pub side_spin_damping: f32,
    pub roll_spin_damping: f32,
}

impl CushionConfig {
    /// Height of the contact point above the ball centre, in radii.
    pub fn contact_lever(&self) -> f32 {
        (2.0 * self.contact_height_ratio - 1.0).max(0.0)
    }
}

impl Default for CushionConfig {
    fn default() -> Self {
        Self {
            restitution_perpendicular: 0.80,
            restitution_glancing: 0.92,
            shallow_floor_ratio: 0.9,
            mid_blend: 0.5,
            compression_factor: 0.08,
            compression_speed: 6.0,
            contact_height_ratio: 0.635,
            min_restitution: 0.65,
            max_restitution: 0.96,
            side_spin_throw: 0.15,
            grip_gain: 0.3,
            retention: 0.97,
            shallow_retention_floor: 0.85,
            side_spin_damping: 0.80,
            roll_spin_damping: 0.95,
        }
    }
}

/// Mapping from cue strike to initial ball state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotConfig {
    /// Ball speed (m/s) at full power.
    pub max_speed: f32,
    /// Top/back-spin per unit of vertical tip offset, in multiples of natural roll.
    pub roll_spin_gain: f32,
    /// Forward roll added to dead-centre (`spin_y == 0`) strikes, in multiples of natural roll.
    pub center_roll_bias: f32,
    /// Side-spin (rad/s) per unit of horizontal tip offset per m/s of speed.
    pub side_spin_gain: f32,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            roll_spin_gain: 2.5,
            center_roll_bias: 0.4,
            side_spin_gain: 8.0,
        }
    }
}

/// Thresholds for the stop condition and the slide/roll split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopThresholds {
    /// Linear speed (m/s) below which a ball may stop.
    pub velocity_stop: f32,
    /// Angular speed (rad/s) below which a ball may stop.
    pub angular_stop: f32,
    /// Slip speed (m/s) separating sliding from rolling.
    pub slip_threshold: f32,
}

impl Default for StopThresholds {
    fn default() -> Self {
        Self {
            velocity_stop: 0.005,
            angular_stop: 0.2,
            slip_threshold: 0.01,
        }
    }
}

/// The full, immutable parameter set. Passed by reference into every physics call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravitational acceleration (m/s²).
    pub gravity: f32,
    pub ball: BallSpec,
    pub cloth: ClothConfig,
    pub friction_partition: FrictionPartition,
    pub swerve: SwerveConfig,
    pub collision: BallContactConfig,
    pub cushion: CushionConfig,
    pub shot: ShotConfig,
    pub thresholds: StopThresholds,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            ball: BallSpec::default(),
            cloth: ClothConfig::default(),
            friction_partition: FrictionPartition::default(),
            swerve: SwerveConfig::default(),
            collision: BallContactConfig::default(),
            cushion: CushionConfig::default(),
            shot: ShotConfig::default(),
            thresholds: StopThresholds::default(),
        }
    }
}

impl PhysicsConfig {
    /// Parse a config from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PhysicsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        log::info!("physics config loaded from {}", path.as_ref().display());
        Ok(config)
    }

    /// Serialize to pretty JSON (for dumping the active tuning).
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every value is inside its physical range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(v: f32, field: &'static str) -> Result<(), ConfigError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(field, "must be positive"))
            }
        }
        fn non_negative(v: f32, field: &'static str) -> Result<(), ConfigError> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(field, "must be non-negative"))
            }
        }
        fn unit(v: f32, field: &'static str) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(field, "must be within [0, 1]"))
            }
        }

        positive(self.gravity, "gravity")?;
        positive(self.ball.mass, "ball.mass")?;
        positive(self.ball.radius, "ball.radius")?;

        non_negative(self.cloth.slide_friction, "cloth.slide_friction")?;
        non_negative(self.cloth.roll_friction, "cloth.roll_friction")?;
        unit(self.cloth.side_spin_retention_per_second, "cloth.side_spin_retention_per_second")?;
        non_negative(self.cloth.nap_drift_factor, "cloth.nap_drift_factor")?;
        if self.cloth.nap_direction.length_squared() < 1e-12 {
            return Err(ConfigError::Invalid("cloth.nap_direction", "must be non-zero"));
        }

        unit(self.friction_partition.linear_share, "friction_partition.linear_share")?;
        non_negative(self.friction_partition.spin_gain, "friction_partition.spin_gain")?;

        positive(self.swerve.spread, "swerve.spread")?;
        positive(self.swerve.ramp_speed, "swerve.ramp_speed")?;
        non_negative(self.swerve.high_speed_damping, "swerve.high_speed_damping")?;

        unit(self.collision.restitution, "collision.restitution")?;
        non_negative(self.collision.friction, "collision.friction")?;
        non_negative(self.collision.friction_accumulation, "collision.friction_accumulation")?;
        positive(self.collision.slow_impact_offset, "collision.slow_impact_offset")?;
        if self.collision.gating_radii < 2.0 {
            return Err(ConfigError::Invalid("collision.gating_radii", "must be at least 2"));
        }
        unit(self.collision.side_spin_damping, "collision.side_spin_damping")?;
        unit(self.collision.struck_roll_fraction, "collision.struck_roll_fraction")?;

        let cushion = &self.cushion;
        unit(cushion.restitution_perpendicular, "cushion.restitution_perpendicular")?;
        unit(cushion.restitution_glancing, "cushion.restitution_glancing")?;
        if cushion.restitution_perpendicular > cushion.restitution_glancing {
            return Err(ConfigError::Invalid(
                "cushion.restitution_perpendicular",
                "must not exceed restitution_glancing",
            ));
        }
        unit(cushion.shallow_floor_ratio, "cushion.shallow_floor_ratio")?;
        unit(cushion.mid_blend, "cushion.mid_blend")?;
        positive(cushion.compression_speed, "cushion.compression_speed")?;
        unit(cushion.contact_height_ratio, "cushion.contact_height_ratio")?;
        unit(cushion.min_restitution, "cushion.min_restitution")?;
        unit(cushion.max_restitution, "cushion.max_restitution")?;
        if cushion.min_restitution > cushion.max_restitution {
            return Err(ConfigError::Invalid("cushion.min_restitution", "must not exceed max_restitution"));
        }
        unit(cushion.retention, "cushion.retention")?;
        unit(cushion.shallow_retention_floor, "cushion.shallow_retention_floor")?;
        unit(cushion.side_spin_damping, "cushion.side_spin_damping")?;
        unit(cushion.roll_spin_damping, "cushion.roll_spin_damping")?;

        non_negative(self.shot.max_speed, "shot.max_speed")?;

        non_negative(self.thresholds.velocity_stop, "thresholds.velocity_stop")?;
        non_negative(self.thresholds.angular_stop, "thresholds.angular_stop")?;
        non_negative(self.thresholds.slip_threshold, "thresholds.slip_threshold")?;
        Ok(())
    }
}
