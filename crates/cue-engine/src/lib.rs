pub mod api;
pub mod core;
pub mod physics;
pub mod broadphase;
pub mod bridge;

pub use glam;

// Re-export key types at crate root for convenience
pub use api::types::{BallId, BallSnapshot, ContactEvent};
pub use core::ball::{natural_roll, BallState, Phase};
pub use core::config::{
    BallContactConfig, BallSpec, ClothConfig, ConfigError, CushionConfig, FrictionPartition,
    PhysicsConfig, ShotConfig, StopThresholds, SwerveConfig,
};
pub use core::rails::{RailHit, Rails};
pub use core::table::{Table, TableConfig};
pub use core::time::FixedTimestep;
pub use bridge::protocol::ProtocolLayout;
pub use broadphase::{BroadPhase, SweepPairs};

pub use physics::{
    advance, apply_shot, describe_spin, effective_restitution, predict, predict_with_rails,
    rebound, resolve, resolve_pair, ContactReport, English, PairContact, ReboundReport,
    RollKind, Shot, SpinDescription, Trajectory, TrajectoryPoint,
};
pub use physics::energy::{kinetic_energy, rotational_energy, total_energy};

#[cfg(feature = "physics")]
pub use broadphase::RapierBroadPhase;
