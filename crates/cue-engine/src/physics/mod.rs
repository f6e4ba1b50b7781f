// physics/mod.rs
//
// The ball model itself. Every entry point takes the state it changes by
// `&mut` and the configuration by `&`, and has no other inputs.

pub mod collision;
pub mod cushion;
pub mod energy;
pub mod integrator;
pub mod shot;
pub mod trajectory;

pub use collision::{resolve, resolve_pair, ContactReport, PairContact};
pub use cushion::{effective_restitution, rebound, ReboundReport};
pub use energy::{describe_spin, kinetic_energy, rotational_energy, total_energy, English, RollKind, SpinDescription};
pub use integrator::{advance, swerve_grip};
pub use shot::{apply_shot, Shot};
pub use trajectory::{predict, predict_with_rails, Trajectory, TrajectoryIter, TrajectoryPoint};
