//! cadence-core library.
//!
//! Task lifecycle state machine, goal/milestone progress aggregation and
//! gamification (XP, levels, streaks, achievements, weekly challenges).
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums in [`error`]; `anyhow` only at the
//!   config-loading edge.
//! - **Logging**: `tracing` macros (`debug!` for mutations, `info!` for
//!   spawns, unlocks and completed challenges, `warn!` for rejected input).
//! - **Time**: every "today" comes from an injected [`clock::Clock`].

pub mod clock;
pub mod config;
pub mod error;
pub mod gamify;
pub mod goals;
pub mod id;
pub mod lifecycle;
pub mod model;
pub mod planner;
pub mod snapshot;

pub use error::{ConfigError, EngineError, ErrorCode, ImportError};
pub use planner::{Planner, PlannerSnapshot};
