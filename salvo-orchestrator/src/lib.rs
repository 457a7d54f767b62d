//! Run lifecycle for salvo
//!
//! ```text
//! Idle → ServerStarting → ProfilerAttaching → LoadRunning
//!      → ServerStopping → ProfilerDraining → Rendering → Done
//! ```
//!
//! Any stage may end the run in `Failed(stage)`.

pub mod error;
pub mod orchestrator;
pub mod stage;

pub use error::{OrchestratorError, OrchestratorResult, StageError};
pub use orchestrator::{Orchestrator, RunReport};
pub use stage::{RunState, Stage, Transition};
