//! Profiler sessions and artifact rendering
//!
//! A [`ProfilingSession`] attaches a sampling profiler to a running server
//! and, once load is done, stops the server and drains the profiler into a
//! [`CaptureFile`]. [`ArtifactPipeline`] turns that capture into the final
//! flamegraph.

pub mod artifact;
pub mod error;
pub mod session;

pub use artifact::{Artifact, ArtifactPipeline};
pub use error::{AttachError, ProfilingError, ProfilingResult, RenderError, RenderResult};
pub use session::{CaptureFile, ProfilingSession};
