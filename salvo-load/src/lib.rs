//! Load generation for salvo
//!
//! A seeded [`RequestStream`] yields the same targets on every run, a
//! [`ShotExecutor`] fires one request per target and [`LoadDriver`] ties the
//! two together in a strictly sequential loop.

pub mod driver;
pub mod error;
pub mod rng;
pub mod shot;
pub mod source;

pub use driver::{LoadDriver, LoadSummary};
pub use error::{LoadError, LoadResult};
pub use rng::Mt19937;
pub use shot::{executor_from_config, CommandShooter, HttpShooter, ShotExecutor, ShotResult};
pub use source::{Catalog, RequestStream, Target};
