//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod fonts;
pub(crate) mod lock;
pub mod outbox;
pub mod packaging;
pub mod raster;
pub mod telemetry;
pub mod workspace;
