//! Domain layer types and invariants.

pub mod color;
pub mod error;
pub mod request;
pub mod types;
