//! Application services: parsing submissions, rendering and the job pipeline.

pub mod command;
pub mod delivery;
pub mod directive;
pub mod error;
pub mod generate;
pub mod jobs;
pub mod render;
pub mod tokenize;
