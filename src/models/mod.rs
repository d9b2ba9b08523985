//! Core data models for the ladder tracker.

mod annotation;
mod entry;
mod region;

pub use annotation::*;
pub use entry::*;
pub use region::*;
