//! Data models for the volunteer intake backend.
//!
//! Field names serialize in camelCase to match the intake client.

mod profile;
mod shirt_size;

pub use profile::*;
pub use shirt_size::*;
