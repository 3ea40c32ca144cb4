//! Live adapters for real external interactions.

pub mod clock;
pub mod dashboard;
pub mod filesystem;
