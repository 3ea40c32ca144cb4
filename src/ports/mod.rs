//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the pipeline core and the
//! outside world (time, disk, the dashboard document).
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod dashboard;
pub mod filesystem;

pub use clock::Clock;
pub use dashboard::{Activity, Dashboard, DashboardUpdate, FolderCounts};
pub use filesystem::FileSystem;
