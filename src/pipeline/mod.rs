//! The boundary between the blackboard and the external pipeline tools
//!
//! [`commands`] builds the argument lists the tools expect from current cell
//! values, [`invocation`] runs them behind a mockable seam, [`status`]
//! computes per-step enablement from what is on disk, and [`volume`] holds
//! the shared precomputed-volume path conventions.

pub mod commands;
pub mod invocation;
pub mod status;
pub mod volume;

pub use invocation::{run_tool, SubprocessRunner, ToolInvocation, ToolRunner};
pub use status::StepStatus;
pub use volume::{count_blobs, count_tif_files, file_uri, volume_is_valid};
