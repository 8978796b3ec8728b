//! Reactive configuration blackboard for a multi-round image alignment
//! pipeline
//!
//! Lightsheet-microscopy alignment runs as a sequence of external
//! command-line tools: stack preprocessing, blob detection, feature
//! extraction, several rounds of neighbor matching and nonrigid transform
//! fitting, and finally volume warping. This crate holds the shared state
//! those steps communicate through and the boundary code that turns it into
//! tool invocations:
//!
//! - [`cell`] - observable [`Cell`]s and channel [`CellList`]s with keyed
//!   change callbacks
//! - [`model`] - the [`Model`] blackboard: every session parameter, flat-JSON
//!   persistence, explicit channel resizing
//! - [`wiring`] - callbacks deriving the artifact paths from the output
//!   directory
//! - [`pipeline`] - command builders, the tool-runner seam, and
//!   file-existence step enablement
//! - [`progress`] - the [`ProgressSink`] handed to running tools
//!
//! The model layer is deliberately single-threaded; see the [`cell`] module
//! docs for the notification contract.
//!
//! ```
//! use multiround_alignment::{wiring, Model};
//!
//! let model = Model::new();
//! wiring::install(&model);
//! model.output_path.set("/data/run1".into());
//! assert_eq!(model.fixed_blob_path.get(), "/data/run1/blobs_fixed.json");
//! ```

pub mod cell;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod wiring;

pub use cell::{Cell, CellList, ResizePolicy};
pub use error::{AlignmentError, Result};
pub use model::{session_save_path, Model, Side, SESSION_FILE_EXTENSION};
pub use pipeline::{
    run_tool, StepStatus, SubprocessRunner, ToolInvocation, ToolRunner,
};
pub use progress::{LogProgress, NullProgress, ProgressSink};
