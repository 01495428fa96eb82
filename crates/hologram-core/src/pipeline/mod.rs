mod coordinator;
mod types;

pub use coordinator::{non_maximum_suppression, run_clip, Coordinator};
pub use types::{ClipAggregate, NoOpReporter, PipelineStage, PipelineState, ProgressReporter};
