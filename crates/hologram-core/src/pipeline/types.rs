/// Lifecycle state of a [`super::Coordinator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Running,
    Finished,
}

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum PipelineStage {
    Aligning,
    Accumulating,
    Selecting,
    Verifying,
    Aggregating,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aligning => write!(f, "Aligning frame"),
            Self::Accumulating => write!(f, "Accumulating chromaticity"),
            Self::Selecting => write!(f, "Selecting HSV regions"),
            Self::Verifying => write!(f, "Verifying dynamic behavior"),
            Self::Aggregating => write!(f, "Aggregating clip result"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when callers don't care about progress.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Per-clip aggregate produced once every frame has been processed.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ClipAggregate {
    pub frames_processed: usize,
    pub detections: Vec<crate::frame::DetectionRecord>,
    pub avg_confidence: Option<f32>,
    pub max_confidence: Option<f32>,
    pub any_hologram: bool,
}
