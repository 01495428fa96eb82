mod aligner;
pub(crate) mod features;
mod homography;
mod matcher;
mod warp;

pub use aligner::{AlignmentResult, FrameAligner};
pub use features::{Descriptor, KeyPoint};
pub use homography::Homography;
pub use warp::{bilinear_sample_bgr, warp_frame};
