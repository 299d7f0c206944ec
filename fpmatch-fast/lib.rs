//! Oriented FAST keypoint detection.
//!
//! Corners are found with FAST-9 on every level of a bilinear image pyramid,
//! ranked by their Harris response, thinned with non-maximum suppression and
//! oriented with the intensity centroid of a circular patch.

mod corner_detection;
mod detector;
mod pyramid;
mod refinement;
mod types;
mod utils;

pub use corner_detection::CornerDetector;
pub use detector::FastDetector;
pub use pyramid::{ImagePyramid, PyramidLevel};
pub use refinement::KeypointRefinement;
pub use types::{ScaleLevel, ScoredKeypoint};
pub use utils::{circle_mask, has_consecutive_pixels};
