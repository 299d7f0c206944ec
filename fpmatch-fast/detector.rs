use fpmatch_core::{CoreResult, Keypoint, OrbConfig};
use rayon::prelude::*;

use crate::corner_detection::CornerDetector;
use crate::pyramid::{ImagePyramid, PyramidLevel};
use crate::refinement::KeypointRefinement;

/// Oriented FAST detector over an image pyramid
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: OrbConfig,
    umax: Vec<i32>,
    quotas: Vec<usize>,
}

impl FastDetector {
    /// Creates a new detector, validating the configuration
    pub fn new(cfg: OrbConfig) -> CoreResult<Self> {
        cfg.validate()?;
        let umax = KeypointRefinement::circular_patch_extents(cfg.patch_size / 2);
        let quotas = cfg.level_quotas();
        Ok(Self { cfg, umax, quotas })
    }

    /// Detect oriented keypoints on every pyramid level.
    ///
    /// Coordinates are expressed in input-image pixels. At most `n_features`
    /// keypoints are returned, strongest first.
    pub fn detect_keypoints(&self, pyramid: &ImagePyramid) -> Vec<Keypoint> {
        let per_level: Vec<Vec<Keypoint>> = pyramid
            .levels()
            .par_iter()
            .map(|level| self.detect_keypoints_at_level(level))
            .collect();

        let all_keypoints: Vec<Keypoint> = per_level.into_iter().flatten().collect();
        let mut keypoints =
            KeypointRefinement::cross_scale_suppression(&all_keypoints, self.cfg.nms_distance);
        keypoints.truncate(self.cfg.n_features);

        log::debug!(
            "kept {} of {} keypoints across {} level(s)",
            keypoints.len(),
            all_keypoints.len(),
            pyramid.len()
        );

        keypoints
    }

    /// Detect, rank, suppress and orient keypoints on a single level
    pub fn detect_keypoints_at_level(&self, level: &PyramidLevel) -> Vec<Keypoint> {
        let info = &level.info;
        let quota = self.quotas.get(info.level).copied().unwrap_or(0);
        if quota == 0 {
            return Vec::new();
        }

        let corners = CornerDetector::detect(&level.image, self.cfg.edge_threshold, self.cfg.fast_threshold);
        let mut suppressed = KeypointRefinement::non_maximum_suppression(&corners, self.cfg.nms_distance);
        suppressed.truncate(quota);

        log::debug!(
            "level {} ({}x{}): {} FAST corners, {} kept",
            info.level,
            info.width,
            info.height,
            corners.len(),
            suppressed.len()
        );

        let size = self.cfg.patch_size as f32 * info.scale;
        suppressed
            .into_iter()
            .map(|sk| Keypoint {
                x: sk.x as f32 * info.scale,
                y: sk.y as f32 * info.scale,
                angle: KeypointRefinement::compute_orientation(&level.image, sk.x, sk.y, &self.umax),
                response: sk.response,
                octave: info.level,
                scale: info.scale,
                size,
            })
            .collect()
    }

    /// Get detector configuration
    pub fn config(&self) -> &OrbConfig {
        &self.cfg
    }
}
