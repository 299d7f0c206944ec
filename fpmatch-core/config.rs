use crate::error::{CoreError, CoreResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ORB detector parameters.
///
/// The defaults mirror the values most ORB implementations ship with, so a
/// score computed here is comparable with one computed elsewhere as long as
/// both sides use the same numbers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbConfig {
    /// Maximum number of keypoints kept per image.
    pub n_features: usize,
    /// Decimation ratio between two pyramid levels.
    pub scale_factor: f32,
    /// Maximum number of pyramid levels.
    pub n_levels: usize,
    /// Border, in level pixels, where keypoints are not detected.
    pub edge_threshold: usize,
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Diameter of the orientation and descriptor patch.
    pub patch_size: usize,
    /// Minimum distance between two kept keypoints, in level pixels.
    pub nms_distance: f32,
    /// Gaussian sigma applied before the binary tests.
    pub blur_sigma: f32,
    /// Worker threads for the data-parallel stages.
    pub n_threads: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            edge_threshold: 31,
            fast_threshold: 20,
            patch_size: 31,
            nms_distance: 3.0,
            blur_sigma: 2.0,
            n_threads: num_cpus::get().max(1),
        }
    }
}

impl OrbConfig {
    pub fn with_n_features(mut self, n_features: usize) -> Self {
        self.n_features = n_features;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_n_levels(mut self, n_levels: usize) -> Self {
        self.n_levels = n_levels;
        self
    }

    pub fn with_edge_threshold(mut self, edge_threshold: usize) -> Self {
        self.edge_threshold = edge_threshold;
        self
    }

    pub fn with_fast_threshold(mut self, threshold: u8) -> Self {
        self.fast_threshold = threshold;
        self
    }

    pub fn with_patch_size(mut self, patch_size: usize) -> Self {
        self.patch_size = patch_size;
        self
    }

    pub fn with_nms_distance(mut self, distance: f32) -> Self {
        self.nms_distance = distance;
        self
    }

    pub fn with_blur_sigma(mut self, sigma: f32) -> Self {
        self.blur_sigma = sigma;
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> CoreResult<()> {
        if self.n_features == 0 {
            return Err(CoreError::InvalidFeatureCount(self.n_features));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 1.0 {
            return Err(CoreError::InvalidScaleFactor(self.scale_factor));
        }
        if self.n_levels == 0 {
            return Err(CoreError::InvalidLevelCount(self.n_levels));
        }
        // FAST needs a 3-pixel ring around every candidate
        if self.edge_threshold < 3 {
            return Err(CoreError::InvalidEdgeThreshold(self.edge_threshold));
        }
        // 0 would accept every pixel, >127 overflows the u8 comparisons
        if self.fast_threshold == 0 || self.fast_threshold > 127 {
            return Err(CoreError::InvalidThreshold(self.fast_threshold));
        }
        if self.patch_size % 2 == 0 || self.patch_size < 7 {
            return Err(CoreError::InvalidPatchSize(self.patch_size));
        }
        if !self.nms_distance.is_finite() || self.nms_distance < 0.0 {
            return Err(CoreError::InvalidNmsDistance(self.nms_distance));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma <= 0.0 {
            return Err(CoreError::InvalidBlurSigma(self.blur_sigma));
        }
        if self.n_threads == 0 {
            return Err(CoreError::InvalidThreadCount(self.n_threads));
        }
        Ok(())
    }

    /// Scale of pyramid level `level` relative to the input image.
    pub fn level_scale(&self, level: usize) -> f32 {
        self.scale_factor.powi(level as i32)
    }

    /// Number of keypoints each pyramid level may contribute.
    ///
    /// Quotas shrink geometrically with the level area so that coarse levels
    /// do not dominate; the last level takes whatever is left.
    pub fn level_quotas(&self) -> Vec<usize> {
        let factor = 1.0 / self.scale_factor as f64;
        let n_levels = self.n_levels;
        let mut quotas = Vec::with_capacity(n_levels);

        let mut desired = self.n_features as f64 * (1.0 - factor)
            / (1.0 - factor.powi(n_levels as i32));
        let mut assigned = 0usize;
        for _ in 0..n_levels.saturating_sub(1) {
            let quota = (desired.round() as usize).min(self.n_features - assigned);
            quotas.push(quota);
            assigned += quota;
            desired *= factor;
        }
        quotas.push(self.n_features - assigned);
        quotas
    }

    /// Human-readable one-line summary
    pub fn summary(&self) -> String {
        format!(
            "OrbConfig: features={}, levels={}x{:.2}, fast={}, patch={}, edge={}, nms={:.1}, blur={:.1}, threads={}",
            self.n_features,
            self.n_levels,
            self.scale_factor,
            self.fast_threshold,
            self.patch_size,
            self.edge_threshold,
            self.nms_distance,
            self.blur_sigma,
            self.n_threads
        )
    }

    /// Deserialize from a TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> CoreResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deserialize from a JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file, picking the format from its extension.
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => Err(CoreError::UnsupportedConfigFormat(path.to_path_buf())),
        }
    }
}
