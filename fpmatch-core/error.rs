/// Errors raised while validating images and detector configuration.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },

    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },

    #[error("Invalid FAST threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),

    #[error("Invalid patch size: {0} (must be odd and at least 7)")]
    InvalidPatchSize(usize),

    #[error("Invalid scale factor: {0} (must be finite and > 1)")]
    InvalidScaleFactor(f32),

    #[error("Invalid pyramid level count: {0} (must be > 0)")]
    InvalidLevelCount(usize),

    #[error("Invalid feature count: {0} (must be > 0)")]
    InvalidFeatureCount(usize),

    #[error("Invalid edge threshold: {0} (must be at least 3)")]
    InvalidEdgeThreshold(usize),

    #[error("Invalid NMS distance: {0} (must be finite and >= 0)")]
    InvalidNmsDistance(f32),

    #[error("Invalid blur sigma: {0} (must be finite and > 0)")]
    InvalidBlurSigma(f32),

    #[error("Invalid thread count: {0} (must be > 0)")]
    InvalidThreadCount(usize),

    #[error("Keypoint references missing pyramid level {0}")]
    MissingPyramidLevel(usize),

    #[error("Unsupported config file extension: {0}")]
    UnsupportedConfigFormat(std::path::PathBuf),

    #[error("Failed to read config file. {0}")]
    ConfigIo(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("Failed to parse TOML config. {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[cfg(feature = "serde")]
    #[error("Failed to encode TOML config. {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[cfg(feature = "serde")]
    #[error("Failed to parse JSON config. {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
