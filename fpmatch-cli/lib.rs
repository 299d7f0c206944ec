use std::path::{Path, PathBuf};

use fpmatch_brief::BriefGenerator;
use fpmatch_core::{CoreError, Descriptor, Image, Keypoint, Match};
use fpmatch_fast::{FastDetector, ImagePyramid};
use fpmatch_hamming::{sort_by_distance, BruteForceHamming};
use image::{GrayImage, ImageReader};
use serde::Serialize;

pub use fpmatch_core::{self, OrbConfig as Config};

/// Errors returned by [`compare`] and [`FingerprintMatcher`].
#[derive(thiserror::Error, Debug)]
pub enum CompareError {
    /// Missing, unreadable or undecodable input image.
    #[error("Unable to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    /// The reference image produced no keypoints, so no score exists.
    #[error("No keypoints found in the first image")]
    NoKeypoints,

    /// Invalid configuration or image data.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CompareError {
    /// Process exit code the `fpmatch` binary uses for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CompareError::ImageLoad { .. } => 2,
            CompareError::NoKeypoints => 3,
            CompareError::Core(_) | CompareError::ThreadPool(_) => 1,
        }
    }
}

pub type CompareResult<T> = Result<T, CompareError>;

/// Keypoints of one image with their aligned descriptors
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

/// High-level ORB feature extractor: oriented FAST keypoints with steered BRIEF descriptors
pub struct Orb {
    detector: FastDetector,
    brief: BriefGenerator,
    pool: rayon::ThreadPool,
}

impl Orb {
    /// Create a new ORB extractor with the given configuration
    pub fn new(cfg: Config) -> CompareResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.n_threads.max(1))
            .build()?;
        let brief = BriefGenerator::new(cfg.blur_sigma)?;
        let detector = FastDetector::new(cfg)?;

        Ok(Self {
            detector,
            brief,
            pool,
        })
    }

    /// Detect keypoints and generate descriptors in one step
    pub fn detect_and_describe(&self, img: &Image) -> CompareResult<Features> {
        self.install(|| {
            let pyramid = ImagePyramid::build(img, self.config())?;
            let keypoints = self.detector.detect_keypoints(&pyramid);
            let descriptors = self.brief.generate_descriptors(&pyramid, &keypoints)?;
            Ok(Features {
                keypoints,
                descriptors,
            })
        })
    }

    /// Run `op` on this extractor's worker pool
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Get detector configuration
    pub fn config(&self) -> &Config {
        self.detector.config()
    }
}

/// Outcome of comparing two images
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub keypoints_a: Vec<Keypoint>,
    pub keypoints_b: Vec<Keypoint>,
    /// Cross-checked matches, closest first
    pub matches: Vec<Match>,
    /// `matches / keypoints_a * 100`
    pub score: f64,
}

/// Compares fingerprint images by the share of reference keypoints that
/// find a mutual nearest neighbour in the other image.
pub struct FingerprintMatcher {
    orb: Orb,
    matcher: BruteForceHamming,
}

impl FingerprintMatcher {
    pub fn new(cfg: Config) -> CompareResult<Self> {
        Ok(Self {
            orb: Orb::new(cfg)?,
            matcher: BruteForceHamming::new(true),
        })
    }

    /// Load both images, then score `path_b` against the reference `path_a`.
    pub fn compare<P, Q>(&self, path_a: P, path_b: Q) -> CompareResult<MatchReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let img_a = load_grayscale(path_a)?;
        let img_b = load_grayscale(path_b)?;
        self.compare_images(&img_a, &img_b)
    }

    /// Score `img_b` against the reference `img_a`.
    ///
    /// A reference without keypoints is an error. A second image without
    /// keypoints simply matches nothing and scores 0.
    ///
    /// Comparing an image with itself is not guaranteed to score 100.
    /// Keypoints whose steered descriptors coincide, such as two points of a
    /// point-symmetric texture oriented π apart, compete for the same
    /// partner and cross-check keeps only one of them.
    pub fn compare_images(&self, img_a: &Image, img_b: &Image) -> CompareResult<MatchReport> {
        let features_a = self.orb.detect_and_describe(img_a)?;
        if features_a.keypoints.is_empty() {
            return Err(CompareError::NoKeypoints);
        }

        let features_b = self.orb.detect_and_describe(img_b)?;
        if features_b.keypoints.is_empty() {
            log::warn!("no keypoints found in the second image, score is 0");
        }

        let mut matches = self.orb.install(|| {
            self.matcher
                .match_descriptors(&features_a.descriptors, &features_b.descriptors)
        });
        sort_by_distance(&mut matches);

        let score = matches.len() as f64 / features_a.keypoints.len() as f64 * 100.0;
        log::debug!(
            "{} matches for {} / {} keypoints, score {:.2}",
            matches.len(),
            features_a.keypoints.len(),
            features_b.keypoints.len(),
            score
        );

        Ok(MatchReport {
            keypoints_a: features_a.keypoints,
            keypoints_b: features_b.keypoints,
            matches,
            score,
        })
    }
}

/// Similarity of `path_b` to `path_a` in percent, with the default detector.
pub fn compare<P, Q>(path_a: P, path_b: Q) -> CompareResult<f64>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let matcher = FingerprintMatcher::new(Config::default())?;
    Ok(matcher.compare(path_a, path_b)?.score)
}

/// Decode any supported image file into 8-bit luma.
pub fn load_grayscale<P: AsRef<Path>>(path: P) -> CompareResult<Image> {
    let path = path.as_ref();
    let load_error = |source: image::ImageError| CompareError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    let gray = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| load_error(image::ImageError::IoError(e)))?
        .decode()
        .map_err(load_error)?
        .to_luma8();

    if gray.width() == 0 || gray.height() == 0 {
        return Err(load_error(image::ImageError::Limits(
            image::error::LimitError::from_kind(image::error::LimitErrorKind::DimensionError),
        )));
    }

    log::debug!("loaded {} ({}x{})", path.display(), gray.width(), gray.height());
    image_from_gray(gray)
}

/// Convert an `image` buffer into the detector's image type.
pub fn image_from_gray(gray: GrayImage) -> CompareResult<Image> {
    let (width, height) = gray.dimensions();
    Ok(Image::new(width as usize, height as usize, gray.into_raw())?)
}
