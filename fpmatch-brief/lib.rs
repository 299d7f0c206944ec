mod pattern;

use std::collections::BTreeMap;

use fpmatch_core::{CoreError, CoreResult, Descriptor, Image, Keypoint, DESCRIPTOR_SIZE};
use fpmatch_fast::ImagePyramid;
use image::GrayImage;
use rayon::prelude::*;

pub use pattern::BRIEF_PATTERN;

/// Steered BRIEF descriptor generator
#[derive(Debug, Clone)]
pub struct BriefGenerator {
    blur_sigma: f32,
}

impl BriefGenerator {
    pub fn new(blur_sigma: f32) -> CoreResult<Self> {
        if !blur_sigma.is_finite() || blur_sigma <= 0.0 {
            return Err(CoreError::InvalidBlurSigma(blur_sigma));
        }
        Ok(Self { blur_sigma })
    }

    /// Compute one descriptor per keypoint, in keypoint order.
    ///
    /// Each keypoint is described on the blurred pyramid level it was
    /// detected on, with the test pattern rotated by the keypoint angle.
    pub fn generate_descriptors(&self, pyramid: &ImagePyramid, kps: &[Keypoint]) -> CoreResult<Vec<Descriptor>> {
        let mut blurred: BTreeMap<usize, Image> = BTreeMap::new();
        for kp in kps {
            if blurred.contains_key(&kp.octave) {
                continue;
            }
            let level = pyramid
                .level(kp.octave)
                .ok_or(CoreError::MissingPyramidLevel(kp.octave))?;
            blurred.insert(kp.octave, self.blur(&level.image)?);
        }

        log::debug!(
            "describing {} keypoints on {} blurred level(s)",
            kps.len(),
            blurred.len()
        );

        Ok(kps
            .par_iter()
            .map(|kp| Self::describe(&blurred[&kp.octave], kp))
            .collect())
    }

    /// Gaussian smoothing so single-pixel noise does not flip test bits
    pub fn blur(&self, img: &Image) -> CoreResult<Image> {
        let (width, height) = img.dimensions();
        let gray = GrayImage::from_raw(width as u32, height as u32, img.as_raw().to_vec()).ok_or(
            CoreError::InvalidImageData {
                expected_len: width * height,
                actual_len: img.as_raw().len(),
            },
        )?;
        let smoothed = imageproc::filter::gaussian_blur_f32(&gray, self.blur_sigma);
        Image::new(width, height, smoothed.into_raw())
    }

    /// Describe one keypoint on an already blurred level image
    pub fn describe(img: &Image, kp: &Keypoint) -> Descriptor {
        let (s, c) = kp.angle.sin_cos();
        let (lx, ly) = kp.level_position();
        let (cx, cy) = (lx.round() as i32, ly.round() as i32);
        let mut d = [0u8; DESCRIPTOR_SIZE];

        for (i, &(x1, y1, x2, y2)) in BRIEF_PATTERN.iter().enumerate() {
            let val1 = Self::steered_sample(img, cx, cy, c, s, x1, y1);
            let val2 = Self::steered_sample(img, cx, cy, c, s, x2, y2);

            let bit = (val1 < val2) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }

    /// Sample the pattern offset `(dx, dy)` rotated by the keypoint angle
    #[inline]
    fn steered_sample(img: &Image, cx: i32, cy: i32, c: f32, s: f32, dx: i8, dy: i8) -> u8 {
        let (dx, dy) = (dx as f32, dy as f32);
        let rx = (c * dx - s * dy).round() as i32;
        let ry = (s * dx + c * dy).round() as i32;
        img.get_clamped(cx + rx, cy + ry)
    }
}
