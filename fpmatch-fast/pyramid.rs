use fpmatch_core::{CoreResult, Image, OrbConfig};

use crate::types::ScaleLevel;

/// One resampled copy of the input image
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    pub info: ScaleLevel,
    pub image: Image,
}

/// Image pyramid for multi-scale feature detection
#[derive(Debug, Clone)]
pub struct ImagePyramid {
    levels: Vec<PyramidLevel>,
}

impl ImagePyramid {
    /// Generate scale levels for image pyramid.
    ///
    /// Stops at `n_levels` or once a level has no pixel left outside the
    /// detection border.
    pub fn generate_scale_levels(width: usize, height: usize, cfg: &OrbConfig) -> Vec<ScaleLevel> {
        let min_size = 2 * cfg.edge_threshold + 1;
        let mut levels = Vec::with_capacity(cfg.n_levels);

        for level in 0..cfg.n_levels {
            let scale = cfg.level_scale(level);
            let scaled_width = ((width as f32) / scale).round() as usize;
            let scaled_height = ((height as f32) / scale).round() as usize;

            if scaled_width < min_size || scaled_height < min_size {
                break;
            }

            levels.push(ScaleLevel {
                level,
                scale,
                width: scaled_width,
                height: scaled_height,
            });
        }

        levels
    }

    /// Build image pyramid from base image
    pub fn build(img: &Image, cfg: &OrbConfig) -> CoreResult<Self> {
        let (width, height) = img.dimensions();
        let scale_levels = Self::generate_scale_levels(width, height, cfg);

        let mut levels = Vec::with_capacity(scale_levels.len());
        for info in scale_levels {
            let image = if info.level == 0 {
                img.clone()
            } else {
                Self::downsample_image(img, info.width, info.height)?
            };
            levels.push(PyramidLevel { info, image });
        }

        log::debug!(
            "built {} pyramid level(s) for a {}x{} image",
            levels.len(),
            width,
            height
        );

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[PyramidLevel] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> Option<&PyramidLevel> {
        self.levels.get(level)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Downsample image using bilinear interpolation
    fn downsample_image(img: &Image, target_width: usize, target_height: usize) -> CoreResult<Image> {
        let (src_width, src_height) = img.dimensions();
        let x_ratio = src_width as f32 / target_width as f32;
        let y_ratio = src_height as f32 / target_height as f32;

        Image::from_fn(target_width, target_height, |x, y| {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;
            Self::bilinear_sample(img, src_x, src_y).round().clamp(0.0, 255.0) as u8
        })
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    fn bilinear_sample(img: &Image, x: f32, y: f32) -> f32 {
        let (width, height) = img.dimensions();
        let x1 = (x.floor() as usize).min(width - 1);
        let y1 = (y.floor() as usize).min(height - 1);
        let x2 = (x1 + 1).min(width - 1);
        let y2 = (y1 + 1).min(height - 1);

        let fx = x - x1 as f32;
        let fy = y - y1 as f32;

        let p11 = img.get(x1, y1) as f32;
        let p12 = img.get(x2, y1) as f32;
        let p21 = img.get(x1, y2) as f32;
        let p22 = img.get(x2, y2) as f32;

        let interpolated_top = p11 * (1.0 - fx) + p12 * fx;
        let interpolated_bottom = p21 * (1.0 - fx) + p22 * fx;

        interpolated_top * (1.0 - fy) + interpolated_bottom * fy
    }
}
