use fpmatch_core::Image;
use rayon::prelude::*;

use crate::types::ScoredKeypoint;
use crate::utils::has_consecutive_pixels;

/// Contiguous arc length required by FAST-9
const FAST_ARC: usize = 9;

/// Harris window is `2 * HARRIS_RADIUS + 1` pixels wide
const HARRIS_RADIUS: i32 = 3;
const HARRIS_K: f64 = 0.04;

/// Corner detection algorithms (FAST and Harris)
pub struct CornerDetector;

impl CornerDetector {
    /// Bresenham circle of radius 3, in circular order
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Detect FAST-9 corners at least `border` pixels away from the image edge
    /// and score them with the Harris response.
    ///
    /// Rows are processed in parallel; the result is in raster order.
    pub fn detect(img: &Image, border: usize, threshold: u8) -> Vec<ScoredKeypoint> {
        let (width, height) = img.dimensions();
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        (border..height - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row_keypoints = Vec::new();
                for x in border..width - border {
                    if Self::is_fast_corner(img, x, y, threshold) {
                        row_keypoints.push(ScoredKeypoint {
                            x,
                            y,
                            response: Self::compute_harris_response(img, x, y),
                        });
                    }
                }
                row_keypoints
            })
            .collect()
    }

    /// Check if a pixel is a FAST-9 corner
    pub fn is_fast_corner(img: &Image, x: usize, y: usize, threshold: u8) -> bool {
        let center = img.get(x, y) as i16;
        let threshold = threshold as i16;
        let (cx, cy) = (x as i32, y as i32);

        // Any 9-pixel arc covers at least two of the four compass points
        let mut bright_compass = 0;
        let mut dark_compass = 0;
        for &(dx, dy) in Self::FAST_OFFSETS.iter().step_by(4) {
            let q = img.get_clamped(cx + dx, cy + dy) as i16;
            if q > center + threshold {
                bright_compass += 1;
            } else if q < center - threshold {
                dark_compass += 1;
            }
        }
        if bright_compass < 2 && dark_compass < 2 {
            return false;
        }

        let mut brighter: u16 = 0;
        let mut darker: u16 = 0;
        for (i, &(dx, dy)) in Self::FAST_OFFSETS.iter().enumerate() {
            let q = img.get_clamped(cx + dx, cy + dy) as i16;
            if q > center + threshold {
                brighter |= 1 << i;
            } else if q < center - threshold {
                darker |= 1 << i;
            }
        }

        has_consecutive_pixels(brighter, FAST_ARC) || has_consecutive_pixels(darker, FAST_ARC)
    }

    /// Harris corner response over a 7x7 window of Sobel gradients.
    ///
    /// Negative responses (edges) are reported as 0.
    pub fn compute_harris_response(img: &Image, x: usize, y: usize) -> f32 {
        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for dy in -HARRIS_RADIUS..=HARRIS_RADIUS {
            for dx in -HARRIS_RADIUS..=HARRIS_RADIUS {
                let (gx, gy) = Self::compute_gradients(img, x as i32 + dx, y as i32 + dy);
                ixx += gx * gx;
                ixy += gx * gy;
                iyy += gy * gy;
            }
        }

        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        let harris_response = det - HARRIS_K * trace * trace;

        if harris_response > 0.0 {
            harris_response as f32
        } else {
            0.0
        }
    }

    /// Sobel gradients, normalised to intensity units
    fn compute_gradients(img: &Image, x: i32, y: i32) -> (f64, f64) {
        let p = |dx: i32, dy: i32| img.get_clamped(x + dx, y + dy) as f64;

        // Sobel X kernel: [-1, 0, 1; -2, 0, 2; -1, 0, 1]
        let gx = p(1, -1) + 2.0 * p(1, 0) + p(1, 1) - p(-1, -1) - 2.0 * p(-1, 0) - p(-1, 1);

        // Sobel Y kernel: [-1, -2, -1; 0, 0, 0; 1, 2, 1]
        let gy = p(-1, 1) + 2.0 * p(0, 1) + p(1, 1) - p(-1, -1) - 2.0 * p(0, -1) - p(1, -1);

        (gx / 8.0, gy / 8.0)
    }
}
