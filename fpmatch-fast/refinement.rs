use fpmatch_core::{Image, Keypoint};

use crate::types::ScoredKeypoint;

/// Orientation computation and keypoint suppression
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Half-widths of each row of a circular patch of radius `half_patch`.
    ///
    /// `umax[v]` is the largest `|u|` with `u² + v² <= half_patch²`.
    pub fn circular_patch_extents(half_patch: usize) -> Vec<i32> {
        let r2 = (half_patch * half_patch) as i32;
        (0..=half_patch as i32)
            .map(|v| {
                let mut u = 0;
                while (u + 1) * (u + 1) + v * v <= r2 {
                    u += 1;
                }
                u
            })
            .collect()
    }

    /// Orientation by the intensity centroid of a circular patch
    pub fn compute_orientation(img: &Image, x: usize, y: usize, umax: &[i32]) -> f32 {
        let half = umax.len() as i32 - 1;
        let (cx, cy) = (x as i32, y as i32);
        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            let extent = umax[dy.unsigned_abs() as usize];
            for dx in -extent..=extent {
                let val = img.get_clamped(cx + dx, cy + dy) as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }

    /// Greedy non-maximum suppression on one level.
    ///
    /// Candidates are visited by decreasing response; ties keep their input
    /// order. A candidate closer than `min_distance` to a kept one is dropped.
    pub fn non_maximum_suppression(keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
        let mut sorted_keypoints = keypoints.to_vec();
        sorted_keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));

        let min_distance_sq = min_distance * min_distance;
        let mut kept: Vec<ScoredKeypoint> = Vec::new();

        for candidate in sorted_keypoints {
            let is_local_max = kept.iter().all(|existing| {
                let dx = candidate.x as f32 - existing.x as f32;
                let dy = candidate.y as f32 - existing.y as f32;
                dx * dx + dy * dy >= min_distance_sq
            });

            if is_local_max {
                kept.push(candidate);
            }
        }

        kept
    }

    /// Suppress keypoints that the same structure produced on several levels.
    ///
    /// Works in input-image coordinates; the radius grows with the coarser of
    /// the two levels involved. Output is ordered by decreasing response.
    pub fn cross_scale_suppression(keypoints: &[Keypoint], min_distance: f32) -> Vec<Keypoint> {
        let mut sorted_keypoints = keypoints.to_vec();
        sorted_keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));

        let mut kept: Vec<Keypoint> = Vec::new();

        for candidate in sorted_keypoints {
            let is_local_max = kept.iter().all(|existing| {
                let radius = min_distance * candidate.scale.max(existing.scale);
                let dx = candidate.x - existing.x;
                let dy = candidate.y - existing.y;
                dx * dx + dy * dy >= radius * radius
            });

            if is_local_max {
                kept.push(candidate);
            }
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(x: usize, y: usize, response: f32) -> ScoredKeypoint {
        ScoredKeypoint { x, y, response }
    }

    fn keypoint(x: f32, y: f32, response: f32, scale: f32) -> Keypoint {
        Keypoint {
            x,
            y,
            angle: 0.0,
            response,
            octave: 0,
            scale,
            size: 31.0 * scale,
        }
    }

    #[test]
    fn test_circular_patch_extents() {
        let umax = KeypointRefinement::circular_patch_extents(3);
        assert_eq!(umax, vec![3, 2, 2, 0]);

        let umax = KeypointRefinement::circular_patch_extents(15);
        assert_eq!(umax.len(), 16);
        assert_eq!(umax[0], 15);
        assert_eq!(umax[15], 0);
        assert!(umax.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_orientation_points_towards_bright_side() {
        let umax = KeypointRefinement::circular_patch_extents(7);

        let right = Image::from_fn(40, 40, |x, _| if x > 20 { 255 } else { 0 }).unwrap();
        let angle = KeypointRefinement::compute_orientation(&right, 20, 20, &umax);
        assert!(angle.abs() < 1e-3, "angle = {}", angle);

        let below = Image::from_fn(40, 40, |_, y| if y > 20 { 255 } else { 0 }).unwrap();
        let angle = KeypointRefinement::compute_orientation(&below, 20, 20, &umax);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-3, "angle = {}", angle);

        let diagonal = Image::from_fn(40, 40, |x, y| if x >= 20 && y >= 20 { 255 } else { 0 }).unwrap();
        let angle = KeypointRefinement::compute_orientation(&diagonal, 20, 20, &umax);
        assert!((angle - std::f32::consts::FRAC_PI_4).abs() < 1e-3, "angle = {}", angle);
    }

    #[test]
    fn test_orientation_of_flat_patch_is_zero() {
        let umax = KeypointRefinement::circular_patch_extents(7);
        let flat = Image::from_value(20, 20, 0).unwrap();
        assert_eq!(KeypointRefinement::compute_orientation(&flat, 10, 10, &umax), 0.0);
    }

    #[test]
    fn test_non_maximum_suppression() {
        let candidates = vec![
            scored(10, 10, 1.0),
            scored(11, 10, 5.0),
            scored(30, 30, 2.0),
            scored(12, 12, 3.0),
        ];
        let kept = KeypointRefinement::non_maximum_suppression(&candidates, 3.0);
        let positions: Vec<(usize, usize)> = kept.iter().map(|k| (k.x, k.y)).collect();
        assert_eq!(positions, vec![(11, 10), (30, 30)]);
    }

    #[test]
    fn test_non_maximum_suppression_ties_keep_input_order() {
        let candidates = vec![scored(5, 5, 1.0), scored(6, 5, 1.0), scored(20, 5, 1.0)];
        let kept = KeypointRefinement::non_maximum_suppression(&candidates, 3.0);
        let positions: Vec<(usize, usize)> = kept.iter().map(|k| (k.x, k.y)).collect();
        assert_eq!(positions, vec![(5, 5), (20, 5)]);
    }

    #[test]
    fn test_zero_distance_keeps_everything() {
        let candidates = vec![scored(5, 5, 1.0), scored(5, 5, 2.0)];
        assert_eq!(KeypointRefinement::non_maximum_suppression(&candidates, 0.0).len(), 2);
    }

    #[test]
    fn test_cross_scale_suppression_uses_coarser_scale() {
        let keypoints = vec![
            keypoint(50.0, 50.0, 4.0, 1.0),
            // 3.5 px away: inside 3 * 1.44, outside 3 * 1.0
            keypoint(53.5, 50.0, 2.0, 1.44),
            keypoint(46.5, 50.0, 1.0, 1.0),
            keypoint(80.0, 80.0, 3.0, 1.0),
        ];
        let kept = KeypointRefinement::cross_scale_suppression(&keypoints, 3.0);
        let positions: Vec<(f32, f32)> = kept.iter().map(|k| (k.x, k.y)).collect();
        assert_eq!(positions, vec![(50.0, 50.0), (80.0, 80.0), (46.5, 50.0)]);
    }
}
