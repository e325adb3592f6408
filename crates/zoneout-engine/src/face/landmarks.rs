//! One face's landmark result and the eye points we read from it.
//!
//! Indices follow the MediaPipe Face Mesh topology (468/478 points), listed
//! in EAR order: outer corner, upper lid x2, inner corner, lower lid x2.

use glam::Vec2;
use crate::core::geometry::{eye_openness_ratio, EyeLandmarkSet, LandmarkPoint};
use crate::error::GeometryError;

/// Left eye `[p1..p6]`.
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
/// Right eye `[p1..p6]`.
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Landmarks of the single tracked face for one video frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<LandmarkPoint>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// Build from a flat `[x0, y0, (z0,) x1, y1, ...]` buffer.
    /// `stride` is 2 for xy or 3 for xyz; anything past y is ignored.
    /// A trailing partial point is dropped.
    pub fn from_flat(data: &[f32], stride: usize) -> Self {
        let stride = stride.max(2);
        let points = data
            .chunks_exact(stride)
            .map(|c| Vec2::new(c[0], c[1]))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    /// Gather six points into an eye set.
    pub fn eye(&self, indices: &[usize; 6]) -> Result<EyeLandmarkSet, GeometryError> {
        let mut pts = [Vec2::ZERO; 6];
        for (slot, &index) in pts.iter_mut().zip(indices) {
            *slot = self.point(index).ok_or(GeometryError::MissingLandmark {
                index,
                available: self.points.len(),
            })?;
        }
        Ok(EyeLandmarkSet::new(pts))
    }

    /// Mean openness ratio of both eyes. Fails if either eye is unusable.
    pub fn average_openness(&self, left: &[usize; 6], right: &[usize; 6]) -> Result<f32, GeometryError> {
        let l = eye_openness_ratio(&self.eye(left)?)?;
        let r = eye_openness_ratio(&self.eye(right)?)?;
        Ok((l + r) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 478-point face with both eyes at the given half lid gap.
    fn face(left_gap: f32, right_gap: f32) -> FaceLandmarks {
        let mut points = vec![Vec2::new(0.5, 0.5); 478];
        for (eye, cx, gap) in [(LEFT_EYE, 0.35, left_gap), (RIGHT_EYE, 0.65, right_gap)] {
            let [p1, p2, p3, p4, p5, p6] = eye;
            points[p1] = Vec2::new(cx - 0.05, 0.4);
            points[p2] = Vec2::new(cx - 0.02, 0.4 - gap);
            points[p3] = Vec2::new(cx + 0.02, 0.4 - gap);
            points[p4] = Vec2::new(cx + 0.05, 0.4);
            points[p5] = Vec2::new(cx + 0.02, 0.4 + gap);
            points[p6] = Vec2::new(cx - 0.02, 0.4 + gap);
        }
        FaceLandmarks::new(points)
    }

    #[test]
    fn from_flat_drops_depth() {
        let f = FaceLandmarks::from_flat(&[0.1, 0.2, 9.0, 0.3, 0.4, 9.0, 0.5], 3);
        assert_eq!(f.len(), 2);
        assert_eq!(f.point(1), Some(Vec2::new(0.3, 0.4)));
    }

    #[test]
    fn from_flat_xy() {
        let f = FaceLandmarks::from_flat(&[0.1, 0.2, 0.3, 0.4], 2);
        assert_eq!(f.len(), 2);
        assert_eq!(f.point(0), Some(Vec2::new(0.1, 0.2)));
    }

    #[test]
    fn averages_both_eyes() {
        // left 0.4, right 0.2 -> 0.3
        let f = face(0.02, 0.01);
        let r = f.average_openness(&LEFT_EYE, &RIGHT_EYE).unwrap();
        assert!((r - 0.3).abs() < 1e-4, "ratio was {}", r);
    }

    #[test]
    fn missing_landmark_reported() {
        let f = FaceLandmarks::new(vec![Vec2::ZERO; 100]);
        assert_eq!(
            f.eye(&RIGHT_EYE),
            Err(GeometryError::MissingLandmark { index: 362, available: 100 })
        );
    }

    #[test]
    fn degenerate_eye_fails_average() {
        let mut f = face(0.02, 0.02);
        f.points[LEFT_EYE[3]] = f.points[LEFT_EYE[0]];
        assert_eq!(
            f.average_openness(&LEFT_EYE, &RIGHT_EYE),
            Err(GeometryError::DegenerateGeometry)
        );
    }
}
