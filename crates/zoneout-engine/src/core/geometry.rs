//! Eye aspect ratio geometry.
//!
//! Works on normalized landmark coordinates as produced by the landmark
//! provider. Only x and y matter; depth is dropped before it reaches here.

use glam::Vec2;
use crate::error::GeometryError;

/// A single tracked facial point in normalized image coordinates.
pub type LandmarkPoint = Vec2;

/// Six points around one eye in EAR order:
/// outer corner, two upper-lid points, inner corner, two lower-lid points.
///
/// The order must match the classical convention `[p1..p6]`; a reordered set
/// still yields a number, just a meaningless one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLandmarkSet(pub [LandmarkPoint; 6]);

impl EyeLandmarkSet {
    pub fn new(points: [LandmarkPoint; 6]) -> Self {
        Self(points)
    }

    /// Outer-to-inner corner distance, the ratio's denominator (halved).
    pub fn horizontal(&self) -> f32 {
        distance(self.0[0], self.0[3])
    }
}

/// Euclidean distance between two landmarks.
#[inline]
pub fn distance(p1: LandmarkPoint, p2: LandmarkPoint) -> f32 {
    p1.distance(p2)
}

/// `(|p2-p6| + |p3-p5|) / (2 * |p1-p4|)`.
///
/// Returns `DegenerateGeometry` when the corners coincide instead of a
/// division by zero.
pub fn eye_openness_ratio(eye: &EyeLandmarkSet) -> Result<f32, GeometryError> {
    let [p1, p2, p3, p4, p5, p6] = eye.0;
    let horizontal = distance(p1, p4);
    if horizontal == 0.0 {
        return Err(GeometryError::DegenerateGeometry);
    }
    let vertical = distance(p2, p6) + distance(p3, p5);
    Ok(vertical / (2.0 * horizontal))
}
