pub mod landmarks;

pub use landmarks::{FaceLandmarks, LEFT_EYE, RIGHT_EYE};
