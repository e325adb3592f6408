pub mod fault;
pub mod gaze;
pub mod geometry;
pub mod scheduler;
pub mod session;
pub mod time;
