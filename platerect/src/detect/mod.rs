pub mod edge;
pub mod points;
#[allow(clippy::needless_range_loop)]
pub mod hull;
pub mod corners;
pub mod detector;
