#[allow(clippy::needless_range_loop)]
pub mod homography;
#[allow(clippy::needless_range_loop)]
pub mod rectifier;
pub mod chunked;
