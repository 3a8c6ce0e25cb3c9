pub mod error;
pub mod config;
#[allow(clippy::needless_range_loop)]
pub mod image;
pub mod geometry;
pub mod detect;
pub mod warp;
pub mod pipeline;
