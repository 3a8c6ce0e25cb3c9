use thiserror::Error;

#[derive(Debug, Error)]
pub enum RectifyError {
    #[error("stride {stride} is smaller than a row of {width} RGBA pixels")]
    InvalidStride { width: u32, stride: u32 },

    #[error("buffer length {len} is smaller than {expected} bytes required for {width}x{height}")]
    BufferTooSmall {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },

    #[error("degenerate quad: {0}")]
    DegenerateQuad(String),

    #[error("target size {width}x{height} is empty")]
    EmptyTarget { width: u32, height: u32 },

    #[error("{width}x{height} RGBA image does not fit in addressable memory")]
    TooLarge { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
