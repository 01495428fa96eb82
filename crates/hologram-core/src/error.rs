use thiserror::Error;

#[derive(Error, Debug)]
pub enum HologramError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("reference frame has too few features: found {found}, need at least {required}")]
    InsufficientFeatures { found: usize, required: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("clip has zero processed frames")]
    EmptyInput,

    #[error("frame dimensions {width}x{height} do not match reference {ref_width}x{ref_height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        ref_width: usize,
        ref_height: usize,
    },

    #[error("pipeline error: {0}")]
    Pipeline(String),
}

pub type Result<T> = std::result::Result<T, HologramError>;
