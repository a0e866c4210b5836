use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid atlas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Nothing to pack")]
    Empty,
    #[error("Item `{key}` has no UV coordinates")]
    MissingUvs { key: String },
    #[error("Item `{key}` has no image (or a zero-sized one)")]
    MissingImage { key: String },
    #[error("Items do not fit into the maximum atlas size {width}x{height}")]
    OutOfSpace { width: u32, height: u32 },
    #[error(
        "Could not pack within limits: gave up after {restarts} restarts at {width}x{height}, output scale {output_scale:.4}"
    )]
    RestartLimit {
        restarts: usize,
        width: u32,
        height: u32,
        output_scale: f64,
    },
}

pub type Result<T> = std::result::Result<T, AtlasError>;
