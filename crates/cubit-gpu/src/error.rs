use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GpuError {
    #[error("buffer capacity must be non-zero")]
    ZeroCapacity,
    #[error("alignment {0} is not a non-zero power of two")]
    InvalidAlignment(u32),
}
