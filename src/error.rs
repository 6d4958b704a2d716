use thiserror::Error;

/// Errors raised while building a frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("plane size must be at least 1, got {0}")]
    InvalidPlaneSize(u32),

    #[error("plane size {size} exceeds the maximum of {max}")]
    PlaneTooLarge { size: u32, max: u32 },

    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject NaN and infinities before they reach the vertex buffer.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::NonFiniteParameter { name, value })
    }
}
