pub type KeyerResult<T> = Result<T, KeyerError>;

#[derive(thiserror::Error, Debug)]
pub enum KeyerError {
    #[error("sensor disconnected: {0}")]
    SensorDisconnected(String),

    #[error("sensor stream is not open")]
    SensorNotOpen,

    #[error("{what} dimensions mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("{what} buffer too small: got {actual}, expected {expected}")]
    BufferTooSmall {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("color conversion failed: {0}")]
    Conversion(String),
}

impl KeyerError {
    pub fn disconnected(msg: impl Into<String>) -> Self {
        Self::SensorDisconnected(msg.into())
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Fatal errors need the pipeline to be rebuilt; everything else only
    /// costs the current tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SensorDisconnected(_) | Self::SensorNotOpen)
    }
}
