use thiserror::Error;

pub type CurriculumResult<T> = std::result::Result<T, CurriculumError>;

#[derive(Debug, Error)]
pub enum CurriculumError {
    /// Rejected before any backend call fires.
    #[error("{0}")]
    Validation(String),

    #[error("index {index} out of bounds for {len} lessons")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("operation not available in the {0} step")]
    WrongStep(&'static str),

    /// Backend failures surface their message verbatim.
    #[error("{0}")]
    Backend(String),
}

impl CurriculumError {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }
}
