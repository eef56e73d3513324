use thiserror::Error;

#[derive(Debug, Error)]
pub enum DmrgError {
  #[error("only even chain lengths are supported, got {0}")]
  OddChainLength(usize),

  #[error("a destination directory is needed to save operators")]
  MissingPath,

  #[error("dimension mismatch: expected {expected}, found {found}")]
  DimensionMismatch { expected: usize, found: usize },

  #[error("invalid parameter: {0}")]
  InvalidParameter(String),

  #[error("LAPACK routine {routine} failed with info = {info}")]
  Lapack { routine: &'static str, info: i32 },

  #[error("Lanczos did not converge after {restarts} restarts (residual {residual:.3e})")]
  NotConverged { restarts: usize, residual: f64 },

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DmrgError>;
