use std::path::PathBuf;

/// Everything that can go wrong between loading a series and recording a configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The source range of a normalizer collapsed to a single value.
  #[error("degenerate range: low ({low}) equals high ({high})")]
  DegenerateRange { low: f64, high: f64 },

  /// A configuration whose windows do not fit in the series.
  #[error("invalid sample: lag {lag} + lead {lead} must be less than series length {len}")]
  InvalidSample { lag: usize, lead: usize, len: usize },

  /// The optimizer produced a non-finite error or failed to step.
  #[error("optimizer failure: {0}")]
  OptimizerFailure(String),

  #[error("dataset is empty")]
  EmptyDataset,

  #[error("model used before initialize()")]
  Uninitialized,

  #[error("shape mismatch: expected {expected} values, got {got}")]
  ShapeMismatch { expected: usize, got: usize },

  /// No lag/lead pair can satisfy `lag + lead < len`.
  #[error("series of length {0} is too short, at least 3 values are needed")]
  SeriesTooShort(usize),

  #[error("invalid search space: {0}")]
  InvalidSearchSpace(String),

  #[error("invalid settings: {0}")]
  InvalidSettings(String),

  #[error("an experiment needs at least one trial")]
  NoTrials,

  #[error("cannot parse token {position} ({token:?}) as a number")]
  Parse { position: usize, token: String },

  #[error("cannot access {path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("serialization failed: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
