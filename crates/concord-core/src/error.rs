//! Error types for `concord-core`.

use thiserror::Error;

/// A boxed storage-layer error, erased so the engine does not depend on any
/// concrete backend.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The store failed while building the raw candidate set. Never conflated
  /// with an empty result.
  #[error("candidate generation failed: {0}")]
  GenerationFailed(#[source] StoreError),

  /// The store failed in any stage after generation (filtering, exclusion,
  /// marking, statistics).
  #[error("store error: {0}")]
  Store(#[source] StoreError),

  #[error("invalid vote value: {0} (expected -1, 0 or 1)")]
  InvalidVoteValue(i64),
}

impl Error {
  pub(crate) fn generation<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::GenerationFailed(Box::new(e))
  }

  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
