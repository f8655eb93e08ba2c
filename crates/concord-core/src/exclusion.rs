//! Exclusion tracking — which candidates a seeker has already been shown.
//!
//! Shown records are keyed by `(seeker_id, shown_id)`. Marking is an
//! idempotent upsert that only refreshes `shown_at`, so overlapping sessions
//! can mark concurrently without further coordination.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, candidates::Candidate, store::MatchStore, vote::UserId};

/// A durable marker that `shown_id` was surfaced to `seeker_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShownRecord {
  pub seeker_id: UserId,
  pub shown_id:  UserId,
  /// Time of the most recent showing.
  pub shown_at:  DateTime<Utc>,
}

pub async fn is_shown<S>(store: &S, seeker_id: UserId, candidate_id: UserId) -> Result<bool>
where
  S: MatchStore,
{
  store
    .is_shown(seeker_id, candidate_id)
    .await
    .map_err(Error::store)
}

pub async fn mark_shown<S>(
  store: &S,
  seeker_id: UserId,
  candidate_id: UserId,
) -> Result<ShownRecord>
where
  S: MatchStore,
{
  store
    .mark_shown(seeker_id, candidate_id)
    .await
    .map_err(Error::store)
}

/// Remove every candidate already shown to `seeker_id`. Used by the "new
/// matches" view only.
pub async fn filter_unseen<S>(
  store: &S,
  candidates: Vec<Candidate>,
  seeker_id: UserId,
) -> Result<Vec<Candidate>>
where
  S: MatchStore,
{
  if candidates.is_empty() {
    return Ok(candidates);
  }
  let shown: HashSet<UserId> = store
    .shown_to(seeker_id)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|r| r.shown_id)
    .collect();
  Ok(retain_unseen(candidates, &shown))
}

/// Pure half of [`filter_unseen`].
pub fn retain_unseen(candidates: Vec<Candidate>, shown: &HashSet<UserId>) -> Vec<Candidate> {
  candidates
    .into_iter()
    .filter(|c| !shown.contains(&c.candidate_id))
    .collect()
}
