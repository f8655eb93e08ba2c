//! Handlers for `/searches`.
//!
//! A search is run once; its ranked result is frozen in a cursor held by the
//! [`SearchRegistry`] and consumed one candidate at a time.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/searches` | Body: [`SearchRequest`]; returns a tagged [`SearchResponse`] |
//! | `POST`   | `/searches/{id}/next` | Reveals one candidate and marks it shown; the cursor is dropped once it reports `no_more_matches` |
//! | `DELETE` | `/searches/{id}` | Drops the cursor |

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
  time::{Duration, Instant},
};

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use chrono::Utc;
use concord_core::{
  engine::{self, SearchOutcome, SearchRequest},
  ranking::{MatchCursor, Reveal},
  store::MatchStore,
  vote::UserId,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

// ─── Registry ─────────────────────────────────────────────────────────────────

/// How long an untouched cursor survives before a sweep drops it.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// An open search: whose it is and how far it has been consumed.
#[derive(Debug)]
pub struct OpenSearch {
  pub seeker_id: UserId,
  pub cursor:    MatchCursor,
}

type Slot = Arc<tokio::sync::Mutex<OpenSearch>>;

#[derive(Debug)]
struct Entry {
  slot:       Slot,
  touched_at: Instant,
}

/// In-memory map of open search cursors.
///
/// The outer lock only guards the map and is never held across `.await`;
/// each cursor sits behind its own async lock so concurrent `next` calls on
/// one search reveal distinct candidates. Cursors leave the map when they are
/// closed, when they report exhaustion, or when they sit idle longer than
/// the registry's TTL (swept whenever a new search opens).
#[derive(Debug)]
pub struct SearchRegistry {
  open:     Mutex<HashMap<Uuid, Entry>>,
  idle_ttl: Duration,
}

impl Default for SearchRegistry {
  fn default() -> Self { Self::with_idle_ttl(DEFAULT_IDLE_TTL) }
}

impl SearchRegistry {
  pub fn new() -> Self { Self::default() }

  pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
    Self { open: Mutex::new(HashMap::new()), idle_ttl }
  }

  /// Store a cursor and return the id it is reachable under. Idle cursors
  /// are swept first.
  pub fn open(&self, seeker_id: UserId, cursor: MatchCursor) -> Uuid {
    self.sweep();
    let id = Uuid::new_v4();
    let slot = Arc::new(tokio::sync::Mutex::new(OpenSearch { seeker_id, cursor }));
    self.lock().insert(id, Entry { slot, touched_at: Instant::now() });
    id
  }

  /// Look up a cursor and refresh its idle timer.
  fn get(&self, id: Uuid) -> Option<Slot> {
    let mut open = self.lock();
    let entry = open.get_mut(&id)?;
    entry.touched_at = Instant::now();
    Some(Arc::clone(&entry.slot))
  }

  /// Drop a cursor. Returns `false` if the id was unknown.
  pub fn close(&self, id: Uuid) -> bool { self.lock().remove(&id).is_some() }

  /// Drop every cursor idle for at least the TTL. Returns how many went.
  pub fn sweep(&self) -> usize {
    let ttl = self.idle_ttl;
    let mut open = self.lock();
    let before = open.len();
    open.retain(|_, entry| entry.touched_at.elapsed() < ttl);
    let swept = before - open.len();
    if swept > 0 {
      tracing::debug!(swept, remaining = open.len(), "swept idle searches");
    }
    swept
  }

  pub fn len(&self) -> usize { self.lock().len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
    self.open.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

// ─── Responses ────────────────────────────────────────────────────────────────

/// Wire form of [`SearchOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchResponse {
  NoVotes,
  NoCandidates,
  NoMatchesWithFilters,
  NoNewMatches,
  Matches { search_id: Uuid, total: usize },
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `POST /searches`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  ApiJson(request): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError>
where
  S: MatchStore,
{
  let today = Utc::now().date_naive();
  let response = match engine::search(&*state.store, &request, today).await? {
    SearchOutcome::NoVotes => SearchResponse::NoVotes,
    SearchOutcome::NoCandidates => SearchResponse::NoCandidates,
    SearchOutcome::NoMatchesWithFilters => SearchResponse::NoMatchesWithFilters,
    SearchOutcome::NoNewMatches => SearchResponse::NoNewMatches,
    SearchOutcome::Matches(cursor) => {
      let total = cursor.total();
      let search_id = state.searches.open(request.seeker_id, cursor);
      tracing::info!(%search_id, seeker = %request.seeker_id, total, "search opened");
      SearchResponse::Matches { search_id, total }
    }
  };
  Ok(Json(response))
}

/// `POST /searches/{id}/next`
pub async fn next<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Reveal>, ApiError>
where
  S: MatchStore,
{
  let slot = state
    .searches
    .get(id)
    .ok_or_else(|| ApiError::NotFound(format!("search {id} not found")))?;
  let mut open = slot.lock().await;
  let seeker_id = open.seeker_id;
  let reveal = engine::show_next(&*state.store, seeker_id, &mut open.cursor).await?;
  if reveal == Reveal::NoMoreMatches {
    state.searches.close(id);
    tracing::info!(search_id = %id, "search exhausted");
  }
  Ok(Json(reveal))
}

/// `DELETE /searches/{id}`
pub async fn close<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: MatchStore,
{
  if state.searches.close(id) {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("search {id} not found")))
  }
}

#[cfg(test)]
mod tests {
  use concord_core::candidates::Candidate;

  use super::*;

  fn cursor(ids: &[i64]) -> MatchCursor {
    MatchCursor::new(
      ids
        .iter()
        .map(|&id| Candidate { candidate_id: UserId(id), agreement_count: 1 }),
    )
  }

  #[test]
  fn open_and_close() {
    let registry = SearchRegistry::new();
    let id = registry.open(UserId(1), cursor(&[2, 3]));
    assert_eq!(registry.len(), 1);
    assert!(registry.get(id).is_some());
    assert!(registry.close(id));
    assert!(!registry.close(id));
    assert!(registry.is_empty());
  }

  #[test]
  fn idle_cursors_are_swept_on_open() {
    let registry = SearchRegistry::with_idle_ttl(Duration::ZERO);
    let stale = registry.open(UserId(1), cursor(&[2]));
    let fresh = registry.open(UserId(1), cursor(&[3]));
    assert!(registry.get(stale).is_none());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.sweep(), 1);
    assert!(registry.get(fresh).is_none());
  }

  #[test]
  fn touched_cursors_survive_a_sweep() {
    let registry = SearchRegistry::new();
    let id = registry.open(UserId(1), cursor(&[2]));
    assert!(registry.get(id).is_some());
    assert_eq!(registry.sweep(), 0);
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn ids_are_distinct() {
    let registry = SearchRegistry::new();
    let a = registry.open(UserId(1), cursor(&[2]));
    let b = registry.open(UserId(1), cursor(&[2]));
    assert_ne!(a, b);
  }

  #[test]
  fn matches_response_shape() {
    let search_id = Uuid::nil();
    let json = serde_json::to_value(SearchResponse::Matches { search_id, total: 2 }).unwrap();
    assert_eq!(json["outcome"], "matches");
    assert_eq!(json["total"], 2);
    let json = serde_json::to_value(SearchResponse::NoMatchesWithFilters).unwrap();
    assert_eq!(json, serde_json::json!({ "outcome": "no_matches_with_filters" }));
  }
}
