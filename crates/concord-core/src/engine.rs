//! Search orchestration.
//!
//! A search runs generation, filtering, (for the "new" view) exclusion and
//! ranking as a strict sequence, each stage consuming the previous stage's
//! full output. Every empty stage maps to its own outcome so callers can
//! tell "no votes yet" from "nobody agreed" from "filters removed everyone".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  candidates::{self, Generation},
  exclusion,
  filter::{self, FilterSet},
  ranking::{MatchCursor, Reveal},
  stats::{self, PairStatistics},
  store::MatchStore,
  vote::UserId,
};

/// Which candidates a search surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchView {
  /// Every filtered candidate, including ones shown before.
  #[default]
  All,
  /// Only candidates never shown to the seeker.
  New,
}

/// Parameters of one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
  pub seeker_id: UserId,
  #[serde(default)]
  pub filters:   FilterSet,
  #[serde(default)]
  pub view:      MatchView,
}

/// The result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
  /// The seeker has no non-neutral votes.
  NoVotes,
  /// The seeker has votes but nobody shares any of them.
  NoCandidates,
  /// Candidates existed but none passed the filters.
  NoMatchesWithFilters,
  /// Filtered candidates existed but all were shown before ("new" view only).
  NoNewMatches,
  /// A ranked cursor positioned before the first match.
  Matches(MatchCursor),
}

/// Run a search for `request.seeker_id`, evaluating age filters as of
/// `today`.
pub async fn search<S>(
  store: &S,
  request: &SearchRequest,
  today: NaiveDate,
) -> Result<SearchOutcome>
where
  S: MatchStore,
{
  let seeker_id = request.seeker_id;

  let candidates = match candidates::generate(store, seeker_id).await? {
    Generation::NoVotes => return Ok(SearchOutcome::NoVotes),
    Generation::Candidates(c) if c.is_empty() => return Ok(SearchOutcome::NoCandidates),
    Generation::Candidates(c) => c,
  };

  let filtered =
    filter::apply_filters(store, candidates, &request.filters, seeker_id, today).await?;
  if filtered.is_empty() {
    return Ok(SearchOutcome::NoMatchesWithFilters);
  }

  let visible = match request.view {
    MatchView::All => filtered,
    MatchView::New => {
      let unseen = exclusion::filter_unseen(store, filtered, seeker_id).await?;
      if unseen.is_empty() {
        return Ok(SearchOutcome::NoNewMatches);
      }
      unseen
    }
  };

  let cursor = MatchCursor::new(visible);
  tracing::debug!(seeker = %seeker_id, view = ?request.view, matches = cursor.total(), "search complete");
  Ok(SearchOutcome::Matches(cursor))
}

/// "Show one more": reveal the next candidate and record it as shown to
/// `seeker_id`. The cursor only advances once the mark is stored.
pub async fn show_next<S>(
  store: &S,
  seeker_id: UserId,
  cursor: &mut MatchCursor,
) -> Result<Reveal>
where
  S: MatchStore,
{
  let Some(next) = cursor.peek() else {
    return Ok(Reveal::NoMoreMatches);
  };
  exclusion::mark_shown(store, seeker_id, next.candidate_id).await?;
  Ok(cursor.advance())
}

/// Detailed statistics for a chosen candidate.
pub async fn pair_statistics<S>(
  store: &S,
  seeker_id: UserId,
  candidate_id: UserId,
) -> Result<PairStatistics>
where
  S: MatchStore,
{
  stats::compute(store, seeker_id, candidate_id).await
}
