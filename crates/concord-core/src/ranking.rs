//! Ranking and incremental reveal.
//!
//! Candidates are ordered by agreement count *ascending* so that the less
//! obvious matches come first, with the candidate id as a tie-break. The
//! order is fixed when the cursor is built; advancing it never re-ranks.

use serde::{Deserialize, Serialize};

use crate::candidates::Candidate;

/// Order `candidates` by `(agreement_count, candidate_id)`, both ascending.
pub fn rank(candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
  let mut ranked: Vec<Candidate> = candidates.into_iter().collect();
  ranked.sort_unstable_by_key(|c| (c.agreement_count, c.candidate_id));
  ranked
}

/// One step of a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reveal {
  Match {
    candidate: Candidate,
    /// Candidates still waiting behind this one.
    remaining: usize,
  },
  /// The cursor is exhausted. Distinct from a search that found nothing.
  NoMoreMatches,
}

/// A forward-only cursor over a ranked, frozen candidate sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCursor {
  ranked:   Vec<Candidate>,
  position: usize,
}

impl MatchCursor {
  /// Rank `candidates` and position the cursor before the first one.
  pub fn new(candidates: impl IntoIterator<Item = Candidate>) -> Self {
    Self { ranked: rank(candidates), position: 0 }
  }

  /// Reveal the next candidate ("show one more").
  pub fn advance(&mut self) -> Reveal {
    match self.ranked.get(self.position) {
      Some(candidate) => {
        self.position += 1;
        Reveal::Match { candidate: *candidate, remaining: self.remaining() }
      }
      None => Reveal::NoMoreMatches,
    }
  }

  /// The candidate the next [`advance`](Self::advance) would reveal.
  pub fn peek(&self) -> Option<Candidate> { self.ranked.get(self.position).copied() }

  pub fn position(&self) -> usize { self.position }

  pub fn total(&self) -> usize { self.ranked.len() }

  pub fn remaining(&self) -> usize { self.ranked.len() - self.position }

  pub fn is_exhausted(&self) -> bool { self.remaining() == 0 }

  /// The full frozen order, including already revealed candidates.
  pub fn ranked(&self) -> &[Candidate] { &self.ranked }
}
