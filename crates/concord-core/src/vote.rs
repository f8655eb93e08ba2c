//! Votes — a user's tri-state rating of a shared item.
//!
//! A vote is unique per `(voter_id, item_id)`. Re-voting overwrites the
//! previous value; votes vanish when either the voter or the item is deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Numeric identity of a user, as assigned by the chat platform.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Numeric identity of a shared item (a post).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for ItemId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// The tri-state vote value.
///
/// `Neutral` means "seen, not rated". It is kept for statistics but never
/// contributes a signal to candidate generation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "i64", try_from = "i64")]
pub enum VoteValue {
  Dislike,
  Neutral,
  Like,
}

impl VoteValue {
  pub fn as_i64(self) -> i64 {
    match self {
      Self::Dislike => -1,
      Self::Neutral => 0,
      Self::Like => 1,
    }
  }

  /// `true` for likes and dislikes.
  pub fn is_signal(self) -> bool { self != Self::Neutral }

  /// `true` when both values are non-neutral and opposite.
  pub fn opposes(self, other: Self) -> bool {
    matches!(
      (self, other),
      (Self::Like, Self::Dislike) | (Self::Dislike, Self::Like)
    )
  }
}

impl From<VoteValue> for i64 {
  fn from(v: VoteValue) -> Self { v.as_i64() }
}

impl TryFrom<i64> for VoteValue {
  type Error = Error;

  fn try_from(raw: i64) -> Result<Self> {
    match raw {
      -1 => Ok(Self::Dislike),
      0 => Ok(Self::Neutral),
      1 => Ok(Self::Like),
      other => Err(Error::InvalidVoteValue(other)),
    }
  }
}

// ─── Vote ────────────────────────────────────────────────────────────────────

/// A single persisted vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub voter_id: UserId,
  pub item_id:  ItemId,
  pub value:    VoteValue,
  /// Server-assigned; refreshed whenever the vote is overwritten.
  pub voted_at: DateTime<Utc>,
}

/// Input to [`crate::store::MatchStore::record_vote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVote {
  pub voter_id: UserId,
  pub item_id:  ItemId,
  pub value:    VoteValue,
}
