//! Candidate generation — finding every user who shares at least one exact
//! vote with the seeker.
//!
//! The computation is a grouped aggregation over `(item, value)` membership:
//! each covote whose value equals the seeker's signal on the same item adds
//! one to the covoter's agreement count. Neutral votes never participate on
//! either side. Two entry points share the same tally:
//!
//! - [`generate`] reads the seeker's votes and the voters of the seeker's
//!   signal items from a [`MatchStore`] in one batched query.
//! - [`VoteIndex`] holds votes in memory, keyed by `(item, value)`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  store::MatchStore,
  vote::{ItemId, UserId, Vote, VoteValue},
};

// ─── Candidate ───────────────────────────────────────────────────────────────

/// Another user who agreed with the seeker on at least one item. Computed per
/// search and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
  pub candidate_id:    UserId,
  /// Items on which both users recorded the same non-neutral value.
  pub agreement_count: u32,
}

/// Result of candidate generation.
///
/// `NoVotes` (the seeker has no signal) is kept distinct from an empty
/// candidate list (the seeker has signal, but nobody agreed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
  NoVotes,
  Candidates(Vec<Candidate>),
}

// ─── Signal set ──────────────────────────────────────────────────────────────

/// A seeker's non-neutral votes, keyed by item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalSet {
  seeker_id: UserId,
  signals:   BTreeMap<ItemId, VoteValue>,
}

impl SignalSet {
  /// Build from the seeker's votes. Neutral votes and votes cast by anyone
  /// other than `seeker_id` are dropped.
  pub fn from_votes(
    seeker_id: UserId,
    votes: impl IntoIterator<Item = Vote>,
  ) -> Self {
    let signals = votes
      .into_iter()
      .filter(|v| v.voter_id == seeker_id && v.value.is_signal())
      .map(|v| (v.item_id, v.value))
      .collect();
    Self { seeker_id, signals }
  }

  pub fn seeker_id(&self) -> UserId { self.seeker_id }

  pub fn is_empty(&self) -> bool { self.signals.is_empty() }

  pub fn len(&self) -> usize { self.signals.len() }

  /// Items carrying a signal, in ascending order.
  pub fn item_ids(&self) -> Vec<ItemId> { self.signals.keys().copied().collect() }

  pub fn value_for(&self, item_id: ItemId) -> Option<VoteValue> {
    self.signals.get(&item_id).copied()
  }

  /// Aggregate `covotes` into candidates. Votes on items outside the signal
  /// set, neutral votes, mismatching values and the seeker's own votes are
  /// ignored.
  pub fn tally<'a>(&self, covotes: impl IntoIterator<Item = &'a Vote>) -> Vec<Candidate> {
    let mut tally = Tally::new(self.seeker_id);
    for vote in covotes {
      if vote.value.is_signal() && self.value_for(vote.item_id) == Some(vote.value) {
        tally.bump(vote.voter_id);
      }
    }
    tally.finish()
  }
}

// ─── Tally ───────────────────────────────────────────────────────────────────

/// Per-voter agreement counter that never admits the seeker.
struct Tally {
  seeker_id: UserId,
  counts:    HashMap<UserId, u32>,
}

impl Tally {
  fn new(seeker_id: UserId) -> Self {
    Self { seeker_id, counts: HashMap::new() }
  }

  fn bump(&mut self, voter_id: UserId) {
    if voter_id != self.seeker_id {
      *self.counts.entry(voter_id).or_default() += 1;
    }
  }

  /// Candidates ordered by id.
  fn finish(self) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = self
      .counts
      .into_iter()
      .map(|(candidate_id, agreement_count)| Candidate { candidate_id, agreement_count })
      .collect();
    out.sort_by_key(|c| c.candidate_id);
    out
  }
}

// ─── Store-backed generation ─────────────────────────────────────────────────

/// Produce the raw candidate set for `seeker_id`.
///
/// Any storage failure surfaces as [`Error::GenerationFailed`].
pub async fn generate<S>(store: &S, seeker_id: UserId) -> Result<Generation>
where
  S: MatchStore,
{
  let own = store.votes_of(seeker_id).await.map_err(Error::generation)?;
  let signal = SignalSet::from_votes(seeker_id, own);
  if signal.is_empty() {
    return Ok(Generation::NoVotes);
  }

  let items = signal.item_ids();
  let covotes = store.voters_of(&items).await.map_err(Error::generation)?;
  let candidates = signal.tally(&covotes);

  tracing::debug!(
    seeker = %seeker_id,
    signals = signal.len(),
    covotes = covotes.len(),
    candidates = candidates.len(),
    "generated candidates"
  );
  Ok(Generation::Candidates(candidates))
}

// ─── In-memory index ─────────────────────────────────────────────────────────

/// An in-memory vote index: `(item, value)` → voters, plus each voter's own
/// votes so that re-votes overwrite rather than accumulate.
#[derive(Debug, Clone, Default)]
pub struct VoteIndex {
  by_value: HashMap<(ItemId, VoteValue), BTreeSet<UserId>>,
  by_voter: HashMap<UserId, BTreeMap<ItemId, VoteValue>>,
}

impl VoteIndex {
  pub fn new() -> Self { Self::default() }

  /// Record or overwrite a vote.
  pub fn insert(&mut self, voter_id: UserId, item_id: ItemId, value: VoteValue) {
    let previous = self
      .by_voter
      .entry(voter_id)
      .or_default()
      .insert(item_id, value);
    if let Some(old) = previous {
      self.unlink(item_id, old, voter_id);
    }
    self.by_value.entry((item_id, value)).or_default().insert(voter_id);
  }

  /// Drop every vote on `item_id`.
  pub fn remove_item(&mut self, item_id: ItemId) {
    self.by_value.retain(|(item, _), _| *item != item_id);
    for votes in self.by_voter.values_mut() {
      votes.remove(&item_id);
    }
    self.by_voter.retain(|_, votes| !votes.is_empty());
  }

  /// The seeker's signal set as currently indexed.
  pub fn signal_set(&self, seeker_id: UserId) -> SignalSet {
    let signals = self
      .by_voter
      .get(&seeker_id)
      .map(|votes| {
        votes
          .iter()
          .filter(|(_, value)| value.is_signal())
          .map(|(item, value)| (*item, *value))
          .collect()
      })
      .unwrap_or_default();
    SignalSet { seeker_id, signals }
  }

  /// Same contract as [`generate`], evaluated against the index.
  pub fn generate(&self, seeker_id: UserId) -> Generation {
    let signal = self.signal_set(seeker_id);
    if signal.is_empty() {
      return Generation::NoVotes;
    }

    let mut tally = Tally::new(seeker_id);
    for (item, value) in &signal.signals {
      if let Some(voters) = self.by_value.get(&(*item, *value)) {
        for voter in voters {
          tally.bump(*voter);
        }
      }
    }
    Generation::Candidates(tally.finish())
  }

  fn unlink(&mut self, item_id: ItemId, value: VoteValue, voter_id: UserId) {
    let key = (item_id, value);
    if let Some(voters) = self.by_value.get_mut(&key) {
      voters.remove(&voter_id);
      if voters.is_empty() {
        self.by_value.remove(&key);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  const SEEKER: UserId = UserId(1);
  const A: UserId = UserId(10);
  const B: UserId = UserId(20);
  const C: UserId = UserId(30);

  fn vote(voter: UserId, item: i64, value: VoteValue) -> Vote {
    Vote {
      voter_id: voter,
      item_id:  ItemId(item),
      value,
      voted_at: Utc::now(),
    }
  }

  fn scenario() -> Vec<Vote> {
    use VoteValue::*;
    vec![
      vote(SEEKER, 1, Like),
      vote(SEEKER, 2, Like),
      vote(SEEKER, 3, Dislike),
      vote(A, 1, Like),
      vote(A, 2, Like),
      vote(A, 3, Dislike),
      vote(B, 1, Like),
      vote(B, 4, Dislike),
      vote(C, 1, Neutral),
    ]
  }

  #[test]
  fn signal_set_drops_neutral_and_foreign_votes() {
    let votes = vec![
      vote(SEEKER, 1, VoteValue::Like),
      vote(SEEKER, 2, VoteValue::Neutral),
      vote(A, 3, VoteValue::Dislike),
    ];
    let signal = SignalSet::from_votes(SEEKER, votes);
    assert_eq!(signal.len(), 1);
    assert_eq!(signal.item_ids(), vec![ItemId(1)]);
    assert_eq!(signal.value_for(ItemId(2)), None);
  }

  #[test]
  fn tally_counts_exact_matches_only() {
    let votes = scenario();
    let signal = SignalSet::from_votes(SEEKER, votes.clone());
    let candidates = signal.tally(&votes);

    assert_eq!(candidates, vec![
      Candidate { candidate_id: A, agreement_count: 3 },
      Candidate { candidate_id: B, agreement_count: 1 },
    ]);
  }

  #[test]
  fn tally_never_counts_opposite_or_neutral_values() {
    let votes = vec![
      vote(SEEKER, 1, VoteValue::Like),
      vote(SEEKER, 2, VoteValue::Dislike),
      vote(A, 1, VoteValue::Dislike),
      vote(A, 2, VoteValue::Neutral),
    ];
    let signal = SignalSet::from_votes(SEEKER, votes.clone());
    assert!(signal.tally(&votes).is_empty());
  }

  #[test]
  fn seeker_never_appears_among_candidates() {
    let votes = scenario();
    let signal = SignalSet::from_votes(SEEKER, votes.clone());
    assert!(signal.tally(&votes).iter().all(|c| c.candidate_id != SEEKER));
  }

  #[test]
  fn index_matches_store_path() {
    let mut index = VoteIndex::new();
    for v in scenario() {
      index.insert(v.voter_id, v.item_id, v.value);
    }
    let Generation::Candidates(candidates) = index.generate(SEEKER) else {
      panic!("expected candidates");
    };
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0], Candidate { candidate_id: A, agreement_count: 3 });
    assert_eq!(candidates[1], Candidate { candidate_id: B, agreement_count: 1 });
  }

  #[test]
  fn index_reports_no_votes_for_neutral_only_seeker() {
    let mut index = VoteIndex::new();
    index.insert(SEEKER, ItemId(1), VoteValue::Neutral);
    index.insert(A, ItemId(1), VoteValue::Neutral);
    assert_eq!(index.generate(SEEKER), Generation::NoVotes);
    assert_eq!(index.generate(UserId(999)), Generation::NoVotes);
  }

  #[test]
  fn index_revote_overwrites() {
    let mut index = VoteIndex::new();
    index.insert(SEEKER, ItemId(1), VoteValue::Like);
    index.insert(A, ItemId(1), VoteValue::Like);
    index.insert(A, ItemId(1), VoteValue::Dislike);

    assert_eq!(index.generate(SEEKER), Generation::Candidates(vec![]));
  }

  #[test]
  fn index_remove_item_drops_its_votes() {
    let mut index = VoteIndex::new();
    index.insert(SEEKER, ItemId(1), VoteValue::Like);
    index.insert(A, ItemId(1), VoteValue::Like);
    index.remove_item(ItemId(1));
    assert_eq!(index.generate(SEEKER), Generation::NoVotes);
  }
}
