//! Pairwise statistics between a seeker and one chosen candidate.
//!
//! Unlike candidate generation, which needs only the seeker's signal, these
//! statistics are restricted to items *both* users voted on. Neutral votes
//! are counted here; they feed the "unmarked" share.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  store::MatchStore,
  vote::{ItemId, UserId, Vote, VoteValue},
};

/// `round(numerator / denominator * 100)`, or 0 when the denominator is 0.
///
/// Results are not clamped: negative inputs and ratios above one produce
/// negative or >100 values. Halves round to even.
pub fn percentage(numerator: i64, denominator: i64) -> i64 {
  if denominator == 0 {
    return 0;
  }
  (numerator as f64 / denominator as f64 * 100.0).round_ties_even() as i64
}

/// Vote counts for one side over the jointly rated items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideCounts {
  pub positive: u32,
  pub negative: u32,
  pub neutral:  u32,
}

impl SideCounts {
  fn add(&mut self, value: VoteValue) {
    match value {
      VoteValue::Like => self.positive += 1,
      VoteValue::Dislike => self.negative += 1,
      VoteValue::Neutral => self.neutral += 1,
    }
  }

  /// Each bucket of `self` as a percentage of the matching bucket of `base`.
  fn relative_to(&self, base: &SideCounts) -> Shares {
    Shares {
      positive: percentage(self.positive.into(), base.positive.into()),
      negative: percentage(self.negative.into(), base.negative.into()),
      neutral:  percentage(self.neutral.into(), base.neutral.into()),
    }
  }

  /// Each bucket as a percentage of `total`.
  fn share_of(&self, total: u32) -> Shares {
    Shares {
      positive: percentage(self.positive.into(), total.into()),
      negative: percentage(self.negative.into(), total.into()),
      neutral:  percentage(self.neutral.into(), total.into()),
    }
  }
}

/// Percentages per vote bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shares {
  pub positive: i64,
  pub negative: i64,
  pub neutral:  i64,
}

/// Agreement and disagreement between two users over their jointly rated
/// items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairStatistics {
  pub seeker_id:        UserId,
  pub candidate_id:     UserId,
  /// Items both users voted on, neutral votes included.
  pub common_items:     u32,
  /// Common items with identical non-neutral values.
  pub agreements:       u32,
  /// Common items with opposite non-neutral values.
  pub disagreements:    u32,
  pub seeker:           SideCounts,
  pub candidate:        SideCounts,
  /// Seeker's buckets as a share of `common_items`.
  pub seeker_share:     Shares,
  /// Candidate's buckets as a share of `common_items`.
  pub candidate_share:  Shares,
  /// Candidate's buckets relative to the seeker's (100 = same amount).
  pub relative:         Shares,
  pub agreement_pct:    i64,
  pub disagreement_pct: i64,
}

impl PairStatistics {
  /// Compute from each side's full vote list. Items rated by only one side
  /// are ignored.
  pub fn from_votes(
    seeker_id: UserId,
    seeker_votes: &[Vote],
    candidate_id: UserId,
    candidate_votes: &[Vote],
  ) -> Self {
    let theirs: HashMap<ItemId, VoteValue> = candidate_votes
      .iter()
      .map(|v| (v.item_id, v.value))
      .collect();

    let mut seeker = SideCounts::default();
    let mut candidate = SideCounts::default();
    let mut common_items = 0u32;
    let mut agreements = 0u32;
    let mut disagreements = 0u32;

    for vote in seeker_votes {
      let Some(other) = theirs.get(&vote.item_id).copied() else {
        continue;
      };
      common_items += 1;
      seeker.add(vote.value);
      candidate.add(other);
      if vote.value.is_signal() && vote.value == other {
        agreements += 1;
      } else if vote.value.opposes(other) {
        disagreements += 1;
      }
    }

    Self {
      seeker_id,
      candidate_id,
      common_items,
      agreements,
      disagreements,
      seeker,
      candidate,
      seeker_share: seeker.share_of(common_items),
      candidate_share: candidate.share_of(common_items),
      relative: candidate.relative_to(&seeker),
      agreement_pct: percentage(agreements.into(), common_items.into()),
      disagreement_pct: percentage(disagreements.into(), common_items.into()),
    }
  }
}

/// Load both users' votes and compute their [`PairStatistics`].
pub async fn compute<S>(
  store: &S,
  seeker_id: UserId,
  candidate_id: UserId,
) -> Result<PairStatistics>
where
  S: MatchStore,
{
  let seeker_votes = store.votes_of(seeker_id).await.map_err(Error::store)?;
  let candidate_votes = store.votes_of(candidate_id).await.map_err(Error::store)?;
  Ok(PairStatistics::from_votes(
    seeker_id,
    &seeker_votes,
    candidate_id,
    &candidate_votes,
  ))
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn votes(voter: i64, values: &[(i64, VoteValue)]) -> Vec<Vote> {
    values
      .iter()
      .map(|(item, value)| Vote {
        voter_id: UserId(voter),
        item_id:  ItemId(*item),
        value:    *value,
        voted_at: Utc::now(),
      })
      .collect()
  }

  #[test]
  fn percentage_of_zero_is_zero() {
    assert_eq!(percentage(5, 0), 0);
    assert_eq!(percentage(-5, 0), 0);
    assert_eq!(percentage(0, 0), 0);
  }

  #[test]
  fn percentage_is_not_clamped() {
    assert_eq!(percentage(7, 6), 117);
    assert_eq!(percentage(-3, 4), -75);
    assert_eq!(percentage(5, -2), -250);
  }

  #[test]
  fn percentage_rounds_half_to_even() {
    assert_eq!(percentage(1, 8), 12);
    assert_eq!(percentage(3, 8), 38);
  }

  #[test]
  fn relative_likes_can_exceed_one_hundred() {
    use VoteValue::*;
    // Seeker: 6 likes, 1 dislike, 5 neutral. Candidate: 7, 2, 3.
    let seeker = votes(1, &[
      (1, Like), (2, Like), (3, Like), (4, Like), (5, Like), (6, Like),
      (7, Dislike),
      (8, Neutral), (9, Neutral), (10, Neutral), (11, Neutral), (12, Neutral),
    ]);
    let candidate = votes(2, &[
      (1, Like), (2, Like), (3, Like), (4, Like), (5, Like), (6, Like), (7, Like),
      (8, Dislike), (9, Dislike),
      (10, Neutral), (11, Neutral), (12, Neutral),
    ]);

    let stats = PairStatistics::from_votes(UserId(1), &seeker, UserId(2), &candidate);

    assert_eq!(stats.common_items, 12);
    assert_eq!(stats.seeker, SideCounts { positive: 6, negative: 1, neutral: 5 });
    assert_eq!(stats.candidate, SideCounts { positive: 7, negative: 2, neutral: 3 });
    assert_eq!(stats.relative, Shares { positive: 117, negative: 200, neutral: 60 });
    assert_eq!(stats.agreements, 6);
    assert_eq!(stats.disagreements, 1);
    assert_eq!(stats.agreement_pct, 50);
    assert_eq!(stats.disagreement_pct, 8);
    assert_eq!(stats.seeker_share, Shares { positive: 50, negative: 8, neutral: 42 });
    assert_eq!(stats.candidate_share, Shares { positive: 58, negative: 17, neutral: 25 });
  }

  #[test]
  fn one_sided_items_are_excluded() {
    use VoteValue::*;
    let seeker = votes(1, &[(1, Like), (2, Dislike)]);
    let candidate = votes(2, &[(1, Like), (3, Dislike)]);

    let stats = PairStatistics::from_votes(UserId(1), &seeker, UserId(2), &candidate);
    assert_eq!(stats.common_items, 1);
    assert_eq!(stats.seeker, SideCounts { positive: 1, negative: 0, neutral: 0 });
    assert_eq!(stats.candidate, SideCounts { positive: 1, negative: 0, neutral: 0 });
    assert_eq!(stats.agreement_pct, 100);
  }

  #[test]
  fn candidate_without_votes_yields_all_zero() {
    let seeker = votes(1, &[(1, VoteValue::Like)]);
    let stats = PairStatistics::from_votes(UserId(1), &seeker, UserId(2), &[]);

    assert_eq!(stats.common_items, 0);
    assert_eq!(stats.seeker, SideCounts::default());
    assert_eq!(stats.candidate, SideCounts::default());
    assert_eq!(stats.relative, Shares::default());
    assert_eq!(stats.seeker_share, Shares::default());
    assert_eq!(stats.agreement_pct, 0);
  }
}
