//! The filter pipeline — demographic and content predicates over candidates.
//!
//! Every predicate is independent and the set is a pure conjunction, so the
//! order of evaluation never changes the result. A predicate left at its
//! neutral setting passes every candidate without looking at the user record,
//! and a fully neutral [`FilterSet`] skips the user lookup altogether.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  candidates::Candidate,
  store::MatchStore,
  user::{Gender, Goal, User},
  vote::UserId,
};

/// The boolean "checkbox" filters a seeker can switch on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkbox {
  Photo,
  Country,
  City,
}

/// A seeker's constraints for one search. Assumed well-formed: inverted age
/// bounds are not repaired and simply admit nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
  /// `None` and `Some(Goal::Both)` are both neutral.
  pub goal:            Option<Goal>,
  /// `None` means any gender.
  pub gender:          Option<Gender>,
  /// Inclusive lower age bound.
  pub min_age:         Option<u8>,
  /// Inclusive upper age bound.
  pub max_age:         Option<u8>,
  pub require_photo:   bool,
  pub require_country: bool,
  pub require_city:    bool,
}

impl FilterSet {
  /// Flip a checkbox and return its new state.
  pub fn toggle(&mut self, checkbox: Checkbox) -> bool {
    let flag = match checkbox {
      Checkbox::Photo => &mut self.require_photo,
      Checkbox::Country => &mut self.require_country,
      Checkbox::City => &mut self.require_city,
    };
    *flag = !*flag;
    *flag
  }

  /// `true` when no predicate is active.
  pub fn is_neutral(&self) -> bool {
    self.active_goal().is_none()
      && self.gender.is_none()
      && self.min_age.is_none()
      && self.max_age.is_none()
      && !self.require_photo
      && !self.require_country
      && !self.require_city
  }

  fn active_goal(&self) -> Option<Goal> {
    self.goal.filter(|g| *g != Goal::Both)
  }

  /// Evaluate every active predicate against `user` on `today`.
  pub fn admits(&self, user: &User, today: NaiveDate) -> bool {
    if let Some(goal) = self.active_goal()
      && !goal.accepts(user.goal)
    {
      return false;
    }
    if let Some(gender) = self.gender
      && gender != user.gender
    {
      return false;
    }
    if self.min_age.is_some() || self.max_age.is_some() {
      let age = user.age_on(today);
      if self.min_age.is_some_and(|min| age < i32::from(min)) {
        return false;
      }
      if self.max_age.is_some_and(|max| age > i32::from(max)) {
        return false;
      }
    }
    if self.require_photo && !user.has_photo {
      return false;
    }
    if self.require_country && user.country.is_none() {
      return false;
    }
    if self.require_city && user.city.is_none() {
      return false;
    }
    true
  }

  /// Keep the candidates whose user record passes every active predicate.
  /// A candidate without a record in `users` fails unless the set is neutral.
  pub fn apply(
    &self,
    candidates: Vec<Candidate>,
    users: &HashMap<UserId, User>,
    today: NaiveDate,
  ) -> Vec<Candidate> {
    if self.is_neutral() {
      return candidates;
    }
    candidates
      .into_iter()
      .filter(|c| {
        users
          .get(&c.candidate_id)
          .is_some_and(|user| self.admits(user, today))
      })
      .collect()
  }
}

/// Store-backed filter stage: loads the candidates' user records (only when a
/// predicate is active) and applies `filters` as of `today`.
pub async fn apply_filters<S>(
  store: &S,
  candidates: Vec<Candidate>,
  filters: &FilterSet,
  seeker_id: UserId,
  today: NaiveDate,
) -> Result<Vec<Candidate>>
where
  S: MatchStore,
{
  if filters.is_neutral() || candidates.is_empty() {
    return Ok(candidates);
  }

  let ids: Vec<UserId> = candidates.iter().map(|c| c.candidate_id).collect();
  let users: HashMap<UserId, User> = store
    .get_users(&ids)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|u| (u.user_id, u))
    .collect();

  let before = candidates.len();
  let kept = filters.apply(candidates, &users, today);
  tracing::debug!(seeker = %seeker_id, before, after = kept.len(), "applied filters");
  Ok(kept)
}
