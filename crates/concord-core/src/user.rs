//! Users — demographic attributes consulted by the filter pipeline.
//!
//! Identity is immutable; every other attribute may be rewritten by
//! re-submitting the profile. `has_photo` is never written directly: the
//! store derives it from the photos attached to the user.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::vote::UserId;

/// What a user is looking for.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Goal {
  Chat,
  Date,
  /// Compatible with every other goal.
  Both,
}

impl Goal {
  /// Goal compatibility: equal goals match, and `Both` on either side
  /// matches anything.
  pub fn accepts(self, other: Goal) -> bool {
    self == Goal::Both || other == Goal::Both || self == other
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

/// A user as held by the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    UserId,
  pub goal:       Goal,
  pub gender:     Gender,
  pub birth_date: NaiveDate,
  pub country:    Option<String>,
  pub city:       Option<String>,
  /// Derived: at least one photo is on file.
  pub has_photo:  bool,
}

impl User {
  /// Age in whole years on `today`.
  pub fn age_on(&self, today: NaiveDate) -> i32 { age_on(self.birth_date, today) }
}

/// Input to [`crate::store::MatchStore::upsert_user`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub goal:       Goal,
  pub gender:     Gender,
  pub birth_date: NaiveDate,
  #[serde(default)]
  pub country:    Option<String>,
  #[serde(default)]
  pub city:       Option<String>,
}

/// Completed years between `birth` and `today`. The birthday itself counts
/// as the day the year completes.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
  let mut years = today.year() - birth.year();
  if (today.month(), today.day()) < (birth.month(), birth.day()) {
    years -= 1;
  }
  years
}
