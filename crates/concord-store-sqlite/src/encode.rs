//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. Enum discriminants are stored as their lowercase names.
//! Identifiers and vote values are plain integers.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use concord_core::{
  exclusion::ShownRecord,
  user::{Gender, Goal, User},
  vote::{ItemId, UserId, Vote, VoteValue},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Goal / Gender ───────────────────────────────────────────────────────────

pub fn decode_goal(s: &str) -> Result<Goal> {
  Goal::from_str(s).map_err(|_| Error::UnknownDiscriminant {
    column: "goal",
    value:  s.to_owned(),
  })
}

pub fn decode_gender(s: &str) -> Result<Gender> {
  Gender::from_str(s).map_err(|_| Error::UnknownDiscriminant {
    column: "gender",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`]. Expects the table alias `u`.
pub const USER_COLUMNS: &str = "u.user_id, u.goal, u.gender, u.birth_date, u.country, u.city,
     EXISTS (SELECT 1 FROM photos p WHERE p.user_id = u.user_id)";

/// Raw values read from a `users` row plus the derived photo flag.
pub struct RawUser {
  pub user_id:    i64,
  pub goal:       String,
  pub gender:     String,
  pub birth_date: String,
  pub country:    Option<String>,
  pub city:       Option<String>,
  pub has_photo:  bool,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      goal:       row.get(1)?,
      gender:     row.get(2)?,
      birth_date: row.get(3)?,
      country:    row.get(4)?,
      city:       row.get(5)?,
      has_photo:  row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    UserId(self.user_id),
      goal:       decode_goal(&self.goal)?,
      gender:     decode_gender(&self.gender)?,
      birth_date: decode_date(&self.birth_date)?,
      country:    self.country,
      city:       self.city,
      has_photo:  self.has_photo,
    })
  }
}

/// Column list matching [`RawVote::from_row`].
pub const VOTE_COLUMNS: &str = "voter_id, item_id, value, voted_at";

/// Raw values read from a `votes` row.
pub struct RawVote {
  pub voter_id: i64,
  pub item_id:  i64,
  pub value:    i64,
  pub voted_at: String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      voter_id: row.get(0)?,
      item_id:  row.get(1)?,
      value:    row.get(2)?,
      voted_at: row.get(3)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      voter_id: UserId(self.voter_id),
      item_id:  ItemId(self.item_id),
      value:    VoteValue::try_from(self.value)?,
      voted_at: decode_dt(&self.voted_at)?,
    })
  }
}

/// Raw values read from a `shown` row.
pub struct RawShown {
  pub seeker_id: i64,
  pub shown_id:  i64,
  pub shown_at:  String,
}

impl RawShown {
  pub fn into_record(self) -> Result<ShownRecord> {
    Ok(ShownRecord {
      seeker_id: UserId(self.seeker_id),
      shown_id:  UserId(self.shown_id),
      shown_at:  decode_dt(&self.shown_at)?,
    })
  }
}

/// `?, ?, ...` with `n` placeholders, for `IN (...)` lists.
pub fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }
