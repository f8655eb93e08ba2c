//! [`SqliteStore`] — the SQLite implementation of [`MatchStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use concord_core::{
  exclusion::ShownRecord,
  store::MatchStore,
  user::{User, UserProfile},
  vote::{ItemId, NewVote, UserId, Vote},
};

use crate::{
  encode::{
    RawShown, RawUser, RawVote, USER_COLUMNS, VOTE_COLUMNS, encode_date, encode_dt,
    placeholders,
  },
  schema::SCHEMA,
  Result,
};

/// Upper bound on bound parameters per `IN (...)` statement; larger id lists
/// are split into several statements inside one read transaction.
const MAX_BOUND_PARAMS: usize = 500;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Concord store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `sql` (which must contain exactly one `{in}` marker) once per chunk
  /// of `ids`, inside a single read transaction, collecting every row.
  async fn select_in<T, F>(&self, sql: String, ids: Vec<i64>, map: F) -> Result<Vec<T>>
  where
    T: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<T> + Send + 'static,
  {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let rows = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut out = Vec::new();
        for chunk in ids.chunks(MAX_BOUND_PARAMS) {
          let query = sql.replace("{in}", &placeholders(chunk.len()));
          let mut stmt = tx.prepare(&query)?;
          let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), &map)?;
          for row in rows {
            out.push(row?);
          }
        }
        tx.commit()?;
        Ok(out)
      })
      .await?;
    Ok(rows)
  }
}

// ─── MatchStore impl ─────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  type Error = crate::Error;

  // ── User directory ────────────────────────────────────────────────────────

  async fn upsert_user(&self, user_id: UserId, profile: UserProfile) -> Result<User> {
    let id         = user_id.0;
    let goal       = AsRef::<str>::as_ref(&profile.goal).to_owned();
    let gender     = AsRef::<str>::as_ref(&profile.gender).to_owned();
    let birth_date = encode_date(profile.birth_date);
    let country    = profile.country;
    let city       = profile.city;
    let now        = encode_dt(Utc::now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, goal, gender, birth_date, country, city, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (user_id) DO UPDATE SET
             goal       = excluded.goal,
             gender     = excluded.gender,
             birth_date = excluded.birth_date,
             country    = excluded.country,
             city       = excluded.city,
             updated_at = excluded.updated_at",
          rusqlite::params![id, goal, gender, birth_date, country, city, now],
        )?;
        let raw = conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
          rusqlite::params![id],
          RawUser::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
    let id = user_id.0;

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
            rusqlite::params![id],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id IN ({{in}})");
    let ids = ids.iter().map(|id| id.0).collect();
    let raws = self.select_in(sql, ids, RawUser::from_row).await?;
    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn delete_user(&self, user_id: UserId) -> Result<bool> {
    let id = user_id.0;
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM users WHERE user_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn add_photo(&self, user_id: UserId, file_id: String) -> Result<()> {
    let id = user_id.0;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO photos (user_id, file_id) VALUES (?1, ?2)
           ON CONFLICT (user_id, file_id) DO NOTHING",
          rusqlite::params![id, file_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn clear_photos(&self, user_id: UserId) -> Result<u64> {
    let id = user_id.0;
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM photos WHERE user_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(removed as u64)
  }

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn register_item(&self, item_id: ItemId) -> Result<()> {
    let id  = item_id.0;
    let now = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO items (item_id, created_at) VALUES (?1, ?2)
           ON CONFLICT (item_id) DO NOTHING",
          rusqlite::params![id, now],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_item(&self, item_id: ItemId) -> Result<bool> {
    let id = item_id.0;
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM items WHERE item_id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn record_vote(&self, vote: NewVote) -> Result<Vote> {
    let recorded = Vote {
      voter_id: vote.voter_id,
      item_id:  vote.item_id,
      value:    vote.value,
      voted_at: Utc::now(),
    };

    let voter_id = recorded.voter_id.0;
    let item_id  = recorded.item_id.0;
    let value    = recorded.value.as_i64();
    let at_str   = encode_dt(recorded.voted_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO votes (voter_id, item_id, value, voted_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (voter_id, item_id) DO UPDATE SET
             value    = excluded.value,
             voted_at = excluded.voted_at",
          rusqlite::params![voter_id, item_id, value, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(recorded)
  }

  async fn votes_of(&self, voter_id: UserId) -> Result<Vec<Vote>> {
    let id = voter_id.0;

    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VOTE_COLUMNS} FROM votes WHERE voter_id = ?1 ORDER BY item_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }

  async fn voters_of(&self, items: &[ItemId]) -> Result<Vec<Vote>> {
    let sql = format!("SELECT {VOTE_COLUMNS} FROM votes WHERE item_id IN ({{in}})");
    let ids = items.iter().map(|id| id.0).collect();
    let raws = self.select_in(sql, ids, RawVote::from_row).await?;
    tracing::trace!(items = items.len(), votes = raws.len(), "loaded covotes");
    raws.into_iter().map(RawVote::into_vote).collect()
  }

  // ── Shown records ─────────────────────────────────────────────────────────

  async fn mark_shown(&self, seeker_id: UserId, shown_id: UserId) -> Result<ShownRecord> {
    let record = ShownRecord { seeker_id, shown_id, shown_at: Utc::now() };

    let seeker = seeker_id.0;
    let shown  = shown_id.0;
    let at_str = encode_dt(record.shown_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shown (seeker_id, shown_id, shown_at) VALUES (?1, ?2, ?3)
           ON CONFLICT (seeker_id, shown_id) DO UPDATE SET shown_at = excluded.shown_at",
          rusqlite::params![seeker, shown, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn is_shown(&self, seeker_id: UserId, shown_id: UserId) -> Result<bool> {
    let seeker = seeker_id.0;
    let shown  = shown_id.0;

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM shown WHERE seeker_id = ?1 AND shown_id = ?2",
            rusqlite::params![seeker, shown],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;
    Ok(found)
  }

  async fn shown_to(&self, seeker_id: UserId) -> Result<Vec<ShownRecord>> {
    let seeker = seeker_id.0;

    let raws: Vec<RawShown> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT seeker_id, shown_id, shown_at FROM shown
           WHERE seeker_id = ?1 ORDER BY shown_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![seeker], |row| {
            Ok(RawShown {
              seeker_id: row.get(0)?,
              shown_id:  row.get(1)?,
              shown_at:  row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawShown::into_record).collect()
  }
}
