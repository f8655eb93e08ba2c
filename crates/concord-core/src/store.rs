//! The `MatchStore` trait — everything the matching engine needs from durable
//! storage.
//!
//! The trait is implemented by storage backends (e.g. `concord-store-sqlite`).
//! The engine and the HTTP layer depend on this abstraction, not on any
//! concrete backend, and receive the handle explicitly on every call.

use std::future::Future;

use crate::{
  exclusion::ShownRecord,
  user::{User, UserProfile},
  vote::{ItemId, NewVote, UserId, Vote},
};

/// Abstraction over a Concord storage backend.
///
/// Three collaborators share one handle: the user directory, the vote store
/// and the shown-record table used by the exclusion tracker. Referential
/// integrity (votes and shown records only link existing users and items) is
/// the backend's responsibility.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait MatchStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── User directory ────────────────────────────────────────────────────

  /// Create the user or overwrite every demographic attribute of an existing
  /// one. Photos are left untouched.
  fn upsert_user(
    &self,
    user_id: UserId,
    profile: UserProfile,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve every user in `ids` that exists. Order is unspecified; unknown
  /// ids are silently skipped.
  fn get_users<'a>(
    &'a self,
    ids: &'a [UserId],
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  /// Delete a user together with their votes, photos and shown records (in
  /// both directions). Returns `false` if the user did not exist.
  fn delete_user(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Attach a photo (an opaque platform file id) to a user.
  fn add_photo(
    &self,
    user_id: UserId,
    file_id: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove every photo of a user. Returns the number removed.
  fn clear_photos(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Register an item so that votes may reference it. Idempotent.
  fn register_item(
    &self,
    item_id: ItemId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete an item and, by cascade, every vote cast on it. Returns `false`
  /// if the item did not exist.
  fn delete_item(
    &self,
    item_id: ItemId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Record a vote, overwriting any earlier vote by the same voter on the
  /// same item. `voted_at` is set by the store.
  fn record_vote(
    &self,
    vote: NewVote,
  ) -> impl Future<Output = Result<Vote, Self::Error>> + Send + '_;

  /// Every vote cast by `voter_id`, neutral ones included.
  fn votes_of(
    &self,
    voter_id: UserId,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  /// Every vote cast on any of `items`, by any voter. This is the single
  /// batched read behind candidate generation, so its cost is proportional to
  /// the seeker's activity rather than to the user base.
  fn voters_of<'a>(
    &'a self,
    items: &'a [ItemId],
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + 'a;

  // ── Shown records ─────────────────────────────────────────────────────

  /// Idempotent upsert of `(seeker_id, shown_id)`; refreshes `shown_at`.
  fn mark_shown(
    &self,
    seeker_id: UserId,
    shown_id: UserId,
  ) -> impl Future<Output = Result<ShownRecord, Self::Error>> + Send + '_;

  fn is_shown(
    &self,
    seeker_id: UserId,
    shown_id: UserId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every user already shown to `seeker_id`.
  fn shown_to(
    &self,
    seeker_id: UserId,
  ) -> impl Future<Output = Result<Vec<ShownRecord>, Self::Error>> + Send + '_;
}
