//! JSON REST API for Concord.
//!
//! Exposes an axum [`Router`] backed by any [`concord_core::store::MatchStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", concord_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod extract;
pub mod searches;
pub mod stats;
pub mod users;
pub mod votes;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use concord_core::store::MatchStore;

pub use error::ApiError;
pub use searches::SearchRegistry;

/// Shared state for every handler.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub searches: Arc<SearchRegistry>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), searches: Arc::clone(&self.searches) }
  }
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, searches: Arc::new(SearchRegistry::new()) }
  }

  /// Like [`ApiState::new`], dropping search cursors idle for `idle_ttl`.
  pub fn with_search_ttl(store: Arc<S>, idle_ttl: Duration) -> Self {
    Self { store, searches: Arc::new(SearchRegistry::with_idle_ttl(idle_ttl)) }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: MatchStore + 'static,
{
  router(ApiState::new(store))
}

/// Build the router over an existing state, sharing its search registry.
pub fn router<S>(state: ApiState<S>) -> Router<()>
where
  S: MatchStore + 'static,
{
  Router::new()
    // Users
    .route(
      "/users/{id}",
      put(users::upsert::<S>)
        .get(users::get_one::<S>)
        .delete(users::delete::<S>),
    )
    .route(
      "/users/{id}/photos",
      post(users::add_photo::<S>).delete(users::clear_photos::<S>),
    )
    .route("/users/{id}/votes", get(users::votes::<S>))
    // Items and votes
    .route("/items", post(votes::register_item::<S>))
    .route("/items/{id}", delete(votes::delete_item::<S>))
    .route("/votes", post(votes::record::<S>))
    // Searches
    .route("/searches", post(searches::create::<S>))
    .route("/searches/{id}", delete(searches::close::<S>))
    .route("/searches/{id}/next", post(searches::next::<S>))
    // Statistics
    .route("/stats", get(stats::handler::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use concord_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state() -> ApiState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    ApiState::new(Arc::new(store))
  }

  async fn call(
    state: &ApiState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn put_user(state: &ApiState<SqliteStore>, id: i64, gender: &str) {
    let profile = json!({
      "goal": "both",
      "gender": gender,
      "birth_date": "1995-03-01",
      "country": "pt",
    });
    let (status, _) = call(state, "PUT", &format!("/users/{id}"), Some(profile)).await;
    assert_eq!(status, StatusCode::OK);
  }

  async fn cast(state: &ApiState<SqliteStore>, voter: i64, item: i64, value: i64) {
    call(state, "POST", "/items", Some(json!({ "item_id": item }))).await;
    let body = json!({ "voter_id": voter, "item_id": item, "value": value });
    let (status, _) = call(state, "POST", "/votes", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
  }

  /// Seeker 1 likes 100, 200, 300. User 10 agrees on all three, user 20 on
  /// one. User 30 only disagrees.
  async fn seed(state: &ApiState<SqliteStore>) {
    put_user(state, 1, "male").await;
    put_user(state, 10, "female").await;
    put_user(state, 20, "male").await;
    put_user(state, 30, "female").await;
    for item in [100, 200, 300] {
      cast(state, 1, item, 1).await;
      cast(state, 10, item, 1).await;
    }
    cast(state, 20, 100, 1).await;
    cast(state, 30, 200, -1).await;
  }

  // ── Users ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn user_roundtrip_and_photo_flag() {
    let state = make_state().await;
    put_user(&state, 7, "female").await;

    let (status, user) = call(&state, "GET", "/users/7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["gender"], "female");
    assert_eq!(user["has_photo"], false);

    let (status, _) =
      call(&state, "POST", "/users/7/photos", Some(json!({ "file_id": "abc" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, user) = call(&state, "GET", "/users/7", None).await;
    assert_eq!(user["has_photo"], true);

    let (_, removed) = call(&state, "DELETE", "/users/7/photos", None).await;
    assert_eq!(removed["removed"], 1);
  }

  #[tokio::test]
  async fn unknown_user_is_404_with_error_body() {
    let state = make_state().await;
    let (status, body) = call(&state, "GET", "/users/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("404"));

    let (status, _) = call(&state, "DELETE", "/users/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn empty_photo_id_is_rejected() {
    let state = make_state().await;
    put_user(&state, 7, "female").await;
    let (status, _) =
      call(&state, "POST", "/users/7/photos", Some(json!({ "file_id": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Votes ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn revote_overwrites() {
    let state = make_state().await;
    put_user(&state, 1, "male").await;
    cast(&state, 1, 100, 1).await;
    cast(&state, 1, 100, -1).await;

    let (_, votes) = call(&state, "GET", "/users/1/votes", None).await;
    let votes = votes.as_array().unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0]["value"], -1);
  }

  #[tokio::test]
  async fn out_of_range_vote_value_is_rejected() {
    let state = make_state().await;
    put_user(&state, 1, "male").await;
    call(&state, "POST", "/items", Some(json!({ "item_id": 100 }))).await;
    let body = json!({ "voter_id": 1, "item_id": 100, "value": 2 });
    let (status, body) = call(&state, "POST", "/votes", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn malformed_input_gets_a_json_error_body() {
    let state = make_state().await;

    let (status, body) = call(&state, "GET", "/users/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");

    let (status, body) = call(&state, "GET", "/stats?seeker_id=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) =
      call(&state, "POST", "/searches", Some(json!({ "filters": {} }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
  }

  #[tokio::test]
  async fn deleting_an_item_removes_its_votes() {
    let state = make_state().await;
    put_user(&state, 1, "male").await;
    cast(&state, 1, 100, 1).await;

    let (status, _) = call(&state, "DELETE", "/items/100", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, votes) = call(&state, "GET", "/users/1/votes", None).await;
    assert!(votes.as_array().unwrap().is_empty());

    let (status, _) = call(&state, "DELETE", "/items/100", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Searches ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn search_without_votes() {
    let state = make_state().await;
    put_user(&state, 1, "male").await;
    let (status, body) = call(&state, "POST", "/searches", Some(json!({ "seeker_id": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "outcome": "no_votes" }));
    assert!(state.searches.is_empty());
  }

  #[tokio::test]
  async fn search_reveals_weakest_agreement_first() {
    let state = make_state().await;
    seed(&state).await;

    let (_, body) = call(&state, "POST", "/searches", Some(json!({ "seeker_id": 1 }))).await;
    assert_eq!(body["outcome"], "matches");
    assert_eq!(body["total"], 2);
    let id = body["search_id"].as_str().unwrap().to_owned();
    let next = format!("/searches/{id}/next");

    let (_, first) = call(&state, "POST", &next, None).await;
    assert_eq!(first["outcome"], "match");
    assert_eq!(first["candidate"]["candidate_id"], 20);
    assert_eq!(first["candidate"]["agreement_count"], 1);
    assert_eq!(first["remaining"], 1);

    let (_, second) = call(&state, "POST", &next, None).await;
    assert_eq!(second["candidate"]["candidate_id"], 10);
    assert_eq!(second["candidate"]["agreement_count"], 3);
    assert_eq!(second["remaining"], 0);

    let (_, done) = call(&state, "POST", &next, None).await;
    assert_eq!(done, json!({ "outcome": "no_more_matches" }));
    assert!(state.searches.is_empty());

    let (status, _) = call(&state, "POST", &next, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn exhausted_searches_do_not_accumulate() {
    let state = make_state().await;
    seed(&state).await;

    for _ in 0..20 {
      let (_, body) = call(&state, "POST", "/searches", Some(json!({ "seeker_id": 1 }))).await;
      let next = format!("/searches/{}/next", body["search_id"].as_str().unwrap());
      loop {
        let (_, reveal) = call(&state, "POST", &next, None).await;
        if reveal["outcome"] == "no_more_matches" {
          break;
        }
      }
    }
    assert!(state.searches.is_empty());
  }

  #[tokio::test]
  async fn abandoned_searches_expire() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = ApiState::with_search_ttl(Arc::new(store), Duration::ZERO);
    seed(&state).await;

    for _ in 0..5 {
      let (_, body) = call(&state, "POST", "/searches", Some(json!({ "seeker_id": 1 }))).await;
      assert_eq!(body["outcome"], "matches");
    }
    // Each open sweeps the ones before it.
    assert_eq!(state.searches.len(), 1);
  }

  #[tokio::test]
  async fn filters_apply_and_new_view_excludes_shown() {
    let state = make_state().await;
    seed(&state).await;

    let female_only = json!({ "seeker_id": 1, "filters": { "gender": "female" }, "view": "new" });
    let (_, body) = call(&state, "POST", "/searches", Some(female_only.clone())).await;
    assert_eq!(body["total"], 1);
    let next = format!("/searches/{}/next", body["search_id"].as_str().unwrap());
    let (_, shown) = call(&state, "POST", &next, None).await;
    assert_eq!(shown["candidate"]["candidate_id"], 10);

    let (_, again) = call(&state, "POST", "/searches", Some(female_only)).await;
    assert_eq!(again, json!({ "outcome": "no_new_matches" }));

    let too_old = json!({ "seeker_id": 1, "filters": { "min_age": 90 } });
    let (_, none) = call(&state, "POST", "/searches", Some(too_old)).await;
    assert_eq!(none, json!({ "outcome": "no_matches_with_filters" }));
  }

  #[tokio::test]
  async fn closed_search_is_gone() {
    let state = make_state().await;
    seed(&state).await;
    let (_, body) = call(&state, "POST", "/searches", Some(json!({ "seeker_id": 1 }))).await;
    let id = body["search_id"].as_str().unwrap().to_owned();

    let (status, _) = call(&state, "DELETE", &format!("/searches/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&state, "POST", &format!("/searches/{id}/next"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Statistics ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn stats_for_a_pair() {
    let state = make_state().await;
    seed(&state).await;

    let (status, stats) = call(&state, "GET", "/stats?seeker_id=1&candidate_id=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["common_items"], 3);
    assert_eq!(stats["agreements"], 3);
    assert_eq!(stats["disagreements"], 0);
    assert_eq!(stats["agreement_pct"], 100);

    let (status, _) = call(&state, "GET", "/stats?seeker_id=1&candidate_id=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
