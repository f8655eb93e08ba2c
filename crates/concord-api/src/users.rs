//! Handlers for `/users` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `PUT`    | `/users/{id}` | Body: [`UserProfile`]; creates or overwrites |
//! | `GET`    | `/users/{id}` | 404 if not found |
//! | `DELETE` | `/users/{id}` | Cascades to votes, photos and shown records |
//! | `POST`   | `/users/{id}/photos` | Body: `{"file_id":"..."}` |
//! | `DELETE` | `/users/{id}/photos` | Returns `{"removed": n}` |
//! | `GET`    | `/users/{id}/votes` | Every vote the user cast |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use concord_core::{
  store::MatchStore,
  user::{User, UserProfile},
  vote::{UserId, Vote},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

// ─── Profile ──────────────────────────────────────────────────────────────────

/// `PUT /users/{id}`
pub async fn upsert<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(profile): ApiJson<UserProfile>,
) -> Result<Json<User>, ApiError>
where
  S: MatchStore,
{
  let user = state
    .store
    .upsert_user(UserId(id), profile)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(user))
}

/// `GET /users/{id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<User>, ApiError>
where
  S: MatchStore,
{
  let user = state
    .store
    .get_user(UserId(id))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

/// `DELETE /users/{id}`
pub async fn delete<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError>
where
  S: MatchStore,
{
  let removed = state
    .store
    .delete_user(UserId(id))
    .await
    .map_err(ApiError::store)?;
  if removed {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("user {id} not found")))
  }
}

// ─── Photos ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PhotoBody {
  pub file_id: String,
}

/// `POST /users/{id}/photos`
pub async fn add_photo<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<PhotoBody>,
) -> Result<StatusCode, ApiError>
where
  S: MatchStore,
{
  if body.file_id.trim().is_empty() {
    return Err(ApiError::BadRequest("file_id must not be empty".into()));
  }
  state
    .store
    .add_photo(UserId(id), body.file_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/{id}/photos`
pub async fn clear_photos<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Value>, ApiError>
where
  S: MatchStore,
{
  let removed = state
    .store
    .clear_photos(UserId(id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "removed": removed })))
}

// ─── Votes ────────────────────────────────────────────────────────────────────

/// `GET /users/{id}/votes`
pub async fn votes<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<Vote>>, ApiError>
where
  S: MatchStore,
{
  let votes = state
    .store
    .votes_of(UserId(id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(votes))
}
