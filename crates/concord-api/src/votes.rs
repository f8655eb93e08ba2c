//! Handlers for `/items` and `/votes`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/items` | Body: `{"item_id": 42}`; idempotent |
//! | `DELETE` | `/items/{id}` | Cascades to every vote on the item |
//! | `POST`   | `/votes` | Body: [`NewVote`]; overwrites an earlier vote; returns 201 |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use concord_core::{
  store::MatchStore,
  vote::{ItemId, NewVote},
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

#[derive(Debug, Deserialize)]
pub struct ItemBody {
  pub item_id: ItemId,
}

/// `POST /items`
pub async fn register_item<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<ItemBody>,
) -> Result<StatusCode, ApiError>
where
  S: MatchStore,
{
  state
    .store
    .register_item(body.item_id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /items/{id}`
pub async fn delete_item<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, ApiError>
where
  S: MatchStore,
{
  let removed = state
    .store
    .delete_item(ItemId(id))
    .await
    .map_err(ApiError::store)?;
  if removed {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("item {id} not found")))
  }
}

/// `POST /votes` — returns 201 + the stored vote.
pub async fn record<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<NewVote>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MatchStore,
{
  let vote = state
    .store
    .record_vote(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(vote)))
}
