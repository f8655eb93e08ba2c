//! Handler for `GET /stats`.

use axum::{
  Json,
  extract::State,
};
use concord_core::{engine, stats::PairStatistics, store::MatchStore, vote::UserId};
use serde::Deserialize;

use crate::{ApiState, error::ApiError, extract::ApiQuery};

#[derive(Debug, Deserialize)]
pub struct StatsParams {
  pub seeker_id:    UserId,
  pub candidate_id: UserId,
}

/// `GET /stats?seeker_id=...&candidate_id=...`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  ApiQuery(params): ApiQuery<StatsParams>,
) -> Result<Json<PairStatistics>, ApiError>
where
  S: MatchStore,
{
  if params.seeker_id == params.candidate_id {
    return Err(ApiError::BadRequest("seeker and candidate must differ".into()));
  }
  let stats =
    engine::pair_statistics(&*state.store, params.seeker_id, params.candidate_id).await?;
  Ok(Json(stats))
}
