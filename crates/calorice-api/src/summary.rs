//! Handler for `GET /summary`.

use std::sync::Arc;

use axum::{Json, extract::State};
use calorice_core::{
  entry::{EntryQuery, MealEntry},
  metabolism::compute_target,
  store::NutritionStore,
  summary::DailySummary,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extract::QueryParams, session::CurrentUser};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
  /// UTC calendar day; defaults to today.
  pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub date:    NaiveDate,
  #[serde(flatten)]
  pub summary: DailySummary,
}

/// `GET /summary[?date=YYYY-MM-DD]`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  current: CurrentUser,
  QueryParams(params): QueryParams<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: NutritionStore + 'static,
{
  let date = params.date.unwrap_or_else(|| Utc::now().date_naive());

  let entries: Vec<MealEntry> = store
    .list_entries(current.user.user_id, EntryQuery::day(date))
    .await
    .map_err(ApiError::from_store)?
    .into_iter()
    .map(|e| e.entry)
    .collect();

  // An incomplete profile still gets a summary, just without a target.
  let target = current
    .user
    .profile
    .complete()
    .ok()
    .map(|p| compute_target(&p).target);

  Ok(Json(SummaryResponse { date, summary: DailySummary::compute(&entries, target) }))
}
