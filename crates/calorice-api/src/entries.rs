//! Handlers for `/entries` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/entries` | Body: [`NewEntryBody`]; resolves calories, returns 201 |
//! | `GET`    | `/entries` | Optional `from` / `until` bounds (half-open) |
//! | `DELETE` | `/entries/{id}` | Owner only; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use calorice_core::{
  entry::{EntryQuery, EntryWithFood, NewMealEntry, is_valid_amount},
  nutrition::Unit,
  store::NutritionStore,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{JsonBody, QueryParams},
  session::CurrentUser,
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /entries`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryBody {
  pub food_id:  Uuid,
  pub unit:     Unit,
  pub amount:   f64,
  /// Defaults to now.
  pub eaten_at: Option<DateTime<Utc>>,
}

/// `POST /entries`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  current: CurrentUser,
  JsonBody(body): JsonBody<NewEntryBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: NutritionStore + 'static,
{
  if !is_valid_amount(body.amount) {
    return Err(ApiError::BadRequest("amount must be a positive number".into()));
  }

  let food = store
    .get_food(body.food_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("food {} not found", body.food_id)))?;

  let new_entry = NewMealEntry::resolve(
    current.user.user_id,
    food.food_id,
    &food.nutrition,
    body.unit,
    body.amount,
    body.eaten_at.unwrap_or_else(Utc::now),
  )
  .ok_or_else(|| ApiError::Undeterminable("cannot compute calories for this food".into()))?;

  let entry = store.record_entry(new_entry).await.map_err(ApiError::from_store)?;

  tracing::info!(
    entry_id = %entry.entry_id,
    food_id = %food.food_id,
    calories = entry.calories,
    "meal entry recorded"
  );
  Ok((StatusCode::CREATED, Json(EntryWithFood { entry, food })))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Inclusive lower bound on `eatenAt`.
  pub from:  Option<DateTime<Utc>>,
  /// Exclusive upper bound on `eatenAt`.
  pub until: Option<DateTime<Utc>>,
}

/// `GET /entries[?from=...][&until=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  current: CurrentUser,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<EntryWithFood>>, ApiError>
where
  S: NutritionStore + 'static,
{
  let query = EntryQuery { from: params.from, until: params.until };
  let entries = store
    .list_entries(current.user.user_id, query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /entries/{id}`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: NutritionStore + 'static,
{
  let removed = store
    .delete_entry(current.user.user_id, id)
    .await
    .map_err(ApiError::from_store)?;

  if !removed {
    return Err(ApiError::NotFound(format!("entry {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
