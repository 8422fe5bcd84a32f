//! Handlers for the shared food catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/foods/search` | `?q=`; empty query returns `[]` |
//! | `POST` | `/foods` | Body: [`FoodInput`]; returns 201, 409 on a duplicate barcode |
//! | `GET`  | `/foods/{id}` | Single food |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use calorice_core::{
  food::{Food, FoodInput, FoodQuery},
  store::NutritionStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{JsonBody, QueryParams},
  session::CurrentUser,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
  pub q: Option<String>,
}

/// `GET /foods/search?q=<text>`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  _current: CurrentUser,
  QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<Vec<Food>>, ApiError>
where
  S: NutritionStore + 'static,
{
  let text = params.q.unwrap_or_default();
  if text.trim().is_empty() {
    return Ok(Json(Vec::new()));
  }

  let foods = store
    .search_foods(&FoodQuery::new(text.trim()))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(foods))
}

/// `POST /foods`: returns 201 + the stored [`Food`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  current: CurrentUser,
  JsonBody(input): JsonBody<FoodInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: NutritionStore + 'static,
{
  let new_food = input
    .validate(Some(current.user.user_id))
    .map_err(ApiError::Validation)?;

  let food = store.create_food(new_food).await.map_err(ApiError::from_store)?;

  tracing::info!(food_id = %food.food_id, name = %food.name, "food created");
  Ok((StatusCode::CREATED, Json(food)))
}

/// `GET /foods/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  _current: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Food>, ApiError>
where
  S: NutritionStore + 'static,
{
  let food = store
    .get_food(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("food {id} not found")))?;
  Ok(Json(food))
}
