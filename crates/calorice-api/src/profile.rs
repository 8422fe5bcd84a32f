//! Handlers for the signed-in user's account and metabolism figures.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Current user with its (possibly partial) profile |
//! | `PUT`  | `/profile` | Body: [`ProfileInput`]; 400 with per-field errors |
//! | `GET`  | `/metabolism` | BMR, TDEE and target; 400 if the profile is incomplete |

use std::sync::Arc;

use axum::{Json, extract::State};
use calorice_core::{
  metabolism::{MetabolismResult, Profile, compute_target},
  store::NutritionStore,
  user::{ProfileInput, User},
};
use serde::Serialize;

use crate::{error::ApiError, extract::JsonBody, session::CurrentUser};

/// `GET /me`
pub async fn me<S>(current: CurrentUser) -> Json<User>
where
  S: NutritionStore + 'static,
{
  Json(current.user)
}

/// `PUT /profile`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  current: CurrentUser,
  JsonBody(input): JsonBody<ProfileInput>,
) -> Result<Json<User>, ApiError>
where
  S: NutritionStore + 'static,
{
  let profile = input.validate().map_err(ApiError::Validation)?;

  let user = store
    .update_profile(current.user.user_id, profile)
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %user.user_id, "profile updated");
  Ok(Json(user))
}

#[derive(Debug, Serialize)]
pub struct MetabolismResponse {
  pub profile: Profile,
  pub results: MetabolismResult,
}

/// `GET /metabolism`
pub async fn metabolism<S>(current: CurrentUser) -> Result<Json<MetabolismResponse>, ApiError>
where
  S: NutritionStore + 'static,
{
  let profile = current
    .user
    .profile
    .complete()
    .map_err(ApiError::IncompleteProfile)?;

  Ok(Json(MetabolismResponse { profile, results: compute_target(&profile) }))
}
