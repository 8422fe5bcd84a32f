//! Handler for `DELETE /account`.

use std::sync::Arc;

use axum::{
  extract::State,
  http::{StatusCode, header},
  response::IntoResponse,
};
use calorice_core::{store::NutritionStore, user::confirms_account_deletion};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::JsonBody,
  session::{CurrentUser, clear_session_cookie},
};

#[derive(Debug, Deserialize)]
pub struct DeleteAccountBody {
  /// The confirmation phrase typed by the user.
  pub confirm: String,
}

/// `DELETE /account` with body `{"confirm":"SUPPRIMER"}`.
///
/// Foods the user created stay in the catalog without an owner; everything
/// else tied to the account is removed and the session cookie is cleared.
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  current: CurrentUser,
  JsonBody(body): JsonBody<DeleteAccountBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: NutritionStore + 'static,
{
  if !confirms_account_deletion(&body.confirm) {
    return Err(ApiError::BadRequest(
      "type SUPPRIMER (or DELETE) to confirm account deletion".into(),
    ));
  }

  let user_id = current.user.user_id;
  store.delete_account(user_id).await.map_err(ApiError::from_store)?;

  tracing::info!(%user_id, "account deleted");
  Ok((
    StatusCode::NO_CONTENT,
    [(header::SET_COOKIE, clear_session_cookie())],
  ))
}
