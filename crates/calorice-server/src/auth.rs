//! Passwordless sign-in: magic links, the callback that turns one into a
//! session, and logout.

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use calorice_api::{
  extract::{JsonBody, QueryParams},
  session::{clear_session_cookie, hash_token, session_cookie, session_token},
};
use calorice_core::{
  store::NutritionStore,
  user::{User, normalize_email},
};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::Error};

/// A fresh 256-bit bearer secret, URL-safe base64 without padding.
pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

// ─── Magic link ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MagicLinkRequest {
  pub email: String,
}

/// `POST /auth/magic-link` with body `{"email":"..."}`; 202 once mailed.
pub async fn request_link<S>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<MagicLinkRequest>,
) -> Result<StatusCode, Error>
where
  S: NutritionStore + Clone + 'static,
{
  let email = normalize_email(&body.email)
    .ok_or_else(|| Error::BadRequest("invalid email address".into()))?;

  let token      = generate_token();
  let expires_at = Utc::now() + Duration::minutes(state.config.magic_link_ttl_minutes);

  state
    .store
    .store_verification_token(email.clone(), hash_token(&token), expires_at)
    .await
    .map_err(Error::store)?;

  let link = format!(
    "{}/auth/callback?token={token}",
    state.config.base_url.trim_end_matches('/')
  );
  if let Err(e) = state.mailer.send_magic_link(&email, &link).await {
    state
      .store
      .discard_verification_token(hash_token(&token))
      .await
      .map_err(Error::store)?;
    return Err(e.into());
  }

  tracing::info!(%email, "sign-in link issued");
  Ok(StatusCode::ACCEPTED)
}

// ─── Callback ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
  pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
  pub user:          User,
  pub session_token: String,
  pub expires_at:    DateTime<Utc>,
}

/// `GET /auth/callback?token=<token>`
///
/// Consumes the sign-in token, creating the account on first use, and opens
/// a session. The session token is returned in the body and set as a cookie.
pub async fn callback<S>(
  State(state): State<AppState<S>>,
  QueryParams(params): QueryParams<CallbackParams>,
) -> Result<impl IntoResponse, Error>
where
  S: NutritionStore + Clone + 'static,
{
  let token = params
    .token
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)?;

  let now = Utc::now();
  let email = state
    .store
    .consume_verification_token(hash_token(&token), now)
    .await
    .map_err(Error::store)?;
  let Some(email) = email else {
    tracing::warn!("rejected sign-in token");
    return Err(Error::Unauthorized);
  };

  let user = state
    .store
    .upsert_user_by_email(&email)
    .await
    .map_err(Error::store)?;

  let ttl           = Duration::hours(state.config.session_ttl_hours);
  let session_token = generate_token();
  let session       = state
    .store
    .create_session(user.user_id, hash_token(&session_token), now + ttl)
    .await
    .map_err(Error::store)?;

  tracing::info!(user_id = %user.user_id, "signed in");

  let cookie = session_cookie(&session_token, ttl, state.config.cookie_secure);
  Ok((
    [(header::SET_COOKIE, cookie)],
    Json(SignInResponse { user, session_token, expires_at: session.expires_at }),
  ))
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `POST /auth/logout`: always 204; clears the cookie.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<impl IntoResponse, Error>
where
  S: NutritionStore + Clone + 'static,
{
  if let Some(token) = session_token(&headers) {
    state
      .store
      .delete_session(hash_token(token))
      .await
      .map_err(Error::store)?;
    tracing::info!("signed out");
  }
  Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, clear_session_cookie())]))
}
