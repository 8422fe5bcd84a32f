//! Session tokens: hashing, transport and the [`CurrentUser`] extractor.
//!
//! A session token travels either in the `calorice_session` cookie or as an
//! `Authorization: Bearer` header. Only its SHA-256 digest is ever stored.

use std::sync::Arc;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use calorice_core::{store::NutritionStore, user::User};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "calorice_session";

/// Hex-encoded SHA-256 digest of a bearer secret.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Find the session token in `headers`, preferring a bearer token over the
/// cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty());
  if bearer.is_some() {
    return bearer;
  }

  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
    .map(|(_, value)| value)
}

/// `Set-Cookie` value carrying a new session token.
pub fn session_cookie(token: &str, ttl: Duration, secure: bool) -> String {
  let mut cookie = format!(
    "{SESSION_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
    ttl.num_seconds()
  );
  if secure {
    cookie.push_str("; Secure");
  }
  cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> String {
  format!("{SESSION_COOKIE}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax")
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The signed-in user. Present in a handler means the request carried a
/// live session.
pub struct CurrentUser {
  pub user:       User,
  pub token_hash: String,
}

impl<S> FromRequestParts<Arc<S>> for CurrentUser
where
  S: NutritionStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let token_hash = session_token(&parts.headers)
      .map(hash_token)
      .ok_or(ApiError::Unauthorized)?;

    let session = store
      .find_session(token_hash.clone(), Utc::now())
      .await
      .map_err(ApiError::from_store)?
      .ok_or(ApiError::Unauthorized)?;

    let user = store
      .get_user(session.user_id)
      .await
      .map_err(ApiError::from_store)?
      .ok_or(ApiError::Unauthorized)?;

    Ok(Self { user, token_hash })
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn hash_is_hex_sha256() {
    let h = hash_token("abc");
    assert_eq!(h, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
  }

  #[test]
  fn token_from_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_static("theme=dark; calorice_session=tok123; other=1"),
    );
    assert_eq!(session_token(&headers), Some("tok123"));
  }

  #[test]
  fn bearer_wins_over_cookie() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("calorice_session=cookie"));
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer bearer"));
    assert_eq!(session_token(&headers), Some("bearer"));
  }

  #[test]
  fn no_token_without_headers() {
    let mut headers = HeaderMap::new();
    assert_eq!(session_token(&headers), None);
    headers.insert(header::COOKIE, HeaderValue::from_static("calorice_session="));
    assert_eq!(session_token(&headers), None);
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
    assert_eq!(session_token(&headers), None);
  }

  #[test]
  fn cookie_attributes() {
    let c = session_cookie("t", Duration::hours(1), true);
    assert_eq!(c, "calorice_session=t; Max-Age=3600; Path=/; HttpOnly; SameSite=Lax; Secure");
    assert!(!session_cookie("t", Duration::hours(1), false).contains("Secure"));
    assert!(clear_session_cookie().contains("Max-Age=0"));
  }
}
