//! HTTP server for Calorice.
//!
//! Serves the sign-in routes and the health check itself, and mounts the
//! JSON API from [`calorice_api`] under `/api`.

pub mod auth;
pub mod error;
pub mod mailer;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  extract::State,
  routing::{get, post},
};
use calorice_core::store::NutritionStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use mailer::{Mailer, MailerConfig};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_session_ttl_hours() -> i64 { 24 * 30 }

fn default_magic_link_ttl_minutes() -> i64 { 24 * 60 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `CALORICE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                   String,
  pub port:                   u16,
  /// Public origin used to build sign-in links.
  pub base_url:               String,
  pub store_path:             PathBuf,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours:      i64,
  #[serde(default = "default_magic_link_ttl_minutes")]
  pub magic_link_ttl_minutes: i64,
  /// Add `Secure` to the session cookie. Enable behind HTTPS.
  #[serde(default)]
  pub cookie_secure:          bool,
  #[serde(default)]
  pub mailer:                 MailerConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server's own handlers.
#[derive(Clone)]
pub struct AppState<S: NutritionStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub mailer: Mailer,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: NutritionStore + Clone + 'static,
{
  let api = calorice_api::api_router(state.store.clone());

  Router::new()
    .route("/health",          get(health::<S>))
    .route("/auth/magic-link", post(auth::request_link::<S>))
    .route("/auth/callback",   get(auth::callback::<S>))
    .route("/auth/logout",     post(auth::logout::<S>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

/// `GET /health`: pings the store.
async fn health<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, Error>
where
  S: NutritionStore + Clone + 'static,
{
  state.store.ping().await.map_err(Error::store)?;
  Ok(Json(json!({ "ok": true })))
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use calorice_store_sqlite::SqliteStore;
  use mailer::Outbox;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  async fn make_state() -> (AppState<SqliteStore>, Outbox) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let (mailer, outbox) = Mailer::memory();

    let state = AppState {
      store: Arc::new(store),
      config: Arc::new(ServerConfig {
        host:                   "127.0.0.1".to_string(),
        port:                   8080,
        base_url:               "http://localhost:8080/".to_string(),
        store_path:             PathBuf::from(":memory:"),
        session_ttl_hours:      1,
        magic_link_ttl_minutes: 15,
        cookie_secure:          false,
        mailer:                 MailerConfig::Log,
      }),
      mailer,
    };
    (state, outbox)
  }

  async fn send(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    token:  Option<&str>,
    body:   Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Run the whole magic-link flow for `email`; returns the session token.
  async fn sign_in(state: &AppState<SqliteStore>, outbox: &Outbox, email: &str) -> String {
    let resp = send(state, "POST", "/auth/magic-link", None, Some(json!({ "email": email }))).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let link = outbox.lock().await.last().unwrap().link.clone();
    let path = link.strip_prefix("http://localhost:8080").unwrap();
    let resp = send(state, "GET", path, None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await["sessionToken"].as_str().unwrap().to_owned()
  }

  fn male_profile() -> Value {
    json!({
      "sex": "MALE",
      "age": 25,
      "weightKg": 80,
      "heightCm": 180,
      "activityLevel": "MODERATE",
      "goal": "MAINTAIN",
    })
  }

  // ── Health ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_ok() {
    let (state, _) = make_state().await;
    let resp = send(&state, "GET", "/health", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!({ "ok": true }));
  }

  // ── Sign-in ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn magic_link_rejects_invalid_email() {
    let (state, outbox) = make_state().await;
    let resp = send(&state, "POST", "/auth/magic-link", None, Some(json!({ "email": "nope" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(outbox.lock().await.is_empty());
  }

  #[tokio::test]
  async fn magic_link_flow_creates_session_and_cookie() {
    let (state, outbox) = make_state().await;

    let resp = send(
      &state,
      "POST",
      "/auth/magic-link",
      None,
      Some(json!({ "email": "  Ana@Example.COM " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let sent = outbox.lock().await.last().cloned().unwrap();
    assert_eq!(sent.to, "ana@example.com");
    assert!(sent.link.starts_with("http://localhost:8080/auth/callback?token="));

    let path = sent.link.strip_prefix("http://localhost:8080").unwrap();
    let resp = send(&state, "GET", path, None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_owned();
    assert!(cookie.starts_with("calorice_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let body = json_body(resp).await;
    assert_eq!(body["user"]["email"], "ana@example.com");
    let token = body["sessionToken"].as_str().unwrap();
    assert!(cookie.contains(token));

    // The link is single use.
    let again = send(&state, "GET", path, None, None).await;
    assert_eq!(again.status(), StatusCode::UNAUTHORIZED);

    // The cookie alone authenticates API calls.
    let req = Request::builder()
      .uri("/api/me")
      .header(header::COOKIE, format!("calorice_session={token}"))
      .body(Body::empty())
      .unwrap();
    let resp = router(state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn callback_rejects_unknown_or_missing_token() {
    let (state, _) = make_state().await;
    let resp = send(&state, "GET", "/auth/callback?token=bogus", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = send(&state, "GET", "/auth/callback", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn undelivered_sign_in_link_is_revoked() {
    let (mut state, _) = make_state().await;
    let outbox = Outbox::default();
    state.mailer = Mailer::Rejecting(outbox.clone());

    let resp = send(
      &state,
      "POST",
      "/auth/magic-link",
      None,
      Some(json!({ "email": "ana@example.com" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(resp).await["error"], "could not send sign-in email");

    let link = outbox.lock().await.last().unwrap().link.clone();
    let path = link.strip_prefix("http://localhost:8080").unwrap();
    let resp = send(&state, "GET", path, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn same_email_signs_into_same_account() {
    let (state, outbox) = make_state().await;
    let first  = sign_in(&state, &outbox, "ana@example.com").await;
    let second = sign_in(&state, &outbox, "ANA@example.com").await;

    let a = json_body(send(&state, "GET", "/api/me", Some(&first), None).await).await;
    let b = json_body(send(&state, "GET", "/api/me", Some(&second), None).await).await;
    assert_eq!(a["userId"], b["userId"]);
  }

  #[tokio::test]
  async fn logout_ends_the_session() {
    let (state, outbox) = make_state().await;
    let token = sign_in(&state, &outbox, "ana@example.com").await;

    let resp = send(&state, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));

    let resp = send(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn api_requires_a_session() {
    let (state, _) = make_state().await;
    for (method, uri) in [
      ("GET", "/api/me"),
      ("GET", "/api/summary"),
      ("GET", "/api/foods/search?q=pain"),
    ] {
      let resp = send(&state, method, uri, None, None).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
    let resp = send(&state, "GET", "/api/me", Some("not-a-session"), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Profile and metabolism ──────────────────────────────────────────────────

  #[tokio::test]
  async fn metabolism_requires_a_complete_profile() {
    let (state, outbox) = make_state().await;
    let token = sign_in(&state, &outbox, "ana@example.com").await;

    let resp = send(&state, "GET", "/api/metabolism", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(
      body["missing"],
      json!(["sex", "age", "weightKg", "heightCm", "activityLevel", "goal"])
    );

    let resp = send(&state, "PUT", "/api/profile", Some(&token), Some(male_profile())).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&state, "GET", "/api/metabolism", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["results"]["bmr"].as_f64(), Some(1805.0));
    assert_eq!(body["results"]["tdee"].as_f64(), Some(2798.0));
    assert_eq!(body["results"]["target"].as_f64(), Some(2798.0));
  }

  #[tokio::test]
  async fn profile_validation_reports_fields() {
    let (state, outbox) = make_state().await;
    let token = sign_in(&state, &outbox, "ana@example.com").await;

    let mut profile = male_profile();
    profile["age"] = json!(5);
    profile["heightCm"] = json!(300);
    let resp = send(&state, "PUT", "/api/profile", Some(&token), Some(profile)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = json_body(resp).await;
    let fields: Vec<&str> = body["fields"]
      .as_array()
      .unwrap()
      .iter()
      .map(|f| f["field"].as_str().unwrap())
      .collect();
    assert_eq!(fields, ["age", "heightCm"]);

    let mut profile = male_profile();
    profile["sex"] = json!("OTHER");
    let resp = send(&state, "PUT", "/api/profile", Some(&token), Some(profile)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Foods and entries ───────────────────────────────────────────────────────

  async fn create_food(state: &AppState<SqliteStore>, token: &str, food: Value) -> Response {
    send(state, "POST", "/api/foods", Some(token), Some(food)).await
  }

  #[tokio::test]
  async fn food_creation_search_and_duplicates() {
    let (state, outbox) = make_state().await;
    let token = sign_in(&state, &outbox, "ana@example.com").await;

    let resp = create_food(
      &state,
      &token,
      json!({ "name": "Pain complet", "barcode": "3017620422003", "caloriesPer100g": 250 }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let food = json_body(resp).await;
    assert_eq!(food["servingUnit"], "g");

    let resp = create_food(
      &state,
      &token,
      json!({ "name": "Autre pain", "barcode": "3017620422003" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = create_food(&state, &token, json!({ "name": " x " })).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&state, "GET", "/api/foods/search?q=PAIN", Some(&token), None).await;
    let hits = json_body(resp).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let resp = send(&state, "GET", "/api/foods/search?q=", Some(&token), None).await;
    assert_eq!(json_body(resp).await, json!([]));

    let id = food["foodId"].as_str().unwrap();
    let resp = send(&state, "GET", &format!("/api/foods/{id}"), Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let missing = Uuid::new_v4();
    let resp = send(&state, "GET", &format!("/api/foods/{missing}"), Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn entry_logging_edge_cases() {
    let (state, outbox) = make_state().await;
    let token = sign_in(&state, &outbox, "ana@example.com").await;

    let food = json_body(
      create_food(&state, &token, json!({ "name": "Pain", "caloriesPer100g": 250 })).await,
    )
    .await;
    let food_id = food["foodId"].as_str().unwrap();

    let zero = json!({ "foodId": food_id, "unit": "g", "amount": 0 });
    let resp = send(&state, "POST", "/api/entries", Some(&token), Some(zero)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let unknown = json!({ "foodId": Uuid::new_v4(), "unit": "g", "amount": 100 });
    let resp = send(&state, "POST", "/api/entries", Some(&token), Some(unknown)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // No per-portion data and no serving size: portions cannot be resolved.
    let portion = json!({ "foodId": food_id, "unit": "portion", "amount": 1 });
    let resp = send(&state, "POST", "/api/entries", Some(&token), Some(portion)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(resp).await["error"], "cannot compute calories for this food");

    let ok = json!({ "foodId": food_id, "unit": "g", "amount": 150 });
    let resp = send(&state, "POST", "/api/entries", Some(&token), Some(ok)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let entry = json_body(resp).await;
    assert_eq!(entry["calories"].as_f64(), Some(375.0));
    assert_eq!(entry["food"]["name"], "Pain");

    let resp = send(&state, "GET", "/api/entries", Some(&token), None).await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn entries_can_only_be_deleted_by_their_owner() {
    let (state, outbox) = make_state().await;
    let ana = sign_in(&state, &outbox, "ana@example.com").await;
    let bo  = sign_in(&state, &outbox, "bo@example.com").await;

    let food = json_body(
      create_food(&state, &ana, json!({ "name": "Pain", "caloriesPer100g": 250 })).await,
    )
    .await;
    let entry = json_body(
      send(
        &state,
        "POST",
        "/api/entries",
        Some(&ana),
        Some(json!({ "foodId": food["foodId"], "unit": "g", "amount": 100 })),
      )
      .await,
    )
    .await;
    let uri = format!("/api/entries/{}", entry["entryId"].as_str().unwrap());

    let resp = send(&state, "DELETE", &uri, Some(&bo), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&state, "DELETE", &uri, Some(&ana), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = send(&state, "DELETE", &uri, Some(&ana), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Summary ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn daily_summary_tracks_target_and_remaining() {
    let (state, outbox) = make_state().await;
    let token = sign_in(&state, &outbox, "ana@example.com").await;

    let food = json_body(
      create_food(
        &state,
        &token,
        json!({ "name": "Pain", "caloriesPer100g": 250, "proteinPer100g": 10 }),
      )
      .await,
    )
    .await;
    for eaten_at in ["2024-05-01T08:00:00Z", "2024-05-01T20:00:00Z", "2024-05-02T08:00:00Z"] {
      let entry = json!({ "foodId": food["foodId"], "unit": "g", "amount": 200, "eatenAt": eaten_at });
      let resp = send(&state, "POST", "/api/entries", Some(&token), Some(entry)).await;
      assert_eq!(resp.status(), StatusCode::CREATED);
    }

    // Without a profile there is no target.
    let resp = send(&state, "GET", "/api/summary?date=2024-05-01", Some(&token), None).await;
    let body = json_body(resp).await;
    assert_eq!(body["consumed"].as_f64(), Some(1000.0));
    assert_eq!(body["entryCount"], 2);
    assert!(body["target"].is_null());
    assert!(body["remaining"].is_null());

    send(&state, "PUT", "/api/profile", Some(&token), Some(male_profile())).await;
    let resp = send(&state, "GET", "/api/summary?date=2024-05-01", Some(&token), None).await;
    let body = json_body(resp).await;
    assert_eq!(body["date"], "2024-05-01");
    assert_eq!(body["target"].as_f64(), Some(2798.0));
    assert_eq!(body["remaining"].as_f64(), Some(1798.0));
    assert_eq!(body["macros"]["protein"].as_f64(), Some(40.0));

    let resp = send(&state, "GET", "/api/summary?date=2024-05-02", Some(&token), None).await;
    assert_eq!(json_body(resp).await["entryCount"], 1);

    let resp = send(&state, "GET", "/api/summary?date=yesterday", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Account deletion ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn account_deletion_requires_confirmation_and_keeps_foods() {
    let (state, outbox) = make_state().await;
    let ana = sign_in(&state, &outbox, "ana@example.com").await;
    let bo  = sign_in(&state, &outbox, "bo@example.com").await;

    let food = json_body(
      create_food(&state, &ana, json!({ "name": "Pain", "caloriesPer100g": 250 })).await,
    )
    .await;
    let food_uri = format!("/api/foods/{}", food["foodId"].as_str().unwrap());

    let resp = send(&state, "DELETE", "/api/account", Some(&ana), Some(json!({ "confirm": "oui" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
      &state,
      "DELETE",
      "/api/account",
      Some(&ana),
      Some(json!({ "confirm": " supprimer " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&state, "GET", "/api/me", Some(&ana), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&state, "GET", &food_uri, Some(&bo), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(json_body(resp).await["createdBy"].is_null());
  }
}
