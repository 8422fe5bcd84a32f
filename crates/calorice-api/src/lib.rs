//! JSON REST API for Calorice.
//!
//! Exposes an axum [`Router`] backed by any
//! [`calorice_core::store::NutritionStore`]. Every route requires a session
//! (see [`session::CurrentUser`]); issuing sessions is the caller's concern.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", calorice_api::api_router(store.clone()))
//! ```

pub mod account;
pub mod entries;
pub mod error;
pub mod extract;
pub mod foods;
pub mod profile;
pub mod session;
pub mod summary;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use calorice_core::store::NutritionStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: NutritionStore + 'static,
{
  Router::new()
    // Account
    .route("/me", get(profile::me::<S>))
    .route("/profile", put(profile::update::<S>))
    .route("/metabolism", get(profile::metabolism::<S>))
    .route("/account", delete(account::delete::<S>))
    // Catalog
    .route("/foods", post(foods::create::<S>))
    .route("/foods/search", get(foods::search::<S>))
    .route("/foods/{id}", get(foods::get_one::<S>))
    // Journal
    .route("/entries", get(entries::list::<S>).post(entries::create::<S>))
    .route("/entries/{id}", delete(entries::delete_one::<S>))
    .route("/summary", get(summary::handler::<S>))
    .with_state(store)
}
