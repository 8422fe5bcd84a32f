//! The `NutritionStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `calorice-store-sqlite`). The HTTP layers depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  entry::{EntryQuery, EntryWithFood, MealEntry, NewMealEntry},
  food::{Food, FoodQuery, NewFood},
  metabolism::Profile,
  user::{Session, User},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Backend errors must expose the domain error they carry, if any, so that
/// callers can tell a duplicate barcode from a broken disk.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Calorice store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait NutritionStore: Send + Sync {
  type Error: StoreError;

  /// Cheap round-trip used by the health check.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Return the user with `email`, creating an account with an empty
  /// profile if none exists. `email` must already be normalised.
  fn upsert_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  /// Retrieve a user by UUID. Returns `None` if not found.
  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Replace the user's profile and return the updated user.
  ///
  /// Fails with [`crate::Error::UserNotFound`] if the user is gone.
  fn update_profile(
    &self,
    user_id: Uuid,
    profile: Profile,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Delete an account: foods it created are kept but detached, its entries,
  /// sessions and pending sign-in tokens are removed. Returns `false` if the
  /// user did not exist.
  fn delete_account(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Sign-in ───────────────────────────────────────────────────────────

  /// Persist the digest of a single-use sign-in token for `email`.
  /// Tokens that have already expired are removed on the way.
  fn store_verification_token(
    &self,
    email: String,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Drop a token that was never delivered.
  fn discard_verification_token(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Atomically remove the token with `token_hash` and return its email.
  ///
  /// Returns `None` if no such token exists or it expired before `now`.
  /// Either way the token can never be used again.
  fn consume_verification_token(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Open a session. Sessions that have already expired are removed.
  fn create_session(
    &self,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Look up an unexpired session by token digest.
  fn find_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Foods ─────────────────────────────────────────────────────────────

  /// Persist a food. Fails with [`crate::Error::DuplicateBarcode`] when
  /// another food already carries the same barcode.
  fn create_food(
    &self,
    input: NewFood,
  ) -> impl Future<Output = Result<Food, Self::Error>> + Send + '_;

  fn get_food(
    &self,
    food_id: Uuid,
  ) -> impl Future<Output = Result<Option<Food>, Self::Error>> + Send + '_;

  /// Foods whose name, brands or barcode contain the query text,
  /// case-insensitively, ordered by name.
  fn search_foods<'a>(
    &'a self,
    query: &'a FoodQuery,
  ) -> impl Future<Output = Result<Vec<Food>, Self::Error>> + Send + 'a;

  // ── Meal entries ──────────────────────────────────────────────────────

  fn record_entry(
    &self,
    input: NewMealEntry,
  ) -> impl Future<Output = Result<MealEntry, Self::Error>> + Send + '_;

  /// A user's entries within `query`, newest first.
  fn list_entries(
    &self,
    user_id: Uuid,
    query: EntryQuery,
  ) -> impl Future<Output = Result<Vec<EntryWithFood>, Self::Error>> + Send + '_;

  /// Delete an entry owned by `user_id`. Returns `false` if there is no such
  /// entry or it belongs to someone else.
  fn delete_entry(
    &self,
    user_id: Uuid,
    entry_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
