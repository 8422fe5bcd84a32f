//! Error types for `calorice-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("food not found: {0}")]
  FoodNotFound(Uuid),

  #[error("meal entry not found: {0}")]
  EntryNotFound(Uuid),

  #[error("a food with barcode {0:?} already exists")]
  DuplicateBarcode(String),

  /// A stored or submitted label that is outside a closed enumeration
  /// (sex, activity level, goal, unit).
  #[error("unknown {kind} label: {label:?}")]
  UnknownLabel { kind: &'static str, label: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
