//! Core types and computations for Calorice.
//!
//! Metabolism estimates and calorie resolution are pure functions over plain
//! values. This crate is deliberately free of HTTP and database dependencies;
//! the store abstraction lives here so every other crate can depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod entry;
pub mod error;
pub mod food;
pub mod metabolism;
pub mod nutrition;
pub mod rounding;
pub mod store;
pub mod summary;
pub mod user;
pub mod validate;

pub use error::{Error, Result};

/// Parse a label of a closed enumeration, naming the enumeration in the
/// error.
pub fn parse_label<T: std::str::FromStr>(kind: &'static str, label: &str) -> Result<T> {
  label
    .parse()
    .map_err(|_| Error::UnknownLabel { kind, label: label.to_owned() })
}
