//! Meal entries: one logged consumption of a catalog food.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  food::Food,
  nutrition::{FoodReference, MacroSnapshot, Unit, resolve_calories},
};

/// A persisted meal entry. Calories and macros are resolved once, at logging
/// time, and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealEntry {
  pub entry_id:   Uuid,
  pub user_id:    Uuid,
  pub food_id:    Uuid,
  pub eaten_at:   DateTime<Utc>,
  pub amount:     f64,
  pub unit:       Unit,
  pub calories:   f64,
  pub macros:     Option<MacroSnapshot>,
  pub created_at: DateTime<Utc>,
}

/// A meal entry together with the food it refers to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWithFood {
  #[serde(flatten)]
  pub entry: MealEntry,
  pub food:  Food,
}

/// Input to [`crate::store::NutritionStore::record_entry`].
#[derive(Debug, Clone)]
pub struct NewMealEntry {
  pub user_id:  Uuid,
  pub food_id:  Uuid,
  pub eaten_at: DateTime<Utc>,
  pub amount:   f64,
  pub unit:     Unit,
  pub calories: f64,
  pub macros:   Option<MacroSnapshot>,
}

impl NewMealEntry {
  /// Resolve calories and macros for `amount` of `unit` of a food.
  ///
  /// Returns `None` when the food's reference data cannot yield a calorie
  /// figure; nothing should be persisted in that case. The amount must
  /// already have been checked to be positive.
  pub fn resolve(
    user_id: Uuid,
    food_id: Uuid,
    reference: &FoodReference,
    unit: Unit,
    amount: f64,
    eaten_at: DateTime<Utc>,
  ) -> Option<Self> {
    let calories = resolve_calories(reference, unit, amount)?;
    Some(Self {
      user_id,
      food_id,
      eaten_at,
      amount,
      unit,
      calories,
      macros: MacroSnapshot::resolve(reference, unit, amount),
    })
  }
}

/// Whether a logged amount may be passed to the resolver.
pub fn is_valid_amount(amount: f64) -> bool { amount.is_finite() && amount > 0.0 }

/// Parameters for [`crate::store::NutritionStore::list_entries`].
/// Bounds are half-open: `from <= eaten_at < until`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryQuery {
  pub from:  Option<DateTime<Utc>>,
  pub until: Option<DateTime<Utc>>,
}

impl EntryQuery {
  /// The 24 hours of `date`, in UTC.
  pub fn day(date: NaiveDate) -> Self {
    let start = date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    let end = date
      .checked_add_days(Days::new(1))
      .and_then(|d| d.and_hms_opt(0, 0, 0))
      .map(|dt| dt.and_utc());
    Self { from: start, until: end }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn resolve_freezes_calories_and_macros() {
    let reference = FoodReference {
      calories_per_portion: Some(150.0),
      protein_per_portion: Some(6.0),
      ..Default::default()
    };
    let entry = NewMealEntry::resolve(
      Uuid::nil(),
      Uuid::nil(),
      &reference,
      Unit::Portion,
      2.0,
      Utc::now(),
    )
    .unwrap();
    assert_eq!(entry.calories, 300.0);
    assert_eq!(entry.macros.unwrap().protein, Some(12.0));
  }

  #[test]
  fn resolve_refuses_undeterminable_food() {
    let entry = NewMealEntry::resolve(
      Uuid::nil(),
      Uuid::nil(),
      &FoodReference::default(),
      Unit::G,
      100.0,
      Utc::now(),
    );
    assert!(entry.is_none());
  }

  #[test]
  fn amount_must_be_positive_and_finite() {
    assert!(is_valid_amount(0.5));
    assert!(!is_valid_amount(0.0));
    assert!(!is_valid_amount(-3.0));
    assert!(!is_valid_amount(f64::NAN));
    assert!(!is_valid_amount(f64::INFINITY));
  }

  #[test]
  fn day_query_spans_midnight_to_midnight() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let q = EntryQuery::day(date);
    assert_eq!(q.from, Some(Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()));
    assert_eq!(q.until, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
  }
}
