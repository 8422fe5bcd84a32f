//! The shared food catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  nutrition::{FoodReference, Unit},
  validate::{FieldError, Violations, non_blank},
};

// ─── Food ────────────────────────────────────────────────────────────────────

/// A catalog food. Foods are shared between users; `created_by` is cleared
/// when the creating account is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
  pub food_id:                Uuid,
  pub name:                   String,
  pub brands:                 Option<String>,
  pub barcode:                Option<String>,
  pub serving_unit:           Unit,
  #[serde(flatten)]
  pub nutrition:              FoodReference,
  pub saturated_fat_per_100g: Option<f64>,
  pub sugar_per_100g:         Option<f64>,
  pub fiber_per_100g:         Option<f64>,
  pub created_by:             Option<Uuid>,
  pub created_at:             DateTime<Utc>,
}

/// Input to [`crate::store::NutritionStore::create_food`]. Already validated.
#[derive(Debug, Clone, Default)]
pub struct NewFood {
  pub name:                   String,
  pub brands:                 Option<String>,
  pub barcode:                Option<String>,
  pub serving_unit:           Unit,
  pub nutrition:              FoodReference,
  pub saturated_fat_per_100g: Option<f64>,
  pub sugar_per_100g:         Option<f64>,
  pub fiber_per_100g:         Option<f64>,
  pub created_by:             Option<Uuid>,
}

// ─── Creation form ───────────────────────────────────────────────────────────

/// A submitted food-creation form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodInput {
  pub name:                   String,
  pub brands:                 Option<String>,
  pub barcode:                Option<String>,
  pub serving_unit:           Option<Unit>,
  #[serde(flatten)]
  pub nutrition:              FoodReference,
  pub saturated_fat_per_100g: Option<f64>,
  pub sugar_per_100g:         Option<f64>,
  pub fiber_per_100g:         Option<f64>,
}

impl FoodInput {
  /// Validate and normalise into a [`NewFood`] attributed to `created_by`.
  pub fn validate(&self, created_by: Option<Uuid>) -> Result<NewFood, Vec<FieldError>> {
    let mut v = Violations::new();

    let name = self.name.trim().to_owned();
    v.check(name.chars().count() >= 2, "name", "Name is too short.");

    let brands = non_blank(self.brands.as_deref());
    let barcode = non_blank(self.barcode.as_deref());
    if let Some(code) = &barcode {
      v.check(code.chars().count() >= 6, "barcode", "Barcode is too short.");
    }

    if let Some(size) = self.nutrition.serving_size {
      v.check(
        size.is_finite() && size > 0.0,
        "servingSize",
        "Serving size must be positive.",
      );
    }

    let n = &self.nutrition;
    let amounts = [
      ("caloriesPer100g", n.calories_per_100g),
      ("caloriesPerPortion", n.calories_per_portion),
      ("fatPer100g", n.fat_per_100g),
      ("carbsPer100g", n.carbs_per_100g),
      ("proteinPer100g", n.protein_per_100g),
      ("fatPerPortion", n.fat_per_portion),
      ("carbsPerPortion", n.carbs_per_portion),
      ("proteinPerPortion", n.protein_per_portion),
      ("saturatedFatPer100g", self.saturated_fat_per_100g),
      ("sugarPer100g", self.sugar_per_100g),
      ("fiberPer100g", self.fiber_per_100g),
    ];
    for (field, value) in amounts {
      if let Some(value) = value {
        v.check(value.is_finite() && value >= 0.0, field, "Must be a non-negative number.");
      }
    }

    v.finish(NewFood {
      name,
      brands,
      barcode,
      serving_unit: self.serving_unit.unwrap_or_default(),
      nutrition: self.nutrition,
      saturated_fat_per_100g: self.saturated_fat_per_100g,
      sugar_per_100g: self.sugar_per_100g,
      fiber_per_100g: self.fiber_per_100g,
      created_by,
    })
  }
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Default and maximum number of search hits.
pub const SEARCH_LIMIT: usize = 10;

/// Parameters for [`crate::store::NutritionStore::search_foods`].
#[derive(Debug, Clone, Default)]
pub struct FoodQuery {
  /// Case-insensitive substring matched against name, brands and barcode.
  pub text:  String,
  pub limit: Option<usize>,
}

impl FoodQuery {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), limit: None }
  }

  pub fn effective_limit(&self) -> usize {
    self.limit.unwrap_or(SEARCH_LIMIT).min(SEARCH_LIMIT)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input() -> FoodInput {
    FoodInput {
      name: "  Greek yoghurt ".into(),
      brands: Some("  ".into()),
      barcode: Some("3033490004521".into()),
      nutrition: FoodReference {
        calories_per_100g: Some(97.0),
        serving_size: Some(125.0),
        ..Default::default()
      },
      ..Default::default()
    }
  }

  #[test]
  fn normalizes_text_fields() {
    let food = input().validate(None).unwrap();
    assert_eq!(food.name, "Greek yoghurt");
    assert_eq!(food.brands, None);
    assert_eq!(food.serving_unit, Unit::G);
  }

  #[test]
  fn rejects_short_name_and_barcode() {
    let bad = FoodInput { name: " x ".into(), barcode: Some("123".into()), ..input() };
    let errors = bad.validate(None).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
    assert_eq!(fields, ["name", "barcode"]);
  }

  #[test]
  fn rejects_negative_nutrition_and_zero_serving() {
    let mut bad = input();
    bad.nutrition.serving_size = Some(0.0);
    bad.nutrition.fat_per_portion = Some(-2.0);
    let errors = bad.validate(None).unwrap_err();
    let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
    assert_eq!(fields, ["servingSize", "fatPerPortion"]);
  }

  #[test]
  fn deserializes_flat_camel_case_body() {
    let body = r#"{"name":"Apple","servingUnit":"portion","caloriesPerPortion":80,
      "servingSize":150}"#;
    let parsed: FoodInput = serde_json::from_str(body).unwrap();
    assert_eq!(parsed.serving_unit, Some(Unit::Portion));
    assert_eq!(parsed.nutrition.calories_per_portion, Some(80.0));
    assert_eq!(parsed.nutrition.serving_size, Some(150.0));
  }

  #[test]
  fn search_limit_is_capped() {
    let q = FoodQuery { text: "a".into(), limit: Some(500) };
    assert_eq!(q.effective_limit(), SEARCH_LIMIT);
    assert_eq!(FoodQuery::new("a").effective_limit(), SEARCH_LIMIT);
  }
}
