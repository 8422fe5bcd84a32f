//! Calorie and macro-nutrient resolution for a single consumption event.
//!
//! Foods carry nutrition values in up to two encodings: per 100 g (or 100 ml)
//! and per manufacturer portion. Either may be missing. The serving size
//! bridges the two encodings for calories; macros are only ever read from the
//! encoding that matches the logging unit.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

// ─── Units ───────────────────────────────────────────────────────────────────

/// The unit a quantity is expressed in. Also used as a food's serving unit.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
  /// Grams.
  #[default]
  G,
  /// Millilitres.
  Ml,
  /// Number of manufacturer-declared portions.
  Portion,
}

impl Unit {
  /// `g` and `ml` are logged against the per-100 encoding.
  pub fn is_per_100(self) -> bool { matches!(self, Self::G | Self::Ml) }
}

/// The macro-nutrients tracked per food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Macro {
  Fat,
  Carbs,
  Protein,
}

// ─── Reference data ──────────────────────────────────────────────────────────

/// The nutrition reference values of a food. Every field is independently
/// optional: user-entered foods are routinely incomplete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodReference {
  pub calories_per_100g:    Option<f64>,
  pub calories_per_portion: Option<f64>,
  /// Mass or volume of one portion, in the food's serving unit.
  pub serving_size:         Option<f64>,

  pub fat_per_100g:         Option<f64>,
  pub carbs_per_100g:       Option<f64>,
  pub protein_per_100g:     Option<f64>,

  pub fat_per_portion:      Option<f64>,
  pub carbs_per_portion:    Option<f64>,
  pub protein_per_portion:  Option<f64>,
}

impl FoodReference {
  /// The serving size, only if it can safely be divided by.
  fn usable_serving_size(&self) -> Option<f64> {
    self.serving_size.filter(|s| *s > 0.0)
  }

  fn macro_per_100g(&self, m: Macro) -> Option<f64> {
    match m {
      Macro::Fat => self.fat_per_100g,
      Macro::Carbs => self.carbs_per_100g,
      Macro::Protein => self.protein_per_100g,
    }
  }

  fn macro_per_portion(&self, m: Macro) -> Option<f64> {
    match m {
      Macro::Fat => self.fat_per_portion,
      Macro::Carbs => self.carbs_per_portion,
      Macro::Protein => self.protein_per_portion,
    }
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Calories in `amount` of `unit` of a food.
///
/// Returns `None` when the reference data cannot support the computation.
/// `Some(0.0)` is a real answer (water), `None` means "unknown".
///
/// The caller must reject non-positive amounts before calling.
pub fn resolve_calories(
  reference: &FoodReference,
  unit: Unit,
  amount: f64,
) -> Option<f64> {
  match unit {
    Unit::Portion => {
      if let Some(per_portion) = reference.calories_per_portion {
        return Some(per_portion * amount);
      }
      let per_100 = reference.calories_per_100g?;
      let serving = reference.usable_serving_size()?;
      Some(per_100 * serving * amount / 100.0)
    }
    Unit::G | Unit::Ml => {
      if let Some(per_100) = reference.calories_per_100g {
        return Some(per_100 * amount / 100.0);
      }
      let per_portion = reference.calories_per_portion?;
      let serving = reference.usable_serving_size()?;
      let per_100 = per_portion * 100.0 / serving;
      Some(per_100 * amount / 100.0)
    }
  }
}

/// Grams of one macro-nutrient in `amount` of `unit` of a food.
///
/// Unlike [`resolve_calories`] this never converts between encodings: portion
/// logging reads only the per-portion value, g/ml logging reads only the
/// per-100 value.
pub fn resolve_macro(
  reference: &FoodReference,
  nutrient: Macro,
  unit: Unit,
  amount: f64,
) -> Option<f64> {
  if unit.is_per_100() {
    reference
      .macro_per_100g(nutrient)
      .map(|per_100| per_100 * amount / 100.0)
  } else {
    reference
      .macro_per_portion(nutrient)
      .map(|per_portion| per_portion * amount)
  }
}

/// The macros of a logged entry, frozen at logging time so later edits to the
/// food do not rewrite history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSnapshot {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub fat:     Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub carbs:   Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub protein: Option<f64>,
}

impl MacroSnapshot {
  /// Resolve all three macros. `None` if none of them resolves.
  pub fn resolve(reference: &FoodReference, unit: Unit, amount: f64) -> Option<Self> {
    let snapshot = Self {
      fat:     resolve_macro(reference, Macro::Fat, unit, amount),
      carbs:   resolve_macro(reference, Macro::Carbs, unit, amount),
      protein: resolve_macro(reference, Macro::Protein, unit, amount),
    };
    (!snapshot.is_empty()).then_some(snapshot)
  }

  pub fn is_empty(&self) -> bool {
    self.fat.is_none() && self.carbs.is_none() && self.protein.is_none()
  }
}
