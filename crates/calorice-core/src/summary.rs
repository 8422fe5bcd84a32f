//! The daily dashboard summary.

use serde::{Deserialize, Serialize};

use crate::{entry::MealEntry, rounding::round_kcal};

/// Calories still available today. Never negative: once intake exceeds the
/// target the remainder is shown as zero.
pub fn remaining_calories(target: f64, consumed: f64) -> f64 {
  (target - consumed).max(0.0)
}

/// Summed macros over a set of entries. Entries without a snapshot, or
/// without a particular macro, contribute nothing to that total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
  pub fat:     f64,
  pub carbs:   f64,
  pub protein: f64,
}

/// What the dashboard shows for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
  pub consumed:    f64,
  /// `None` when the profile is incomplete.
  pub target:      Option<f64>,
  pub remaining:   Option<f64>,
  pub entry_count: usize,
  pub macros:      MacroTotals,
}

impl DailySummary {
  /// Summarise `entries` against an already-rounded `target`.
  pub fn compute(entries: &[MealEntry], target: Option<f64>) -> Self {
    let consumed: f64 = entries.iter().map(|e| e.calories).sum();

    let macros = entries
      .iter()
      .filter_map(|e| e.macros)
      .fold(MacroTotals::default(), |acc, m| MacroTotals {
        fat:     acc.fat + m.fat.unwrap_or(0.0),
        carbs:   acc.carbs + m.carbs.unwrap_or(0.0),
        protein: acc.protein + m.protein.unwrap_or(0.0),
      });

    Self {
      consumed: round_kcal(consumed),
      target,
      remaining: target.map(|t| round_kcal(remaining_calories(t, consumed))),
      entry_count: entries.len(),
      macros,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::nutrition::{MacroSnapshot, Unit};

  fn entry(calories: f64, macros: Option<MacroSnapshot>) -> MealEntry {
    MealEntry {
      entry_id: Uuid::new_v4(),
      user_id: Uuid::nil(),
      food_id: Uuid::nil(),
      eaten_at: Utc::now(),
      amount: 100.0,
      unit: Unit::G,
      calories,
      macros,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn remaining_is_clamped_at_zero() {
    assert_eq!(remaining_calories(2000.0, 1500.0), 500.0);
    assert_eq!(remaining_calories(2000.0, 2600.0), 0.0);
  }

  #[test]
  fn sums_calories_and_rounds_for_display() {
    let entries = [entry(120.4, None), entry(310.3, None)];
    let s = DailySummary::compute(&entries, Some(2000.0));
    assert_eq!(s.consumed, 431.0);
    // 2000 - 430.7
    assert_eq!(s.remaining, Some(1569.0));
    assert_eq!(s.entry_count, 2);
  }

  #[test]
  fn no_target_means_no_remaining() {
    let s = DailySummary::compute(&[entry(500.0, None)], None);
    assert_eq!(s.target, None);
    assert_eq!(s.remaining, None);
  }

  #[test]
  fn over_target_shows_zero_remaining() {
    let s = DailySummary::compute(&[entry(2500.0, None)], Some(1800.0));
    assert_eq!(s.remaining, Some(0.0));
  }

  #[test]
  fn macro_totals_skip_missing_values() {
    let entries = [
      entry(100.0, Some(MacroSnapshot { fat: Some(2.0), carbs: None, protein: Some(5.0) })),
      entry(100.0, None),
      entry(100.0, Some(MacroSnapshot { fat: Some(1.5), carbs: Some(20.0), protein: None })),
    ];
    let s = DailySummary::compute(&entries, None);
    assert_eq!(s.macros, MacroTotals { fat: 3.5, carbs: 20.0, protein: 5.0 });
  }

  #[test]
  fn empty_day() {
    let s = DailySummary::compute(&[], Some(2100.0));
    assert_eq!(s.consumed, 0.0);
    assert_eq!(s.remaining, Some(2100.0));
  }
}
