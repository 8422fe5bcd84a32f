//! Metabolic estimates: BMR, TDEE and the daily calorie target.
//!
//! BMR uses the Mifflin-St Jeor equation. TDEE scales BMR by an activity
//! multiplier and the target scales TDEE by a goal multiplier. Everything in
//! this module is pure: the caller loads and validates the profile, then
//! passes plain values in.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::rounding::round_kcal;

// ─── Closed enumerations ─────────────────────────────────────────────────────

/// Biological sex as used by the BMR equation. There is deliberately no third
/// variant: any other label is rejected when parsed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
  Male,
  Female,
}

/// Self-reported activity level.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
  Sedentary,
  Light,
  Moderate,
  Active,
  VeryActive,
}

/// What the user wants their intake to achieve.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Goal {
  LoseWeight,
  Maintain,
  GainWeight,
  Recomp,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A complete physiological profile. Only constructed once every field has
/// been checked, see [`crate::user::ProfileDraft::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub sex:            Sex,
  pub age:            u32,
  pub weight_kg:      f64,
  pub height_cm:      f64,
  pub activity_level: ActivityLevel,
  pub goal:           Goal,
}

/// The three calorie figures plus the multipliers that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetabolismResult {
  pub bmr:             f64,
  pub tdee:            f64,
  pub target:          f64,
  /// Unrounded.
  pub activity_factor: f64,
  /// Unrounded.
  pub goal_factor:     f64,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Basal metabolic rate in kcal/day, unrounded.
///
/// `10 * weight + 6.25 * height - 5 * age`, then `+5` for men and `-161` for
/// women.
pub fn compute_bmr(sex: Sex, weight_kg: f64, height_cm: f64, age: u32) -> f64 {
  let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);
  let adjustment = match sex {
    Sex::Male => 5.0,
    Sex::Female => -161.0,
  };
  base + adjustment
}

/// TDEE multiplier for an activity level.
///
/// The match is exhaustive: labels outside the five levels never get this
/// far, they fail to parse into [`ActivityLevel`].
pub fn activity_factor(level: ActivityLevel) -> f64 {
  match level {
    ActivityLevel::Sedentary => 1.2,
    ActivityLevel::Light => 1.375,
    ActivityLevel::Moderate => 1.55,
    ActivityLevel::Active => 1.725,
    ActivityLevel::VeryActive => 1.9,
  }
}

/// Target multiplier for a goal.
pub fn goal_factor(goal: Goal) -> f64 {
  match goal {
    // ~15% deficit
    Goal::LoseWeight => 0.85,
    // ~15% surplus
    Goal::GainWeight => 1.15,
    // mild deficit
    Goal::Recomp => 0.95,
    Goal::Maintain => 1.0,
  }
}

/// BMR, TDEE and target for a profile. Never fails.
pub fn compute_target(profile: &Profile) -> MetabolismResult {
  let bmr = compute_bmr(
    profile.sex,
    profile.weight_kg,
    profile.height_cm,
    profile.age,
  );
  let af = activity_factor(profile.activity_level);
  let tdee = bmr * af;
  let gf = goal_factor(profile.goal);
  let target = tdee * gf;

  MetabolismResult {
    bmr:             round_kcal(bmr),
    tdee:            round_kcal(tdee),
    target:          round_kcal(target),
    activity_factor: af,
    goal_factor:     gf,
  }
}
