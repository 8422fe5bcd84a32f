//! Users, their stored profile, and sign-in sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  metabolism::{ActivityLevel, Goal, Profile, Sex},
  validate::{FieldError, Violations},
};

// ─── User ────────────────────────────────────────────────────────────────────

/// An account, identified by its (lower-cased) email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:    Uuid,
  pub email:      String,
  pub created_at: DateTime<Utc>,
  pub profile:    ProfileDraft,
}

/// Normalise and sanity-check an email address.
///
/// Returns the trimmed, lower-cased address, or `None` if it does not look
/// like `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Option<String> {
  let email = raw.trim().to_lowercase();
  let (local, domain) = email.split_once('@')?;
  let valid = !local.is_empty()
    && !domain.contains('@')
    && domain.contains('.')
    && !domain.starts_with('.')
    && !domain.ends_with('.')
    && !email.chars().any(char::is_whitespace);
  valid.then_some(email)
}

// ─── Profile draft ───────────────────────────────────────────────────────────

/// The profile columns as stored on a user. New accounts start empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
  pub sex:            Option<Sex>,
  pub age:            Option<u32>,
  pub weight_kg:      Option<f64>,
  pub height_cm:      Option<f64>,
  pub activity_level: Option<ActivityLevel>,
  pub goal:           Option<Goal>,
}

/// A profile field that can be reported as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileField {
  Sex,
  Age,
  WeightKg,
  HeightCm,
  ActivityLevel,
  Goal,
}

/// Why a draft could not become a [`Profile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteProfile {
  pub missing: Vec<ProfileField>,
}

impl ProfileDraft {
  /// Promote to a complete [`Profile`], or list every missing field.
  ///
  /// A weight or height that is not strictly positive counts as missing.
  pub fn complete(&self) -> Result<Profile, IncompleteProfile> {
    let weight_kg = self.weight_kg.filter(|w| *w > 0.0);
    let height_cm = self.height_cm.filter(|h| *h > 0.0);

    let mut missing = Vec::new();
    if self.sex.is_none() {
      missing.push(ProfileField::Sex);
    }
    if self.age.is_none() {
      missing.push(ProfileField::Age);
    }
    if weight_kg.is_none() {
      missing.push(ProfileField::WeightKg);
    }
    if height_cm.is_none() {
      missing.push(ProfileField::HeightCm);
    }
    if self.activity_level.is_none() {
      missing.push(ProfileField::ActivityLevel);
    }
    if self.goal.is_none() {
      missing.push(ProfileField::Goal);
    }

    match (self.sex, self.age, weight_kg, height_cm, self.activity_level, self.goal) {
      (Some(sex), Some(age), Some(weight_kg), Some(height_cm), Some(activity_level), Some(goal)) => {
        Ok(Profile { sex, age, weight_kg, height_cm, activity_level, goal })
      }
      _ => Err(IncompleteProfile { missing }),
    }
  }
}

impl From<Profile> for ProfileDraft {
  fn from(p: Profile) -> Self {
    Self {
      sex:            Some(p.sex),
      age:            Some(p.age),
      weight_kg:      Some(p.weight_kg),
      height_cm:      Some(p.height_cm),
      activity_level: Some(p.activity_level),
      goal:           Some(p.goal),
    }
  }
}

// ─── Profile form ────────────────────────────────────────────────────────────

/// A submitted profile form. Numbers arrive as plain JSON numbers and are
/// range-checked by [`ProfileInput::validate`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
  pub sex:            Sex,
  pub age:            f64,
  pub weight_kg:      f64,
  pub height_cm:      f64,
  pub activity_level: ActivityLevel,
  pub goal:           Goal,
}

impl ProfileInput {
  pub fn validate(&self) -> Result<Profile, Vec<FieldError>> {
    let mut v = Violations::new();

    v.check(self.age.fract() == 0.0, "age", "Age must be a whole number.");
    v.check(self.age >= 10.0, "age", "Minimum age is 10 years.");
    v.check(self.age <= 120.0, "age", "Maximum age is 120 years.");

    v.check(
      self.weight_kg.is_finite() && self.weight_kg > 0.0,
      "weightKg",
      "Invalid weight.",
    );
    v.check(self.weight_kg <= 500.0, "weightKg", "Weight is too high.");

    v.check(self.height_cm >= 50.0, "heightCm", "Height is too low.");
    v.check(self.height_cm <= 260.0, "heightCm", "Height is too high.");

    // Only converted once the range check above has passed.
    let age = self.age as u32;

    v.finish(Profile {
      sex: self.sex,
      age,
      weight_kg: self.weight_kg,
      height_cm: self.height_cm,
      activity_level: self.activity_level,
      goal: self.goal,
    })
  }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// A sign-in session. The bearer secret is never stored, only its digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub user_id:    Uuid,
  #[serde(skip_serializing)]
  pub token_hash: String,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

/// Phrases accepted as confirmation for deleting an account.
const DELETE_CONFIRMATIONS: [&str; 2] = ["SUPPRIMER", "DELETE"];

/// Whether `typed` confirms account deletion (trimmed, case-insensitive).
pub fn confirms_account_deletion(typed: &str) -> bool {
  let typed = typed.trim().to_uppercase();
  DELETE_CONFIRMATIONS.contains(&typed.as_str())
}
