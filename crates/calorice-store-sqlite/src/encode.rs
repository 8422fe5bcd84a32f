//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that string order
//! is time order. Enum labels are stored as their serde names, the macro
//! snapshot as compact JSON, UUIDs as hyphenated lowercase strings.

use calorice_core::{
  entry::MealEntry,
  food::Food,
  nutrition::{FoodReference, MacroSnapshot, Unit},
  parse_label,
  user::{ProfileDraft, Session, User},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── Labels ───────────────────────────────────────────────────────────────────

fn decode_opt_label<T: std::str::FromStr>(
  kind: &'static str,
  s: Option<String>,
) -> Result<Option<T>> {
  Ok(s.as_deref().map(|l| parse_label(kind, l)).transpose()?)
}

pub fn decode_unit(s: &str) -> Result<Unit> { Ok(parse_label("unit", s)?) }

// ─── MacroSnapshot ────────────────────────────────────────────────────────────

pub fn encode_macros(m: Option<&MacroSnapshot>) -> Result<Option<String>> {
  Ok(m.map(serde_json::to_string).transpose()?)
}

pub fn decode_macros(s: Option<&str>) -> Result<Option<MacroSnapshot>> {
  Ok(s.map(serde_json::from_str).transpose()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for a user, in order.
pub const USER_COLUMNS: &str = "user_id, email, created_at, sex, age, weight_kg, height_cm, \
                                activity_level, goal";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:        String,
  pub email:          String,
  pub created_at:     String,
  pub sex:            Option<String>,
  pub age:            Option<i64>,
  pub weight_kg:      Option<f64>,
  pub height_cm:      Option<f64>,
  pub activity_level: Option<String>,
  pub goal:           Option<String>,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:        row.get(0)?,
      email:          row.get(1)?,
      created_at:     row.get(2)?,
      sex:            row.get(3)?,
      age:            row.get(4)?,
      weight_kg:      row.get(5)?,
      height_cm:      row.get(6)?,
      activity_level: row.get(7)?,
      goal:           row.get(8)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    let age = self
      .age
      .map(|a| u32::try_from(a).map_err(|_| Error::Decode(format!("bad age {a}"))))
      .transpose()?;

    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
      profile:    ProfileDraft {
        sex: decode_opt_label("sex", self.sex)?,
        age,
        weight_kg: self.weight_kg,
        height_cm: self.height_cm,
        activity_level: decode_opt_label("activity level", self.activity_level)?,
        goal: decode_opt_label("goal", self.goal)?,
      },
    })
  }
}

/// Columns selected for a food, in order. Prefix with a table alias where
/// needed.
pub const FOOD_COLUMNS: [&str; 19] = [
  "food_id",
  "name",
  "brands",
  "barcode",
  "serving_unit",
  "serving_size",
  "calories_per_100g",
  "calories_per_portion",
  "fat_per_100g",
  "carbs_per_100g",
  "protein_per_100g",
  "fat_per_portion",
  "carbs_per_portion",
  "protein_per_portion",
  "saturated_fat_per_100g",
  "sugar_per_100g",
  "fiber_per_100g",
  "created_by",
  "created_at",
];

/// `FOOD_COLUMNS` joined for a SELECT list, each prefixed with `alias.`.
pub fn food_select_list(alias: &str) -> String {
  FOOD_COLUMNS
    .iter()
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// Raw values read directly from a `foods` row.
pub struct RawFood {
  pub food_id:                String,
  pub name:                   String,
  pub brands:                 Option<String>,
  pub barcode:                Option<String>,
  pub serving_unit:           String,
  pub nutrition:              FoodReference,
  pub saturated_fat_per_100g: Option<f64>,
  pub sugar_per_100g:         Option<f64>,
  pub fiber_per_100g:         Option<f64>,
  pub created_by:             Option<String>,
  pub created_at:             String,
}

impl RawFood {
  /// Read the food columns starting at column index `at`.
  pub fn from_row(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      food_id:                row.get(at)?,
      name:                   row.get(at + 1)?,
      brands:                 row.get(at + 2)?,
      barcode:                row.get(at + 3)?,
      serving_unit:           row.get(at + 4)?,
      nutrition:              FoodReference {
        serving_size:         row.get(at + 5)?,
        calories_per_100g:    row.get(at + 6)?,
        calories_per_portion: row.get(at + 7)?,
        fat_per_100g:         row.get(at + 8)?,
        carbs_per_100g:       row.get(at + 9)?,
        protein_per_100g:     row.get(at + 10)?,
        fat_per_portion:      row.get(at + 11)?,
        carbs_per_portion:    row.get(at + 12)?,
        protein_per_portion:  row.get(at + 13)?,
      },
      saturated_fat_per_100g: row.get(at + 14)?,
      sugar_per_100g:         row.get(at + 15)?,
      fiber_per_100g:         row.get(at + 16)?,
      created_by:             row.get(at + 17)?,
      created_at:             row.get(at + 18)?,
    })
  }

  pub fn into_food(self) -> Result<Food> {
    Ok(Food {
      food_id:                decode_uuid(&self.food_id)?,
      name:                   self.name,
      brands:                 self.brands,
      barcode:                self.barcode,
      serving_unit:           decode_unit(&self.serving_unit)?,
      nutrition:              self.nutrition,
      saturated_fat_per_100g: self.saturated_fat_per_100g,
      sugar_per_100g:         self.sugar_per_100g,
      fiber_per_100g:         self.fiber_per_100g,
      created_by:             self.created_by.as_deref().map(decode_uuid).transpose()?,
      created_at:             decode_dt(&self.created_at)?,
    })
  }
}

/// Columns selected for a meal entry, in order.
pub const ENTRY_COLUMNS: [&str; 9] = [
  "entry_id",
  "user_id",
  "food_id",
  "eaten_at",
  "amount",
  "unit",
  "calories",
  "macros_json",
  "created_at",
];

/// Raw values read directly from a `meal_entries` row.
pub struct RawEntry {
  pub entry_id:    String,
  pub user_id:     String,
  pub food_id:     String,
  pub eaten_at:    String,
  pub amount:      f64,
  pub unit:        String,
  pub calories:    f64,
  pub macros_json: Option<String>,
  pub created_at:  String,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:    row.get(0)?,
      user_id:     row.get(1)?,
      food_id:     row.get(2)?,
      eaten_at:    row.get(3)?,
      amount:      row.get(4)?,
      unit:        row.get(5)?,
      calories:    row.get(6)?,
      macros_json: row.get(7)?,
      created_at:  row.get(8)?,
    })
  }

  pub fn into_entry(self) -> Result<MealEntry> {
    Ok(MealEntry {
      entry_id:   decode_uuid(&self.entry_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      food_id:    decode_uuid(&self.food_id)?,
      eaten_at:   decode_dt(&self.eaten_at)?,
      amount:     self.amount,
      unit:       decode_unit(&self.unit)?,
      calories:   self.calories,
      macros:     decode_macros(self.macros_json.as_deref())?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      user_id:    decode_uuid(&self.user_id)?,
      token_hash: self.token_hash,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}
