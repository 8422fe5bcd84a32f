//! The SQLite implementation of [`NutritionStore`].

use std::path::Path;

use calorice_core::{
  entry::{EntryQuery, EntryWithFood, MealEntry, NewMealEntry},
  food::{Food, FoodQuery, NewFood},
  metabolism::Profile,
  store::NutritionStore,
  user::{Session, User},
};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, functions::FunctionFlags};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ENTRY_COLUMNS, RawEntry, RawFood, RawSession, RawUser, USER_COLUMNS, decode_dt,
    encode_dt, encode_macros, encode_uuid, food_select_list,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Calorice store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}

/// Install `fold_case(text)`, Unicode lower-casing for search. SQLite's own
/// `LOWER()` only folds ASCII.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    "fold_case",
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: Option<String> = ctx.get(0)?;
      Ok(text.map(|t| t.to_lowercase()))
    },
  )
}

/// Escape `%`, `_` and the escape character itself for a `LIKE … ESCAPE '\'`
/// pattern.
fn escape_like(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── NutritionStore impl ─────────────────────────────────────────────────────

impl NutritionStore for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn upsert_user_by_email(&self, email: &str) -> Result<User> {
    let email  = email.to_owned();
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());

    let raw: RawUser = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, email, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(email) DO NOTHING",
          rusqlite::params![id_str, email, at_str],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
          rusqlite::params![email],
          RawUser::from_row,
        )?)
      })
      .await?;

    raw.into_user()
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    self.user_by_id(user_id).await
  }

  async fn update_profile(&self, user_id: Uuid, profile: Profile) -> Result<User> {
    let id_str   = encode_uuid(user_id);
    let sex      = profile.sex.as_ref().to_owned();
    let activity = profile.activity_level.as_ref().to_owned();
    let goal     = profile.goal.as_ref().to_owned();

    let updated: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users
             SET sex = ?2, age = ?3, weight_kg = ?4, height_cm = ?5,
                 activity_level = ?6, goal = ?7
           WHERE user_id = ?1",
          rusqlite::params![
            id_str,
            sex,
            profile.age,
            profile.weight_kg,
            profile.height_cm,
            activity,
            goal,
          ],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(calorice_core::Error::UserNotFound(user_id).into());
    }

    self
      .user_by_id(user_id)
      .await?
      .ok_or(Error::Core(calorice_core::Error::UserNotFound(user_id)))
  }

  async fn delete_account(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);

    let deleted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE foods SET created_by = NULL WHERE created_by = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM meal_entries WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM sessions WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM verification_tokens
           WHERE email = (SELECT email FROM users WHERE user_id = ?1)",
          rusqlite::params![id_str],
        )?;
        let n = tx.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    if deleted {
      tracing::debug!(%user_id, "account rows removed");
    }
    Ok(deleted)
  }

  // ── Sign-in ───────────────────────────────────────────────────────────────

  async fn store_verification_token(
    &self,
    email:      String,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    let expires_str = encode_dt(expires_at);
    let now_str     = encode_dt(Utc::now());

    let purged: usize = self
      .conn
      .call(move |conn| {
        let purged = conn.execute(
          "DELETE FROM verification_tokens WHERE expires_at <= ?1",
          rusqlite::params![now_str],
        )?;
        conn.execute(
          "INSERT INTO verification_tokens (token_hash, email, expires_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![token_hash, email, expires_str],
        )?;
        Ok(purged)
      })
      .await?;

    if purged > 0 {
      tracing::debug!(purged, "expired sign-in tokens removed");
    }
    Ok(())
  }

  async fn discard_verification_token(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM verification_tokens WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn consume_verification_token(
    &self,
    token_hash: String,
    now:        DateTime<Utc>,
  ) -> Result<Option<String>> {
    let row: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let row: Option<(String, String)> = tx
          .query_row(
            "SELECT email, expires_at FROM verification_tokens WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        if row.is_some() {
          tx.execute(
            "DELETE FROM verification_tokens WHERE token_hash = ?1",
            rusqlite::params![token_hash],
          )?;
        }
        tx.commit()?;
        Ok(row)
      })
      .await?;

    let Some((email, expires_at)) = row else {
      return Ok(None);
    };
    if decode_dt(&expires_at)? <= now {
      return Ok(None);
    }
    Ok(Some(email))
  }

  async fn create_session(
    &self,
    user_id:    Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> Result<Session> {
    let session = Session {
      user_id,
      token_hash,
      created_at: Utc::now(),
      expires_at,
    };

    let hash_str    = session.token_hash.clone();
    let user_str    = encode_uuid(user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    let purged: usize = self
      .conn
      .call(move |conn| {
        let purged = conn.execute(
          "DELETE FROM sessions WHERE expires_at <= ?1",
          rusqlite::params![created_str],
        )?;
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![hash_str, user_str, created_str, expires_str],
        )?;
        Ok(purged)
      })
      .await?;

    if purged > 0 {
      tracing::debug!(purged, "expired sessions removed");
    }

    Ok(session)
  }

  async fn find_session(
    &self,
    token_hash: String,
    now:        DateTime<Utc>,
  ) -> Result<Option<Session>> {
    let now_str = encode_dt(now);

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions
             WHERE token_hash = ?1 AND expires_at > ?2",
            rusqlite::params![token_hash, now_str],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Foods ─────────────────────────────────────────────────────────────────

  async fn create_food(&self, input: NewFood) -> Result<Food> {
    let food = Food {
      food_id:                Uuid::new_v4(),
      name:                   input.name,
      brands:                 input.brands,
      barcode:                input.barcode,
      serving_unit:           input.serving_unit,
      nutrition:              input.nutrition,
      saturated_fat_per_100g: input.saturated_fat_per_100g,
      sugar_per_100g:         input.sugar_per_100g,
      fiber_per_100g:         input.fiber_per_100g,
      created_by:             input.created_by,
      created_at:             Utc::now(),
    };

    let id_str      = encode_uuid(food.food_id);
    let name        = food.name.clone();
    let brands      = food.brands.clone();
    let barcode     = food.barcode.clone();
    let unit_str    = food.serving_unit.as_ref().to_owned();
    let n           = food.nutrition;
    let saturated   = food.saturated_fat_per_100g;
    let sugar       = food.sugar_per_100g;
    let fiber       = food.fiber_per_100g;
    let created_by  = food.created_by.map(encode_uuid);
    let created_str = encode_dt(food.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let result = conn.execute(
          "INSERT INTO foods (
             food_id, name, brands, barcode, serving_unit, serving_size,
             calories_per_100g, calories_per_portion,
             fat_per_100g, carbs_per_100g, protein_per_100g,
             fat_per_portion, carbs_per_portion, protein_per_portion,
             saturated_fat_per_100g, sugar_per_100g, fiber_per_100g,
             created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18, ?19)",
          rusqlite::params![
            id_str,
            name,
            brands,
            barcode,
            unit_str,
            n.serving_size,
            n.calories_per_100g,
            n.calories_per_portion,
            n.fat_per_100g,
            n.carbs_per_100g,
            n.protein_per_100g,
            n.fat_per_portion,
            n.carbs_per_portion,
            n.protein_per_portion,
            saturated,
            sugar,
            fiber,
            created_by,
            created_str,
          ],
        );
        match result {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      let barcode = food.barcode.unwrap_or_default();
      return Err(calorice_core::Error::DuplicateBarcode(barcode).into());
    }

    Ok(food)
  }

  async fn get_food(&self, food_id: Uuid) -> Result<Option<Food>> {
    let id_str = encode_uuid(food_id);
    let sql    = format!(
      "SELECT {} FROM foods f WHERE f.food_id = ?1",
      food_select_list("f")
    );

    let raw: Option<RawFood> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params![id_str], |row| RawFood::from_row(row, 0))
          .optional()?)
      })
      .await?;

    raw.map(RawFood::into_food).transpose()
  }

  async fn search_foods(&self, query: &FoodQuery) -> Result<Vec<Food>> {
    let text = query.text.trim().to_lowercase();
    if text.is_empty() {
      return Ok(Vec::new());
    }

    let pattern = format!("%{}%", escape_like(&text));
    let limit   = query.effective_limit() as i64;
    let sql     = format!(
      "SELECT {} FROM foods f
       WHERE fold_case(f.name) LIKE ?1 ESCAPE '\\'
          OR fold_case(COALESCE(f.brands, '')) LIKE ?1 ESCAPE '\\'
          OR fold_case(COALESCE(f.barcode, '')) LIKE ?1 ESCAPE '\\'
       ORDER BY fold_case(f.name) ASC, f.name ASC
       LIMIT ?2",
      food_select_list("f")
    );

    let raws: Vec<RawFood> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![pattern, limit], |row| RawFood::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFood::into_food).collect()
  }

  // ── Meal entries ──────────────────────────────────────────────────────────

  async fn record_entry(&self, input: NewMealEntry) -> Result<MealEntry> {
    let entry = MealEntry {
      entry_id:   Uuid::new_v4(),
      user_id:    input.user_id,
      food_id:    input.food_id,
      eaten_at:   input.eaten_at,
      amount:     input.amount,
      unit:       input.unit,
      calories:   input.calories,
      macros:     input.macros,
      created_at: Utc::now(),
    };

    let id_str      = encode_uuid(entry.entry_id);
    let user_str    = encode_uuid(entry.user_id);
    let food_str    = encode_uuid(entry.food_id);
    let eaten_str   = encode_dt(entry.eaten_at);
    let unit_str    = entry.unit.as_ref().to_owned();
    let macros_str  = encode_macros(entry.macros.as_ref())?;
    let created_str = encode_dt(entry.created_at);
    let amount      = entry.amount;
    let calories    = entry.calories;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO meal_entries (
             entry_id, user_id, food_id, eaten_at, amount, unit,
             calories, macros_json, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            user_str,
            food_str,
            eaten_str,
            amount,
            unit_str,
            calories,
            macros_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(entry)
  }

  async fn list_entries(
    &self,
    user_id: Uuid,
    query:   EntryQuery,
  ) -> Result<Vec<EntryWithFood>> {
    let user_str  = encode_uuid(user_id);
    let from_str  = query.from.map(encode_dt);
    let until_str = query.until.map(encode_dt);

    let entry_cols = ENTRY_COLUMNS
      .iter()
      .map(|c| format!("e.{c}"))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "SELECT {entry_cols}, {}
       FROM meal_entries e
       JOIN foods f ON f.food_id = e.food_id
       WHERE e.user_id = ?1
         AND (?2 IS NULL OR e.eaten_at >= ?2)
         AND (?3 IS NULL OR e.eaten_at < ?3)
       ORDER BY e.eaten_at DESC, e.created_at DESC",
      food_select_list("f")
    );

    let raws: Vec<(RawEntry, RawFood)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, from_str, until_str], |row| {
            Ok((RawEntry::from_row(row)?, RawFood::from_row(row, ENTRY_COLUMNS.len())?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(entry, food)| {
        Ok(EntryWithFood { entry: entry.into_entry()?, food: food.into_food()? })
      })
      .collect()
  }

  async fn delete_entry(&self, user_id: Uuid, entry_id: Uuid) -> Result<bool> {
    let user_str  = encode_uuid(user_id);
    let entry_str = encode_uuid(entry_id);

    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM meal_entries WHERE entry_id = ?1 AND user_id = ?2",
          rusqlite::params![entry_str, user_str],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }
}
