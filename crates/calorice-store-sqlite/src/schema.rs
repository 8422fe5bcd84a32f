//! SQL schema for the Calorice SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id        TEXT PRIMARY KEY,
    email          TEXT NOT NULL UNIQUE,   -- normalised, lower-case
    created_at     TEXT NOT NULL,
    -- Profile columns stay NULL until the user fills in the form.
    sex            TEXT,                   -- 'MALE' | 'FEMALE'
    age            INTEGER,
    weight_kg      REAL,
    height_cm      REAL,
    activity_level TEXT,
    goal           TEXT
);

-- Single-use magic-link tokens; only the SHA-256 digest is stored.
CREATE TABLE IF NOT EXISTS verification_tokens (
    token_hash TEXT PRIMARY KEY,
    email      TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- Shared catalog. created_by is cleared, not cascaded, on account deletion.
CREATE TABLE IF NOT EXISTS foods (
    food_id                TEXT PRIMARY KEY,
    name                   TEXT NOT NULL,
    brands                 TEXT,
    barcode                TEXT UNIQUE,
    serving_unit           TEXT NOT NULL DEFAULT 'g',
    serving_size           REAL,
    calories_per_100g      REAL,
    calories_per_portion   REAL,
    fat_per_100g           REAL,
    carbs_per_100g         REAL,
    protein_per_100g       REAL,
    fat_per_portion        REAL,
    carbs_per_portion      REAL,
    protein_per_portion    REAL,
    saturated_fat_per_100g REAL,
    sugar_per_100g         REAL,
    fiber_per_100g         REAL,
    created_by             TEXT REFERENCES users(user_id),
    created_at             TEXT NOT NULL
);

-- Calories and macros are frozen at logging time.
CREATE TABLE IF NOT EXISTS meal_entries (
    entry_id    TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    food_id     TEXT NOT NULL REFERENCES foods(food_id),
    eaten_at    TEXT NOT NULL,
    amount      REAL NOT NULL CHECK (amount > 0),
    unit        TEXT NOT NULL,     -- 'g' | 'ml' | 'portion'
    calories    REAL NOT NULL,
    macros_json TEXT,              -- JSON MacroSnapshot or NULL
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS entries_user_eaten_idx ON meal_entries(user_id, eaten_at);
CREATE INDEX IF NOT EXISTS foods_name_idx         ON foods(name);
CREATE INDEX IF NOT EXISTS sessions_user_idx      ON sessions(user_id);

PRAGMA user_version = 1;
";
