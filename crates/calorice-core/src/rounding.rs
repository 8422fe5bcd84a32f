//! Display rounding shared by the metabolism and summary figures.

/// Round a calorie figure to the nearest whole number, with halves rounded
/// towards positive infinity (`1.5 → 2`, `-1.5 → -1`).
pub fn round_kcal(value: f64) -> f64 { (value + 0.5).floor() }
