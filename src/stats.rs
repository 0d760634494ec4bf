//! Numeric conventions shared by the aggregate queries.
//!
//! Counts are integers throughout. Percentages are `(value / total) * 100` rounded to two decimal
//! places, and a zero total yields zero rather than NaN.

/// Number of decimal places kept in percentages and averages.
pub const DECIMAL_PLACES: i32 = 2;

/// Round a value to [DECIMAL_PLACES] decimal places.
pub fn round(value: f64) -> f64 {
    let scale = 10_f64.powi(DECIMAL_PLACES);
    (value * scale).round() / scale
}

/// Unrounded percentage of `value` in `total`.
pub fn raw_percentage(value: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    value as f64 / total as f64 * 100.0
}

/// Percentage of `value` in `total`, rounded.
pub fn percentage(value: u64, total: u64) -> f64 {
    round(raw_percentage(value, total))
}

/// Rounded mean of the values, or `None` if there are none.
///
/// Values are averaged before rounding.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(round(sum / count as f64))
    }
}
