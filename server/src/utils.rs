use chrono::{Duration, NaiveDate, Utc};

/// UTC day used to key the per-day counter snapshots.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The last `n` UTC days, oldest first, ending today. Always non-empty.
pub fn trailing_days(n: u32) -> Vec<NaiveDate> {
    let today = today();
    (0..n.max(1) as i64)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
