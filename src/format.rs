use chrono::{DateTime, TimeZone, Utc};

/// Short label for a message or conversation time, relative to `now`.
///
/// Under a day old shows the clock time, one day old shows `Yesterday`,
/// anything older shows day and month. Rendered in `now`'s time zone.
pub fn relative_time<Tz>(at: DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let local = at.with_timezone(&now.timezone());
    match now.clone().signed_duration_since(local.clone()).num_days() {
        days if days <= 0 => local.format("%H:%M").to_string(),
        1 => "Yesterday".to_string(),
        _ => local.format("%-d %b").to_string(),
    }
}
