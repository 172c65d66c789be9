//! Natural-language timestamp descriptions.
//!
//! Accepted, case-insensitively, relative to a given `now`:
//! `now`, `today`, `yesterday`, `tomorrow`, `<n> <unit> ago`,
//! `in <n> <unit>`, RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`
//! (a `T` separator works too) and a bare `HH:MM[:SS]` meaning today.
//! Units are seconds through weeks, singular, plural or abbreviated.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

pub fn parse_datetime(text: &str, now: OffsetDateTime) -> Result<OffsetDateTime, String> {
    let input = text.trim().to_ascii_lowercase();
    if input.is_empty() {
        return Err("no time given".to_string());
    }

    match input.as_str() {
        "now" | "today" => return Ok(now),
        "yesterday" => return shift(now, -Duration::DAY, &input),
        "tomorrow" => return shift(now, Duration::DAY, &input),
        _ => {}
    }

    if let Some(rest) = input.strip_suffix(" ago") {
        let back = parse_offset(rest)?
            .checked_neg()
            .ok_or_else(|| format!("'{}' is out of range", input))?;
        return shift(now, back, &input);
    }
    if let Some(rest) = input.strip_prefix("in ") {
        return shift(now, parse_offset(rest)?, &input);
    }

    if let Ok(ts) = OffsetDateTime::parse(text.trim(), &Rfc3339) {
        return Ok(ts);
    }
    parse_absolute(&input, now).ok_or_else(|| format!("Could not parse '{}' into a datetime", text.trim()))
}

fn shift(now: OffsetDateTime, by: Duration, input: &str) -> Result<OffsetDateTime, String> {
    now.checked_add(by)
        .ok_or_else(|| format!("'{}' is out of range", input))
}

fn parse_offset(text: &str) -> Result<Duration, String> {
    let mut parts = text.split_whitespace();
    let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected '<number> <unit>', got '{}'", text));
    };
    let amount: i64 = if amount == "a" || amount == "an" {
        1
    } else {
        amount
            .parse()
            .map_err(|_| format!("'{}' is not a whole number", amount))?
    };
    let unit_secs: i64 = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600,
        "d" | "day" | "days" => 86_400,
        "w" | "week" | "weeks" => 604_800,
        other => return Err(format!("unknown time unit '{}'", other)),
    };
    amount
        .checked_mul(unit_secs)
        .map(Duration::seconds)
        .ok_or_else(|| format!("'{} {}' is out of range", amount, unit))
}

fn parse_absolute(input: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let normalized = input.replacen('t', " ", 1);
    let offset = now.offset();

    let date_time_formats = [
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    for fmt in date_time_formats {
        if let Ok(dt) = PrimitiveDateTime::parse(&normalized, &fmt) {
            return Some(dt.assume_offset(offset));
        }
    }
    if let Ok(date) = Date::parse(input, &format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_offset(offset));
    }

    let time_formats = [
        format_description!("[hour]:[minute]:[second]"),
        format_description!("[hour]:[minute]"),
    ];
    for fmt in time_formats {
        if let Ok(time) = Time::parse(input, &fmt) {
            return Some(now.replace_time(time));
        }
    }
    None
}
