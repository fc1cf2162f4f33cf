use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, Timelike};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::calendar::{CalendarValue, TimeDelta};

/// Moves `current` by `delta`. Components are applied in the order years,
/// months, days, hours, minutes, each with calendar rollover; minutes only
/// matter once they add up to a whole hour. An empty delta returns `current`
/// unchanged. A shift that leaves the representable range is logged and ignored.
pub fn advance(current: &CalendarValue, delta: &TimeDelta) -> CalendarValue {
    if delta.is_empty() {
        return *current;
    }

    match to_datetime(current).and_then(|start| shift(start, delta)) {
        Some(moved) => from_datetime(&moved),
        None => {
            warn!("Time shift {delta:?} from {current:?} is out of range; calendar unchanged");
            *current
        }
    }
}

/// Rolls out-of-range month/day/hour values into the following units.
pub fn normalize(value: &CalendarValue) -> CalendarValue {
    match to_datetime(value) {
        Some(dt) => from_datetime(&dt),
        None => {
            warn!("Calendar value {value:?} cannot be represented; using the default date");
            CalendarValue::default()
        }
    }
}

fn to_datetime(value: &CalendarValue) -> Option<NaiveDateTime> {
    let start_of_year = NaiveDate::from_ymd_opt(value.year, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let dt = shift_months(start_of_year, i64::from(value.month) - 1)?;
    let dt = dt.checked_add_signed(Duration::try_days(i64::from(value.day) - 1)?)?;
    dt.checked_add_signed(Duration::try_hours(i64::from(value.hour))?)
}

fn from_datetime(dt: &NaiveDateTime) -> CalendarValue {
    CalendarValue {
        year: dt.year(),
        month: dt.month(),
        day: dt.day(),
        hour: dt.hour(),
    }
}

fn shift(start: NaiveDateTime, delta: &TimeDelta) -> Option<NaiveDateTime> {
    let mut dt = start;

    if let Some(years) = delta.years.filter(|n| *n != 0) {
        dt = shift_months(dt, years.checked_mul(12)?)?;
    }
    if let Some(months) = delta.months.filter(|n| *n != 0) {
        dt = shift_months(dt, months)?;
    }
    if let Some(days) = delta.days.filter(|n| *n != 0) {
        dt = dt.checked_add_signed(Duration::try_days(days)?)?;
    }
    if let Some(hours) = delta.hours.filter(|n| *n != 0) {
        dt = dt.checked_add_signed(Duration::try_hours(hours)?)?;
    }
    if let Some(minutes) = delta.minutes.filter(|n| *n != 0) {
        dt = dt.checked_add_signed(Duration::try_minutes(minutes)?)?;
    }

    // Hour resolution: leftover minutes are dropped, as on the way in.
    dt.with_minute(0)
}

fn shift_months(dt: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        dt.checked_add_months(magnitude)
    } else {
        dt.checked_sub_months(magnitude)
    }
}

/// Vietnamese period-of-day label shown next to the clock.
pub fn time_of_day(hour: u32) -> &'static str {
    match hour {
        6..=11 => "Sáng",
        12..=13 => "Trưa",
        14..=17 => "Chiều",
        18..=21 => "Tối",
        _ => "Đêm",
    }
}

#[derive(Clone, Copy)]
enum Unit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
}

static DURATION_PATTERNS: Lazy<Vec<(Regex, Unit, i64)>> = Lazy::new(|| {
    [
        (r"(?i)([0-9]+)\s+nghìn\s+năm", Unit::Years, 1000),
        (r"(?i)([0-9]+)\s+năm", Unit::Years, 1),
        (r"(?i)([0-9]+)\s+tháng", Unit::Months, 1),
        (r"(?i)([0-9]+)\s+ngày", Unit::Days, 1),
        (r"(?i)([0-9]+)\s+giờ", Unit::Hours, 1),
        (r"(?i)([0-9]+)\s+phút", Unit::Minutes, 1),
    ]
    .into_iter()
    .map(|(pattern, unit, multiplier)| {
        (
            Regex::new(pattern).expect("invalid duration regex"),
            unit,
            multiplier,
        )
    })
    .collect()
});

/// Reads a rough time span out of prose ("3 ngày", "2 nghìn năm", ...).
/// Only the first match of each pattern counts.
pub fn extract_time_passed(text: &str) -> TimeDelta {
    let mut delta = TimeDelta::default();

    for (re, unit, multiplier) in DURATION_PATTERNS.iter() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let Ok(amount) = caps[1].parse::<i64>() else {
            continue;
        };
        let value = amount.saturating_mul(*multiplier);

        let slot = match unit {
            Unit::Years => &mut delta.years,
            Unit::Months => &mut delta.months,
            Unit::Days => &mut delta.days,
            Unit::Hours => &mut delta.hours,
            Unit::Minutes => &mut delta.minutes,
        };
        *slot = Some(slot.unwrap_or(0).saturating_add(value));
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_delta_is_identity() {
        let now = CalendarValue::new(5, 3, 14, 9);
        assert_eq!(advance(&now, &TimeDelta::default()), now);
        let zeros = TimeDelta {
            years: Some(0),
            hours: Some(0),
            ..TimeDelta::default()
        };
        assert_eq!(advance(&now, &zeros), now);
    }

    #[test]
    fn hours_roll_over_the_year_end() {
        let end_of_year = CalendarValue::new(1, 12, 31, 23);
        assert_eq!(
            advance(&end_of_year, &TimeDelta::hours(2)),
            CalendarValue::new(2, 1, 1, 1)
        );
    }

    #[test]
    fn month_twelve_plus_one_is_january_next_year() {
        let delta = TimeDelta {
            months: Some(1),
            ..TimeDelta::default()
        };
        assert_eq!(
            advance(&CalendarValue::new(7, 12, 10, 8), &delta),
            CalendarValue::new(8, 1, 10, 8)
        );
    }

    #[test]
    fn negative_deltas_move_backwards() {
        let delta = TimeDelta {
            days: Some(-1),
            hours: Some(-9),
            ..TimeDelta::default()
        };
        assert_eq!(
            advance(&CalendarValue::new(3, 3, 1, 8), &delta),
            CalendarValue::new(3, 2, 27, 23)
        );
    }

    #[test]
    fn minutes_count_once_they_make_an_hour() {
        let now = CalendarValue::new(1, 1, 1, 8);
        let half = TimeDelta {
            minutes: Some(30),
            ..TimeDelta::default()
        };
        assert_eq!(advance(&now, &half), now);
        let ninety = TimeDelta {
            minutes: Some(90),
            ..TimeDelta::default()
        };
        assert_eq!(advance(&now, &ninety), CalendarValue::new(1, 1, 1, 9));
    }

    #[test]
    fn all_components_apply_in_order() {
        let delta = TimeDelta {
            years: Some(1),
            months: Some(2),
            days: Some(3),
            hours: Some(4),
            minutes: Some(60),
        };
        assert_eq!(
            advance(&CalendarValue::new(1, 1, 1, 8), &delta),
            CalendarValue::new(2, 3, 4, 13)
        );
    }

    #[test]
    fn normalize_rolls_overflowing_fields() {
        assert_eq!(
            normalize(&CalendarValue::new(1, 12, 31, 24)),
            CalendarValue::new(2, 1, 1, 0)
        );
        assert_eq!(
            normalize(&CalendarValue::new(1, 13, 1, 0)),
            CalendarValue::new(2, 1, 1, 0)
        );
        assert_eq!(
            normalize(&CalendarValue::new(4, 5, 6, 7)),
            CalendarValue::new(4, 5, 6, 7)
        );
    }

    #[test]
    fn out_of_range_shift_is_ignored() {
        let now = CalendarValue::new(1, 1, 1, 8);
        let huge = TimeDelta {
            years: Some(i64::MAX),
            ..TimeDelta::default()
        };
        assert_eq!(advance(&now, &huge), now);
    }

    #[test]
    fn periods_of_day() {
        assert_eq!(time_of_day(6), "Sáng");
        assert_eq!(time_of_day(12), "Trưa");
        assert_eq!(time_of_day(17), "Chiều");
        assert_eq!(time_of_day(21), "Tối");
        assert_eq!(time_of_day(2), "Đêm");
    }

    #[test]
    fn spans_are_read_from_prose() {
        let delta = extract_time_passed("Sau 3 ngày và 2 giờ bế quan, rồi thêm 15 phút.");
        assert_eq!(delta.days, Some(3));
        assert_eq!(delta.hours, Some(2));
        assert_eq!(delta.minutes, Some(15));
        assert_eq!(delta.years, None);

        let delta = extract_time_passed("Hắn ngủ say 2 nghìn năm");
        assert_eq!(delta.years, Some(2000));

        assert!(extract_time_passed("Không có gì").is_empty());
    }
}
