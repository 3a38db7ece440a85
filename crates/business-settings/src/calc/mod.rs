//! Pure derived calculations over a [`BusinessSettings`] record.
//!
//! These helpers never touch the network or the cache; the cache exposes
//! thin wrappers that feed them the current (or default) record.

use chrono::NaiveTime;

use crate::models::BusinessSettings;

/// Parse a `HH:MM[:SS]` time-of-day string, tolerating missing seconds.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

/// True if the check-in time-of-day is strictly after the workday start.
///
/// Unparseable input is not considered late.
pub fn is_late(settings: &BusinessSettings, check_in: &str) -> bool {
    match parse_time_of_day(check_in) {
        Some(time) => time > settings.workday_start,
        None => false,
    }
}

/// True if either stamp is absent or checkout precedes the workday end.
pub fn is_incomplete_day(
    settings: &BusinessSettings,
    check_in: Option<&str>,
    check_out: Option<&str>,
) -> bool {
    if check_in.and_then(parse_time_of_day).is_none() {
        return true;
    }
    match check_out.and_then(parse_time_of_day) {
        Some(out) => out < settings.workday_end,
        None => true,
    }
}

/// Expected daily hours: `workday_end - workday_start` in fractional hours.
pub fn expected_hours(settings: &BusinessSettings) -> f64 {
    let worked = settings.workday_end - settings.workday_start;
    worked.num_seconds() as f64 / 3600.0
}

/// Overtime pay: `overtime_hours * hourly_rate * overtime_rate`.
///
/// Regular hours are part of the payroll call signature but do not enter
/// the overtime formula.
pub fn overtime_pay(
    settings: &BusinessSettings,
    _regular_hours: f64,
    overtime_hours: f64,
    hourly_rate: f64,
) -> f64 {
    overtime_hours * hourly_rate * settings.overtime_rate
}

/// Format a monetary amount with the record's currency code.
///
/// Known codes get their conventional symbol; everything else renders as
/// `CODE amount`. Two decimals, thousands grouping.
pub fn format_currency(settings: &BusinessSettings, amount: f64) -> String {
    let rendered = group_thousands(amount);
    match currency_symbol(&settings.currency) {
        Some(symbol) => {
            if amount < 0.0 {
                format!("-{}{}", symbol, rendered)
            } else {
                format!("{}{}", symbol, rendered)
            }
        }
        None => {
            if amount < 0.0 {
                format!("{} -{}", settings.currency, rendered)
            } else {
                format!("{} {}", settings.currency, rendered)
            }
        }
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" | "CNY" => Some("¥"),
        "INR" => Some("₹"),
        "BDT" => Some("৳"),
        _ => None,
    }
}

/// Render `|amount|` with two decimals and comma-grouped integer digits.
fn group_thousands(amount: f64) -> String {
    let plain = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }
    format!("{}.{}", grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn settings_with_hours(start: &str, end: &str) -> BusinessSettings {
        BusinessSettings {
            workday_start: parse_time_of_day(start).unwrap(),
            workday_end: parse_time_of_day(end).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_time_of_day_with_and_without_seconds() {
        assert_eq!(
            parse_time_of_day("09:00:00"),
            NaiveTime::from_hms_opt(9, 0, 0)
        );
        assert_eq!(parse_time_of_day("17:30"), NaiveTime::from_hms_opt(17, 30, 0));
        assert_eq!(parse_time_of_day(" 08:15 "), NaiveTime::from_hms_opt(8, 15, 0));
        assert_eq!(parse_time_of_day("not a time"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn test_is_late_boundary() {
        let settings = settings_with_hours("09:00:00", "17:00:00");
        assert!(is_late(&settings, "09:01"));
        assert!(!is_late(&settings, "08:59"));
        // On the dot is not late
        assert!(!is_late(&settings, "09:00"));
        assert!(!is_late(&settings, "garbage"));
    }

    #[test]
    fn test_is_incomplete_day() {
        let settings = settings_with_hours("09:00", "17:00");
        assert!(is_incomplete_day(&settings, None, Some("18:00")));
        assert!(is_incomplete_day(&settings, Some("09:00"), None));
        assert!(is_incomplete_day(&settings, Some("09:00"), Some("16:59")));
        assert!(!is_incomplete_day(&settings, Some("09:00"), Some("17:00")));
        assert!(!is_incomplete_day(&settings, Some("09:30"), Some("18:15")));
    }

    #[test]
    fn test_expected_hours() {
        let settings = settings_with_hours("09:00", "17:30");
        assert_eq!(expected_hours(&settings), 8.5);

        let settings = settings_with_hours("09:00:00", "17:00:00");
        assert_eq!(expected_hours(&settings), 8.0);
    }

    #[test]
    fn test_overtime_pay_ignores_regular_hours() {
        let settings = BusinessSettings {
            overtime_rate: 2.0,
            ..Default::default()
        };
        assert_eq!(overtime_pay(&settings, 0.0, 10.0, 20.0), 400.0);
        assert_eq!(overtime_pay(&settings, 160.0, 10.0, 20.0), 400.0);
    }

    #[test]
    fn test_format_currency_known_symbols() {
        let mut settings = BusinessSettings::default();
        assert_eq!(format_currency(&settings, 400.0), "$400.00");

        settings.currency = "EUR".to_string();
        assert_eq!(format_currency(&settings, 400.0), "€400.00");
        assert_eq!(format_currency(&settings, 1234.5), "€1,234.50");
        assert_eq!(format_currency(&settings, -1234.5), "-€1,234.50");
    }

    #[test]
    fn test_format_currency_unknown_code() {
        let settings = BusinessSettings {
            currency: "CHF".to_string(),
            ..Default::default()
        };
        assert_eq!(format_currency(&settings, 1000000.0), "CHF 1,000,000.00");
        assert_eq!(format_currency(&settings, -5.0), "CHF -5.00");
    }
}
