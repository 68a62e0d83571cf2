//! Number-format dispatcher
//!
//! Only a handful of format codes change how a value reads in a report:
//! thousands separators, fixed decimals, percentages, dollar currency and a
//! long date. Everything else, and any text that is not a number, passes
//! through unchanged.

use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Long date format code (`January 5, 2024`)
pub const LONG_DATE: &str = r"mmmm\ dd\,\ yyyy";

/// Canonical code of a built-in number format id
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Recognized format codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Thousands { decimals: u32 },
    Fixed { decimals: u32 },
    Percent { decimals: u32 },
    Currency { decimals: u32 },
    LongDate,
}

fn dispatch(code: &str) -> Option<Dispatch> {
    let d = match code {
        "#,##0" => Dispatch::Thousands { decimals: 0 },
        "#,##0.00" => Dispatch::Thousands { decimals: 2 },
        "0" => Dispatch::Fixed { decimals: 0 },
        "0.00" => Dispatch::Fixed { decimals: 2 },
        "0%" => Dispatch::Percent { decimals: 0 },
        "0.0%" => Dispatch::Percent { decimals: 1 },
        "0.00%" => Dispatch::Percent { decimals: 2 },
        r##""$"#,##0"## | r##""$"#,##0;\-"$"#,##0"## => Dispatch::Currency { decimals: 0 },
        r##""$"#,##0.00"## | r##""$"#,##0.00;\-"$"#,##0.00"## => Dispatch::Currency { decimals: 2 },
        LONG_DATE => Dispatch::LongDate,
        _ => return None,
    };
    Some(d)
}

/// Render a cell's text through its number format code
///
/// # Examples
/// ```
/// use docfill_xlsx::number_format::apply_number_format;
///
/// assert_eq!(apply_number_format("1000", "#,##0"), "1,000");
/// assert_eq!(apply_number_format("-2500.5", "\"$\"#,##0.00"), "-$ 2,500.50");
/// assert_eq!(apply_number_format("n/a", "#,##0"), "n/a");
/// ```
pub fn apply_number_format(text: &str, code: &str) -> String {
    let Some(kind) = dispatch(code) else {
        return text.to_string();
    };

    let Some(number) = parse_decimal(text) else {
        // Only the date format has a meaning for non-numeric text
        if kind == Dispatch::LongDate {
            if let Some(date) = parse_text_date(text) {
                return format_long_date(date);
            }
        }
        return text.to_string();
    };

    match kind {
        Dispatch::Thousands { decimals } => group_thousands(number, decimals),
        Dispatch::Fixed { decimals } => fixed(number, decimals),
        Dispatch::Percent { decimals } => match number.checked_mul(Decimal::ONE_HUNDRED) {
            Some(scaled) => format!("{}%", fixed(scaled, decimals)),
            None => text.to_string(),
        },
        Dispatch::Currency { decimals } => currency(number, "$", decimals),
        Dispatch::LongDate => number
            .to_f64()
            .and_then(from_serial_date)
            .map(format_long_date)
            .unwrap_or_else(|| text.to_string()),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
        .or_else(|| {
            let no_groups = s.replace(',', "");
            if no_groups.len() == s.len() {
                return None;
            }
            Decimal::from_str(&no_groups).ok()
        })
}

fn round(number: Decimal, decimals: u32) -> Decimal {
    let mut rounded = number.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(decimals);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded
}

fn fixed(number: Decimal, decimals: u32) -> String {
    round(number, decimals).to_string()
}

fn group_thousands(number: Decimal, decimals: u32) -> String {
    let rendered = fixed(number, decimals);
    let (sign, digits) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `$ 1,000`, `-$ 1,000`, and a bare `$0` for zero
fn currency(number: Decimal, symbol: &str, decimals: u32) -> String {
    if number.is_zero() {
        return format!("{symbol}0");
    }
    if number.is_sign_negative() {
        format!("-{symbol} {}", group_thousands(-number, decimals))
    } else {
        format!("{symbol} {}", group_thousands(number, decimals))
    }
}

/// Convert a serial date (days since 1899-12-30) to a timestamp
pub fn from_serial_date(serial: f64) -> Option<NaiveDateTime> {
    if !(-657_435.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc();
    let seconds = ((serial - days).abs() * 86_400.0).round();
    epoch
        .checked_add_signed(Duration::days(days as i64))?
        .checked_add_signed(Duration::seconds(seconds as i64))
}

fn parse_text_date(text: &str) -> Option<NaiveDateTime> {
    let s = text.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn format_long_date(date: NaiveDateTime) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_thousands() {
        assert_eq!(apply_number_format("1000", "#,##0"), "1,000");
        assert_eq!(apply_number_format("1234567.891", "#,##0.00"), "1,234,567.89");
        assert_eq!(apply_number_format("999.5", "#,##0"), "1,000");
        assert_eq!(apply_number_format("-1234", "#,##0"), "-1,234");
        assert_eq!(apply_number_format("12", "#,##0"), "12");
    }

    #[test]
    fn test_fixed_and_percent() {
        assert_eq!(apply_number_format("2.5", "0"), "3");
        assert_eq!(apply_number_format("0.1234", "0.0%"), "12.3%");
        assert_eq!(apply_number_format("0.5", "0%"), "50%");
        assert_eq!(apply_number_format("1.5E-1", "0.0%"), "15.0%");
    }

    #[test]
    fn test_currency() {
        assert_eq!(apply_number_format("1000", r##""$"#,##0"##), "$ 1,000");
        assert_eq!(apply_number_format("-1000", r##""$"#,##0;\-"$"#,##0"##), "-$ 1,000");
        assert_eq!(apply_number_format("0", r##""$"#,##0"##), "$0");
        assert_eq!(apply_number_format("12.5", r##""$"#,##0.00"##), "$ 12.50");
    }

    #[test]
    fn test_long_date() {
        assert_eq!(apply_number_format("45292", LONG_DATE), "January 1, 2024");
        assert_eq!(apply_number_format("2024-03-05", LONG_DATE), "March 5, 2024");
        assert_eq!(apply_number_format("2024-03-05", "#,##0"), "2024-03-05");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(apply_number_format("1000", "General"), "1000");
        assert_eq!(apply_number_format("1000", "0.00E+00"), "1000");
        assert_eq!(apply_number_format("abc", "#,##0"), "abc");
    }

    #[test]
    fn test_builtin_codes() {
        assert_eq!(builtin_format_code(3), Some("#,##0"));
        assert_eq!(builtin_format_code(164), None);
    }
    #[test]
    fn test_extreme_magnitudes() {
        let max = Decimal::MAX.to_string();
        // Too large to scale by a hundred
        assert_eq!(apply_number_format(&max, "0.0%"), max);
        assert_eq!(apply_number_format(&max, "0%"), max);
        assert_eq!(apply_number_format("1e26", "0%"), "10000000000000000000000000000%");

        assert_eq!(apply_number_format(&max, "#,##0"), "79,228,162,514,264,337,593,543,950,335");
        assert_eq!(apply_number_format(&max, r##""$"#,##0"##), "$ 79,228,162,514,264,337,593,543,950,335");
        let min = Decimal::MIN.to_string();
        assert_eq!(apply_number_format(&min, "#,##0"), "-79,228,162,514,264,337,593,543,950,335");
        assert!(apply_number_format(&max, "#,##0.00").starts_with("79,228,162,514"));

        // Out of decimal range altogether
        assert_eq!(apply_number_format("1e40", "0.00%"), "1e40");
        assert_eq!(apply_number_format("1e40", LONG_DATE), "1e40");
    }

    proptest! {
        #[test]
        fn thousands_grouping_keeps_integer_digits(n in any::<i128>()) {
            let text = n.to_string();
            prop_assert_eq!(apply_number_format(&text, "#,##0").replace(',', ""), text);
        }

        #[test]
        fn any_number_formats_without_panicking(
            value in any::<f64>(),
            code in prop::sample::select(vec![
                "#,##0", "#,##0.00", "0", "0.00", "0%", "0.0%", "0.00%",
                r##""$"#,##0"##, r##""$"#,##0.00"##, LONG_DATE,
            ]),
        ) {
            prop_assert!(!apply_number_format(&value.to_string(), code).is_empty());
        }
    }
}
