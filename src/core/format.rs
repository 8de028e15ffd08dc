/// Formats an amount as whole Australian dollars, e.g. `-$1,234,568`.
///
/// Rounds half away from zero. Non-finite values keep the currency symbol
/// (`$NaN`, `$∞`) so they stand out in a report instead of reading as zero.
pub fn format_currency(value: f64) -> String {
    if value.is_nan() {
        return "$NaN".to_string();
    }

    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    if rounded.is_infinite() {
        return format!("{sign}$∞");
    }

    let digits = format!("{:.0}", rounded.abs());
    format!("{sign}${}", group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_dollars_with_grouping() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(1_000.0), "$1,000");
        assert_eq!(format_currency(491_933.866), "$491,934");
        assert_eq!(format_currency(3_406_705.28), "$3,406,705");
        assert_eq!(format_currency(1_234_567_890.0), "$1,234,567,890");
    }

    #[test]
    fn negative_amounts_put_sign_before_symbol() {
        assert_eq!(format_currency(-426_433.87), "-$426,434");
        assert_eq!(format_currency(-0.4), "$0");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_currency(2.5), "$3");
        assert_eq!(format_currency(-2.5), "-$3");
        assert_eq!(format_currency(1_499.49), "$1,499");
    }

    #[test]
    fn non_finite_values_are_marked() {
        assert_eq!(format_currency(f64::NAN), "$NaN");
        assert_eq!(format_currency(f64::INFINITY), "$∞");
        assert_eq!(format_currency(f64::NEG_INFINITY), "-$∞");
    }
}
