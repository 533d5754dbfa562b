//! Number formatting for pages and exports.

fn group_thousands(whole: u64) -> String {
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn finite(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Whole dollars with thousands separators: `$1,234`, `-$1,234`.
pub fn money(x: f64) -> String {
    let rounded = finite(x).round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.abs() as u64))
}

/// Dollars and cents: `$1,234.56`.
pub fn money_cents(x: f64) -> String {
    let cents = (finite(x) * 100.0).round();
    let sign = if cents < 0.0 { "-" } else { "" };
    let cents = cents.abs() as u64;
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

pub fn kwh(x: f64) -> String {
    format!("{} kWh", group_thousands(finite(x).max(0.0).round() as u64))
}

/// Signed percentage with one decimal: `+1.5%`, `-3.0%`.
pub fn delta_pct(x: f64) -> String {
    format!("{:+.1}%", finite(x))
}

pub fn percent(x: f64) -> String {
    format!("{:.1}%", finite(x))
}

/// Usage rates in c/kWh.
pub fn usage_rate(x: f64) -> String {
    format!("{:.2}", finite(x))
}

/// Daily supply in $/day.
pub fn daily_rate(x: f64) -> String {
    format!("{:.4}", finite(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_and_rounds() {
        assert_eq!(money(0.0), "$0");
        assert_eq!(money(999.4), "$999");
        assert_eq!(money(1234.5), "$1,235");
        assert_eq!(money(1_234_567.0), "$1,234,567");
        assert_eq!(money(-5000.0), "-$5,000");
        assert_eq!(money(f64::NAN), "$0");
    }

    #[test]
    fn money_with_cents() {
        assert_eq!(money_cents(18_250.0), "$18,250.00");
        assert_eq!(money_cents(0.137), "$0.14");
        assert_eq!(money_cents(-42.5), "-$42.50");
    }

    #[test]
    fn rates_and_percentages() {
        assert_eq!(usage_rate(22.114), "22.11");
        assert_eq!(daily_rate(1.07312), "1.0731");
        assert_eq!(delta_pct(1.54), "+1.5%");
        assert_eq!(delta_pct(-3.0), "-3.0%");
        assert_eq!(percent(12.345), "12.3%");
        assert_eq!(kwh(10_000.4), "10,000 kWh");
    }
}
