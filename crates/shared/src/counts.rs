use regex::Regex;
use std::sync::OnceLock;

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+(?:\.\d+)?|\.\d+)([KkMmBb])?").expect("count pattern is valid")
    })
}

/// Parse a human-readable engagement count such as "12.3K" or "1,204".
///
/// Absence of data is zero, not an error: empty input or text without a
/// leading number yields 0.
pub fn parse_count(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    let cleaned = raw.replace(',', "");

    let Some(caps) = count_pattern().captures(&cleaned) else {
        return 0;
    };

    let number: f64 = match caps.get(1).map(|m| m.as_str().parse()) {
        Some(Ok(n)) => n,
        _ => return 0,
    };

    let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(s) if s == "K" => 1e3,
        Some(s) if s == "M" => 1e6,
        Some(s) if s == "B" => 1e9,
        _ => 1.0,
    };

    (number * multiplier).round() as u64
}

/// Compact display form: 1500 -> "1.5K", 2000000 -> "2M".
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        trim_zero(format!("{:.1}", n as f64 / 1_000_000.0)) + "M"
    } else if n >= 1_000 {
        trim_zero(format!("{:.1}", n as f64 / 1_000.0)) + "K"
    } else {
        n.to_string()
    }
}

fn trim_zero(s: String) -> String {
    match s.strip_suffix(".0") {
        Some(trimmed) => trimmed.to_string(),
        None => s,
    }
}
