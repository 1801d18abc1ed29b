//! Value normalization: LOC amounts, free text, and emails.

use std::sync::LazyLock;

use bu_model::OutputOptions;
use regex::Regex;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Parse the numeric part of a LOC amount.
///
/// Everything except digits and the decimal point is discarded (currency
/// symbols, letters, thousands separators). A second decimal point ends the
/// number. Returns `None` when no digits remain or the value overflows.
pub fn parse_loc_amount(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    let mut parts = kept.splitn(3, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let number = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{fraction}", if whole.is_empty() { "0" } else { whole })
    };
    number.parse().ok().filter(|amount: &f64| amount.is_finite())
}

/// Clean a LOC amount for output.
///
/// Two decimal places, or the next whole number when `round_up` is set
/// (`149.01` becomes `150`, `149.00` stays `149`). Unparseable input
/// becomes an empty string.
pub fn clean_loc_amount(raw: &str, round_up: bool) -> String {
    match parse_loc_amount(raw) {
        Some(amount) if round_up => format!("{:.0}", amount.ceil()),
        Some(amount) => format!("{amount:.2}"),
        None => String::new(),
    }
}

/// Strip commas, double quotes, and backticks, then collapse whitespace.
///
/// Apostrophes survive so names like O'Neil are untouched.
pub fn sanitize_value(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !matches!(ch, ',' | '"' | '`' | '\u{201C}' | '\u{201D}' | '\u{201E}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Simple `local@domain.tld` check.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Whether the value contains any configured keyword, ignoring case.
pub fn is_keyword_flagged(value: &str, keywords: &[String]) -> bool {
    let lowered = value.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .any(|keyword| !keyword.is_empty() && lowered.contains(&keyword))
}

/// Pick the email for one row.
///
/// Precedence is primary, then secondary, then the configured fallback. The
/// primary is used when it is non-empty, well-formed, and not keyword-flagged.
/// The secondary must meet the same bar. The fallback is used verbatim. When
/// nothing resolves, a keyword-flagged primary becomes empty and any other
/// primary is kept as-is so validation can still see it.
pub fn resolve_email(primary: &str, secondary: Option<&str>, options: &OutputOptions) -> String {
    let keywords = &options.email_keywords_to_replace;
    let usable = |value: &str| {
        !value.is_empty() && is_valid_email(value) && !is_keyword_flagged(value, keywords)
    };

    let primary = sanitize_value(primary);
    if usable(&primary) {
        return primary;
    }
    if let Some(secondary) = secondary.map(sanitize_value)
        && usable(&secondary)
    {
        return secondary;
    }
    if let Some(fallback) = options
        .fallback_email
        .as_deref()
        .filter(|fallback| !fallback.trim().is_empty())
    {
        return fallback.to_string();
    }
    if is_keyword_flagged(&primary, keywords) {
        String::new()
    } else {
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_currency_and_separators() {
        assert_eq!(clean_loc_amount("£1,234.567", false), "1234.57");
        assert_eq!(clean_loc_amount("$ 500", false), "500.00");
        assert_eq!(clean_loc_amount("GBP 1,000.5", false), "1000.50");
        assert_eq!(clean_loc_amount(".5", false), "0.50");
    }

    #[test]
    fn rounds_up_to_whole_numbers() {
        assert_eq!(clean_loc_amount("149.01", true), "150");
        assert_eq!(clean_loc_amount("149.00", true), "149");
        assert_eq!(clean_loc_amount("€149", true), "149");
    }

    #[test]
    fn unparseable_amounts_become_empty() {
        assert_eq!(clean_loc_amount("abc", false), "");
        assert_eq!(clean_loc_amount("", true), "");
        assert_eq!(clean_loc_amount(".", false), "");
        assert_eq!(clean_loc_amount(&"9".repeat(400), false), "");
        assert_eq!(parse_loc_amount(&"9".repeat(400)), None);
    }

    #[test]
    fn second_decimal_point_ends_the_number() {
        assert_eq!(parse_loc_amount("1.2.3"), Some(1.2));
    }

    #[test]
    fn sanitize_keeps_apostrophes() {
        assert_eq!(sanitize_value("  O'Neil,  \"Jr\" `x` "), "O'Neil Jr x");
        assert_eq!(sanitize_value("\u{201C}Acme\u{201D}"), "Acme");
    }

    fn options(keywords: &[&str], fallback: Option<&str>) -> OutputOptions {
        OutputOptions {
            email_keywords_to_replace: keywords.iter().map(|k| (*k).to_string()).collect(),
            fallback_email: fallback.map(str::to_string),
            ..OutputOptions::default()
        }
    }

    #[test]
    fn secondary_used_when_primary_empty() {
        assert_eq!(resolve_email("", Some("a@b.com"), &options(&[], None)), "a@b.com");
    }

    #[test]
    fn flagged_primary_without_alternatives_is_blank() {
        assert_eq!(resolve_email("none@x.com", None, &options(&["none"], None)), "");
    }

    #[test]
    fn flagged_secondary_falls_through_to_fallback() {
        let options = options(&["NOREPLY"], Some("hr@acme.com"));
        assert_eq!(
            resolve_email("", Some("noreply@acme.com"), &options),
            "hr@acme.com"
        );
    }

    #[test]
    fn invalid_primary_kept_when_nothing_resolves() {
        assert_eq!(resolve_email("jane at acme", None, &options(&[], None)), "jane at acme");
        assert_eq!(
            resolve_email("jane at acme", Some("bad"), &options(&[], Some("x@y.com"))),
            "x@y.com"
        );
    }

    #[test]
    fn valid_primary_wins() {
        assert_eq!(
            resolve_email(" jane@acme.com ", Some("b@b.com"), &options(&[], Some("x@y.com"))),
            "jane@acme.com"
        );
    }
}
