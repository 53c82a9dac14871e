use chrono::{Duration, NaiveDate};

/// Strips every HTML tag (script/style bodies included) from free text
pub fn sanitize_text(input: &str) -> String {
    ammonia::Builder::empty()
        .clean_content_tags(maplit::hashset!["script", "style"])
        .clean(input.trim())
        .to_string()
        .trim()
        .to_string()
}

/// Sanitized text, or None when nothing is left
pub fn sanitize_opt(input: Option<&str>) -> Option<String> {
    input.map(sanitize_text).filter(|s| !s.is_empty())
}

/// Ten-digit Indian mobile number from loosely formatted input
/// (`+91 98765-43210`, `098765 43210`, `9876543210`)
pub fn normalize_mobile(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let local = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('0') => &digits[1..],
        12 if digits.starts_with("91") => &digits[2..],
        _ => return None,
    };
    if local.starts_with(['6', '7', '8', '9']) {
        Some(local.to_string())
    } else {
        None
    }
}

/// Normalised mobile if valid, the trimmed input otherwise; None when blank
pub fn clean_mobile(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(normalize_mobile(raw).unwrap_or_else(|| raw.to_string()))
}

/// International form used by wa.me links
pub fn whatsapp_number(mobile: &str) -> Option<String> {
    normalize_mobile(mobile).map(|m| format!("91{}", m))
}

pub fn whatsapp_link(mobile: &str, message: &str) -> Option<String> {
    whatsapp_number(mobile)
        .map(|n| format!("https://wa.me/{}?text={}", n, urlencoding::encode(message)))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Money in paise for exact comparisons
pub fn to_paise(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Parses an amount cell: `1,500`, `₹ 300.50`, `Rs. 200`
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("Rs.")
        .trim_start_matches("Rs")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `YYYY-MM-DD`, `DD-MM-YYYY`, `DD/MM/YYYY`, `DD.MM.YYYY`, an
/// ISO datetime prefix, or an Excel serial day number
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // "2025-10-01T00:00:00" or "2025-10-01 00:00:00"
    if s.len() > 10 && s.is_char_boundary(10) {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }

    if let Ok(serial) = s.parse::<f64>() {
        return excel_serial_to_date(serial);
    }
    None
}

/// Excel's 1900 date system (serial 1 = 1900-01-01, with the leap-year bug)
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  <b>Paid</b> in cash "), "Paid in cash");
        assert_eq!(sanitize_text("<script>alert(1)</script>ok"), "ok");
        assert_eq!(sanitize_opt(Some("<i></i>")), None);
    }

    #[test]
    fn test_normalize_mobile() {
        assert_eq!(normalize_mobile("+91 98765-43210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_mobile("098765 43210").as_deref(), Some("9876543210"));
        assert_eq!(normalize_mobile("12345"), None);
        assert_eq!(normalize_mobile("1234567890"), None);
        assert_eq!(clean_mobile(Some("  ")), None);
        assert_eq!(clean_mobile(Some("ext 12")).as_deref(), Some("ext 12"));
    }

    #[test]
    fn test_whatsapp_link() {
        let link = whatsapp_link("9876543210", "Hi Ravi, CSF due: ₹500").unwrap();
        assert!(link.starts_with("https://wa.me/919876543210?text="));
        assert!(link.contains("Hi%20Ravi"));
        assert!(whatsapp_link("000", "x").is_none());
    }

    #[test]
    fn test_money() {
        assert_eq!(round2(300.0 * 10.0 / 100.0), 30.0);
        assert_eq!(round2(333.3333), 333.33);
        assert_eq!(to_paise(499.999), 50000);
        assert_eq!(parse_amount("₹ 1,500.50"), Some(1500.5));
        assert_eq!(parse_amount("Rs. 200"), Some(200.0));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-10-01"), Some(d(2025, 10, 1)));
        assert_eq!(parse_date("01-10-2025"), Some(d(2025, 10, 1)));
        assert_eq!(parse_date("01/10/2025"), Some(d(2025, 10, 1)));
        assert_eq!(parse_date("01.10.2025"), Some(d(2025, 10, 1)));
        assert_eq!(parse_date("2025-10-01T10:00:00"), Some(d(2025, 10, 1)));
        assert_eq!(parse_date("45931"), Some(d(2025, 10, 1)));
        assert_eq!(parse_date("31/02/2025"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
    }
}
