//! Best-effort parsing of heterogeneous dataset fields, isolated here so the
//! engine only ever sees typed products.

/// Sentinels that mean "no value" in scraped datasets.
fn is_missing(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("null")
}

/// Parse a price string into a non-negative f64. Strips currency symbols and
/// thousands separators; anything unparseable becomes `0.0` (meaning
/// unknown, not free) with a warning.
pub fn clean_price(raw: &str) -> f64 {
    if is_missing(raw) {
        return 0.0;
    }
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    match cleaned.parse::<f64>() {
        Ok(price) if price >= 0.0 => price,
        Ok(_) | Err(_) => {
            tracing::warn!(raw, "could not parse price, using 0.0");
            0.0
        }
    }
}

/// Parse a category field into a clean label. A `"[a, b]"`-shaped list
/// string flattens to `"a, b"`; missing values become `"Unknown"`.
pub fn parse_categories(raw: &str) -> String {
    if is_missing(raw) {
        return "Unknown".to_string();
    }
    let trimmed = raw.trim();
    match parse_list_string(trimmed) {
        Some(items) if !items.is_empty() => items.join(", "),
        _ => trimmed.to_string(),
    }
}

/// Parse an image field and return the first URL, if any. A list-shaped
/// string yields its first element.
pub fn parse_images(raw: &str) -> Option<String> {
    if is_missing(raw) {
        return None;
    }
    let trimmed = raw.trim();
    match parse_list_string(trimmed) {
        Some(items) => items.into_iter().next(),
        None => Some(trimmed.to_string()),
    }
}

/// Split a `"['a', 'b']"`-shaped string into its elements. Returns `None`
/// when the input is not bracketed; bracketed-but-empty input yields an
/// empty vec.
fn parse_list_string(raw: &str) -> Option<Vec<String>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"').trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
