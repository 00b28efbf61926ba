//! Deterministic reason generation.
//!
//! A reason is a pure function of (score, category, price): independent
//! clauses accumulate and join with `"; "`. The mapping is stable and
//! testable; no request state feeds into it.

/// Price above which an item earns the premium clause.
const PREMIUM_PRICE: f64 = 1000.0;
/// Price below which an item earns the value clause.
const VALUE_PRICE: f64 = 200.0;

/// Build the reason string for a query recommendation.
///
/// Clauses, in order: a similarity tier (strictly above 0.9 / 0.8 / 0.7;
/// boundary values fall into the lower tier), a category-popularity clause
/// whenever the category is known, and a price tier. When nothing applies
/// the generic fallback is returned.
pub fn recommendation_reason(score: f32, category: &str, price: f64) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if score > 0.9 {
        reasons.push("Highly similar to your search".to_string());
    } else if score > 0.8 {
        reasons.push("Very similar to your search".to_string());
    } else if score > 0.7 {
        reasons.push("Similar to your search".to_string());
    }

    if category_is_known(category) {
        reasons.push(format!("Popular in {category} category"));
    }

    if price > PREMIUM_PRICE {
        reasons.push("Premium quality".to_string());
    } else if price > 0.0 && price < VALUE_PRICE {
        reasons.push("Great value".to_string());
    }

    if reasons.is_empty() {
        "Recommended for you".to_string()
    } else {
        reasons.join("; ")
    }
}

/// `"Unknown"` is the normalization sentinel for an unparseable category; it
/// counts as unknown here, as does an empty label.
fn category_is_known(category: &str) -> bool {
    !category.is_empty() && category != "Unknown"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_clauses_join_with_semicolons() {
        let reason = recommendation_reason(0.95, "Chairs", 1500.0);
        assert_eq!(
            reason,
            "Highly similar to your search; Popular in Chairs category; Premium quality"
        );
    }

    #[test]
    fn similarity_tiers_are_strict() {
        assert!(recommendation_reason(0.95, "", 500.0).contains("Highly similar"));
        assert!(recommendation_reason(0.85, "", 500.0).contains("Very similar"));
        assert!(recommendation_reason(0.75, "", 500.0).contains("Similar to your search"));
        // Boundary values fall into the lower tier.
        let at_nine_tenths = recommendation_reason(0.9, "", 500.0);
        assert!(!at_nine_tenths.contains("Highly"));
        assert!(at_nine_tenths.contains("Very similar"));
        let at_point_seven = recommendation_reason(0.7, "", 500.0);
        assert!(!at_point_seven.contains("Similar"));
    }

    #[test]
    fn low_score_omits_similarity_clause() {
        let reason = recommendation_reason(0.5, "Tables", 500.0);
        assert_eq!(reason, "Popular in Tables category");
    }

    #[test]
    fn unknown_category_omitted() {
        assert_eq!(
            recommendation_reason(0.5, "Unknown", 500.0),
            "Recommended for you"
        );
        assert_eq!(recommendation_reason(0.5, "", 500.0), "Recommended for you");
    }

    #[test]
    fn price_tiers() {
        assert!(recommendation_reason(0.0, "", 1200.0).contains("Premium quality"));
        assert!(recommendation_reason(0.0, "", 50.0).contains("Great value"));
        // Mid-range prices earn no price clause.
        assert_eq!(recommendation_reason(0.0, "", 500.0), "Recommended for you");
        // Exactly 1000 is not premium; exactly 200 is not great value.
        assert_eq!(
            recommendation_reason(0.0, "", 1000.0),
            "Recommended for you"
        );
        assert_eq!(recommendation_reason(0.0, "", 200.0), "Recommended for you");
    }

    #[test]
    fn unknown_price_earns_no_value_clause() {
        // 0.0 means "price unknown", not "free".
        assert_eq!(recommendation_reason(0.0, "", 0.0), "Recommended for you");
    }

    #[test]
    fn reason_is_pure() {
        let a = recommendation_reason(0.82, "Sofas", 180.0);
        let b = recommendation_reason(0.82, "Sofas", 180.0);
        assert_eq!(a, b);
        assert_eq!(a, "Very similar to your search; Popular in Sofas category; Great value");
    }
}
