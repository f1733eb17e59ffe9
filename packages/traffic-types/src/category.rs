/// The category keywords that mark a platform type as civilian for the
/// purposes of weapon disarmament (invariant I6 / property P6).
///
/// Data-driven rather than a hard-coded class list (spec.md §9): any type
/// definition whose `category` field contains one of these keywords (matched
/// case-insensitively as a whole word) is treated as civilian.
const CIVILIAN_CATEGORY_KEYWORDS: &[&str] = &[
    "commercial",
    "civilian",
    "commercial_aircraft",
    "commercial_vehicle",
];

/// Returns true when `category` should disarm its platforms.
pub fn is_civilian_category(category: &str) -> bool {
    let lower = category.to_lowercase();
    CIVILIAN_CATEGORY_KEYWORDS
        .iter()
        .any(|kw| lower.split(|c: char| !c.is_alphanumeric()).any(|word| word == *kw) || lower == *kw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_civilian_keywords() {
        assert!(is_civilian_category("commercial"));
        assert!(is_civilian_category("Civilian"));
        assert!(is_civilian_category("commercial_aircraft"));
        assert!(is_civilian_category("commercial_vehicle"));
    }

    #[test]
    fn rejects_military_categories() {
        assert!(!is_civilian_category("fighter"));
        assert!(!is_civilian_category("military"));
        assert!(!is_civilian_category(""));
    }
}
