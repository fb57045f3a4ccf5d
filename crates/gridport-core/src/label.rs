//! Header label normalization.

/// Canonical form of a header label for case/whitespace-insensitive matching:
/// trim, collapse internal whitespace runs to a single space, casefold.
pub fn normalize_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&word.to_lowercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_collapses() {
        assert_eq!(normalize_label("  Order  ID \t"), "order id");
        assert_eq!(normalize_label("Status"), "status");
        assert_eq!(normalize_label(""), "");
        assert_eq!(normalize_label("   "), "");
    }

    #[test]
    fn matches_are_case_and_space_insensitive() {
        assert_eq!(normalize_label("ORDER  id"), normalize_label(" Order ID "));
    }
}
