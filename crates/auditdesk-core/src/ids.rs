//! ID prefixes for persisted entities.
//!
//! IDs are `{prefix}-{8 hex chars}`, e.g. `aud-3fa9c2d1`. Generation happens in
//! the persistence layer; these constants keep the prefixes in one place.

pub const PREFIX_TEMPLATE: &str = "tpl";
pub const PREFIX_AUDIT: &str = "aud";
pub const PREFIX_ITEM: &str = "itm";
pub const PREFIX_EVIDENCE: &str = "evd";
pub const PREFIX_ACTIVITY: &str = "act";

/// Every prefix in use.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_TEMPLATE,
    PREFIX_AUDIT,
    PREFIX_ITEM,
    PREFIX_EVIDENCE,
    PREFIX_ACTIVITY,
];

/// Check that `id` looks like `{prefix}-{hex}`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for prefix in ALL_PREFIXES {
            assert!(seen.insert(*prefix), "duplicate prefix {prefix}");
        }
    }

    #[test]
    fn has_prefix_checks_shape() {
        assert!(has_prefix("aud-3fa9c2d1", PREFIX_AUDIT));
        assert!(!has_prefix("aud-", PREFIX_AUDIT));
        assert!(!has_prefix("itm-3fa9c2d1", PREFIX_AUDIT));
        assert!(!has_prefix("aud-zzzz", PREFIX_AUDIT));
    }
}
