//! Identifier normalization.
//!
//! Catalog codes arrive in vendor-specific spellings: a trailing `C`/`U`
//! marks a censored/uncensored variant, `-C`/`-U` may appear mid-string, and
//! FC2 items are listed on-site as `FC2-PPV-…`. Both the cache file names and
//! the search URL use the normalized form produced here.

/// Short franchise prefix as supplied by callers.
pub const FRANCHISE_PREFIX: &str = "FC2-";

/// Long franchise prefix used by the site.
pub const FRANCHISE_LONG_PREFIX: &str = "FC2-PPV-";

const TRAILING_MARKERS: [char; 2] = ['C', 'U'];
const EMBEDDED_MARKERS: [&str; 2] = ["-C", "-U"];

/// Normalized forms of a raw identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedId {
    /// Key used for search URLs and snapshot file names.
    pub query_key: String,
    /// Whether the raw identifier is a franchise (FC2) item.
    pub is_franchise: bool,
}

impl NormalizedId {
    /// Key used to compare against identifiers found on cached pages.
    pub fn comparison_key(&self) -> String {
        comparison_form(&self.query_key)
    }
}

/// Normalize a raw identifier. Never fails; unmatched input is only trimmed.
pub fn normalize(raw: &str) -> NormalizedId {
    let trimmed = raw.trim();
    let is_franchise = trimmed.starts_with(FRANCHISE_PREFIX);

    let stripped = strip_trailing_marker(trimmed);
    let mut marker_removed = stripped.len() != trimmed.len();
    let mut id = stripped.to_string();
    for marker in EMBEDDED_MARKERS {
        let without = remove_ignore_ascii_case(&id, marker);
        marker_removed |= without.len() != id.len();
        id = without;
    }
    // "ABC-123-C" leaves a dangling hyphen once the trailing letter is gone
    if marker_removed {
        if let Some(rest) = id.strip_suffix('-') {
            id = rest.to_string();
        }
    }

    if is_franchise && !id.starts_with(FRANCHISE_LONG_PREFIX) {
        if let Some(rest) = id.strip_prefix(FRANCHISE_PREFIX) {
            id = format!("{FRANCHISE_LONG_PREFIX}{rest}");
        }
    }

    NormalizedId {
        query_key: id,
        is_franchise,
    }
}

/// Lowercased form with the franchise long prefix folded to the short one.
pub fn comparison_form(id: &str) -> String {
    let id = id.trim();
    let folded = match id.strip_prefix(FRANCHISE_LONG_PREFIX) {
        Some(rest) => format!("{FRANCHISE_PREFIX}{rest}"),
        None => id.to_string(),
    };
    folded.to_lowercase()
}

fn strip_trailing_marker(id: &str) -> &str {
    match id.chars().last() {
        Some(last) if TRAILING_MARKERS.contains(&last.to_ascii_uppercase()) => {
            &id[..id.len() - last.len_utf8()]
        }
        _ => id,
    }
}

fn remove_ignore_ascii_case(haystack: &str, needle: &str) -> String {
    let lower = haystack.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(&needle) {
        out.push_str(&haystack[pos..pos + found]);
        pos += found + needle.len();
    }
    out.push_str(&haystack[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifier_only_trimmed() {
        let id = normalize("  082713-417 ");
        assert_eq!(id.query_key, "082713-417");
        assert!(!id.is_franchise);
    }

    #[test]
    fn test_trailing_marker_removed_any_case() {
        assert_eq!(normalize("ABP-123C").query_key, "ABP-123");
        assert_eq!(normalize("ABP-123c").query_key, "ABP-123");
        assert_eq!(normalize("ABP-123U").query_key, "ABP-123");
        assert_eq!(normalize("abp-123u").query_key, "abp-123");
    }

    #[test]
    fn test_only_one_trailing_letter_removed() {
        assert_eq!(normalize("ABP-123UC").query_key, "ABP-123U");
    }

    #[test]
    fn test_embedded_marker_removed() {
        assert_eq!(normalize("ABP-123-U-1").query_key, "ABP-123-1");
        assert_eq!(normalize("ABP-123-c-2").query_key, "ABP-123-2");
    }

    #[test]
    fn test_hyphenated_suffix_leaves_no_dangling_hyphen() {
        assert_eq!(normalize("ABP-123-C").query_key, "ABP-123");
    }

    #[test]
    fn test_trailing_hyphen_kept_without_marker() {
        assert_eq!(normalize("ABP-123-").query_key, "ABP-123-");
        assert_eq!(normalize("ABP-123--").query_key, "ABP-123--");
        assert_eq!(normalize("ABP-123--C").query_key, "ABP-123-");
    }

    #[test]
    fn test_bare_franchise_prefix_still_rewritten() {
        let id = normalize("FC2-");
        assert!(id.is_franchise);
        assert_eq!(id.query_key, "FC2-PPV-");
    }

    #[test]
    fn test_franchise_rewritten_to_long_form() {
        let id = normalize("FC2-1234567");
        assert_eq!(id.query_key, "FC2-PPV-1234567");
        assert!(id.is_franchise);

        let id = normalize("FC2-1234567C");
        assert_eq!(id.query_key, "FC2-PPV-1234567");
    }

    #[test]
    fn test_franchise_long_form_not_doubled() {
        assert_eq!(normalize("FC2-PPV-1234567").query_key, "FC2-PPV-1234567");
    }

    #[test]
    fn test_franchise_prefix_is_case_sensitive() {
        let id = normalize("fc2-1234567");
        assert!(!id.is_franchise);
        assert_eq!(id.query_key, "fc2-1234567");
    }

    #[test]
    fn test_comparison_key_folds_long_prefix() {
        assert_eq!(normalize("FC2-1234567U").comparison_key(), "fc2-1234567");
        assert_eq!(normalize("SSIS-001").comparison_key(), "ssis-001");
        assert_eq!(comparison_form("FC2-PPV-42"), "fc2-42");
    }

    #[test]
    fn test_normalize_does_not_touch_input() {
        let raw = String::from("FC2-1234567C");
        let _ = normalize(&raw);
        assert_eq!(raw, "FC2-1234567C");
    }
}
