/// Lowercase, ASCII-alphanumeric words joined by `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// At most `max` characters, cut back to a word boundary when possible.
pub fn truncate_words(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > max / 2 => cut[..idx].trim_end().to_string(),
        _ => cut,
    }
}

/// Case-insensitive containment; an empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Magical Bali -- 6 Days!"), "magical-bali-6-days");
        assert_eq!(slugify("Café & Co"), "caf-co");
    }

    #[test]
    fn truncate_prefers_word_boundaries() {
        assert_eq!(truncate_words("short", 10), "short");
        assert_eq!(
            truncate_words("explore the islands of greece", 20),
            "explore the islands"
        );
    }

    #[test]
    fn contains_ci_ignores_case() {
        assert!(contains_ci("Dubai Desert Safari", "desert"));
        assert!(!contains_ci("Dubai", "bali"));
    }
}
