//! Text canonicalisation used before comparing or hashing quotes.

/// Canonicalise a free-text field.
///
/// Absent or empty input yields an empty string. Otherwise the text is trimmed, lowercased and
/// every run of whitespace (any Unicode whitespace, including tabs and newlines) is collapsed
/// to a single ASCII space. The ASCII separators U+001C..=U+001F count as whitespace too, as
/// they do in a regex `\s` class, so fingerprints stay stable for existing `quotes.db` files.
pub fn normalize(s: Option<&str>) -> String {
    let Some(s) = s else {
        return String::new();
    };

    let mut out = String::with_capacity(s.len());
    for word in s.split(is_separator).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.to_lowercase()
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}
