#[must_use]
pub fn lookup_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Lower-cases, turns whitespace/hyphen/underscore runs into a single `_`,
/// and drops every other non-alphanumeric character.
#[must_use]
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(ch);
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
    }
    out
}
