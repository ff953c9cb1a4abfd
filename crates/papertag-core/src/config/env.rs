pub(super) const ENV_REJECT_UNKNOWN: &str = "PAPERTAG_REJECT_UNKNOWN";
pub(super) const ENV_MIN_COOCCURRENCE: &str = "PAPERTAG_MIN_COOCCURRENCE";
pub(super) const ENV_PRIMARY_CATEGORY: &str = "PAPERTAG_PRIMARY_CATEGORY";
pub(super) const ENV_ID_PREFIX: &str = "PAPERTAG_ID_PREFIX";

#[must_use]
pub(super) fn read_non_empty(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(super) fn read_usize(
    lookup: &dyn Fn(&str) -> Option<String>,
    name: &str,
    min_value: usize,
) -> Option<usize> {
    lookup(name)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value >= min_value)
}

#[must_use]
pub(super) fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => Some(true),
        Some("0" | "false" | "no" | "off") => Some(false),
        _ => None,
    }
}

#[must_use]
pub(super) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
