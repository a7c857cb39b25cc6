use std::sync::LazyLock;

use regex::Regex;

static REGISTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Registro sanitario\s*:\s*(?:INVIMA\s*)?([A-Z0-9-]+)").unwrap()
});

/// Sanitary registry code, with the optional `INVIMA` prefix dropped.
pub fn registry_number(text: &str) -> Option<String> {
    REGISTRY_RE.captures(text).map(|caps| caps[1].to_string())
}
