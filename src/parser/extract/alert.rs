use std::sync::LazyLock;

use regex::Regex;

pub const TYPE_UNKNOWN: &str = "Desconocido";

static ALERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Alerta|Informe de Seguridad)\s+No\.?\s*(\d{3}-\d{4})").unwrap()
});

/// Document category and alert number, e.g. `("Alerta", "123-2024")`. The
/// category label is canonicalized regardless of the casing in the document.
pub fn alert_info(text: &str) -> Option<(String, String)> {
    let caps = ALERT_RE.captures(text)?;
    let label = if caps[1].to_lowercase().starts_with("alerta") {
        "Alerta"
    } else {
        "Informe de Seguridad"
    };
    Some((label.to_string(), caps[2].to_string()))
}
