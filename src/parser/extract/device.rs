use std::sync::LazyLock;

use regex::Regex;

use super::SAFETY_REPORT_MARKER;

pub const UNSPECIFIED: &str = "No especificado";

// Capture runs to the next all-caps `HEADER:` line, the internal-ID marker
// line, or the end of the text. The stop line is consumed by the
// non-capturing group, not returned.
static SUBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Asunto\s*:\s*(.+?)(?:\n(?:No\. identificación interna del Informe de Seguridad|[A-ZÁÉÍÓÚÑ ]{2,}:)|$)").unwrap()
});
static PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Nombre del producto\s*:\s*(.+?)(?:\n(?:No\. identificación interna del Informe de Seguridad|[A-ZÁÉÍÓÚÑ ]{2,}:)|$)").unwrap()
});

/// Device or equipment name. Safety reports label it `Asunto:`, alerts label
/// it `Nombre del producto:`.
pub fn device_name(text: &str) -> Option<String> {
    let re = if text.contains(SAFETY_REPORT_MARKER) {
        &SUBJECT_RE
    } else {
        &PRODUCT_RE
    };
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}
