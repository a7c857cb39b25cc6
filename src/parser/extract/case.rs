use std::sync::LazyLock;

use regex::Regex;

use super::date::LONG_DATE_PATTERN;
use super::{NOT_FOUND, SAFETY_REPORT_MARKER};

pub const SECTION_NOT_FOUND: &str = "No se encontró la sección 'Descripción del caso'.";

const CASE_HEADING: &str = "Descripción del caso";
const PROFESSIONALS_HEADING: &str = "Información para profesionales de la salud";

static CASE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Descripción del caso").unwrap());
static STOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Medidas para|Antecedentes|Acciones tomadas|A los|Nota|Referencia|Registro Sanitario|Enlace Relacionado)").unwrap()
});
static DATE_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(LONG_DATE_PATTERN).unwrap());

/// Case-description block. Safety reports carry it as a delimited section,
/// alerts as free lines between headings; outcomes are `NOT_FOUND` when
/// nothing was captured and `SECTION_NOT_FOUND` when a report is missing the
/// section heading entirely.
pub fn case_description(text: &str) -> String {
    if text.contains(SAFETY_REPORT_MARKER) {
        report_section(text)
    } else {
        alert_lines(text)
    }
}

/// Substring between the case heading and the health-professionals heading
/// (or end of text).
fn report_section(text: &str) -> String {
    let Some(start) = text.find(CASE_HEADING) else {
        return SECTION_NOT_FOUND.to_string();
    };
    let body = &text[start + CASE_HEADING.len()..];
    let end = body.find(PROFESSIONALS_HEADING).unwrap_or(body.len());
    body[..end].trim().to_string()
}

/// Line scan: capture between the case heading and the first section-header
/// keyword, then strip embedded long-form dates and collapse whitespace.
fn alert_lines(text: &str) -> String {
    let mut capturing = false;
    let mut captured: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if !capturing && CASE_START_RE.is_match(line) {
            capturing = true;
            continue;
        }
        if capturing {
            if STOP_RE.is_match(line) {
                break;
            }
            captured.push(line);
        }
    }

    let joined = captured.join(" ");
    let without_dates = DATE_PHRASE_RE.replace_all(&joined, "");
    let collapsed = without_dates.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        NOT_FOUND.to_string()
    } else {
        collapsed
    }
}
