use std::sync::LazyLock;

use regex::Regex;

pub const DATE_NOT_FOUND: &str = "Fecha no encontrada";
pub const MONTH_UNKNOWN: &str = "Desconocido";

/// Spanish long-form date, e.g. "5 de enero 2025" or "12 marzo 2024".
pub const LONG_DATE_PATTERN: &str = r"(?i)\b(\d{1,2})\s(?:de\s)?(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|octubre|noviembre|diciembre)\s(\d{4})\b";

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(LONG_DATE_PATTERN).unwrap());

// (lowercase name, two-digit code, display name)
const MONTHS: [(&str, &str, &str); 12] = [
    ("enero", "01", "Enero"),
    ("febrero", "02", "Febrero"),
    ("marzo", "03", "Marzo"),
    ("abril", "04", "Abril"),
    ("mayo", "05", "Mayo"),
    ("junio", "06", "Junio"),
    ("julio", "07", "Julio"),
    ("agosto", "08", "Agosto"),
    ("septiembre", "09", "Septiembre"),
    ("octubre", "10", "Octubre"),
    ("noviembre", "11", "Noviembre"),
    ("diciembre", "12", "Diciembre"),
];

/// First Spanish long-form date in the text, formatted `DD/MM/YYYY` with a
/// zero-padded day.
pub fn full_date(text: &str) -> Option<String> {
    let caps = DATE_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_code(&caps[2].to_lowercase())?;
    Some(format!("{:02}/{}/{}", day, month, &caps[3]))
}

/// Display month name for a `DD/MM/YYYY` date. Returns `Desconocido` for the
/// not-found sentinel or anything malformed.
pub fn month_name(date: &str) -> &'static str {
    if date == DATE_NOT_FOUND {
        return MONTH_UNKNOWN;
    }
    let Some(code) = date.split('/').nth(1) else {
        return MONTH_UNKNOWN;
    };
    MONTHS
        .iter()
        .find(|(_, c, _)| *c == code)
        .map(|(_, _, n)| *n)
        .unwrap_or(MONTH_UNKNOWN)
}

fn month_code(name: &str) -> Option<&'static str> {
    MONTHS.iter().find(|(n, _, _)| *n == name).map(|(_, c, _)| *c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_form_date() {
        let text = "Bogotá D.C., 5 de enero 2025\nAlerta No. 001-2025";
        assert_eq!(full_date(text).as_deref(), Some("05/01/2025"));
    }

    #[test]
    fn date_without_de() {
        assert_eq!(full_date("emitida el 12 marzo 2024").as_deref(), Some("12/03/2024"));
    }

    #[test]
    fn case_insensitive_month() {
        assert_eq!(full_date("28 de Febrero 2025").as_deref(), Some("28/02/2025"));
    }

    #[test]
    fn first_match_wins() {
        let text = "3 de abril 2025 ... 9 de mayo 2025";
        assert_eq!(full_date(text).as_deref(), Some("03/04/2025"));
    }

    #[test]
    fn no_date() {
        assert_eq!(full_date("sin fecha alguna"), None);
    }

    #[test]
    fn month_name_round_trip() {
        for day in [1, 9, 28] {
            let date = full_date(&format!("{} de febrero 2031", day)).unwrap();
            assert_eq!(month_name(&date), "Febrero");
        }
    }

    #[test]
    fn month_name_sentinel() {
        assert_eq!(month_name(DATE_NOT_FOUND), MONTH_UNKNOWN);
    }

    #[test]
    fn month_name_malformed() {
        assert_eq!(month_name("2025-01-05"), MONTH_UNKNOWN);
        assert_eq!(month_name(""), MONTH_UNKNOWN);
        assert_eq!(month_name("05/13/2025"), MONTH_UNKNOWN);
    }
}
