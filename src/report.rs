use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use crate::parser::extract::NOT_FOUND;

// Template layout (0-based; the template's own numbering is 1-based, so the
// column headers sit on row 5 and data starts on row 6).
const HEADER_ROW: u32 = 4;
const DATA_START_ROW: u32 = 5;
const FILL: Color = Color::RGB(0xA7C7E7);

const ORG_TITLE: &str = "HOSPITAL UNIVERSITARIO DEL VALLE \"EVARISTO GARCÍA\" E.S.E";
const REPORT_TITLE: &str = "PLANTILLA DE GESTIÓN Y REVISIÓN DE ALERTAS SANITARIAS";

pub const COLUMNS: [&str; 13] = [
    "Mes",
    "Fecha Completa",
    "Numero de alerta (codigo fuente)",
    "Fuente",
    "Tipo",
    "Dispositivo médico o equipo",
    "Tipo de dispositivo",
    "Registro INVIMA",
    "Descripción de la alerta Sanitaria o Informe de Seguridad",
    "Responsable de verificación",
    "Medio de socialización",
    "Aplicabilidad",
    "Soporte",
];

// Document-control cells above the table, (row, col, value).
const CONTROL_CELLS: [(u32, u16, &str); 14] = [
    (0, 7, "CÓDIGO:"),
    (0, 8, "2"),
    (1, 7, "VERSIÓN:"),
    (1, 8, "FOR-HUV-HUV-009"),
    (1, 9, "PÁGINA"),
    (1, 10, "1"),
    (1, 11, "DE"),
    (1, 12, "1"),
    (2, 9, "DÍA"),
    (2, 10, "MES"),
    (2, 11, "AÑO"),
    (3, 9, "5"),
    (3, 10, "9"),
    (3, 11, "2019"),
];

/// One row of the alert table. `alert_number` is the natural key for
/// deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRecord {
    pub month: String,
    pub full_date: String,
    pub alert_number: String,
    pub source: String,
    pub alert_type: String,
    pub device_name: String,
    pub device_category: String,
    pub registry_number: String,
    pub case_description: String,
    pub reviewer: String,
    pub channel: String,
    pub applicability: String,
    pub support: String,
}

impl AlertRecord {
    fn fields(&self) -> [&str; 13] {
        [
            &self.month,
            &self.full_date,
            &self.alert_number,
            &self.source,
            &self.alert_type,
            &self.device_name,
            &self.device_category,
            &self.registry_number,
            &self.case_description,
            &self.reviewer,
            &self.channel,
            &self.applicability,
            &self.support,
        ]
    }

    fn from_cells(cells: [String; 13]) -> Self {
        let [month, full_date, alert_number, source, alert_type, device_name, device_category, registry_number, case_description, reviewer, channel, applicability, support] =
            cells;
        Self {
            month,
            full_date,
            alert_number,
            source,
            alert_type,
            device_name,
            device_category,
            registry_number,
            case_description,
            reviewer,
            channel,
            applicability,
            support,
        }
    }
}

pub struct ReportStats {
    pub existing: usize,
    pub added: usize,
    pub total: usize,
}

/// Load existing data rows (below the branding block) from a report file.
pub fn load_existing(path: &Path) -> Result<Vec<AlertRecord>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open report {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Report {} has no worksheets", path.display()))?
        .with_context(|| format!("Failed to read report {}", path.display()))?;

    let Some((last_row, _)) = range.end() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for row in DATA_START_ROW..=last_row {
        let cells: [String; 13] =
            std::array::from_fn(|col| cell_to_string(range.get_value((row, col as u32))));
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        records.push(AlertRecord::from_cells(cells));
    }
    Ok(records)
}

fn cell_to_string(cell: Option<&Data>) -> String {
    match cell {
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Concatenate existing and fresh records, deduplicating by alert number
/// with the first occurrence kept: existing rows win over newly scraped
/// duplicates. Rows whose key is the not-found sentinel are only dropped
/// when the whole record is identical to one already kept.
pub fn merge(existing: Vec<AlertRecord>, fresh: Vec<AlertRecord>) -> Vec<AlertRecord> {
    let mut seen = std::collections::HashSet::new();
    let mut merged: Vec<AlertRecord> = Vec::new();
    for record in existing.into_iter().chain(fresh) {
        if record.alert_number == NOT_FOUND {
            if merged.iter().any(|kept| kept == &record) {
                continue;
            }
        } else if !seen.insert(record.alert_number.clone()) {
            continue;
        }
        merged.push(record);
    }
    merged
}

/// Write the full report: branding block, styled headers, then the data
/// region from the fixed offset. The branding block is reapplied on every
/// write, so the data-clearing rewrite can never clobber it.
pub fn write(path: &Path, records: &[AlertRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    let banner = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(FILL)
        .set_border(FormatBorder::Thin);
    let control = Format::new()
        .set_background_color(FILL)
        .set_border(FormatBorder::Thin);
    let grid = Format::new().set_border(FormatBorder::Thin);
    let header = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_border(FormatBorder::Thin);

    sheet.merge_range(0, 2, 1, 6, ORG_TITLE, &banner)?;
    sheet.merge_range(2, 2, 3, 6, REPORT_TITLE, &banner)?;
    sheet.merge_range(2, 7, 3, 8, "FECHA DE EMISIÓN", &control)?;
    for (row, col, value) in CONTROL_CELLS {
        sheet.write_with_format(row, col, value, &control)?;
    }
    // Border the rest of the branding block.
    for row in 0..HEADER_ROW {
        for col in 0..COLUMNS.len() as u16 {
            if !in_branding(row, col) {
                sheet.write_blank(row, col, &grid)?;
            }
        }
    }
    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_with_format(HEADER_ROW, col as u16, *name, &header)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = DATA_START_ROW + i as u32;
        for (col, value) in record.fields().iter().enumerate() {
            sheet.write(row, col as u16, *value)?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save report {}", path.display()))?;
    Ok(())
}

fn in_branding(row: u32, col: u16) -> bool {
    let merged = (row <= 1 && (2..=6).contains(&col))
        || ((2..=3).contains(&row) && (2..=8).contains(&col));
    merged || CONTROL_CELLS.iter().any(|&(r, c, _)| r == row && c == col)
}

/// Load-if-exists, merge, rewrite. Any load or save failure is fatal for the
/// run; there is no partial write.
pub fn update(path: &Path, fresh: Vec<AlertRecord>) -> Result<ReportStats> {
    let existing = if path.exists() {
        load_existing(path)?
    } else {
        Vec::new()
    };
    // A legacy or hand-edited file may carry duplicate keys itself; collapse
    // them first so the counts reflect only fresh rows.
    let existing = merge(existing, Vec::new());
    let existing_count = existing.len();
    let merged = merge(existing, fresh);
    let total = merged.len();
    write(path, &merged)?;
    Ok(ReportStats {
        existing: existing_count,
        added: total - existing_count,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: &str, device: &str) -> AlertRecord {
        AlertRecord {
            month: "Enero".into(),
            full_date: "05/01/2025".into(),
            alert_number: number.into(),
            source: "INVIMA".into(),
            alert_type: "Alerta".into(),
            device_name: device.into(),
            device_category: "Equipo biomédico".into(),
            registry_number: "2020DM-0001".into(),
            case_description: "Falla reportada.".into(),
            reviewer: " ".into(),
            channel: " ".into(),
            applicability: " ".into(),
            support: "pdfs/a.pdf".into(),
        }
    }

    #[test]
    fn merge_keeps_first_on_duplicate_key() {
        let existing = vec![record("001-2025", "Bomba vieja")];
        let fresh = vec![record("001-2025", "Bomba nueva"), record("002-2025", "Catéter")];
        let merged = merge(existing, fresh);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].device_name, "Bomba vieja");
        assert_eq!(merged[1].alert_number, "002-2025");
    }

    #[test]
    fn merge_is_idempotent() {
        let fresh = vec![record("001-2025", "Bomba"), record("002-2025", "Catéter")];
        let once = merge(Vec::new(), fresh.clone());
        let twice = merge(once.clone(), fresh);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_preserves_order() {
        let existing = vec![record("003-2025", "C"), record("001-2025", "A")];
        let fresh = vec![record("002-2025", "B")];
        let numbers: Vec<String> =
            merge(existing, fresh).into_iter().map(|r| r.alert_number).collect();
        assert_eq!(numbers, ["003-2025", "001-2025", "002-2025"]);
    }

    #[test]
    fn not_found_keys_stay_distinct() {
        let a = record(NOT_FOUND, "Bomba");
        let b = record(NOT_FOUND, "Catéter");
        let merged = merge(vec![a.clone()], vec![b, a.clone()]);
        // Distinct content kept, identical content dropped.
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn write_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alertas.xlsx");
        let records = vec![record("001-2025", "Bomba"), record("002-2025", "Catéter")];
        write(&path, &records).unwrap();
        assert_eq!(load_existing(&path).unwrap(), records);
    }

    #[test]
    fn update_with_no_new_records_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alertas.xlsx");
        let records = vec![record("001-2025", "Bomba")];
        write(&path, &records).unwrap();

        let stats = update(&path, Vec::new()).unwrap();
        assert_eq!(stats.existing, 1);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.total, 1);
        assert_eq!(load_existing(&path).unwrap(), records);
    }

    #[test]
    fn update_creates_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alertas.xlsx");
        let stats = update(&path, vec![record("001-2025", "Bomba")]).unwrap();
        assert_eq!(stats.existing, 0);
        assert_eq!(stats.total, 1);
        assert!(path.exists());
    }

    #[test]
    fn update_collapses_duplicate_rows_in_existing_file() {
        // A hand-edited or legacy file can hold duplicate keys; update must
        // collapse them and report the counts without failing.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alertas.xlsx");
        write(
            &path,
            &[record("001-2025", "Bomba vieja"), record("001-2025", "Bomba repetida")],
        )
        .unwrap();

        let stats = update(&path, Vec::new()).unwrap();
        assert_eq!(stats.existing, 1);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.total, 1);

        let rows = load_existing(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].device_name, "Bomba vieja");
    }

    #[test]
    fn update_reapplies_branding_block() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alertas.xlsx");
        write(&path, &[record("001-2025", "Bomba")]).unwrap();
        update(&path, vec![record("002-2025", "Catéter")]).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(cell_to_string(range.get_value((0, 2))), ORG_TITLE);
        assert_eq!(cell_to_string(range.get_value((2, 2))), REPORT_TITLE);
        assert_eq!(cell_to_string(range.get_value((0, 7))), "CÓDIGO:");
        assert_eq!(cell_to_string(range.get_value((1, 8))), "FOR-HUV-HUV-009");
        assert_eq!(cell_to_string(range.get_value((HEADER_ROW, 0))), "Mes");
    }

    #[test]
    fn update_existing_rows_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alertas.xlsx");
        write(&path, &[record("001-2025", "Bomba vieja")]).unwrap();

        update(&path, vec![record("001-2025", "Bomba nueva")]).unwrap();
        let rows = load_existing(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].device_name, "Bomba vieja");
    }
}
