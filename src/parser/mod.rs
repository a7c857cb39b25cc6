pub mod extract;

use std::path::Path;

use tracing::{info, warn};

use crate::classifier::DeviceClassifier;
use crate::pdf;
use crate::report::AlertRecord;
use extract::{alert, case, date, device, registry, NOT_FOUND};

/// Issuing authority, constant for every record.
pub const SOURCE_ORG: &str = "INVIMA";

// Columns left for manual review downstream.
const REVIEW_PLACEHOLDER: &str = " ";

/// Run every extractor over a document's text and assemble one record.
/// Extractors are independent; a field that fails to match degrades to its
/// sentinel without affecting the others.
pub fn extract_record(
    text: &str,
    source_file: &str,
    classifier: &DeviceClassifier,
) -> AlertRecord {
    let full_date = date::full_date(text).unwrap_or_else(|| date::DATE_NOT_FOUND.to_string());
    let month = date::month_name(&full_date).to_string();
    let (alert_type, alert_number) = alert::alert_info(text)
        .unwrap_or_else(|| (alert::TYPE_UNKNOWN.to_string(), NOT_FOUND.to_string()));
    let device_name =
        device::device_name(text).unwrap_or_else(|| device::UNSPECIFIED.to_string());
    let device_category = classifier.predict(&device_name);
    let registry_number =
        registry::registry_number(text).unwrap_or_else(|| NOT_FOUND.to_string());
    let case_description = case::case_description(text);

    AlertRecord {
        month,
        full_date,
        alert_number,
        source: SOURCE_ORG.to_string(),
        alert_type,
        device_name,
        device_category,
        registry_number,
        case_description,
        reviewer: REVIEW_PLACEHOLDER.to_string(),
        channel: REVIEW_PLACEHOLDER.to_string(),
        applicability: REVIEW_PLACEHOLDER.to_string(),
        support: source_file.to_string(),
    }
}

/// Read one downloaded PDF and assemble its record. A text-extraction
/// failure degrades every field to its sentinel; the batch keeps going.
pub fn process_document(path: &Path, classifier: &DeviceClassifier) -> AlertRecord {
    let source_file = path.display().to_string();
    match pdf::read_text(path) {
        Ok(text) => {
            let record = extract_record(&text, &source_file, classifier);
            info!(
                "{}: {} {} ({})",
                source_file, record.alert_type, record.alert_number, record.full_date
            );
            record
        }
        Err(e) => {
            warn!("{}", e);
            extract_record("", &source_file, classifier)
        }
    }
}
