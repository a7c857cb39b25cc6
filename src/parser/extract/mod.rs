pub mod alert;
pub mod case;
pub mod date;
pub mod device;
pub mod registry;

/// Shared sentinel for fields whose pattern never matched.
pub const NOT_FOUND: &str = "No encontrado";

/// Marker distinguishing safety reports from alerts. Several extractors
/// branch on its presence in the document text.
pub const SAFETY_REPORT_MARKER: &str = "Informe de Seguridad";
