//! Corpus loading and cell normalization.

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// A course as handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub organization: String,
    pub certificate_type: String,
    pub rating: f64,
    pub difficulty: String,
    pub students_enrolled: f64,
}

impl CatalogItem {
    /// Text blob used only for vectorization.
    pub fn composite_text(&self) -> String {
        format!("{} {} {} {}", self.title, self.organization, self.certificate_type, self.difficulty)
    }
}

/// Canonical fields a source column can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Title,
    Organization,
    CertificateType,
    Difficulty,
    Rating,
    StudentsEnrolled,
}

fn canonical_field(column: &str) -> Option<Field> {
    match column {
        "course_title" => Some(Field::Title),
        "course_organization" => Some(Field::Organization),
        "course_certificate_type" => Some(Field::CertificateType),
        "course_difficulty" => Some(Field::Difficulty),
        "course_rating" => Some(Field::Rating),
        "course_students_enrolled" => Some(Field::StudentsEnrolled),
        _ => None,
    }
}

const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool { MISSING_MARKERS.contains(&cell) }

fn text_cell(cell: Option<&str>) -> String {
    match cell {
        Some(c) if !is_missing(c) => c.to_string(),
        _ => String::new(),
    }
}

/// Parse an enrollment count such as "5.3k", "1.2M", "12,500" or "-". Anything unparseable is 0.0.
pub fn parse_enrollment(raw: &str) -> f64 {
    let s = raw.trim().to_lowercase().replace(',', "");
    let parsed = if let Some(num) = s.strip_suffix('k') {
        num.trim().parse::<f64>().map(|v| v * 1_000.0)
    } else if let Some(num) = s.strip_suffix('m') {
        num.trim().parse::<f64>().map(|v| v * 1_000_000.0)
    } else if matches!(s.as_str(), "" | "-" | "n/a" | "none") {
        Ok(0.0)
    } else {
        s.parse::<f64>()
    };
    match parsed {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            tracing::trace!(cell = raw, "unparseable enrollment count");
            0.0
        }
    }
}

/// Coerce a rating cell to a number; missing or unparseable is 0.0.
pub fn parse_rating(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            if !is_missing(raw.trim()) {
                tracing::trace!(cell = raw, "unparseable rating");
            }
            0.0
        }
    }
}

/// Load catalog rows from a CSV file on disk.
pub fn load_items<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogItem>, LoadError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let not_found = |source: io::Error| LoadError::SourceNotFound { path: display.clone(), source };
    let meta = std::fs::metadata(path).map_err(not_found)?;
    if !meta.is_file() {
        return Err(not_found(io::Error::other("not a regular file")));
    }
    let file = File::open(path).map_err(not_found)?;
    read_items(file, &display)
}

/// Load catalog rows from any CSV reader. `origin` names the source in errors.
pub fn read_items<R: Read>(reader: R, origin: &str) -> Result<Vec<CatalogItem>, LoadError> {
    let unparseable = |reason: String| LoadError::SourceUnparseable { path: origin.to_string(), reason };

    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().map_err(|e| unparseable(e.to_string()))?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(unparseable("no header row".into()));
    }

    // First occurrence wins when two source columns normalize to the same name.
    let mut columns: HashMap<Field, usize> = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        if let Some(field) = canonical_field(&name.trim().to_lowercase()) {
            columns.entry(field).or_insert(idx);
        }
    }

    let mut items = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| unparseable(e.to_string()))?;
        if record.len() > headers.len() {
            return Err(unparseable(format!(
                "row {} has {} fields, header has {}",
                row + 1,
                record.len(),
                headers.len()
            )));
        }
        let cell = |field: Field| columns.get(&field).and_then(|&idx| record.get(idx));
        items.push(CatalogItem {
            title: text_cell(cell(Field::Title)),
            organization: text_cell(cell(Field::Organization)),
            certificate_type: text_cell(cell(Field::CertificateType)),
            rating: cell(Field::Rating).map(parse_rating).unwrap_or(0.0),
            difficulty: text_cell(cell(Field::Difficulty)),
            students_enrolled: cell(Field::StudentsEnrolled).map(parse_enrollment).unwrap_or(0.0),
        });
    }
    tracing::debug!(origin, rows = items.len(), mapped_columns = columns.len(), "corpus read");
    Ok(items)
}
