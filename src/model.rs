use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

/// Output column names, in CSV order.
pub const PARCEL_COLUMNS: [&str; 12] = [
    "直轄市縣市名稱",
    "鄉鎮市區",
    "地政事務所代碼",
    "地段代碼",
    "地段名稱",
    "地號",
    "面積",
    "繪製或檢討變更前_國土功能分區及其分類",
    "繪製或檢討變更前_使用地編定類別",
    "繪製或檢討變更後_國土功能分區及其分類",
    "繪製或檢討變更後_使用地編定類別",
    "備註",
];

/// A grid of cell strings as returned by the page table extractor.
/// Rows may be ragged; an absent cell is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    #[must_use]
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn from_cells(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
                .collect(),
        )
    }

    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub index: usize,
    pub text: String,
    pub tables: Vec<TableGrid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParcelRecord {
    #[serde(rename = "直轄市縣市名稱")]
    pub city: String,
    #[serde(rename = "鄉鎮市區")]
    pub district: String,
    #[serde(rename = "地政事務所代碼")]
    pub land_office_code: String,
    #[serde(rename = "地段代碼")]
    pub section_code: String,
    #[serde(rename = "地段名稱")]
    pub section_name: String,
    #[serde(rename = "地號")]
    pub lot_number: String,
    #[serde(rename = "面積")]
    pub area: String,
    #[serde(rename = "繪製或檢討變更前_國土功能分區及其分類")]
    pub zoning_before: String,
    #[serde(rename = "繪製或檢討變更前_使用地編定類別")]
    pub land_use_before: String,
    #[serde(rename = "繪製或檢討變更後_國土功能分區及其分類")]
    pub zoning_after: String,
    #[serde(rename = "繪製或檢討變更後_使用地編定類別")]
    pub land_use_after: String,
    #[serde(rename = "備註")]
    pub remarks: String,
}

impl ParcelRecord {
    #[must_use]
    pub fn fields(&self) -> [&str; 12] {
        [
            self.city.as_str(),
            self.district.as_str(),
            self.land_office_code.as_str(),
            self.section_code.as_str(),
            self.section_name.as_str(),
            self.lot_number.as_str(),
            self.area.as_str(),
            self.zoning_before.as_str(),
            self.land_use_before.as_str(),
            self.zoning_after.as_str(),
            self.land_use_after.as_str(),
            self.remarks.as_str(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Written { csv_path: PathBuf },
    NoRecords,
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub success: bool,
    pub record_count: usize,
    pub elapsed: Duration,
    pub outcome: DocumentOutcome,
}

impl DocumentResult {
    #[must_use]
    pub fn new(
        path: &Path,
        record_count: usize,
        elapsed: Duration,
        outcome: DocumentOutcome,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            success: matches!(outcome, DocumentOutcome::Written { .. }),
            record_count,
            elapsed,
            outcome,
        }
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        display_file_name(&self.path)
    }

    #[must_use]
    pub fn average_seconds_per_record(&self) -> f64 {
        average_seconds(self.elapsed, self.record_count)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.outcome == DocumentOutcome::Cancelled
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub results: Vec<DocumentResult>,
    pub files_found: usize,
    pub succeeded: usize,
    pub total_records: usize,
    pub elapsed: Duration,
    pub cancelled: bool,
    pub statistics_csv: Option<PathBuf>,
}

impl BatchSummary {
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Only successful documents contribute to the record total.
    pub fn push(&mut self, result: DocumentResult) {
        if result.success {
            self.succeeded += 1;
            self.total_records += result.record_count;
        }
        self.results.push(result);
    }

    #[must_use]
    pub fn average_seconds_per_record(&self) -> f64 {
        average_seconds(self.elapsed, self.total_records)
    }
}

/// Final path component, or the whole path when there is none.
#[must_use]
pub fn display_file_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_seconds(elapsed: Duration, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        elapsed.as_secs_f64() / count as f64
    }
}

/// Renders whole elapsed seconds as `H:MM:SS`.
#[must_use]
pub fn format_hms(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
