use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;

use crate::error::ExtractError;
use crate::model::{DocumentResult, PARCEL_COLUMNS, ParcelRecord};

pub const PROCESSING_LOG_FILE: &str = "processing_log.txt";
pub const STATISTICS_CSV_FILE: &str = "processing_statistics.csv";

pub const STATISTICS_COLUMNS: [&str; 5] = [
    "檔案名稱",
    "成功處理",
    "記錄數",
    "處理時間(秒)",
    "平均每筆時間(秒)",
];

/// Spreadsheet tools only detect UTF-8 CSV reliably with a byte-order mark.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn create_with_bom(path: &Path) -> Result<File, ExtractError> {
    let mut file = File::create(path)?;
    file.write_all(UTF8_BOM)?;
    Ok(file)
}

fn write_rows<T: Serialize>(
    path: &Path,
    headers: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(create_with_bom(path)?);
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_parcel_csv(path: &Path, records: &[ParcelRecord]) -> Result<(), ExtractError> {
    write_rows(path, &PARCEL_COLUMNS, records)
}

#[derive(Debug, Serialize)]
struct StatisticsRow {
    file_name: String,
    success: &'static str,
    record_count: usize,
    seconds: String,
    average_seconds: String,
}

impl From<&DocumentResult> for StatisticsRow {
    fn from(result: &DocumentResult) -> Self {
        Self {
            file_name: result.file_name(),
            success: if result.success { "True" } else { "False" },
            record_count: result.record_count,
            seconds: format!("{:.4}", result.elapsed.as_secs_f64()),
            average_seconds: format!("{:.4}", result.average_seconds_per_record()),
        }
    }
}

/// Overwrites the batch statistics file with one row per attempted document.
pub fn write_statistics_csv(path: &Path, results: &[DocumentResult]) -> Result<(), ExtractError> {
    write_rows(
        path,
        &STATISTICS_COLUMNS,
        results.iter().map(StatisticsRow::from),
    )
}

pub fn append_processing_log(output_dir: &Path, line: &str) -> Result<(), ExtractError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_dir.join(PROCESSING_LOG_FILE))?;
    writeln!(file, "{line}")?;
    Ok(())
}
