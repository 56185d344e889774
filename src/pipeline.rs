use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;
use crate::csv_out::{append_processing_log, write_parcel_csv};
use crate::document::{DocumentSource, PdfDocument};
use crate::error::ExtractError;
use crate::events::EventSink;
use crate::model::{DocumentOutcome, DocumentResult, ParcelRecord, average_seconds, format_hms};
use crate::options::RecordInterval;
use crate::rows::{ExtractItem, RowExtractor};
use crate::table_detect::locate_table_start;

/// Base name of the source document, used for the CSV and the log line.
#[must_use]
pub fn document_stem(path: &Path) -> String {
    path.file_stem().map_or_else(
        || path.display().to_string(),
        |stem| stem.to_string_lossy().into_owned(),
    )
}

#[must_use]
pub fn output_csv_path(path: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}.csv", document_stem(path)))
}

fn timing_summary(elapsed: Duration, count: usize) -> String {
    format!(
        "處理時間: {}，平均每筆: {:.4} 秒",
        format_hms(elapsed),
        average_seconds(elapsed, count)
    )
}

struct DocumentRun<'a> {
    path: &'a Path,
    output_dir: &'a Path,
    interval: RecordInterval,
    token: &'a CancellationToken,
    sink: &'a dyn EventSink,
    started: Instant,
    records: Vec<ParcelRecord>,
}

impl DocumentRun<'_> {
    fn extract<S: DocumentSource>(&mut self, source: &S) -> Result<(), ExtractError> {
        fs::create_dir_all(self.output_dir)?;

        let document = source.open(self.path)?;
        self.token.check()?;
        self.sink.debug(format!(
            "已開啟 {}，共 {} 頁",
            document_stem(self.path),
            document.page_count()
        ));

        let location = locate_table_start(&document, self.token, self.sink)?;
        self.sink.info(format!(
            "開始處理 {} 從第 {} 頁開始...",
            document_stem(self.path),
            location.start_page + 1
        ));

        let extractor =
            RowExtractor::new(&document, location.start_page, self.interval, self.token)
                .started_at(self.started);
        for item in extractor {
            match item? {
                ExtractItem::Record(record) => self.records.push(record),
                ExtractItem::Progress(progress) => self.sink.info(format!(
                    "已處理 {} 筆資料，耗時: {}，平均每筆: {:.4} 秒",
                    progress.count,
                    format_hms(progress.elapsed),
                    progress.average_seconds_per_record()
                )),
            }
        }

        // A stop after the last record still discards the document.
        self.token.check()
    }

    fn write_outputs(&self) -> Result<PathBuf, ExtractError> {
        let csv_path = output_csv_path(self.path, self.output_dir);
        write_parcel_csv(&csv_path, &self.records)?;

        let count = self.records.len();
        let elapsed = self.started.elapsed();
        self.sink.info(format!(
            "成功將 {} 轉換為 {}，共提取 {} 筆資料",
            self.path.display(),
            csv_path.display(),
            count
        ));
        self.sink.info(format!(
            "總處理時間: {}，平均每筆: {:.4} 秒",
            format_hms(elapsed),
            average_seconds(elapsed, count)
        ));

        append_processing_log(
            self.output_dir,
            &format!(
                "{}: 提取 {} 筆資料，{}",
                document_stem(self.path),
                count,
                timing_summary(elapsed, count)
            ),
        )?;

        Ok(csv_path)
    }

    fn fail(&self, error: &ExtractError) -> DocumentOutcome {
        tracing::warn!(path = %self.path.display(), %error, "document failed");
        let path = self.path.display();
        self.sink.error(format!("處理 {path} 時發生錯誤: {error}"));
        DocumentOutcome::Failed(error.to_string())
    }
}

/// Runs locate → extract → write for one document.
///
/// Never fails: errors, cancellation and empty documents all come back as an
/// unsuccessful [`DocumentResult`] carrying the partial count and elapsed
/// time. A cancelled document writes neither its CSV nor a log line.
pub fn process_document<S: DocumentSource>(
    source: &S,
    path: &Path,
    output_dir: &Path,
    interval: RecordInterval,
    token: &CancellationToken,
    sink: &dyn EventSink,
) -> DocumentResult {
    let mut run = DocumentRun {
        path,
        output_dir,
        interval,
        token,
        sink,
        started: Instant::now(),
        records: Vec::new(),
    };

    let outcome = match run.extract(source) {
        Err(ExtractError::Cancelled) => {
            tracing::info!(
                path = %path.display(),
                records = run.records.len(),
                "document cancelled"
            );
            sink.warn(format!("處理 {} 被使用者中斷", path.display()));
            DocumentOutcome::Cancelled
        }
        Err(error) => run.fail(&error),
        Ok(()) if run.records.is_empty() => {
            sink.warn(format!("警告: 無法從 {} 提取表格數據", path.display()));
            DocumentOutcome::NoRecords
        }
        Ok(()) => match run.write_outputs() {
            Ok(csv_path) => DocumentOutcome::Written { csv_path },
            Err(error) => run.fail(&error),
        },
    };

    DocumentResult::new(path, run.records.len(), run.started.elapsed(), outcome)
}
