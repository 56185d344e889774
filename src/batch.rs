use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::cancel::CancellationToken;
use crate::csv_out::{STATISTICS_CSV_FILE, write_statistics_csv};
use crate::document::DocumentSource;
use crate::error::ExtractError;
use crate::events::EventSink;
use crate::model::{BatchSummary, display_file_name, format_hms};
use crate::options::BatchOptions;
use crate::pipeline::process_document;

const BANNER: &str = "==================================================";

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
}

/// PDF files directly inside `input_dir`, sorted by file name.
pub fn find_pdf_files(input_dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        }
    }
    files.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    Ok(files)
}

#[allow(clippy::cast_precision_loss)]
fn percent(done: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

fn report_totals(summary: &BatchSummary, sink: &dyn EventSink) {
    sink.info(BANNER.to_string());
    if summary.cancelled {
        sink.warn("處理被使用者中斷!".to_string());
    } else {
        sink.info(format!(
            "處理完成! 成功轉換 {}/{} 個檔案",
            summary.succeeded, summary.files_found
        ));
    }
    sink.info(format!("總共提取 {} 筆資料", summary.total_records));
    sink.info(format!("總處理時間: {}", format_hms(summary.elapsed)));
    if summary.total_records > 0 {
        sink.info(format!(
            "平均每筆資料處理時間: {:.4} 秒",
            summary.average_seconds_per_record()
        ));
    }
    sink.info(BANNER.to_string());
}

/// Converts every PDF in the input folder, one document at a time.
///
/// Per-document failures are recorded in the summary and never stop the
/// loop. Cancellation is checked before each document; documents after the
/// stop are left unattempted. The statistics CSV is written whenever at
/// least one PDF was found.
pub fn process_batch<S: DocumentSource>(
    source: &S,
    options: &BatchOptions,
    token: &CancellationToken,
    sink: &dyn EventSink,
) -> Result<BatchSummary, ExtractError> {
    let started = Instant::now();
    fs::create_dir_all(&options.output_dir)?;

    let files = find_pdf_files(&options.input_dir)?;
    let mut summary = BatchSummary {
        files_found: files.len(),
        ..BatchSummary::default()
    };

    if files.is_empty() {
        sink.warn(format!("在 {} 中找不到PDF檔案", options.input_dir.display()));
        return Ok(summary);
    }

    let total = files.len();
    sink.info(format!("找到 {total} 個PDF檔案，開始處理..."));
    sink.progress(0.0);

    for (index, path) in files.iter().enumerate() {
        if token.is_cancelled() {
            tracing::info!(remaining = total - index, "batch cancelled");
            break;
        }

        sink.progress(percent(index, total));
        let file_name = display_file_name(path);
        sink.info(format!("正在處理 ({}/{total}): {file_name}", index + 1));

        let result = process_document(
            source,
            path,
            &options.output_dir,
            options.record_interval,
            token,
            sink,
        );
        tracing::debug!(
            file = %file_name,
            success = result.success,
            records = result.record_count,
            "document finished"
        );
        summary.push(result);
    }

    summary.elapsed = started.elapsed();
    summary.cancelled = token.is_cancelled();
    sink.progress(100.0);

    let statistics_csv = options.output_dir.join(STATISTICS_CSV_FILE);
    match write_statistics_csv(&statistics_csv, &summary.results) {
        Ok(()) => summary.statistics_csv = Some(statistics_csv),
        Err(error) => {
            tracing::warn!(%error, "writing statistics failed");
            sink.error(format!(
                "無法寫入處理統計信息 {}: {error}",
                statistics_csv.display()
            ));
        }
    }

    report_totals(&summary, sink);
    if let Some(path) = &summary.statistics_csv {
        sink.info(format!("處理統計信息已保存至: {}", path.display()));
    }

    Ok(summary)
}
