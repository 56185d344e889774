use std::sync::LazyLock;

use regex::Regex;

use crate::cancel::CancellationToken;
use crate::document::PdfDocument;
use crate::error::ExtractError;
use crate::events::EventSink;
use crate::model::TableGrid;

/// Header substrings identifying the parcel table.
pub const KEY_COLUMNS: [&str; 4] = ["地段名稱", "地號", "面積", "繪製或檢討變更"];

/// Looser header test for continuation pages that repeat a partial header.
pub const CONTINUATION_KEYS: [&str; 3] = ["地段名稱", "地號", "繪製或檢討變更"];

/// Page text that marks the beginning of the listing when no table qualifies.
pub const START_MARKERS: [&str; 3] = ["第 1 頁", "公開展覽草案", "地籍資料版本"];

const MIN_HEADER_COLUMNS: usize = 7;
const MIN_KEY_MATCHES: usize = 2;
const MIN_SAMPLE_COLUMNS: usize = 6;

static LOT_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{4}").expect("hardcoded lot code regex is valid"));

/// Whether `table` looks like the cadastral parcel listing.
#[must_use]
pub fn is_target_table(table: &TableGrid) -> bool {
    if table.len() < 2 {
        return false;
    }

    let header = &table.rows[0];
    if header.len() >= MIN_HEADER_COLUMNS {
        let header_text = header
            .iter()
            .map(|cell| cell.trim())
            .collect::<Vec<_>>()
            .join(" ");
        let matches = KEY_COLUMNS
            .iter()
            .filter(|key| header_text.contains(*key))
            .count();
        if matches >= MIN_KEY_MATCHES {
            return true;
        }
    }

    table.rows[1..]
        .iter()
        .take(2)
        .filter(|row| row.len() >= MIN_SAMPLE_COLUMNS)
        .flatten()
        .any(|cell| LOT_CODE_RE.is_match(cell))
}

/// Target tables plus continuation tables whose header names a key column.
#[must_use]
pub fn is_relevant_table(table: &TableGrid) -> bool {
    if is_target_table(table) {
        return true;
    }
    table.len() >= 2
        && table.rows[0]
            .iter()
            .any(|cell| CONTINUATION_KEYS.iter().any(|key| cell.contains(key)))
}

#[must_use]
pub fn has_start_marker(text: &str) -> bool {
    START_MARKERS.iter().any(|marker| text.contains(marker))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocation {
    /// Zero-based page index where row extraction starts.
    pub start_page: usize,
    /// `false` when the start comes from a text marker or the default.
    pub found_table: bool,
}

/// Finds the first page holding the parcel table.
///
/// Falls back to the first page containing one of [`START_MARKERS`], and
/// finally to page 0. The marker fallback starts extraction even though no
/// qualifying table was seen, so such documents may still yield no rows.
///
/// Returns [`ExtractError::Cancelled`] if `token` fires between pages.
pub fn locate_table_start<D: PdfDocument + ?Sized>(
    document: &D,
    token: &CancellationToken,
    sink: &dyn EventSink,
) -> Result<TableLocation, ExtractError> {
    let page_count = document.page_count();

    for index in 0..page_count {
        token.check()?;
        let tables = document.page_tables(index)?;
        sink.debug(format!("檢查第 {} 頁，共 {} 個表格", index + 1, tables.len()));
        if tables.iter().any(is_target_table) {
            tracing::debug!(page = index + 1, tables = tables.len(), "target table found");
            sink.info(format!("在第 {} 頁找到目標表格", index + 1));
            return Ok(TableLocation {
                start_page: index,
                found_table: true,
            });
        }
    }

    for index in 0..page_count {
        token.check()?;
        if has_start_marker(&document.page_text(index)?) {
            tracing::warn!(page = index + 1, "no target table, starting at marker page");
            sink.info(format!("在第 {} 頁找到關鍵字", index + 1));
            sink.info("但未找到目標表格，將從此頁開始處理".to_string());
            return Ok(TableLocation {
                start_page: index,
                found_table: false,
            });
        }
    }

    tracing::warn!(pages = page_count, "no target table or marker found");
    sink.warn("警告：無法找到目標表格，將從第1頁開始處理".to_string());
    Ok(TableLocation {
        start_page: 0,
        found_table: false,
    })
}

#[cfg(test)]
mod tests {
    use super::{has_start_marker, is_relevant_table, is_target_table, locate_table_start};
    use crate::cancel::CancellationToken;
    use crate::document::MemoryDocument;
    use crate::events::{Event, EventLevel};
    use crate::model::{PageContent, TableGrid};

    const HEADER: [&str; 12] = [
        "直轄市縣市名稱",
        "鄉鎮市區",
        "地政事務所代碼",
        "地段代碼",
        "地段名稱",
        "地號",
        "面積",
        "繪製或檢討變更前 國土功能分區",
        "繪製或檢討變更前 使用地",
        "繪製或檢討變更後 國土功能分區",
        "繪製或檢討變更後 使用地",
        "備註",
    ];

    fn page(index: usize, text: &str, tables: Vec<TableGrid>) -> PageContent {
        PageContent {
            index,
            text: text.to_string(),
            tables,
        }
    }

    fn parcel_table() -> TableGrid {
        TableGrid::from_cells(&[
            &HEADER,
            &["臺中市", "北屯區", "HA", "0123", "大坑段", "0001-0000", "120.5"],
        ])
    }

    fn locate(document: &MemoryDocument) -> (super::TableLocation, Vec<Event>) {
        let (tx, rx) = crossbeam_channel::unbounded::<Event>();
        let location = locate_table_start(document, &CancellationToken::new(), &tx)
            .expect("locate should not be cancelled");
        (location, rx.try_iter().collect())
    }

    #[test]
    fn rejects_tables_with_fewer_than_two_rows() {
        assert!(!is_target_table(&TableGrid::default()));
        assert!(!is_target_table(&TableGrid::from_cells(&[&HEADER])));
    }

    #[test]
    fn accepts_header_with_two_key_columns() {
        let table = TableGrid::from_cells(&[
            &["a", "b", "c", "d", " 地段名稱 ", "地號", "g"],
            &["", "", "", "", "", "", ""],
        ]);
        assert!(is_target_table(&table));
    }

    #[test]
    fn one_key_column_is_not_enough_for_a_wide_header() {
        let table = TableGrid::from_cells(&[
            &["a", "b", "c", "d", "地段名稱", "f", "g"],
            &["x", "y", "", "", "", "", ""],
        ]);
        assert!(!is_target_table(&table));
    }

    #[test]
    fn narrow_header_falls_back_to_lot_code_in_sample_rows() {
        let table = TableGrid::from_cells(&[
            &["地段名稱", "地號"],
            &["臺中市", "北屯區", "HA", "0123", "大坑段", "0001-0000"],
        ]);
        assert!(is_target_table(&table));

        let short_row = TableGrid::from_cells(&[&["h"], &["0001-0000", "x"]]);
        assert!(!is_target_table(&short_row));
    }

    #[test]
    fn lot_code_beyond_third_row_is_ignored() {
        let filler = ["a", "b", "c", "d", "e", "f"];
        let table = TableGrid::from_cells(&[
            &["h"],
            &filler,
            &filler,
            &["a", "b", "c", "d", "e", "0001-0000"],
        ]);
        assert!(!is_target_table(&table));
    }

    #[test]
    fn continuation_header_is_relevant() {
        let table = TableGrid::from_cells(&[&["序號", "地號"], &["1", "12-3"]]);
        assert!(!is_target_table(&table));
        assert!(is_relevant_table(&table));
        assert!(!is_relevant_table(&TableGrid::from_cells(&[&["地號"]])));
        assert!(!is_relevant_table(&TableGrid::from_cells(&[&["名稱"], &["x"]])));
    }

    #[test]
    fn detects_start_markers() {
        assert!(has_start_marker("xx 第 1 頁 yy"));
        assert!(has_start_marker("地籍資料版本：112年"));
        assert!(!has_start_marker("第1頁"));
    }

    #[test]
    fn locates_first_page_with_target_table() {
        let document = MemoryDocument::new(vec![
            page(0, "第 1 頁", vec![]),
            page(1, "", vec![parcel_table()]),
            page(2, "", vec![parcel_table()]),
        ]);
        let (location, events) = locate(&document);
        assert_eq!(location.start_page, 1);
        assert!(location.found_table);
        let messages = events
            .iter()
            .filter(|event| event.level() != Some(EventLevel::Debug))
            .filter_map(Event::message)
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["在第 2 頁找到目標表格"]);
    }

    #[test]
    fn scanned_pages_are_reported_at_debug_level() {
        let document = MemoryDocument::new(vec![
            page(0, "", vec![]),
            page(1, "", vec![parcel_table(), TableGrid::default()]),
        ]);
        let (_, events) = locate(&document);
        let debug = events
            .iter()
            .filter(|event| event.level() == Some(EventLevel::Debug))
            .filter_map(Event::message)
            .collect::<Vec<_>>();
        assert_eq!(
            debug,
            vec!["檢查第 1 頁，共 0 個表格", "檢查第 2 頁，共 2 個表格"]
        );
    }

    #[test]
    fn marker_page_is_used_when_no_table_qualifies() {
        let document = MemoryDocument::new(vec![
            page(0, "封面", vec![]),
            page(1, "公開展覽草案", vec![]),
            page(2, "地籍資料版本", vec![]),
        ]);
        let (location, events) = locate(&document);
        assert_eq!(location.start_page, 1);
        assert!(!location.found_table);
        assert!(events.iter().all(|event| event.level() != Some(EventLevel::Warn)));
    }

    #[test]
    fn defaults_to_first_page_with_single_warning() {
        let document = MemoryDocument::new(vec![page(0, "a", vec![]), page(1, "b", vec![])]);
        let (location, events) = locate(&document);
        assert_eq!(location.start_page, 0);
        assert!(!location.found_table);
        let warnings = events
            .iter()
            .filter(|event| event.level() == Some(EventLevel::Warn))
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn cancelled_scan_reports_stop() {
        let document = MemoryDocument::new(vec![page(0, "", vec![parcel_table()])]);
        let token = CancellationToken::new();
        token.cancel();
        let (tx, _rx) = crossbeam_channel::unbounded::<Event>();
        let err = locate_table_start(&document, &token, &tx).expect_err("scan should stop");
        assert!(err.is_cancelled());
    }
}
