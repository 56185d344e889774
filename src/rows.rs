use std::collections::VecDeque;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::area::normalize_area;
use crate::cancel::CancellationToken;
use crate::document::PdfDocument;
use crate::error::ExtractError;
use crate::model::{PageContent, ParcelRecord, average_seconds};
use crate::options::RecordInterval;
use crate::region::RegionHints;
use crate::table_detect::is_relevant_table;

pub const PARCEL_WIDTH: usize = 12;

const SECTION_NAME_COL: usize = 4;
const LOT_NUMBER_COL: usize = 5;

static LOT_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+-\d+").expect("hardcoded lot number regex is valid"));

#[must_use]
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(String::is_empty)
}

/// A data row carries either a `dddd-dddd` style lot number or a section name.
#[must_use]
pub fn is_parcel_row(row: &[String]) -> bool {
    let lot_number = row.get(LOT_NUMBER_COL).map_or("", String::as_str);
    let section_name = row.get(SECTION_NAME_COL).map_or("", String::as_str);
    LOT_NUMBER_RE.is_match(lot_number) || !section_name.is_empty()
}

/// Maps a source row onto the fixed 12-column schema. Missing cells become
/// empty strings; empty city/district cells take the page-level hints.
#[must_use]
pub fn parcel_from_row(row: &[String], hints: &RegionHints) -> ParcelRecord {
    let cell = |index: usize| row.get(index).cloned().unwrap_or_default();
    let or_hint = |index: usize, hint: &str| {
        let value = cell(index);
        if value.is_empty() { hint.to_string() } else { value }
    };

    ParcelRecord {
        city: or_hint(0, &hints.city),
        district: or_hint(1, &hints.district),
        land_office_code: cell(2),
        section_code: cell(3),
        section_name: cell(4),
        lot_number: cell(5),
        area: normalize_area(&cell(6)),
        zoning_before: cell(7),
        land_use_before: cell(8),
        zoning_after: cell(9),
        land_use_after: cell(10),
        remarks: cell(11),
    }
}

/// All parcel records found on one page, in table and row order.
#[must_use]
pub fn extract_page_records(page: &PageContent) -> Vec<ParcelRecord> {
    let hints = RegionHints::from_page_text(&page.text);
    let mut records = Vec::new();

    for table in page.tables.iter().filter(|table| is_relevant_table(table)) {
        for row in table.rows.iter().skip(1) {
            if is_blank_row(row) {
                continue;
            }

            let mut padded = row.clone();
            if padded.len() < PARCEL_WIDTH {
                padded.resize(PARCEL_WIDTH, String::new());
            }

            if is_parcel_row(&padded) {
                records.push(parcel_from_row(&padded, &hints));
            }
        }
    }

    tracing::debug!(page = page.index + 1, records = records.len(), "page rows extracted");
    records
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractProgress {
    pub count: usize,
    pub elapsed: Duration,
}

impl ExtractProgress {
    #[must_use]
    pub fn average_seconds_per_record(&self) -> f64 {
        average_seconds(self.elapsed, self.count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractItem {
    Record(ParcelRecord),
    Progress(ExtractProgress),
}

/// Streams parcel records from `start_page` to the end of the document.
///
/// A progress item follows every record whose running count is a multiple of
/// the record interval. The stream ends after the first error, including
/// [`ExtractError::Cancelled`], which is checked before every page and before
/// every record.
pub struct RowExtractor<'a, D: PdfDocument + ?Sized> {
    document: &'a D,
    token: &'a CancellationToken,
    interval: RecordInterval,
    started: Instant,
    next_page: usize,
    pending: VecDeque<ParcelRecord>,
    count: usize,
    progress_due: bool,
    finished: bool,
}

impl<'a, D: PdfDocument + ?Sized> RowExtractor<'a, D> {
    #[must_use]
    pub fn new(
        document: &'a D,
        start_page: usize,
        interval: RecordInterval,
        token: &'a CancellationToken,
    ) -> Self {
        Self {
            document,
            token,
            interval,
            started: Instant::now(),
            next_page: start_page,
            pending: VecDeque::new(),
            count: 0,
            progress_due: false,
            finished: false,
        }
    }

    /// Measures progress from `started` instead of construction time.
    #[must_use]
    pub fn started_at(mut self, started: Instant) -> Self {
        self.started = started;
        self
    }

    /// Records yielded so far.
    #[must_use]
    pub fn records_emitted(&self) -> usize {
        self.count
    }

    fn fail(&mut self, error: ExtractError) -> Option<Result<ExtractItem, ExtractError>> {
        self.finished = true;
        self.pending.clear();
        Some(Err(error))
    }
}

impl<D: PdfDocument + ?Sized> Iterator for RowExtractor<'_, D> {
    type Item = Result<ExtractItem, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.progress_due {
            self.progress_due = false;
            return Some(Ok(ExtractItem::Progress(ExtractProgress {
                count: self.count,
                elapsed: self.started.elapsed(),
            })));
        }

        loop {
            if let Some(record) = self.pending.pop_front() {
                if let Err(error) = self.token.check() {
                    return self.fail(error);
                }
                self.count += 1;
                self.progress_due = self.interval.is_due(self.count);
                return Some(Ok(ExtractItem::Record(record)));
            }

            if self.next_page >= self.document.page_count() {
                self.finished = true;
                return None;
            }

            if let Err(error) = self.token.check() {
                return self.fail(error);
            }

            match self.document.page(self.next_page) {
                Ok(page) => self.pending.extend(extract_page_records(&page)),
                Err(error) => return self.fail(error),
            }
            self.next_page += 1;
        }
    }
}
