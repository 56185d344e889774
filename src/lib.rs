mod area;
mod batch;
mod cancel;
mod csv_out;
mod document;
mod error;
mod events;
mod model;
mod options;
mod pdf_reader;
mod pipeline;
mod region;
mod rows;
mod table_detect;
mod table_parse;

pub use area::normalize_area;
pub use batch::{find_pdf_files, process_batch};
pub use cancel::CancellationToken;
pub use csv_out::{
    PROCESSING_LOG_FILE, STATISTICS_COLUMNS, STATISTICS_CSV_FILE, append_processing_log,
    write_parcel_csv, write_statistics_csv,
};
pub use document::{DocumentSource, MemoryDocument, PdfDocument};
pub use error::{ConfigError, ExtractError};
pub use events::{Event, EventKind, EventLevel, EventSink};
pub use model::{
    BatchSummary, DocumentOutcome, DocumentResult, PARCEL_COLUMNS, PageContent, ParcelRecord,
    TableGrid, average_seconds, display_file_name, format_hms,
};
pub use options::{BatchOptions, DEFAULT_RECORD_INTERVAL, RecordInterval};
pub use pdf_reader::{PdfFile, PdfFileSource};
pub use pipeline::{document_stem, output_csv_path, process_document};
pub use region::{RegionHints, UNKNOWN_CITY, UNKNOWN_DISTRICT, infer_city, infer_district};
pub use rows::{
    ExtractItem, ExtractProgress, PARCEL_WIDTH, RowExtractor, extract_page_records, is_blank_row,
    is_parcel_row, parcel_from_row,
};
pub use table_detect::{
    CONTINUATION_KEYS, KEY_COLUMNS, START_MARKERS, TableLocation, has_start_marker,
    is_relevant_table, is_target_table, locate_table_start,
};
