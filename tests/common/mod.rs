#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;

use cadastral_pdf_csv::{
    CancellationToken, DocumentSource, Event, EventSink, ExtractError, MemoryDocument, PageContent,
    TableGrid,
};
use crossbeam_channel::Sender;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

type FixtureResult<T> = Result<T, Box<dyn std::error::Error>>;

/// ASCII stand-in for the twelve parcel columns; the built-in Courier font
/// cannot render the Chinese headers.
pub const ASCII_PARCEL_HEADER: [&str; 12] = [
    "City", "Dist", "Office", "Code", "Section", "Lot", "Area", "ZoneA", "UseA", "ZoneB", "UseB",
    "Note",
];

/// Writes a small text-only PDF page by page, each line shown with `Tj`.
pub struct FixturePdf {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    page_ids: Vec<ObjectId>,
}

impl FixturePdf {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        Self {
            doc,
            pages_id,
            font_id,
            page_ids: Vec::new(),
        }
    }

    pub fn text_page(mut self, lines: &[&str]) -> FixtureResult<Self> {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 8.into()]),
            Operation::new("TL", vec![12.into()]),
            Operation::new("Td", vec![20.into(), 800.into()]),
        ];
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let stream = Stream::new(dictionary! {}, Content { operations }.encode()?);
        let content_id = self.doc.add_object(stream);
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        Ok(self)
    }

    /// A page holding the ASCII parcel header and `rows`, cells two spaces apart.
    pub fn parcel_page(self, rows: &[[&str; 12]]) -> FixtureResult<Self> {
        let lines = std::iter::once(&ASCII_PARCEL_HEADER)
            .chain(rows)
            .map(|cells| cells.join("  "))
            .collect::<Vec<_>>();
        self.text_page(&lines.iter().map(String::as_str).collect::<Vec<_>>())
    }

    pub fn save(mut self, path: &Path) -> FixtureResult<()> {
        let kids = self
            .page_ids
            .iter()
            .map(|id| Object::Reference(*id))
            .collect::<Vec<_>>();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::try_from(self.page_ids.len())?,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => self.font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();
        self.doc.save(path)?;
        Ok(())
    }
}

/// Empty placeholder files; `MemorySource` never reads them.
pub fn touch_pdfs(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"%PDF-1.5").expect("placeholder PDF should be written");
    }
}

pub fn parcel_header() -> Vec<&'static str> {
    vec![
        "縣市", "鄉鎮市區", "地政事務所", "段代碼", "地段名稱", "地號", "面積", "原分區",
        "原用地", "新分區", "新用地", "備註",
    ]
}

pub fn parcel_row(lot: &'static str, area: &'static str) -> Vec<&'static str> {
    vec![
        "臺中市", "北屯區", "HA", "0305", "大坑段", lot, area, "農業區", "農牧用地", "城2-3",
        "農牧用地", "",
    ]
}

pub fn grid(rows: &[Vec<&str>]) -> TableGrid {
    TableGrid::new(
        rows.iter()
            .map(|row| row.iter().map(|cell| (*cell).to_string()).collect())
            .collect(),
    )
}

pub fn page(index: usize, text: &str, tables: Vec<TableGrid>) -> PageContent {
    PageContent {
        index,
        text: text.to_string(),
        tables,
    }
}

/// A document whose single table on the second page holds `lots.len()` parcels.
pub fn parcel_document(lots: &[&'static str]) -> MemoryDocument {
    let mut rows = vec![parcel_header()];
    rows.extend(lots.iter().map(|lot| parcel_row(lot, "1,024.5")));
    MemoryDocument::new(vec![
        page(0, "國土計畫 臺中市 北屯區", Vec::new()),
        page(1, "臺中市 北屯區 地籍清冊", vec![grid(&rows)]),
    ])
}

/// Serves fixture documents by file name.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: HashMap<String, MemoryDocument>,
    broken: HashSet<String>,
}

impl MemorySource {
    pub fn with_document(mut self, name: &str, document: MemoryDocument) -> Self {
        self.documents.insert(name.to_string(), document);
        self
    }

    pub fn with_broken(mut self, name: &str) -> Self {
        self.broken.insert(name.to_string());
        self
    }
}

impl DocumentSource for MemorySource {
    type Document = MemoryDocument;

    fn open(&self, path: &Path) -> Result<MemoryDocument, ExtractError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.broken.contains(&name) {
            return Err(ExtractError::PdfExtract(format!("{name} is damaged")));
        }
        self.documents
            .get(&name)
            .cloned()
            .ok_or_else(|| ExtractError::PdfExtract(format!("no fixture for {name}")))
    }
}

/// Forwards events and cancels the run once a message containing `trigger`
/// has been emitted.
pub struct CancelOnMessage {
    pub events: Sender<Event>,
    pub token: CancellationToken,
    pub trigger: &'static str,
}

impl EventSink for CancelOnMessage {
    fn emit(&self, event: Event) {
        if event
            .message()
            .is_some_and(|message| message.contains(self.trigger))
        {
            self.token.cancel();
        }
        let _ = self.events.send(event);
    }
}

pub fn messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| event.message().map(str::to_string))
        .collect()
}
