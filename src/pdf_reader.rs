use std::collections::BTreeMap;
use std::panic;
use std::path::Path;

use encoding_rs::{BIG5, UTF_16BE};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};

use crate::document::{DocumentSource, PdfDocument};
use crate::error::ExtractError;
use crate::model::TableGrid;
use crate::table_parse::{grids_from_text, split_line_into_cells, split_words};

const FORM_FEED: char = '\u{000C}';
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_ENCODING_HINTS: [&str; 4] = ["utf16", "ucs2", "identity-h", "unicode"];
const BIG5_ENCODING_HINTS: [&str; 4] = ["big5", "b5", "eten", "cns"];
const GARBLED_PENALTY: i64 = 800;

/// `pdf-extract` separates pages with form feeds and ends with one.
fn split_form_feeds(text: &str) -> Vec<&str> {
    text.strip_suffix(FORM_FEED)
        .unwrap_or(text)
        .split(FORM_FEED)
        .collect()
}

#[derive(Debug, Default)]
struct GlyphStats {
    total: usize,
    replacement: usize,
    control: usize,
    cjk: usize,
    cjk_ext_a: usize,
}

impl GlyphStats {
    fn of(text: &str) -> Self {
        let mut stats = Self::default();
        for ch in text.chars() {
            stats.total += 1;
            match ch {
                '\u{FFFD}' => stats.replacement += 1,
                '\n' | '\r' | '\t' => {}
                '\u{3400}'..='\u{4DBF}' => {
                    stats.cjk += 1;
                    stats.cjk_ext_a += 1;
                }
                '\u{4E00}'..='\u{9FFF}' => stats.cjk += 1,
                _ if ch.is_control() => stats.control += 1,
                _ => {}
            }
        }
        stats
    }

    /// Mostly replacement or control characters, or Han text dominated by
    /// rare Extension A glyphs, which is what a wrong CMap produces.
    fn looks_garbled(&self) -> bool {
        self.replacement * 8 > self.total
            || self.control * 5 > self.total
            || (self.cjk > 20 && self.cjk_ext_a * 4 > self.cjk)
    }
}

fn is_garbled(text: &str) -> bool {
    text.contains("?Identity-H Unimplemented?") || GlyphStats::of(text).looks_garbled()
}

fn decode_utf16be(bytes: &[u8]) -> Option<String> {
    let (text, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

fn decode_big5(bytes: &[u8]) -> Option<String> {
    let (text, _, had_errors) = BIG5.decode(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

fn hint_matches(encoding_hint: &str, hints: &[&str]) -> bool {
    hints.iter().any(|hint| encoding_hint.contains(hint))
}

fn fallback_decode(encoding_hint: &str, bytes: &[u8]) -> Option<String> {
    if let Some(body) = bytes
        .strip_prefix(&UTF16_BE_BOM)
        .or_else(|| bytes.strip_prefix(&UTF16_LE_BOM))
    {
        if let Some(text) = decode_utf16be(body) {
            return Some(text);
        }
    }
    if hint_matches(encoding_hint, &UTF16_ENCODING_HINTS) {
        if let Some(text) = decode_utf16be(bytes) {
            return Some(text);
        }
    }
    if hint_matches(encoding_hint, &BIG5_ENCODING_HINTS) {
        return decode_big5(bytes);
    }
    None
}

/// Decodes a content-stream string with the font's encoding, retrying as
/// UTF-16 or Big5 when the result looks garbled. Local reports often embed
/// Big5 CMaps that lopdf does not map.
fn decode_pdf_string(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !is_garbled(&decoded) {
        return decoded;
    }

    let hint = encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    fallback_decode(&hint, bytes).unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

fn looks_tabular(line: &str) -> bool {
    split_line_into_cells(line).len() >= 2 || split_words(line).len() >= 3
}

fn looks_like_parcel(line: &str) -> bool {
    (line.contains('-') && line.bytes().any(|byte| byte.is_ascii_digit()))
        || line.contains("地號")
        || line.contains("地段")
}

/// Ranks decoding candidates for one page: tabular lines count most, then
/// parcel-like lines, then plain line count.
fn candidate_score(text: &str) -> i64 {
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    if lines.is_empty() {
        return i64::MIN / 4;
    }

    let tabular = lines.iter().filter(|line| looks_tabular(line)).count();
    let parcel_like = lines.iter().filter(|line| looks_like_parcel(line)).count();
    let score = i64::try_from(tabular * 50 + parcel_like * 15 + lines.len()).unwrap_or(i64::MAX);
    if is_garbled(text) {
        score - GARBLED_PENALTY
    } else {
        score
    }
}

fn best_candidate(candidates: Vec<String>) -> String {
    candidates
        .into_iter()
        .max_by_key(|text| candidate_score(text))
        .unwrap_or_default()
}

/// Rebuilds text lines from a page content stream, decoding each string with
/// the encoding of the font selected by the last `Tf`.
struct ContentText<'a> {
    encodings: BTreeMap<Vec<u8>, &'a str>,
    encoding: Option<&'a str>,
    lines: Vec<String>,
    line: String,
}

impl<'a> ContentText<'a> {
    fn new(encodings: BTreeMap<Vec<u8>, &'a str>) -> Self {
        Self {
            encodings,
            encoding: None,
            lines: Vec::new(),
            line: String::new(),
        }
    }

    fn push_operands(&mut self, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    let text = decode_pdf_string(self.encoding, bytes);
                    self.line.push_str(&text);
                }
                Object::Array(items) => {
                    self.push_operands(items);
                    self.line.push(' ');
                }
                // Large negative kerning inside TJ arrays is a visual gap.
                Object::Integer(offset) if *offset < -100 => self.line.push(' '),
                _ => {}
            }
        }
    }

    fn end_line(&mut self) {
        let line = std::mem::take(&mut self.line);
        if !line.trim().is_empty() {
            self.lines.push(line);
        }
    }

    fn apply(&mut self, operation: &Operation) {
        match operation.operator.as_str() {
            "Tf" => {
                let font = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok());
                if let Some(font) = font {
                    self.encoding = self.encodings.get(font).copied();
                }
            }
            "Tj" | "TJ" | "'" | "\"" => self.push_operands(&operation.operands),
            "T*" | "Td" | "TD" | "ET" => self.end_line(),
            _ => {}
        }
    }

    fn finish(mut self) -> Option<String> {
        self.end_line();
        (!self.lines.is_empty()).then(|| self.lines.join("\n"))
    }
}

fn page_content_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = Content::decode(&document.get_page_content(page_id).ok()?).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();

    let mut text = ContentText::new(encodings);
    for operation in &content.operations {
        text.apply(operation);
    }
    text.finish()
}

/// Whole-document text from `pdf-extract`, which panics on some malformed
/// font programs; a panic is treated like any other extraction failure.
fn pdf_extract_text(path: &Path) -> Option<String> {
    match panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(Ok(text)) => Some(text),
        Ok(Err(error)) => {
            tracing::debug!(path = %path.display(), %error, "pdf-extract failed");
            None
        }
        Err(_) => {
            tracing::warn!(path = %path.display(), "pdf-extract panicked");
            None
        }
    }
}

/// Decodes every page up front. Each page takes the best of up to three
/// candidates: the `pdf-extract` page, the raw content stream and lopdf's own
/// text extraction.
fn read_pdf_pages(path: &Path) -> Result<Vec<String>, ExtractError> {
    let document = Document::load(path)?;
    let page_ids = document.get_pages();

    let extracted = pdf_extract_text(path)
        .map(|text| {
            split_form_feeds(&text)
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|pages| pages.len() == page_ids.len());
    if extracted.is_none() {
        tracing::debug!(path = %path.display(), "no usable pdf-extract text, using lopdf only");
    }

    let pages = page_ids
        .iter()
        .enumerate()
        .map(|(index, (&number, &id))| {
            let candidates = [
                extracted.as_ref().and_then(|pages| pages.get(index).cloned()),
                page_content_text(&document, id),
                document.extract_text(&[number]).ok(),
            ]
            .into_iter()
            .flatten()
            .filter(|text| !text.trim().is_empty())
            .collect();
            best_candidate(candidates)
        })
        .collect::<Vec<_>>();

    tracing::debug!(path = %path.display(), pages = pages.len(), "PDF pages decoded");
    Ok(pages)
}

/// A PDF decoded up front into per-page text. Tables are inferred from the
/// text layout on demand.
#[derive(Debug, Clone)]
pub struct PdfFile {
    pages: Vec<String>,
}

impl PdfFile {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        Ok(Self {
            pages: read_pdf_pages(path)?,
        })
    }

    fn text(&self, index: usize) -> Result<&str, ExtractError> {
        self.pages
            .get(index)
            .map(String::as_str)
            .ok_or(ExtractError::PageOutOfRange {
                index,
                count: self.pages.len(),
            })
    }
}

impl PdfDocument for PdfFile {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, ExtractError> {
        self.text(index).map(str::to_string)
    }

    fn page_tables(&self, index: usize) -> Result<Vec<TableGrid>, ExtractError> {
        self.text(index).map(grids_from_text)
    }
}

/// Opens PDFs from disk with `lopdf` and `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfFileSource;

impl DocumentSource for PdfFileSource {
    type Document = PdfFile;

    fn open(&self, path: &Path) -> Result<PdfFile, ExtractError> {
        PdfFile::open(path)
    }
}
