use std::sync::LazyLock;

use regex::Regex;

use crate::model::TableGrid;

const MIN_CELLS: usize = 2;
const MIN_ROWS: usize = 2;
const MAX_WORDS_WITHOUT_DIGITS: usize = 6;

/// A tab (with any surrounding blanks) or a run of two or more blanks.
static CELL_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\t\s*|\s{2,}").expect("hardcoded cell gap regex is valid"));

pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    CELL_GAP_RE
        .split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

/// Single-space split, for text layers that collapse column gaps.
pub(crate) fn split_words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

fn ends_like_sentence(line: &str) -> bool {
    line.trim_end()
        .ends_with(['.', '!', '?', '。', '！', '？'])
}

fn row_cells(line: &str) -> Vec<String> {
    let cells = split_line_into_cells(line);
    if cells.len() >= MIN_CELLS || ends_like_sentence(line) {
        return cells;
    }

    let words = split_words(line);
    let has_digits = words
        .iter()
        .any(|word| word.bytes().any(|byte| byte.is_ascii_digit()));
    if words.len() >= MIN_CELLS && (has_digits || words.len() <= MAX_WORDS_WITHOUT_DIGITS) {
        words
    } else {
        cells
    }
}

/// Groups runs of consecutive multi-cell lines into grids; runs shorter than
/// two rows are dropped.
pub(crate) fn grids_from_text(text: &str) -> Vec<TableGrid> {
    let mut grids = Vec::new();
    let mut run = Vec::new();

    for cells in text.lines().map(row_cells).chain(std::iter::once(Vec::new())) {
        if cells.len() >= MIN_CELLS {
            run.push(cells);
        } else if run.len() >= MIN_ROWS {
            grids.push(TableGrid::new(std::mem::take(&mut run)));
        } else {
            run.clear();
        }
    }

    grids
}

#[cfg(test)]
mod tests {
    use super::{grids_from_text, row_cells, split_line_into_cells, split_words};

    #[test]
    fn splits_on_wide_gaps_only() {
        let cells = split_line_into_cells("大坑段  0001-0000  120.5 平方公尺");
        assert_eq!(cells, vec!["大坑段", "0001-0000", "120.5 平方公尺"]);
    }

    #[test]
    fn tabs_always_separate_cells() {
        assert_eq!(split_line_into_cells("A\tB \t C"), vec!["A", "B", "C"]);
        assert!(split_line_into_cells("   ").is_empty());
    }

    #[test]
    fn collapsed_rows_fall_back_to_words() {
        assert_eq!(split_words("地段名稱 地號 面積"), vec!["地段名稱", "地號", "面積"]);
        assert_eq!(
            row_cells("大坑段 0001-0000 120.5"),
            vec!["大坑段", "0001-0000", "120.5"]
        );
        assert_eq!(row_cells("本案 依法 辦理。"), vec!["本案 依法 辦理。"]);
    }

    #[test]
    fn groups_consecutive_rows_into_grids() {
        let text = "報告書\n地段名稱  地號\n大坑段  0001-0000\n\n說明文字。\nA  B\nC  D\nE  F\n";
        let grids = grids_from_text(text);
        assert_eq!(grids.len(), 2);
        assert_eq!(grids[0].rows[1], vec!["大坑段", "0001-0000"]);
        assert_eq!(grids[1].len(), 3);
    }

    #[test]
    fn single_row_runs_are_not_grids() {
        assert!(grids_from_text("A  B\nplain\nC  D").is_empty());
    }
}
