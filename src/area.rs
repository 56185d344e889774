fn is_area_char(ch: char) -> bool {
    ch.is_ascii_digit() || ('０'..='９').contains(&ch) || matches!(ch, '.' | ',')
}

/// Reduces a raw area cell to its numeric part, e.g. `" 1 , 234 . 5 平方公尺 "`
/// becomes `"1,234.5"`. Units, stray letters and whitespace are dropped.
///
/// Only ASCII and fullwidth decimal digits count as digits. Superscripts such
/// as the `²` in `m²` are dropped so a unit never adds a digit to the area.
#[must_use]
pub fn normalize_area(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .filter(|ch| is_area_char(*ch))
        .collect()
}
