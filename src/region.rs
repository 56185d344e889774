use std::sync::LazyLock;

use regex::Regex;

pub const UNKNOWN_CITY: &str = "未知城市";
pub const UNKNOWN_DISTRICT: &str = "未知區域";

static CITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{4e00}-\x{9fff}]{2,3}市").expect("hardcoded city regex is valid")
});
static DISTRICT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{4e00}-\x{9fff}]{2,3}區").expect("hardcoded district regex is valid")
});

/// First city label (2–3 CJK characters followed by 市) in the page text.
#[must_use]
pub fn infer_city(text: &str) -> Option<&str> {
    CITY_RE.find(text).map(|found| found.as_str())
}

/// First district label (2–3 CJK characters followed by 區) in the page text.
#[must_use]
pub fn infer_district(text: &str) -> Option<&str> {
    DISTRICT_RE.find(text).map(|found| found.as_str())
}

/// Page-level fallbacks for rows whose own city/district cells are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionHints {
    pub city: String,
    pub district: String,
}

impl RegionHints {
    #[must_use]
    pub fn from_page_text(text: &str) -> Self {
        Self {
            city: infer_city(text).unwrap_or(UNKNOWN_CITY).to_string(),
            district: infer_district(text).unwrap_or(UNKNOWN_DISTRICT).to_string(),
        }
    }
}
