use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut pages = BTreeSet::new();
        for token in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                pages.extend(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                pages.insert(page);
            }
        }

        if pages.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { pages })
    }
}

/// Which extraction vocabulary to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageMode {
    #[default]
    Auto,
    Chinese,
    English,
}

impl FromStr for LanguageMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "zh" | "cn" | "chinese" => Ok(Self::Chinese),
            "en" | "english" => Ok(Self::English),
            other => Err(format!("unknown language '{other}', expected auto, zh or en")),
        }
    }
}

/// A glyph that precedes a course's type designation, with its category label
/// in both layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub glyph: char,
    pub label_en: String,
    pub label_zh: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    #[must_use]
    pub fn new<'a>(entries: impl IntoIterator<Item = (char, &'a str, &'a str)>) -> Self {
        let markers = entries
            .into_iter()
            .map(|(glyph, label_en, label_zh)| Marker {
                glyph,
                label_en: label_en.to_string(),
                label_zh: label_zh.to_string(),
            })
            .collect();
        Self { markers }
    }

    #[must_use]
    pub fn get(&self, glyph: char) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.glyph == glyph)
    }

    /// Byte offset and marker of the first marker glyph in `text`.
    #[must_use]
    pub fn find_in(&self, text: &str) -> Option<(usize, &Marker)> {
        text.char_indices()
            .find_map(|(index, ch)| self.get(ch).map(|marker| (index, marker)))
    }

    #[must_use]
    pub fn label(&self, glyph: char, chinese: bool) -> Option<&str> {
        self.get(glyph).map(|marker| {
            if chinese {
                marker.label_zh.as_str()
            } else {
                marker.label_en.as_str()
            }
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::new([
            ('△', "Theory", "理论"),
            ('★', "Technical", "技术"),
            ('◆', "Practice", "实践"),
            ('■', "Experiment", "实验"),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    pub pages: Option<PageSelection>,
    pub language: LanguageMode,
    pub markers: MarkerSet,
    pub line_tolerance: f32,
    pub continuation_window: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            pages: None,
            language: LanguageMode::Auto,
            markers: MarkerSet::default(),
            line_tolerance: 2.0,
            continuation_window: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LanguageMode, MarkerSet, PageSelection};
    use std::str::FromStr;

    #[test]
    fn parse_page_selection_range_and_single() {
        let selection = PageSelection::from_str("1-3,5").expect("selection should parse");
        assert!(selection.contains(1));
        assert!(selection.contains(2));
        assert!(selection.contains(3));
        assert!(selection.contains(5));
        assert!(!selection.contains(4));
    }

    #[test]
    fn reject_invalid_page_selection() {
        let err = PageSelection::from_str("3-1").expect_err("invalid range should fail");
        assert!(err.contains("invalid range"));
    }

    #[test]
    fn parse_language_mode_aliases() {
        assert_eq!(LanguageMode::from_str("ZH"), Ok(LanguageMode::Chinese));
        assert_eq!(LanguageMode::from_str("english"), Ok(LanguageMode::English));
        assert!(LanguageMode::from_str("fr").is_err());
    }

    #[test]
    fn default_markers_map_glyphs_to_labels() {
        let markers = MarkerSet::default();
        assert_eq!(markers.label('△', false), Some("Theory"));
        assert_eq!(markers.label('★', true), Some("技术"));
        assert_eq!(markers.label('x', false), None);

        let (offset, marker) = markers.find_in("高数★(1-2节)").expect("marker present");
        assert_eq!(offset, "高数".len());
        assert_eq!(marker.glyph, '★');
    }
}
