use std::collections::BTreeMap;

use encoding_rs::{BIG5, UTF_16BE};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::model::{PageRuns, TextRun};
use crate::options::PageSelection;
use crate::warning::{ParseWarning, WarningCode};

const DEFAULT_PAGE_HEIGHT: f32 = 842.0;
const FALLBACK_LINE_PITCH: f32 = 14.0;

pub(crate) struct IngestedPages {
    pub pages: Vec<PageRuns>,
    pub warnings: Vec<ParseWarning>,
}

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();
    let cjk_count = text
        .chars()
        .filter(|ch| {
            ('\u{4E00}'..='\u{9FFF}').contains(ch) || ('\u{3400}'..='\u{4DBF}').contains(ch)
        })
        .count();
    let ext_a_count = text
        .chars()
        .filter(|ch| ('\u{3400}'..='\u{4DBF}').contains(ch))
        .count();

    replacement * 8 > total
        || control * 5 > total
        || (cjk_count > 20 && ext_a_count * 4 > cjk_count)
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if bytes.starts_with(&[0xFE, 0xFF]) {
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();

        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !utf16.is_empty() {
                return utf16.into_owned();
            }
        }

        if lower.contains("big5") || lower.contains("b5") || lower.contains("eten") {
            let (big5, _, had_errors) = BIG5.decode(bytes);
            if !had_errors && !big5.is_empty() {
                return big5.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn number(object: &Object) -> Option<f32> {
    match object {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(operands.get(..N)?) {
        *slot = number(operand)?;
    }
    Some(out)
}

/// Height of the page's MediaBox, inherited through the page tree.
fn page_height(document: &Document, page_id: ObjectId) -> f32 {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current
        && depth < 16
    {
        let Ok(dict) = document.get_dictionary(id) else {
            break;
        };
        if let Ok(media_box) = dict.get(b"MediaBox")
            && let Ok((_, media_box)) = document.dereference(media_box)
            && let Ok(values) = media_box.as_array()
            && let Some([_, bottom, _, top]) = numbers::<4>(values)
        {
            return (top - bottom).abs();
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    DEFAULT_PAGE_HEIGHT
}

/// Text-space state needed to place each shown string on the page.
#[derive(Debug, Clone, Copy)]
struct TextState {
    line_matrix: [f32; 6],
    leading: f32,
}

impl TextState {
    const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

    fn new() -> Self {
        Self {
            line_matrix: Self::IDENTITY,
            leading: 0.0,
        }
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line_matrix;
        self.line_matrix = [a, b, c, d, tx * a + ty * c + e, tx * b + ty * d + f];
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn origin(&self) -> (f32, f32) {
        (self.line_matrix[4], self.line_matrix[5])
    }
}

fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&decode_pdf_bytes(encoding, bytes)),
            Object::Array(items) => collect_text(text, encoding, items),
            Object::Integer(value) if *value < -100 => text.push(' '),
            Object::Real(value) if *value < -100.0 => text.push(' '),
            _ => {}
        }
    }
}

/// Walks a page's content operations and emits one run per positioned
/// string, with `y` measured downward from the top of the page.
fn runs_from_operations(
    operations: &[Operation],
    encodings: &BTreeMap<Vec<u8>, &str>,
    page_height: f32,
) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut state = TextState::new();
    let mut encoding = None;
    let mut pending = String::new();
    let mut pending_origin = state.origin();

    let mut flush = |pending: &mut String, origin: (f32, f32)| {
        let text = pending.trim();
        if !text.is_empty() {
            runs.push(TextRun::new(text, origin.0, page_height - origin.1));
        }
        pending.clear();
    };

    for operation in operations {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "BT" => {
                flush(&mut pending, pending_origin);
                state.line_matrix = TextState::IDENTITY;
            }
            "ET" => flush(&mut pending, pending_origin),
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    encoding = encodings.get(font_name).copied();
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    state.leading = leading;
                }
            }
            "Tm" => {
                flush(&mut pending, pending_origin);
                if let Some(matrix) = numbers::<6>(operands) {
                    state.line_matrix = matrix;
                }
            }
            "Td" | "TD" => {
                flush(&mut pending, pending_origin);
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    if operation.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.translate(tx, ty);
                }
            }
            "T*" => {
                flush(&mut pending, pending_origin);
                state.next_line();
            }
            "Tj" | "TJ" | "'" | "\"" => {
                if matches!(operation.operator.as_str(), "'" | "\"") {
                    flush(&mut pending, pending_origin);
                    state.next_line();
                }
                if pending.is_empty() {
                    pending_origin = state.origin();
                }
                let shown = if operation.operator == "\"" {
                    operands.get(2..).unwrap_or_default()
                } else {
                    operands
                };
                collect_text(&mut pending, encoding, shown);
            }
            _ => {}
        }
    }
    flush(&mut pending, pending_origin);

    runs
}

fn positioned_runs(document: &Document, page_id: ObjectId) -> Vec<TextRun> {
    let Ok(raw_content) = document.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&raw_content) else {
        return Vec::new();
    };
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    runs_from_operations(&content.operations, &encodings, page_height(document, page_id))
}

/// One run per non-empty line at `x = 0`, for pages whose positions are lost.
fn runs_from_plain_text(text: &str) -> Vec<TextRun> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            #[allow(clippy::cast_precision_loss)]
            let y = index as f32 * FALLBACK_LINE_PITCH;
            TextRun::new(line, 0.0, y)
        })
        .collect()
}

fn runs_are_broken(runs: &[TextRun]) -> bool {
    let joined = runs
        .iter()
        .map(|run| run.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    joined.trim().is_empty() || looks_decoding_broken(&joined)
}

pub(crate) fn read_pdf_pages_from_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<IngestedPages, ParseError> {
    let document = Document::load_mem(input_pdf)?;
    let pages_map = document.get_pages();

    let mut plain_pages: Option<Vec<String>> = None;
    let mut extract_error: Option<String> = None;
    let mut pages = Vec::new();
    let mut warnings = Vec::new();
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        if page_selection.is_some_and(|selection| !selection.contains(*page_no)) {
            continue;
        }

        let mut runs = positioned_runs(&document, *page_id);
        if runs_are_broken(&runs) {
            let plain = plain_pages.get_or_insert_with(|| {
                match pdf_extract::extract_text_from_mem(input_pdf) {
                    Ok(text) => split_text_into_pages(&text),
                    Err(error) => {
                        warn!(%error, "pdf-extract fallback failed");
                        extract_error = Some(error.to_string());
                        Vec::new()
                    }
                }
            });
            let fallback = plain
                .get(index)
                .filter(|_| plain.len() == pages_map.len())
                .map(|text| runs_from_plain_text(text))
                .unwrap_or_default();

            if !fallback.is_empty() {
                warn!(page = page_no, "positioned text unusable, using plain text lines");
                warnings.push(
                    ParseWarning::new(
                        WarningCode::DecodingFallback,
                        "positioned text was unusable; page read as plain lines",
                    )
                    .with_page(*page_no),
                );
                runs = fallback;
            }
        }

        debug!(page = page_no, runs = runs.len(), "ingested page");
        pages.push(PageRuns {
            page_number: *page_no,
            runs,
        });
    }

    if pages.is_empty() {
        return Err(ParseError::NoPagesSelected);
    }
    if let Some(error) = extract_error
        && pages.iter().all(|page| page.runs.is_empty())
    {
        return Err(ParseError::PdfExtract(error));
    }

    Ok(IngestedPages { pages, warnings })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use lopdf::Object;
    use lopdf::content::Operation;

    use crate::pdf_reader::{
        decode_pdf_bytes, runs_from_operations, runs_from_plain_text, split_text_into_pages,
    };

    #[test]
    fn splits_form_feed_delimited_pages() {
        let pages = split_text_into_pages("p1\u{000C}p2\u{000C}");
        assert_eq!(pages, vec!["p1", "p2"]);
    }

    #[test]
    fn decodes_big5_when_encoding_hint_is_present() {
        let (bytes, _, had_errors) = encoding_rs::BIG5.encode("測試");
        assert!(!had_errors);
        let decoded = decode_pdf_bytes(Some("ETen-B5-H"), &bytes);
        assert_eq!(decoded, "測試");
    }

    #[test]
    fn tracks_text_matrix_and_line_moves() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Tm", vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                100.into(),
                700.into(),
            ]),
            Operation::new("Tj", vec![Object::string_literal("Mon")]),
            Operation::new("Td", vec![50.into(), 0.into()]),
            Operation::new("TJ", vec![Object::Array(vec![
                Object::string_literal("Tu"),
                Object::Integer(-20),
                Object::string_literal("e"),
            ])]),
            Operation::new("T*", vec![]),
            Operation::new("Tj", vec![Object::string_literal("Notes")]),
            Operation::new("ET", vec![]),
        ];

        let runs = runs_from_operations(&operations, &BTreeMap::new(), 842.0);
        let placed = runs
            .iter()
            .map(|run| (run.text.as_str(), run.x, run.y))
            .collect::<Vec<_>>();
        assert_eq!(placed, vec![
            ("Mon", 100.0, 142.0),
            ("Tue", 150.0, 142.0),
            ("Notes", 150.0, 156.0),
        ]);
    }

    #[test]
    fn plain_text_fallback_stacks_lines() {
        let runs = runs_from_plain_text("Mon\n\n△Intro\n");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].text, "△Intro");
        assert!((runs[1].y - 14.0).abs() < f32::EPSILON);
    }
}
