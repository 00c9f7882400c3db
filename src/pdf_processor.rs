//! Page extraction: PDF bytes to positioned text spans, spans to pages.

use pdf::content::{Op, TextDrawAdjusted};
use pdf::file::FileOptions;
use regex::Regex;

use crate::config::ExtractionConfig;
use crate::document::{Document, Page};
use crate::error::{AnalyzerError, Result};

/// A run of text drawn with one font size at one baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub font_size: f32,
    /// Baseline height in page space; larger is higher on the page.
    pub y: f32,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, font_size: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            y,
        }
    }
}

/// Produces the spans of every physical page, in page order.
pub trait LayoutSource: Send + Sync {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<Vec<TextSpan>>>;
}

/// Layout source backed by the `pdf` crate's content stream operators.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfLayoutSource;

impl LayoutSource for PdfLayoutSource {
    fn pages(&self, bytes: &[u8]) -> Result<Vec<Vec<TextSpan>>> {
        let file = FileOptions::cached()
            .load(bytes.to_vec())
            .map_err(|e| AnalyzerError::extraction("<pdf>", e))?;

        let total_pages = file.num_pages();
        tracing::debug!("PDF has {} pages", total_pages);

        let mut pages = Vec::with_capacity(total_pages as usize);
        for page_num in 0..total_pages {
            let mut spans = Vec::new();
            match file.get_page(page_num) {
                Ok(page) => {
                    if let Some(content) = &page.contents {
                        match content.operations(&file) {
                            Ok(ops) => collect_spans(&ops, &mut spans),
                            Err(e) => {
                                tracing::warn!("failed to decode page {} content: {}", page_num + 1, e)
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!("failed to get page {}: {}", page_num + 1, e),
            }
            // Unreadable pages still count as pages.
            pages.push(spans);
        }
        Ok(pages)
    }
}

#[derive(Debug, Clone, Copy)]
struct TextState {
    font_size: f32,
    scale: f32,
    leading: f32,
    line_y: f32,
    /// Set when the cursor moved since the last draw.
    gap: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_size: 0.0,
            scale: 1.0,
            leading: 0.0,
            line_y: 0.0,
            gap: false,
        }
    }
}

impl TextState {
    fn effective_size(&self) -> f32 {
        (self.font_size * self.scale).abs()
    }

    fn begin_text(&mut self) {
        self.scale = 1.0;
        self.line_y = 0.0;
        self.gap = true;
    }

    fn set_matrix(&mut self, d_scale: f32, y: f32) {
        self.scale = if d_scale > 0.0 { d_scale } else { 1.0 };
        self.line_y = y;
        self.gap = true;
    }

    fn move_by(&mut self, x: f32, y: f32) {
        self.line_y += y * self.scale;
        if x != 0.0 || y != 0.0 {
            self.gap = true;
        }
    }

    fn newline(&mut self) {
        self.line_y -= self.leading * self.scale;
        self.gap = true;
    }

    fn push(&mut self, spans: &mut Vec<TextSpan>, text: String) {
        if text.trim().is_empty() {
            return;
        }
        let gap = std::mem::take(&mut self.gap);
        // Consecutive draws on the same baseline at the same size extend one span;
        // a repositioned draw is a separate word.
        if let Some(last) = spans.last_mut() {
            if last.y == self.line_y && last.font_size == self.effective_size() {
                let separated = last.text.ends_with(char::is_whitespace)
                    || text.starts_with(char::is_whitespace);
                if gap && !separated {
                    last.text.push(' ');
                }
                last.text.push_str(&text);
                return;
            }
        }
        spans.push(TextSpan::new(text, self.effective_size(), self.line_y));
    }
}

fn collect_spans(ops: &[Op], spans: &mut Vec<TextSpan>) {
    let mut state = TextState::default();
    for op in ops {
        match op {
            Op::BeginText => state.begin_text(),
            Op::TextFont { size, .. } => state.font_size = *size,
            Op::Leading { leading } => state.leading = *leading,
            Op::SetTextMatrix { matrix } => {
                state.set_matrix((matrix.c * matrix.c + matrix.d * matrix.d).sqrt(), matrix.f);
            }
            Op::MoveTextPosition { translation } => state.move_by(translation.x, translation.y),
            Op::TextNewline => state.newline(),
            Op::TextDraw { text } => {
                state.push(spans, text.to_string_lossy().to_string());
            }
            Op::TextDrawAdjusted { array } => {
                let mut line = String::new();
                for item in array {
                    match item {
                        TextDrawAdjusted::Text(text) => line.push_str(&text.to_string_lossy()),
                        // Large negative kerning is a word gap.
                        TextDrawAdjusted::Spacing(gap) if *gap < -200.0 => line.push(' '),
                        TextDrawAdjusted::Spacing(_) => {}
                    }
                }
                state.push(spans, line);
            }
            _ => {}
        }
    }
}

/// A line of text on a page: spans sharing a baseline.
#[derive(Debug, Clone, PartialEq)]
struct Line {
    text: String,
    font_size: f32,
    y: f32,
}

fn group_lines(spans: &[TextSpan]) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for span in spans {
        let text = span.text.trim();
        if text.is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some(line) if (line.y - span.y).abs() < 1.0 => {
                line.text.push(' ');
                line.text.push_str(text);
                line.font_size = line.font_size.max(span.font_size);
            }
            _ => lines.push(Line {
                text: text.to_string(),
                font_size: span.font_size,
                y: span.y,
            }),
        }
    }
    lines
}

/// Turns per-page spans into [`Page`] records with candidate titles.
pub struct PageExtractor<S> {
    source: S,
    config: ExtractionConfig,
    whitespace: Regex,
    has_letter: Regex,
}

impl<S: LayoutSource> PageExtractor<S> {
    pub fn new(source: S, config: ExtractionConfig) -> Self {
        Self {
            source,
            config,
            whitespace: Regex::new(r"[ \t\u{a0}]+").expect("static regex"),
            has_letter: Regex::new(r"[a-zA-Z]").expect("static regex"),
        }
    }

    /// Extracts one page record per physical page.
    pub fn extract(&self, document_id: &str, bytes: &[u8]) -> Result<Document> {
        let pages = self.source.pages(bytes).map_err(|e| match e {
            AnalyzerError::Extraction { reason, .. } => AnalyzerError::extraction(document_id, reason),
            other => other,
        })?;

        let pages = pages
            .iter()
            .enumerate()
            .map(|(i, spans)| self.build_page(i as u32 + 1, spans))
            .collect::<Vec<_>>();

        tracing::debug!(
            "{}: {} pages, {} with text",
            document_id,
            pages.len(),
            pages.iter().filter(|p| p.is_rankable()).count()
        );
        Ok(Document::new(document_id, pages))
    }

    fn build_page(&self, page_number: u32, spans: &[TextSpan]) -> Page {
        let lines = group_lines(spans);
        let text = lines
            .iter()
            .map(|l| self.clean_line(&l.text))
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Page::new(page_number, "", "");
        }

        match self.pick_title(&lines) {
            Some(line) => Page {
                page_number,
                text,
                title: self.clean_line(&line.text),
                title_font_size: Some(line.font_size),
            },
            None => Page::new(page_number, text, format!("Content from page {}", page_number)),
        }
    }

    /// Largest font wins; ties go to the topmost line, then the earliest.
    fn pick_title<'l>(&self, lines: &'l [Line]) -> Option<&'l Line> {
        lines
            .iter()
            .filter(|l| self.has_letter.is_match(&l.text))
            .filter(|l| l.text.split_whitespace().count() < self.config.max_title_words)
            .fold(None, |best: Option<&Line>, line| match best {
                Some(b) if b.font_size > line.font_size => Some(b),
                Some(b) if b.font_size == line.font_size && b.y >= line.y => Some(b),
                _ => Some(line),
            })
    }

    fn clean_line(&self, line: &str) -> String {
        self.whitespace.replace_all(line.trim(), " ").to_string()
    }
}
