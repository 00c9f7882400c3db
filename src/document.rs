//! In-memory records produced and consumed by the ranking pipeline.
//!
//! Every value here is built once by one stage and only read by the next.

/// A single physical page of a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based physical page number.
    pub page_number: u32,
    pub text: String,
    /// Most prominent line on the page, empty when the page has no text.
    pub title: String,
    /// Font size of the line chosen as title.
    pub title_font_size: Option<f32>,
}

impl Page {
    pub fn new(page_number: u32, text: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
            title: title.into(),
            title_font_size: None,
        }
    }

    /// Pages without text are kept for page counting but never ranked.
    pub fn is_rankable(&self) -> bool {
        !self.title.trim().is_empty() && !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Source file name, used as the document id in results.
    pub id: String,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(id: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            id: id.into(),
            pages,
        }
    }

    /// A document that failed extraction still appears, with no pages.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::new(id, Vec::new())
    }

    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Persona and job-to-be-done, combined into the semantic query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub persona: String,
    pub job: String,
}

impl Query {
    pub fn new(persona: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            job: job.into(),
        }
    }

    pub fn text(&self) -> String {
        format!("{}: {}", self.persona, self.job)
    }
}

/// A page with its combined relevance score and 1-based rank.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPage<'a> {
    pub document_id: &'a str,
    pub page: &'a Page,
    pub title_score: f32,
    pub body_score: f32,
    pub score: f32,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub document_id: String,
    pub section_title: String,
    pub importance_rank: u32,
    pub page_number: u32,
    /// Body text carried along for summarization.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    pub document_id: String,
    pub refined_text: String,
    pub page_number: u32,
}
