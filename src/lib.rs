//! Persona-driven page ranking over PDF collections.
//!
//! For each collection the pages of every document are extracted, filtered by
//! constraints derived from the job text, ranked against a `persona: job`
//! query, and the top pages are summarized extractively.

pub mod config;
pub mod constraints;
pub mod document;
pub mod embedding;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod pdf_processor;
pub mod ranker;
pub mod summarizer;
pub mod utils;

pub use config::{CollectionPaths, Config, EmbeddingConfig, RankingConfig, SummaryConfig};
pub use constraints::{ConstraintRule, ConstraintSet, ConstraintTable};
pub use document::{Document, Page, Query, RankedResult, ScoredPage, SummaryResult};
pub use embedding::{cosine_similarity, Embedder, HashingEmbedder, WindowedEmbedder};
pub use error::AnalyzerError;
pub use models::{InputJson, OutputJson};
pub use orchestrator::{Analyzer, CollectionReport, CollectionSummary};
pub use pdf_processor::{LayoutSource, PageExtractor, PdfLayoutSource, TextSpan};
pub use ranker::{Ranker, Ranking};
pub use summarizer::Summarizer;
