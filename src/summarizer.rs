//! Extractive summaries for ranked pages.

use std::collections::HashSet;

use regex::Regex;

use crate::config::SummaryConfig;
use crate::document::{RankedResult, SummaryResult};
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::Result;

pub struct Summarizer<E> {
    embedder: E,
    config: SummaryConfig,
    boundary: Regex,
}

impl<E: Embedder> Summarizer<E> {
    pub fn new(embedder: E, config: SummaryConfig) -> Self {
        Self {
            embedder,
            config,
            boundary: Regex::new(r"[.!?]+[\s]+").expect("static regex"),
        }
    }

    /// Splits on terminal punctuation followed by whitespace, keeping the
    /// punctuation with its sentence. Line breaks inside a sentence become spaces.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.boundary.find_iter(text) {
            let end = m.start() + m.as_str().trim_end().len();
            sentences.push(&text[start..end]);
            start = m.end();
        }
        sentences.push(&text[start..]);

        let candidates: Vec<String> = sentences
            .into_iter()
            .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|s| s.chars().any(char::is_alphabetic))
            .collect();

        // Short fragments (headers, captions) only count when nothing longer exists.
        let long: Vec<String> = candidates
            .iter()
            .filter(|s| s.chars().count() >= self.config.min_sentence_chars)
            .cloned()
            .collect();
        if long.is_empty() {
            candidates
        } else {
            long
        }
    }

    /// Picks the most query-like sentences and returns them in page order.
    pub fn refine(&self, text: &str, query_embedding: &[f32]) -> Result<String> {
        let sentences = self.split_sentences(text);
        if sentences.is_empty() {
            return Ok(String::new());
        }

        let limit = self.config.max_sentences.clamp(2, 3);
        if sentences.len() <= 2 {
            return Ok(sentences.join(" "));
        }

        let refs: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&refs)?;
        let mut scored: Vec<(usize, f32)> = embeddings
            .iter()
            .map(|e| cosine_similarity(e, query_embedding))
            .enumerate()
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut seen = HashSet::new();
        let mut picked: Vec<usize> = scored
            .into_iter()
            .map(|(i, _)| i)
            .filter(|&i| seen.insert(sentences[i].to_lowercase()))
            .take(limit)
            .collect();
        picked.sort_unstable();

        Ok(picked
            .into_iter()
            .map(|i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" "))
    }

    pub fn summarize(
        &self,
        ranked: &[RankedResult],
        query_embedding: &[f32],
    ) -> Result<Vec<SummaryResult>> {
        ranked
            .iter()
            .map(|r| {
                let refined_text = self.refine(&r.text, query_embedding)?;
                tracing::debug!(
                    "summary for {} p{}: {} chars",
                    r.document_id,
                    r.page_number,
                    refined_text.len()
                );
                Ok(SummaryResult {
                    document_id: r.document_id.clone(),
                    refined_text,
                    page_number: r.page_number,
                })
            })
            .collect()
    }
}
