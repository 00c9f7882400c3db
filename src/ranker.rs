//! Persona-conditioned page ranking.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::RankingConfig;
use crate::constraints::ConstraintSet;
use crate::document::{Document, Page, Query, RankedResult, ScoredPage};
use crate::embedding::{cosine_similarity, Embedder};
use crate::error::Result;

/// Output of one ranking run.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub query_embedding: Vec<f32>,
    pub results: Vec<RankedResult>,
    /// Pages that passed filtering, before the top-k cut.
    pub candidates: usize,
}

pub struct Ranker<E> {
    embedder: E,
    config: RankingConfig,
}

impl<E: Embedder> Ranker<E> {
    pub fn new(embedder: E, config: RankingConfig) -> Self {
        Self { embedder, config }
    }

    /// Scores every surviving page and keeps the best `top_k`.
    pub fn rank(
        &self,
        query: &Query,
        constraints: &ConstraintSet,
        documents: &[Document],
    ) -> Result<Ranking> {
        let query_embedding = self.embedder.embed(&query.text())?;

        let candidates: Vec<(&Document, &Page)> = documents
            .iter()
            .flat_map(|doc| doc.pages.iter().map(move |page| (doc, page)))
            .filter(|(_, page)| page.is_rankable())
            .filter(|(doc, page)| {
                let violation = constraints
                    .violation(&page.text)
                    .or_else(|| constraints.violation(&page.title));
                if let Some(category) = violation {
                    tracing::debug!(
                        "{} p{} excluded by '{}' constraint",
                        doc.id,
                        page.page_number,
                        category
                    );
                }
                violation.is_none()
            })
            .collect();

        if candidates.is_empty() {
            tracing::warn!("no candidate pages survived filtering");
            return Ok(Ranking {
                query_embedding,
                results: Vec::new(),
                candidates: 0,
            });
        }

        let titles: Vec<&str> = candidates.iter().map(|(_, p)| p.title.as_str()).collect();
        let bodies: Vec<&str> = candidates.iter().map(|(_, p)| p.text.as_str()).collect();
        let title_embeddings = self.embedder.embed_batch(&titles)?;
        let body_embeddings = self.embedder.embed_batch(&bodies)?;
        let document_scores = self.document_scores(documents, &query_embedding)?;

        let mut scored: Vec<ScoredPage> = candidates
            .iter()
            .zip(title_embeddings.iter().zip(&body_embeddings))
            .map(|(&(doc, page), (title_emb, body_emb))| {
                let title_score = cosine_similarity(title_emb, &query_embedding);
                let body_score = cosine_similarity(body_emb, &query_embedding);
                let doc_score = document_scores.get(doc.id.as_str()).copied().unwrap_or(0.0);
                ScoredPage {
                    document_id: doc.id.as_str(),
                    page,
                    title_score,
                    body_score,
                    score: self.config.title_weight * title_score
                        + self.config.body_weight * body_score
                        + self.config.document_weight * doc_score,
                    rank: 0,
                }
            })
            .collect();

        scored.sort_by(compare_scored);
        scored.truncate(self.config.top_k);

        let results = scored
            .into_iter()
            .enumerate()
            .map(|(i, mut s)| {
                s.rank = i as u32 + 1;
                tracing::debug!(
                    "#{} {} p{} score={:.4} (title={:.4}, body={:.4}) '{}'",
                    s.rank,
                    s.document_id,
                    s.page.page_number,
                    s.score,
                    s.title_score,
                    s.body_score,
                    s.page.title
                );
                RankedResult {
                    document_id: s.document_id.to_string(),
                    section_title: s.page.title.clone(),
                    importance_rank: s.rank,
                    page_number: s.page.page_number,
                    text: s.page.text.clone(),
                }
            })
            .collect();

        Ok(Ranking {
            query_embedding,
            results,
            candidates: candidates.len(),
        })
    }

    fn document_scores<'d>(
        &self,
        documents: &'d [Document],
        query_embedding: &[f32],
    ) -> Result<HashMap<&'d str, f32>> {
        if self.config.document_weight == 0.0 {
            return Ok(HashMap::new());
        }
        let texts: Vec<String> = documents.iter().map(Document::full_text).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&refs)?;
        Ok(documents
            .iter()
            .zip(&embeddings)
            .map(|(doc, e)| (doc.id.as_str(), cosine_similarity(e, query_embedding)))
            .collect())
    }
}

/// Score descending, then document id and page number ascending.
fn compare_scored(a: &ScoredPage, b: &ScoredPage) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.document_id.cmp(b.document_id))
        .then_with(|| a.page.page_number.cmp(&b.page.page_number))
}
