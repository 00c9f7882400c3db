//! Runs the extraction, ranking and summarization stages for each collection.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;

use crate::config::{CollectionPaths, Config};
use crate::constraints::ConstraintTable;
use crate::document::{Document, Query};
use crate::embedding::Embedder;
use crate::error::AnalyzerError;
use crate::models::{ExtractedSection, InputJson, Metadata, OutputJson, SubsectionAnalysis};
use crate::pdf_processor::{LayoutSource, PageExtractor};
use crate::ranker::Ranker;
use crate::summarizer::Summarizer;
use crate::utils::{ensure_directory_exists, preview};

/// Outcome of one collection run.
#[derive(Debug)]
pub struct CollectionReport {
    pub name: String,
    pub outcome: Result<CollectionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub output_path: PathBuf,
    pub sections: usize,
}

pub struct Analyzer<E, S> {
    embedder: E,
    extractor: PageExtractor<S>,
    constraints: ConstraintTable,
    config: Config,
}

impl<E: Embedder, S: LayoutSource> Analyzer<E, S> {
    pub fn new(embedder: E, source: S, config: Config) -> Self {
        let constraints = ConstraintTable::builtin().with_rules(config.constraints.clone());
        Self {
            embedder,
            extractor: PageExtractor::new(source, config.extraction),
            constraints,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Processes every collection independently; one failure never stops the others.
    pub fn process_all(&self, collections: &[CollectionPaths]) -> Vec<CollectionReport> {
        collections
            .par_iter()
            .map(|paths| {
                let outcome = self.process_collection(paths);
                match &outcome {
                    Ok(summary) => tracing::info!(
                        "{}: wrote {} sections to {}",
                        paths.name,
                        summary.sections,
                        summary.output_path.display()
                    ),
                    Err(e) => tracing::error!("{}: {:#}", paths.name, e),
                }
                CollectionReport {
                    name: paths.name.clone(),
                    outcome,
                }
            })
            .collect()
    }

    pub fn process_collection(&self, paths: &CollectionPaths) -> Result<CollectionSummary> {
        tracing::info!("processing collection {}", paths.name);

        let raw = std::fs::read_to_string(&paths.input_path)
            .with_context(|| format!("Failed to read input JSON at {}", paths.input_path.display()))?;
        let input: InputJson = serde_json::from_str(&raw)
            .map_err(|e| AnalyzerError::configuration(&paths.name, e))?;

        let pdf_dir = self
            .config
            .pdf_dir_for(&paths.input_path)
            .ok_or_else(|| {
                AnalyzerError::configuration(
                    &paths.name,
                    format!("no PDF directory (tried {:?})", self.config.pdf_dir_names),
                )
            })?;

        let output = self.analyze(&paths.name, &input, &pdf_dir)?;

        if let Some(parent) = paths.output_path.parent() {
            ensure_directory_exists(parent)?;
        }
        std::fs::write(&paths.output_path, serde_json::to_string_pretty(&output)?)
            .with_context(|| format!("Failed to write output to {}", paths.output_path.display()))?;

        Ok(CollectionSummary {
            output_path: paths.output_path.clone(),
            sections: output.extracted_sections.len(),
        })
    }

    /// Runs the full pipeline for one parsed input specification.
    pub fn analyze(
        &self,
        collection: &str,
        input: &InputJson,
        pdf_dir: &Path,
    ) -> Result<OutputJson, AnalyzerError> {
        let persona = input.persona.role.trim();
        let job = input.job_to_be_done.task.trim();
        if persona.is_empty() {
            return Err(AnalyzerError::configuration(collection, "persona role is empty"));
        }
        if job.is_empty() {
            return Err(AnalyzerError::configuration(collection, "job to be done is empty"));
        }
        if input.documents.is_empty() {
            return Err(AnalyzerError::configuration(collection, "no input documents"));
        }

        let query = Query::new(persona, job);
        let constraints = self.constraints.derive(job);

        let filenames: Vec<&str> = input.documents.iter().map(|d| d.filename.as_str()).collect();
        let documents = self.extract_documents(pdf_dir, &filenames);

        let ranker = Ranker::new(&self.embedder, self.config.ranking);
        let ranking = ranker.rank(&query, &constraints, &documents)?;
        tracing::info!(
            "{}: {} candidate pages, kept {}",
            collection,
            ranking.candidates,
            ranking.results.len()
        );

        let summarizer = Summarizer::new(&self.embedder, self.config.summary);
        let summaries = summarizer.summarize(&ranking.results, &ranking.query_embedding)?;
        if let Some(top) = summaries.first() {
            tracing::debug!("top excerpt: {}", preview(&top.refined_text, 120));
        }

        Ok(OutputJson {
            metadata: Metadata {
                input_documents: filenames.iter().map(|f| f.to_string()).collect(),
                persona: query.persona.clone(),
                job_to_be_done: query.job.clone(),
                processing_timestamp: Utc::now().to_rfc3339(),
            },
            extracted_sections: ranking.results.iter().map(ExtractedSection::from).collect(),
            subsection_analysis: summaries.into_iter().map(SubsectionAnalysis::from).collect(),
        })
    }

    /// Extracts documents in parallel; each worker builds its own `Document`
    /// and results come back in input order. Failures yield empty documents.
    pub fn extract_documents(&self, pdf_dir: &Path, filenames: &[&str]) -> Vec<Document> {
        filenames
            .par_iter()
            .map(|&name| match self.extract_one(pdf_dir, name) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("{}", e);
                    Document::empty(name)
                }
            })
            .collect()
    }

    fn extract_one(&self, pdf_dir: &Path, name: &str) -> Result<Document, AnalyzerError> {
        let path = pdf_dir.join(name);
        tracing::debug!("extracting {}", path.display());
        let bytes = std::fs::read(&path).map_err(|e| AnalyzerError::extraction(name, e))?;
        self.extractor.extract(name, &bytes)
    }
}
