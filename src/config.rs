use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::constraints::ConstraintRule;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collections_dir: PathBuf,
    pub input_file_name: String,
    pub output_file_name: String,
    /// Candidate names of the directory holding a collection's PDFs.
    pub pdf_dir_names: Vec<String>,
    pub ranking: RankingConfig,
    pub summary: SummaryConfig,
    pub embedding: EmbeddingConfig,
    pub extraction: ExtractionConfig,
    /// Rules appended to the built-in constraint table.
    pub constraints: Vec<ConstraintRule>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    pub top_k: usize,
    pub title_weight: f32,
    pub body_weight: f32,
    /// Weight of whole-document similarity; 0 disables the signal.
    pub document_weight: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    pub max_sentences: usize,
    pub min_sentence_chars: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
    pub window_tokens: usize,
    pub use_bigrams: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    pub max_title_words: usize,
}

/// Locations of one collection on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPaths {
    pub name: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            collections_dir: PathBuf::from("collections"),
            input_file_name: "challenge1b_input.json".to_string(),
            output_file_name: "challenge1b_output.json".to_string(),
            pdf_dir_names: vec!["PDFs".to_string(), "pdfs".to_string()],
            ranking: RankingConfig::default(),
            summary: SummaryConfig::default(),
            embedding: EmbeddingConfig::default(),
            extraction: ExtractionConfig::default(),
            constraints: Vec::new(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            title_weight: 0.6,
            body_weight: 0.4,
            document_weight: 0.0,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_sentences: 2,
            min_sentence_chars: 20,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: 384,
            window_tokens: 256,
            use_bigrams: true,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { max_title_words: 25 }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Directories directly under `collections_dir` that hold an input file,
    /// sorted by name.
    pub fn get_collection_paths(&self) -> Result<Vec<CollectionPaths>> {
        let mut collections = Vec::new();
        for entry in WalkDir::new(&self.collections_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| {
                format!("Failed to list {}", self.collections_dir.display())
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let input_path = entry.path().join(&self.input_file_name);
            if !input_path.is_file() {
                tracing::debug!("skipping {}: no {}", entry.path().display(), self.input_file_name);
                continue;
            }
            collections.push(CollectionPaths {
                name: entry.file_name().to_string_lossy().to_string(),
                output_path: entry.path().join(&self.output_file_name),
                input_path,
            });
        }
        Ok(collections)
    }

    /// First configured PDF directory that exists next to the input file.
    pub fn pdf_dir_for(&self, input_path: &Path) -> Option<PathBuf> {
        let base = input_path.parent().unwrap_or_else(|| Path::new("."));
        self.pdf_dir_names
            .iter()
            .map(|name| base.join(name))
            .find(|dir| dir.is_dir())
    }
}
