//! Text embeddings used for relevance scoring.
//!
//! The ranker and summarizer only see the [`Embedder`] trait. The bundled
//! [`HashingEmbedder`] is an offline, deterministic bag-of-stems model; any
//! other provider can be plugged in behind the same trait.

use rust_stemmers::{Algorithm, Stemmer};

use crate::config::EmbeddingConfig;
use crate::error::{AnalyzerError, Result};

pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at",
    "be", "been", "before", "but", "by", "can", "do", "each", "for", "from",
    "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "may", "more", "most", "my", "no", "not", "of", "on",
    "or", "other", "our", "out", "over", "she", "so", "some", "such", "than",
    "that", "the", "their", "them", "then", "there", "these", "they", "this",
    "those", "to", "up", "us", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "will", "with", "would", "you", "your",
];

/// Deterministic feature-hashing embedder over stemmed English tokens.
///
/// Unigram (and optionally bigram) stems are hashed with FNV-1a into a fixed
/// number of signed buckets and the result is L2-normalised. Vectors are stable
/// across processes and platforms.
pub struct HashingEmbedder {
    dimensions: usize,
    use_bigrams: bool,
    stemmer: Stemmer,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize, use_bigrams: bool) -> Self {
        Self {
            dimensions: dimensions.max(1),
            use_bigrams,
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self::new(config.dimensions, config.use_bigrams)
    }

    fn stems(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .filter(|w| !STOP_WORDS.contains(&w.as_str()))
            .map(|w| self.stemmer.stem(&w).into_owned())
            .collect()
    }

    fn add_feature(&self, v: &mut [f32], feature: &str, weight: f32) {
        let h = fnv1a(feature.as_bytes());
        let bucket = (h % self.dimensions as u64) as usize;
        let sign = if (h >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        v[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0; self.dimensions];
        let stems = self.stems(text);
        for stem in &stems {
            self.add_feature(&mut v, stem, 1.0);
        }
        if self.use_bigrams {
            for pair in stems.windows(2) {
                self.add_feature(&mut v, &format!("{} {}", pair[0], pair[1]), 0.5);
            }
        }
        normalize(&mut v);
        Ok(v)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(PRIME))
}

/// Windowing wrapper: text longer than `window_tokens` whitespace tokens is
/// split into consecutive windows, each embedded separately; the normalised
/// window vectors are averaged and renormalised. No content is dropped.
pub struct WindowedEmbedder<E> {
    inner: E,
    window_tokens: usize,
}

impl<E: Embedder> WindowedEmbedder<E> {
    pub fn new(inner: E, window_tokens: usize) -> Self {
        Self {
            inner,
            window_tokens: window_tokens.max(1),
        }
    }
}

impl<E: Embedder> Embedder for WindowedEmbedder<E> {
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() <= self.window_tokens {
            return self.inner.embed(text);
        }

        let windows: Vec<String> = tokens
            .chunks(self.window_tokens)
            .map(|chunk| chunk.join(" "))
            .collect();
        let refs: Vec<&str> = windows.iter().map(String::as_str).collect();
        let vectors = self.inner.embed_batch(&refs)?;

        let dims = self.inner.dimensions();
        let mut pooled = vec![0.0; dims];
        for mut v in vectors {
            if v.len() != dims {
                return Err(AnalyzerError::EmbeddingUnavailable(format!(
                    "provider returned {} dimensions, expected {}",
                    v.len(),
                    dims
                )));
            }
            normalize(&mut v);
            pooled.iter_mut().zip(&v).for_each(|(p, x)| *p += x);
        }
        normalize(&mut pooled);
        Ok(pooled)
    }
}
