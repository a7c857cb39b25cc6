use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

pub const PREDICTION_FAILED: &str = "Predicción fallida";

/// On-disk artifact: a TF-IDF vectorizer plus a linear model, exported to
/// JSON by the offline training pipeline.
#[derive(Deserialize)]
struct ModelFile {
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    #[serde(default)]
    stopwords: Vec<String>,
}

/// Device-type classifier. Loaded once per run and passed by reference into
/// the record assembler; classification failures surface as the
/// `PREDICTION_FAILED` sentinel, never as errors.
pub struct DeviceClassifier {
    classes: Vec<String>,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    stopwords: HashSet<String>,
}

impl DeviceClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model {}", path.display()))?;
        let model: ModelFile = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse model {}", path.display()))?;

        let vocab_size = model.vocabulary.len();
        if model.classes.is_empty() {
            bail!("Model {} has no classes", path.display());
        }
        if model.idf.len() != vocab_size {
            bail!(
                "Model {}: idf length {} does not match vocabulary size {}",
                path.display(),
                model.idf.len(),
                vocab_size
            );
        }
        if model.coefficients.len() != model.classes.len()
            || model.intercepts.len() != model.classes.len()
        {
            bail!(
                "Model {}: expected {} coefficient rows and intercepts",
                path.display(),
                model.classes.len()
            );
        }
        if model.coefficients.iter().any(|row| row.len() != vocab_size) {
            bail!("Model {}: coefficient row does not match vocabulary size", path.display());
        }
        if model.vocabulary.values().any(|&col| col >= vocab_size) {
            bail!("Model {}: vocabulary column out of range", path.display());
        }

        info!(
            "Loaded classifier {} ({} classes, {} terms)",
            path.display(),
            model.classes.len(),
            vocab_size
        );
        Ok(Self {
            classes: model.classes,
            vocabulary: model.vocabulary,
            idf: model.idf,
            coefficients: model.coefficients,
            intercepts: model.intercepts,
            stopwords: model.stopwords.into_iter().collect(),
        })
    }

    /// Classifier that answers every prediction with the failure sentinel.
    /// Used when the model artifact is unavailable so the pipeline can still
    /// produce records.
    pub fn disabled() -> Self {
        Self {
            classes: Vec::new(),
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            coefficients: Vec::new(),
            intercepts: Vec::new(),
            stopwords: HashSet::new(),
        }
    }

    /// Predicted device category for a device-name string.
    pub fn predict(&self, text: &str) -> String {
        self.score(text)
            .unwrap_or_else(|| PREDICTION_FAILED.to_string())
    }

    fn score(&self, text: &str) -> Option<String> {
        if self.classes.is_empty() {
            return None;
        }

        // Same vectorization as training: cleaned unigrams + bigrams,
        // TF-IDF weighted, L2 normalized.
        let tokens = self.clean_tokens(text);
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in &tokens {
            if let Some(&col) = self.vocabulary.get(token.as_str()) {
                *counts.entry(col).or_default() += 1.0;
            }
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            if let Some(&col) = self.vocabulary.get(bigram.as_str()) {
                *counts.entry(col).or_default() += 1.0;
            }
        }

        let mut features: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, count)| (col, count * self.idf[col]))
            .collect();
        let norm = features.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for feature in &mut features {
                feature.1 /= norm;
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for (class, (row, intercept)) in
            self.coefficients.iter().zip(&self.intercepts).enumerate()
        {
            let score: f64 =
                intercept + features.iter().map(|&(col, v)| row[col] * v).sum::<f64>();
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((class, score));
            }
        }
        best.and_then(|(class, _)| self.classes.get(class).cloned())
    }

    /// Training-time text cleaning: lowercase, digits removed, split on
    /// non-alphabetic characters, stopwords dropped.
    fn clean_tokens(&self, text: &str) -> Vec<String> {
        let lowered: String = text
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_numeric())
            .collect();
        lowered
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty() && !self.stopwords.contains(*w))
            .map(str::to_string)
            .collect()
    }
}
