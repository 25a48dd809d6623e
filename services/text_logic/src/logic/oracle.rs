//! External oracle interfaces
//!
//! The core never talks to a model directly. Similarity scoring and LLM atom
//! extraction sit behind these traits so callers can plug in a service and
//! tests can plug in fixed tables.

use std::collections::HashMap;
use crate::error::OracleError;

/// Scores how likely two canonical texts denote the same proposition
pub trait EquivalenceOracle: Send + Sync {
    /// Symmetric score in `[0.0, 1.0]`
    fn similarity(&self, a: &str, b: &str) -> Result<f64, OracleError>;
}

impl<F> EquivalenceOracle for F
where
    F: Fn(&str, &str) -> Result<f64, OracleError> + Send + Sync,
{
    fn similarity(&self, a: &str, b: &str) -> Result<f64, OracleError> {
        self(a, b)
    }
}

/// Baseline oracle: 1.0 for identical text, 0.0 otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactOracle;

impl EquivalenceOracle for ExactOracle {
    fn similarity(&self, a: &str, b: &str) -> Result<f64, OracleError> {
        Ok(if a == b { 1.0 } else { 0.0 })
    }
}

/// Deterministic oracle backed by a fixed table of pair scores
#[derive(Debug, Clone, Default)]
pub struct SimilarityTable {
    scores: HashMap<(String, String), f64>,
    default_score: f64,
}

impl SimilarityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a symmetric score for the pair
    pub fn with_pair(mut self, a: &str, b: &str, score: f64) -> Self {
        self.scores.insert((a.to_string(), b.to_string()), score);
        self.scores.insert((b.to_string(), a.to_string()), score);
        self
    }

    /// Score returned for pairs not in the table
    pub fn with_default(mut self, score: f64) -> Self {
        self.default_score = score;
        self
    }
}

impl EquivalenceOracle for SimilarityTable {
    fn similarity(&self, a: &str, b: &str) -> Result<f64, OracleError> {
        if a == b {
            return Ok(1.0);
        }
        Ok(self
            .scores
            .get(&(a.to_string(), b.to_string()))
            .copied()
            .unwrap_or(self.default_score))
    }
}

/// Fallback extractor used when no clause shape applies
pub trait ExtractionOracle: Send + Sync {
    /// Raw response expected to hold a JSON list of atomic statements
    fn extract_atoms(&self, text: &str) -> Result<String, OracleError>;

    /// Formula over the given `(symbol, text)` labels
    fn formulate(&self, text: &str, mapping: &[(String, String)]) -> Result<String, OracleError>;
}

/// Parse an extraction response, keeping only non-blank string atoms.
///
/// Accepts a bare JSON list or an object carrying a list under any key.
/// Anything else yields no atoms.
pub fn parse_atom_list(raw: &str) -> Vec<String> {
    let value: serde_json::Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Extraction response is not JSON ({}): {:?}", e, raw);
            return Vec::new();
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => {
            match map.into_iter().find_map(|(_, v)| match v {
                serde_json::Value::Array(items) => Some(items),
                _ => None,
            }) {
                Some(items) => items,
                None => {
                    tracing::warn!("Extraction response object holds no list: {:?}", raw);
                    return Vec::new();
                }
            }
        }
        other => {
            tracing::warn!("Extraction response is not a list: {}", other);
            return Vec::new();
        }
    };

    let total = items.len();
    let atoms: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect();

    if atoms.len() < total {
        tracing::warn!("Dropped {} invalid atoms from extraction response", total - atoms.len());
    }
    atoms
}
