//! Error taxonomy for the translation engine

use thiserror::Error;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RuleMatching,
    Registry,
    Segmentation,
    OracleCall,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::RuleMatching => "rule_matching",
            Stage::Registry => "registry",
            Stage::Segmentation => "segmentation",
            Stage::OracleCall => "oracle_call",
        }
    }
}

/// Failure reported by an external oracle
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle returned similarity {0} outside [0, 1]")]
    InvalidScore(f64),
}

#[derive(Debug, Error)]
pub enum LogicError {
    #[error("invalid rule {template:?}: {reason}")]
    InvalidRule { template: String, reason: String },

    #[error("symbol alphabet exhausted after {capacity} propositions while registering {text:?}")]
    AlphabetExhausted { capacity: usize, text: String },

    #[error("equivalence oracle failed while registering {candidate:?}")]
    Equivalence {
        candidate: String,
        #[source]
        source: OracleError,
    },

    #[error("extraction oracle failed on clause {clause:?}")]
    Extraction {
        clause: String,
        #[source]
        source: OracleError,
    },

    #[error("sentence is empty after cleanup")]
    EmptySentence,

    #[error("failed to compile clause pattern")]
    Pattern(#[from] regex::Error),
}

impl LogicError {
    pub fn invalid_rule(template: &str, reason: impl Into<String>) -> Self {
        LogicError::InvalidRule {
            template: template.to_string(),
            reason: reason.into(),
        }
    }

    /// Stage that raised this error
    pub fn stage(&self) -> Stage {
        match self {
            LogicError::InvalidRule { .. } => Stage::RuleMatching,
            LogicError::AlphabetExhausted { .. } => Stage::Registry,
            LogicError::Equivalence { .. } | LogicError::Extraction { .. } => Stage::OracleCall,
            LogicError::EmptySentence | LogicError::Pattern(_) => Stage::Segmentation,
        }
    }
}

pub type Result<T> = std::result::Result<T, LogicError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_stage_mapping() {
        let err = LogicError::AlphabetExhausted {
            capacity: 23,
            text: "the tenant pays rent".to_string(),
        };
        assert_eq!(err.stage(), Stage::Registry);
        assert!(err.to_string().contains("23"));

        let err = LogicError::invalid_rule("{P} => {Q}", "missing slot");
        assert_eq!(err.stage().as_str(), "rule_matching");

        assert_eq!(LogicError::EmptySentence.stage(), Stage::Segmentation);
    }

    #[test]
    fn test_oracle_source_is_kept() {
        let err = LogicError::Equivalence {
            candidate: "I drink beer".to_string(),
            source: OracleError::Unavailable("connection refused".to_string()),
        };
        assert_eq!(err.stage(), Stage::OracleCall);
        let source = err.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("connection refused"));
    }
}
