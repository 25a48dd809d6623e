//! Negation normalization with polarity accounting
//!
//! Markers are applied in order against an atomic sentence. A marker either
//! flips the sign of the atom ("not", "cannot", "n't", ...) or is a purely
//! lexical rewrite that leaves the sign alone ("shoulda" -> "should have").
//! Only the parity of flips decides whether the atom ends up negated.

use regex::Regex;
use crate::error::Result;
use crate::logic::text::clean;

/// Effect a marker has on the sign of an atom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Flip,
    Keep,
}

#[derive(Debug, Clone)]
pub struct NegationMarker {
    pattern: Regex,
    replacement: String,
    sign: Sign,
}

impl NegationMarker {
    /// Marker matched as a whole word, case-insensitively
    pub fn word(word: &str, replacement: &str, sign: Sign) -> Result<Self> {
        Self::pattern(&format!(r"(?i)\b{}\b", regex::escape(word)), replacement, sign)
    }

    /// Marker matched anywhere, including inside words (e.g. `n't`)
    pub fn suffix(suffix: &str, replacement: &str, sign: Sign) -> Result<Self> {
        Self::pattern(&format!("(?i){}", regex::escape(suffix)), replacement, sign)
    }

    fn pattern(pattern: &str, replacement: &str, sign: Sign) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement: replacement.to_string(),
            sign,
        })
    }
}

/// Result of normalizing one atom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// Number of sign-flipping substitutions
    pub flips: u32,
    /// Number of sign-preserving substitutions
    pub rewrites: u32,
}

impl Normalized {
    pub fn is_negated(&self) -> bool {
        self.flips % 2 == 1
    }
}

/// Ordered marker table
#[derive(Debug, Clone)]
pub struct NegationTable {
    markers: Vec<NegationMarker>,
}

impl NegationTable {
    pub fn new(markers: Vec<NegationMarker>) -> Self {
        Self { markers }
    }

    /// Standard English table. Order matters: whole-word contractions must
    /// run before the bare `n't` suffix strips them.
    pub fn standard() -> Result<Self> {
        use Sign::*;
        Ok(Self::new(vec![
            NegationMarker::word("not", "", Flip)?,
            NegationMarker::word("never", "", Flip)?,
            NegationMarker::word("cannot", "can", Flip)?,
            NegationMarker::word("can't", "can", Flip)?,
            NegationMarker::word("won't", "will", Flip)?,
            NegationMarker::word("ain't", "is", Flip)?,
            NegationMarker::word("false", "true", Flip)?,
            NegationMarker::word("fails", "succeeds", Flip)?,
            NegationMarker::word("shoulda", "should have", Keep)?,
            NegationMarker::word("coulda", "could have", Keep)?,
            NegationMarker::word("woulda", "would have", Keep)?,
            NegationMarker::suffix("n't", "", Flip)?,
        ]))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Apply every marker in sequence and re-clean the result
    pub fn normalize(&self, sentence: &str) -> Normalized {
        let mut text = sentence.to_string();
        let mut flips = 0u32;
        let mut rewrites = 0u32;

        for marker in &self.markers {
            let hits = marker.pattern.find_iter(&text).count() as u32;
            if hits == 0 {
                continue;
            }
            text = marker
                .pattern
                .replace_all(&text, marker.replacement.as_str())
                .into_owned();
            match marker.sign {
                Sign::Flip => flips += hits,
                Sign::Keep => rewrites += hits,
            }
        }

        Normalized {
            text: clean(&text),
            flips,
            rewrites,
        }
    }

    /// Negation-stripped, case-folded comparison key and its negation flag
    pub fn stripped(&self, text: &str) -> (String, bool) {
        let normalized = self.normalize(text);
        let negated = normalized.is_negated();
        (normalized.text.to_lowercase(), negated)
    }
}
