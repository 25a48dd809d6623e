//! Proposition identity registry
//!
//! Maps symbolic names to canonical sentence text, reusing a name whenever a
//! new text denotes a proposition already seen. Each registry is an explicit
//! value owned by a translation session; nothing here is global.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use crate::error::{LogicError, OracleError, Result};
use crate::logic::negation::NegationTable;
use crate::logic::oracle::{EquivalenceOracle, ExactOracle};
use crate::logic::text::clean;

/// Similarity a match must exceed to reuse an existing symbol
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Letters handed out in order; `A`, `I` and `O` are skipped
pub const DEFAULT_ALPHABET: &str = "PQRSTUVWXYZBCDEFGHJKLMN";

/// Ordered symbol supply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    letters: Vec<String>,
    overflow_prefix: Option<String>,
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::letters(DEFAULT_ALPHABET)
    }
}

impl Alphabet {
    /// One symbol per character; exhaustion is an error
    pub fn letters(letters: &str) -> Self {
        let mut symbols: Vec<String> = Vec::new();
        for c in letters.chars().filter(|c| !c.is_whitespace()) {
            let s = c.to_string();
            if !symbols.contains(&s) {
                symbols.push(s);
            }
        }
        Self {
            letters: symbols,
            overflow_prefix: None,
        }
    }

    /// Only indexed names: `P1`, `P2`, ...
    pub fn indexed(prefix: &str) -> Self {
        Self {
            letters: Vec::new(),
            overflow_prefix: Some(prefix.to_string()),
        }
    }

    /// Continue with `{prefix}1`, `{prefix}2`, ... once letters run out
    pub fn with_overflow(mut self, prefix: &str) -> Self {
        self.overflow_prefix = Some(prefix.to_string());
        self
    }

    /// Number of names available, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        match self.overflow_prefix {
            Some(_) => None,
            None => Some(self.letters.len()),
        }
    }

    pub fn nth(&self, index: usize) -> Option<String> {
        if let Some(letter) = self.letters.get(index) {
            return Some(letter.clone());
        }
        self.overflow_prefix
            .as_ref()
            .map(|prefix| format!("{}{}", prefix, index - self.letters.len() + 1))
    }
}

/// A registered atomic proposition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposition {
    pub symbol: String,
    pub text: String,
    /// Sign-flipping negation markers removed before registration
    pub polarity: u32,
}

#[derive(Debug, Clone)]
struct Entry {
    proposition: Proposition,
    stripped: String,
    negated: bool,
}

pub struct Registry {
    entries: Vec<Entry>,
    alphabet: Alphabet,
    threshold: f64,
    oracle: Box<dyn EquivalenceOracle>,
    negations: NegationTable,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("propositions", &self.propositions().collect::<Vec<_>>())
            .field("alphabet", &self.alphabet)
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl Registry {
    pub fn new(oracle: Box<dyn EquivalenceOracle>, negations: NegationTable) -> Self {
        Self {
            entries: Vec::new(),
            alphabet: Alphabet::default(),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            oracle,
            negations,
        }
    }

    /// Exact-equality registry with the standard negation table
    pub fn exact() -> Result<Self> {
        Ok(Self::new(Box::new(ExactOracle), NegationTable::standard()?))
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Propositions in insertion order
    pub fn propositions(&self) -> impl Iterator<Item = &Proposition> {
        self.entries.iter().map(|e| &e.proposition)
    }

    /// `(symbol, text)` pairs in insertion order
    pub fn mapping(&self) -> Vec<(String, String)> {
        self.propositions()
            .map(|p| (p.symbol.clone(), p.text.clone()))
            .collect()
    }

    pub fn lookup(&self, symbol: &str) -> Option<&Proposition> {
        self.propositions().find(|p| p.symbol == symbol)
    }

    /// Symbol for `text`, registering it if no equivalent entry exists
    pub fn get_or_create(&mut self, text: &str) -> Result<String> {
        self.register(text, 0)
    }

    /// Like [`Registry::get_or_create`], recording the polarity count the
    /// caller stripped from the text. Polarity is kept from first insertion.
    pub fn register(&mut self, text: &str, polarity: u32) -> Result<String> {
        let text = clean(text);
        let (stripped, negated) = self.negations.stripped(&text);

        if let Some(symbol) = self.find_equivalent(&text, &stripped, negated)? {
            tracing::debug!("Reusing {} for {:?}", symbol, text);
            return Ok(symbol);
        }

        let symbol = self.next_symbol(&text)?;
        tracing::info!("Registered {} = {:?} (polarity {})", symbol, text, polarity);
        self.entries.push(Entry {
            proposition: Proposition {
                symbol: symbol.clone(),
                text,
                polarity,
            },
            stripped,
            negated,
        });
        Ok(symbol)
    }

    /// Best-scoring entry with agreeing negation flag, if above threshold.
    ///
    /// Entries whose negation flag disagrees with the candidate are never
    /// considered, so "X" and "not X" always get distinct symbols.
    fn find_equivalent(&self, text: &str, stripped: &str, negated: bool) -> Result<Option<String>> {
        let mut best: Option<(&Entry, f64)> = None;

        for entry in &self.entries {
            if entry.negated != negated {
                if entry.stripped == stripped {
                    tracing::debug!(
                        "{:?} is the negation of {}; keeping them distinct",
                        text,
                        entry.proposition.symbol
                    );
                }
                continue;
            }

            let score = if entry.proposition.text == text {
                1.0
            } else {
                self.score(text, &entry.proposition.text)?
            };

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }

        Ok(best
            .filter(|(_, score)| *score > self.threshold)
            .map(|(entry, _)| entry.proposition.symbol.clone()))
    }

    fn score(&self, candidate: &str, existing: &str) -> Result<f64> {
        let score = self
            .oracle
            .similarity(candidate, existing)
            .map_err(|source| LogicError::Equivalence {
                candidate: candidate.to_string(),
                source,
            })?;
        if !(0.0..=1.0).contains(&score) {
            return Err(LogicError::Equivalence {
                candidate: candidate.to_string(),
                source: OracleError::InvalidScore(score),
            });
        }
        Ok(score)
    }

    fn next_symbol(&self, text: &str) -> Result<String> {
        let mut index = 0;
        while let Some(symbol) = self.alphabet.nth(index) {
            if !self.entries.iter().any(|e| e.proposition.symbol == symbol) {
                return Ok(symbol);
            }
            index += 1;
        }
        Err(LogicError::AlphabetExhausted {
            capacity: self.alphabet.capacity().unwrap_or(index),
            text: text.to_string(),
        })
    }
}

/// Serializes as an ordered `{symbol: text}` map
impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for p in self.propositions() {
            map.serialize_entry(&p.symbol, &p.text)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::oracle::SimilarityTable;

    fn exact() -> Registry {
        Registry::exact().unwrap()
    }

    fn semantic(table: SimilarityTable) -> Registry {
        Registry::new(Box::new(table), NegationTable::standard().unwrap())
    }

    #[test]
    fn test_first_symbol_is_p() {
        let mut r = exact();
        assert_eq!(r.get_or_create("A").unwrap(), "P");
        assert_eq!(r.get_or_create("B").unwrap(), "Q");
        assert_eq!(r.get_or_create("A").unwrap(), "P");
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_exact_oracle_keeps_surface_variants_apart() {
        let mut r = exact();
        let a = r.get_or_create("I drink beer").unwrap();
        let b = r.get_or_create("I do drink beer").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_semantic_oracle_reuses_above_threshold() {
        let table = SimilarityTable::new().with_pair("I drink beer", "I do drink beer", 0.9);
        let mut r = semantic(table);
        let a = r.get_or_create("I drink beer").unwrap();
        let b = r.get_or_create("I do drink beer").unwrap();
        assert_eq!(a, b);
        assert_eq!(r.lookup(&a).unwrap().text, "I drink beer");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let table = SimilarityTable::new().with_pair("I drink beer", "I drink ale", 0.85);
        let mut r = semantic(table);
        let a = r.get_or_create("I drink beer").unwrap();
        let b = r.get_or_create("I drink ale").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_negation_disagreement_gives_distinct_symbols() {
        let table = SimilarityTable::new().with_default(0.95);
        let mut r = semantic(table);
        let pos = r.get_or_create("the tenant pays rent").unwrap();
        let neg = r.get_or_create("the tenant does not pay rent").unwrap();
        let neg_again = r.get_or_create("the tenant doesn't pay rent").unwrap();
        assert_ne!(pos, neg);
        assert_eq!(neg, neg_again);

        let mut r = exact();
        let x = r.get_or_create("X holds").unwrap();
        let not_x = r.get_or_create("not X holds").unwrap();
        assert_ne!(x, not_x);
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let oracle = |_: &str, _: &str| -> std::result::Result<f64, OracleError> {
            Err(OracleError::Unavailable("model not loaded".to_string()))
        };
        let mut r = Registry::new(Box::new(oracle), NegationTable::standard().unwrap());
        r.get_or_create("first").unwrap();
        let err = r.get_or_create("second").unwrap_err();
        assert!(matches!(err, LogicError::Equivalence { ref candidate, .. } if candidate == "second"));
        // identical text never reaches the oracle
        assert_eq!(r.get_or_create("first").unwrap(), "P");
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let oracle = |_: &str, _: &str| -> std::result::Result<f64, OracleError> { Ok(1.5) };
        let mut r = Registry::new(Box::new(oracle), NegationTable::standard().unwrap());
        r.get_or_create("first").unwrap();
        assert!(matches!(
            r.get_or_create("second"),
            Err(LogicError::Equivalence { source: OracleError::InvalidScore(_), .. })
        ));
    }

    #[test]
    fn test_alphabet_exhaustion() {
        let mut r = exact().with_alphabet(Alphabet::letters("PQ"));
        r.get_or_create("one").unwrap();
        r.get_or_create("two").unwrap();
        let err = r.get_or_create("three").unwrap_err();
        assert!(matches!(err, LogicError::AlphabetExhausted { capacity: 2, .. }));
    }

    #[test]
    fn test_overflow_and_indexed_names() {
        let mut r = exact().with_alphabet(Alphabet::letters("PQ").with_overflow("P"));
        for text in ["one", "two", "three", "four"] {
            r.get_or_create(text).unwrap();
        }
        let symbols: Vec<_> = r.propositions().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["P", "Q", "P1", "P2"]);

        let mut r = exact().with_alphabet(Alphabet::indexed("P"));
        assert_eq!(r.get_or_create("The tenant pays rent").unwrap(), "P1");
    }

    #[test]
    fn test_default_alphabet_size() {
        assert_eq!(Alphabet::default().capacity(), Some(23));
    }

    #[test]
    fn test_serialize_as_ordered_map() {
        let mut r = exact();
        r.get_or_create("B").unwrap();
        r.get_or_create("A").unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"P":"B","Q":"A"}"#);
    }
}
