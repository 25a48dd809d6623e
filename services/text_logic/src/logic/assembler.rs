//! Clause segmentation and formula assembly
//!
//! Free text is split into sentences, each sentence gets a subject and has
//! its pronouns resolved, and then one of a few fixed clause shapes is tried
//! in order. Each side of a recognized shape becomes a (possibly negated)
//! conjunction of registered atoms. When nothing is recognized an optional
//! extraction oracle gets the whole clause.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use crate::error::{LogicError, OracleError, Result};
use crate::logic::formula::Formula;
use crate::logic::negation::NegationTable;
use crate::logic::oracle::{parse_atom_list, ExtractionOracle};
use crate::logic::registry::Registry;
use crate::logic::subject::{extract_subject, resolve_pronouns, tokenize, StopWords};
use crate::logic::text::{clean, split_sentences};

pub const DEFAULT_SUBJECT: &str = "Agent";

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "his", "her", "its",
    "our", "their", "each", "every", "no", "some", "any", "all",
];

const PRONOUNS: &[&str] = &["i", "we", "you", "he", "she", "they", "it"];

/// Assembler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Term used when no sentence has named a subject yet
    #[serde(default = "default_subject")]
    pub default_subject: String,
    /// Added to the built-in stop words
    #[serde(default)]
    pub stop_words: Vec<String>,
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            default_subject: default_subject(),
            stop_words: Vec::new(),
        }
    }
}

/// Recognized clause shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseShape {
    /// "X that Y are able to Z"
    Capability,
    /// "without X, Y"
    Absence,
    /// "if P, then Q"
    Conditional,
    /// "Q since P" / "because P, Q"
    Causal,
}

impl ClauseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClauseShape::Capability => "capability",
            ClauseShape::Absence => "absence",
            ClauseShape::Conditional => "conditional",
            ClauseShape::Causal => "causal",
        }
    }
}

/// One formula produced from a clause
#[derive(Debug, Clone, Serialize)]
pub struct Premise {
    pub sentence: String,
    /// `None` for oracle-formulated premises
    pub shape: Option<ClauseShape>,
    pub formula: Formula,
}

/// Output of [`ClauseAssembler::process_clause`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClauseResult {
    /// First 16 hex chars of the sha256 of the raw clause
    pub clause_hash: String,
    pub premises: Vec<Premise>,
    /// Symbols this clause touched, in first-use order
    pub mapping: Vec<(String, String)>,
    pub notes: Vec<String>,
    pub used_fallback: bool,
}

impl ClauseResult {
    pub fn new(clause: &str) -> Self {
        Self {
            clause_hash: clause_hash(clause),
            ..Self::default()
        }
    }

    pub fn add_note(&mut self, note: &str) {
        self.notes.push(note.to_string());
    }
}

pub fn clause_hash(clause: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(clause.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

// Every shape regex names its antecedent `lhs` and its consequent `rhs`.
struct ShapePattern {
    shape: ClauseShape,
    regex: Regex,
}

struct ShapeMatch {
    shape: ClauseShape,
    role: Option<String>,
    lhs: String,
    rhs: String,
}

pub struct ClauseAssembler {
    shapes: Vec<ShapePattern>,
    copula: Regex,
    copula_word: Regex,
    and_split: Regex,
    negations: NegationTable,
    stop_words: StopWords,
    default_subject: String,
    subject: Option<String>,
}

impl std::fmt::Debug for ClauseAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClauseAssembler")
            .field("shapes", &self.shapes.iter().map(|s| s.shape).collect::<Vec<_>>())
            .field("default_subject", &self.default_subject)
            .field("subject", &self.subject)
            .finish()
    }
}

impl ClauseAssembler {
    pub fn new(config: &AssemblerConfig) -> Result<Self> {
        let shape = |kind: ClauseShape, pattern: &str| -> Result<ShapePattern> {
            Ok(ShapePattern {
                shape: kind,
                regex: Regex::new(pattern)?,
            })
        };

        let shapes = vec![
            shape(
                ClauseShape::Capability,
                r"(?i)^(?P<role>.+?)\s+(?:that|who)\s+(?P<lhs>.+?)\s+(?:are|is)\s+able\s+to\s+(?P<rhs>.+)$",
            )?,
            shape(ClauseShape::Absence, r"(?i)^without\s+(?P<lhs>.+?),\s*(?P<rhs>.+)$")?,
            shape(
                ClauseShape::Conditional,
                r"(?i)^if\s+(?P<lhs>.+?),\s*(?:then\s+)?(?P<rhs>.+)$",
            )?,
            shape(ClauseShape::Conditional, r"(?i)^if\s+(?P<lhs>.+?)\s+then\s+(?P<rhs>.+)$")?,
            shape(
                ClauseShape::Causal,
                r"(?i)^(?:since|because)\s+(?P<lhs>.+?),\s*(?P<rhs>.+)$",
            )?,
            shape(
                ClauseShape::Causal,
                r"(?i)^(?P<rhs>.+?),?\s+(?:since|because)\s+(?P<lhs>.+)$",
            )?,
        ];

        Ok(Self {
            shapes,
            copula: Regex::new(r"(?i)^(?P<head>.+?\b(?:is|are|was|were|am|be)\b)\s+(?P<pred>.+)$")?,
            copula_word: Regex::new(r"(?i)\b(?:is|are|was|were|am|be)\b")?,
            and_split: Regex::new(r"(?i)\s+and\s+")?,
            negations: NegationTable::standard()?,
            stop_words: StopWords::default()
                .extend(config.stop_words.iter().map(String::as_str)),
            default_subject: config.default_subject.clone(),
            subject: None,
        })
    }

    pub fn standard() -> Result<Self> {
        Self::new(&AssemblerConfig::default())
    }

    /// Last named subject of this session
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Turn a clause into premises, registering atoms in `registry`.
    ///
    /// `fallback` is consulted only when no sentence yields a formula.
    pub fn process_clause(
        &mut self,
        clause: &str,
        registry: &mut Registry,
        fallback: Option<&dyn ExtractionOracle>,
    ) -> Result<ClauseResult> {
        let mut result = ClauseResult::new(clause);
        let mut touched: Vec<String> = Vec::new();

        for sentence in split_sentences(clause) {
            let tokens = tokenize(&sentence);
            if let Some(named) = extract_subject(&tokens, &self.stop_words) {
                self.subject = Some(named);
            }

            let (resolved, term) = match &self.subject {
                Some(subject) => (resolve_pronouns(&sentence, subject), subject.clone()),
                None => (sentence.clone(), self.default_subject.clone()),
            };

            let Some(found) = self.match_shape(&resolved) else {
                result.add_note(&format!("No clause shape for {:?}", sentence));
                continue;
            };
            tracing::debug!("{:?} matched {} shape", resolved, found.shape.as_str());

            match self.assemble(&found, &term, registry, &mut touched)? {
                Some(formula) => {
                    result.add_note(&format!("{} shape", found.shape.as_str()));
                    result.premises.push(Premise {
                        sentence,
                        shape: Some(found.shape),
                        formula,
                    });
                }
                None => result.add_note(&format!(
                    "Dropped {} shape in {:?}: a side has no atoms",
                    found.shape.as_str(),
                    sentence
                )),
            }
        }

        if result.premises.is_empty() {
            match fallback {
                Some(oracle) => self.formulate(clause, registry, oracle, &mut touched, &mut result)?,
                None => result.add_note("No formula and no extraction oracle"),
            }
        }

        for symbol in touched {
            if let Some(p) = registry.lookup(&symbol) {
                result.mapping.push((p.symbol.clone(), p.text.clone()));
            }
        }

        tracing::info!(
            "Clause {} produced {} premises over {} symbols",
            result.clause_hash,
            result.premises.len(),
            result.mapping.len()
        );
        Ok(result)
    }

    fn match_shape(&self, sentence: &str) -> Option<ShapeMatch> {
        self.shapes.iter().find_map(|sp| {
            let caps = sp.regex.captures(sentence)?;
            Some(ShapeMatch {
                shape: sp.shape,
                role: caps.name("role").map(|m| m.as_str().trim().to_string()),
                lhs: caps["lhs"].trim().to_string(),
                rhs: caps["rhs"].trim().to_string(),
            })
        })
    }

    /// `None` when either side yields no atoms
    fn assemble(
        &self,
        found: &ShapeMatch,
        term: &str,
        registry: &mut Registry,
        touched: &mut Vec<String>,
    ) -> Result<Option<Formula>> {
        let (lhs_text, rhs_text) = match (&found.shape, &found.role) {
            (ClauseShape::Capability, Some(role)) => (
                format!("{} {}", role, found.lhs),
                format!("{} can {}", role, found.rhs),
            ),
            _ => (found.lhs.clone(), found.rhs.clone()),
        };

        // Antecedent registers first so its symbols come first
        let Some(lhs) = self.side(&lhs_text, registry, touched)? else {
            return Ok(None);
        };
        let Some(rhs) = self.side(&rhs_text, registry, touched)? else {
            return Ok(None);
        };

        let antecedent = match found.shape {
            ClauseShape::Capability => Formula::and(Formula::term(term), lhs),
            ClauseShape::Absence => Formula::and(Formula::term(term), Formula::negate(lhs)),
            ClauseShape::Conditional | ClauseShape::Causal => lhs,
        };
        Ok(Some(Formula::implies(antecedent, rhs)))
    }

    fn side(
        &self,
        text: &str,
        registry: &mut Registry,
        touched: &mut Vec<String>,
    ) -> Result<Option<Formula>> {
        let normalized = self.negations.normalize(text);
        let mut atoms = Vec::new();
        for atom in self.split_predicate(&normalized.text) {
            let symbol = registry.register(&atom, normalized.flips)?;
            if !touched.contains(&symbol) {
                touched.push(symbol.clone());
            }
            atoms.push(Formula::atom(&symbol));
        }
        Ok(Formula::conjunction(atoms).map(|f| f.with_parity(normalized.flips)))
    }

    /// Split a side into atoms.
    ///
    /// Clause-level "and" keeps each conjunct whole ("the tenant is late and
    /// the landlord sends notice"). A compound copula predicate shares its
    /// head ("Amy is tall and famous" -> "Amy is tall", "Amy is famous")
    /// unless the conjuncts modify one noun ("a tall and fair actress").
    fn split_predicate(&self, text: &str) -> Vec<String> {
        let text = clean(text);
        if text.is_empty() {
            return Vec::new();
        }

        let conjuncts = self.conjuncts(&text);
        if conjuncts.len() > 1 && conjuncts[1..].iter().any(|c| self.is_clause(c)) {
            return conjuncts.iter().map(|c| c.to_string()).collect();
        }

        if let Some(caps) = self.copula.captures(&text) {
            let head = &caps["head"];
            let parts = self.conjuncts(&caps["pred"]);
            if parts.len() > 1 && !modifies_one_noun(&parts) {
                return parts.iter().map(|p| format!("{} {}", head, p)).collect();
            }
        }
        vec![text]
    }

    fn conjuncts<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.and_split
            .split(text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Whether a conjunct carries its own subject and verb
    fn is_clause(&self, conjunct: &str) -> bool {
        if self.copula_word.is_match(conjunct) {
            return true;
        }
        let words: Vec<&str> = conjunct.split_whitespace().collect();
        let Some(first) = words.first() else {
            return false;
        };
        let lower = first.to_lowercase();
        if PRONOUNS.contains(&lower.as_str()) {
            return words.len() >= 2;
        }
        if DETERMINERS.contains(&lower.as_str()) {
            return words.len() >= 3;
        }
        first.chars().next().is_some_and(char::is_uppercase) && words.len() >= 2
    }

    fn formulate(
        &self,
        clause: &str,
        registry: &mut Registry,
        oracle: &dyn ExtractionOracle,
        touched: &mut Vec<String>,
        result: &mut ClauseResult,
    ) -> Result<()> {
        let extraction_error = |source: OracleError| LogicError::Extraction {
            clause: clause.to_string(),
            source,
        };

        let raw = oracle.extract_atoms(clause).map_err(extraction_error)?;
        let atoms = parse_atom_list(&raw);
        if atoms.is_empty() {
            result.add_note("Extraction oracle returned no atoms");
            return Ok(());
        }

        let mut mapping: Vec<(String, String)> = Vec::new();
        for atom in &atoms {
            let symbol = registry.get_or_create(atom)?;
            if !touched.contains(&symbol) {
                touched.push(symbol.clone());
            }
            if !mapping.iter().any(|(s, _)| *s == symbol) {
                mapping.push((symbol, clean(atom)));
            }
        }

        let formula = oracle.formulate(clause, &mapping).map_err(extraction_error)?;
        let formula = formula.trim();
        if formula.is_empty() {
            result.add_note("Extraction oracle returned an empty formula");
            return Ok(());
        }

        tracing::debug!("Oracle formula for clause {}: {}", result.clause_hash, formula);
        result.premises.push(Premise {
            sentence: clean(clause),
            shape: None,
            formula: Formula::Verbatim(formula.to_string()),
        });
        result.used_fallback = true;
        result.add_note("Formula from extraction oracle");
        Ok(())
    }
}

// "a tall and fair actress": an article plus one modifier, then the noun
fn modifies_one_noun(parts: &[&str]) -> bool {
    let first: Vec<&str> = parts[0].split_whitespace().collect();
    let last_len = parts[parts.len() - 1].split_whitespace().count();
    first.len() == 2 && ["a", "an", "the"].contains(&first[0].to_lowercase().as_str()) && last_len >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::logic::formula::Notation;

    struct FixedExtractor {
        atoms: &'static str,
        formula: &'static str,
    }

    impl ExtractionOracle for FixedExtractor {
        fn extract_atoms(&self, _text: &str) -> std::result::Result<String, OracleError> {
            Ok(self.atoms.to_string())
        }

        fn formulate(
            &self,
            _text: &str,
            _mapping: &[(String, String)],
        ) -> std::result::Result<String, OracleError> {
            Ok(self.formula.to_string())
        }
    }

    struct OfflineExtractor;

    impl ExtractionOracle for OfflineExtractor {
        fn extract_atoms(&self, _text: &str) -> std::result::Result<String, OracleError> {
            Err(OracleError::Unavailable("offline".to_string()))
        }

        fn formulate(
            &self,
            _text: &str,
            _mapping: &[(String, String)],
        ) -> std::result::Result<String, OracleError> {
            Err(OracleError::Unavailable("offline".to_string()))
        }
    }

    fn setup() -> (ClauseAssembler, Registry) {
        (ClauseAssembler::standard().unwrap(), Registry::exact().unwrap())
    }

    #[test]
    fn test_absence_shape() {
        let (mut a, mut r) = setup();
        let result = a
            .process_clause(
                "Without an appreciation for history, an architect can never design a famous building",
                &mut r,
                None,
            )
            .unwrap();
        assert_eq!(result.premises.len(), 1);
        assert_eq!(result.premises[0].shape, Some(ClauseShape::Absence));
        assert_eq!(
            result.premises[0].formula.render(Notation::Solver),
            "(Agent ∧ ¬P) -> ¬Q"
        );
        assert_eq!(
            result.mapping,
            vec![
                ("P".to_string(), "an appreciation for history".to_string()),
                ("Q".to_string(), "an architect can design a famous building".to_string()),
            ]
        );
        assert!(!result.used_fallback);
    }

    #[test]
    fn test_conditional_splits_copula_predicate() {
        let (mut a, mut r) = setup();
        let result = a
            .process_clause("If Amy were tall and famous, she would have won an award.", &mut r, None)
            .unwrap();
        assert_eq!(result.premises[0].formula.render(Notation::Solver), "(P ∧ Q) -> R");
        assert_eq!(r.lookup("P").unwrap().text, "Amy were tall");
        assert_eq!(r.lookup("Q").unwrap().text, "Amy were famous");
        assert_eq!(r.lookup("R").unwrap().text, "Amy would have won an award");
        assert_eq!(a.subject(), Some("Amy"));
    }

    #[test]
    fn test_shared_noun_is_not_split() {
        let (mut a, mut r) = setup();
        let result = a
            .process_clause(
                "If Amy were a tall and fair actress, she would have won an award.",
                &mut r,
                None,
            )
            .unwrap();
        assert_eq!(result.premises[0].formula.render(Notation::Solver), "P -> Q");
        assert_eq!(r.lookup("P").unwrap().text, "Amy were a tall and fair actress");
    }

    #[test]
    fn test_clause_level_conjunction_keeps_subjects() {
        let (mut a, mut r) = setup();
        let result = a
            .process_clause(
                "If the tenant is late and the landlord sends notice, the lease ends",
                &mut r,
                None,
            )
            .unwrap();
        assert_eq!(result.premises[0].formula.render(Notation::Solver), "(P ∧ Q) -> R");
        assert_eq!(r.lookup("P").unwrap().text, "the tenant is late");
        assert_eq!(r.lookup("Q").unwrap().text, "the landlord sends notice");
        assert_eq!(r.lookup("R").unwrap().text, "the lease ends");
    }

    #[test]
    fn test_causal_shape_uses_session_subject() {
        let (mut a, mut r) = setup();
        a.process_clause("If Amy were famous, then Amy would be rich.", &mut r, None)
            .unwrap();
        let result = a
            .process_clause("She is not rich, since she has not won an award.", &mut r, None)
            .unwrap();

        let premise = &result.premises[0];
        assert_eq!(premise.shape, Some(ClauseShape::Causal));
        assert_eq!(premise.formula.render(Notation::Solver), "¬R -> ¬S");
        assert_eq!(r.lookup("R").unwrap().text, "Amy has won an award");
        assert_eq!(r.lookup("S").unwrap().text, "Amy is rich");
        assert_eq!(r.lookup("S").unwrap().polarity, 1);
    }

    #[test]
    fn test_leading_causal() {
        let (mut a, mut r) = setup();
        let result = a
            .process_clause("Because the tenant paid late, the landlord charges a fee", &mut r, None)
            .unwrap();
        assert_eq!(result.premises[0].formula.to_string(), "P ⇒ Q");
        assert_eq!(r.lookup("P").unwrap().text, "the tenant paid late");
    }

    #[test]
    fn test_capability_shape() {
        let (mut a, mut r) = setup();
        let result = a
            .process_clause("Tenants that pay on time are able to renew the lease", &mut r, None)
            .unwrap();
        assert_eq!(
            result.premises[0].formula.render(Notation::Solver),
            "(Tenants ∧ P) -> Q"
        );
        assert_eq!(r.lookup("P").unwrap().text, "Tenants pay on time");
        assert_eq!(r.lookup("Q").unwrap().text, "Tenants can renew the lease");
    }

    #[test]
    fn test_leading_quantifier_is_not_a_subject() {
        let (mut a, mut r) = setup();
        let result = a
            .process_clause("Only tenants that pay on time are able to renew the lease", &mut r, None)
            .unwrap();
        assert_eq!(a.subject(), None);
        assert_eq!(
            result.premises[0].formula.render(Notation::Solver),
            "(Agent ∧ P) -> Q"
        );
        assert_eq!(r.lookup("P").unwrap().text, "Only tenants pay on time");
    }

    #[test]
    fn test_configured_placeholder() {
        let config = AssemblerConfig {
            default_subject: "Party".to_string(),
            stop_words: vec!["Tenants".to_string()],
        };
        let mut a = ClauseAssembler::new(&config).unwrap();
        let mut r = Registry::exact().unwrap();
        let result = a
            .process_clause("Tenants who pay on time are able to renew the lease", &mut r, None)
            .unwrap();
        assert_eq!(
            result.premises[0].formula.render(Notation::Solver),
            "(Party ∧ P) -> Q"
        );
    }

    #[test]
    fn test_empty_side_is_dropped() {
        let (mut a, mut r) = setup();
        let result = a.process_clause("If not, the lease ends", &mut r, None).unwrap();
        assert!(result.premises.is_empty());
        assert!(result.notes.iter().any(|n| n.starts_with("Dropped conditional")));
    }

    #[test]
    fn test_fallback_formulates_verbatim() {
        let (mut a, mut r) = setup();
        let oracle = FixedExtractor {
            atoms: r#"{"atoms": ["The tenant pays rent monthly", 7, ""]}"#,
            formula: "  P \n",
        };
        let result = a
            .process_clause("The tenant shall pay rent monthly.", &mut r, Some(&oracle))
            .unwrap();
        assert!(result.used_fallback);
        assert_eq!(result.premises[0].formula, Formula::Verbatim("P".to_string()));
        assert_eq!(result.premises[0].shape, None);
        assert_eq!(
            result.mapping,
            vec![("P".to_string(), "The tenant pays rent monthly".to_string())]
        );
    }

    #[test]
    fn test_fallback_without_atoms() {
        let (mut a, mut r) = setup();
        let oracle = FixedExtractor {
            atoms: "I could not find any propositions",
            formula: "P",
        };
        let result = a
            .process_clause("The tenant shall pay rent monthly.", &mut r, Some(&oracle))
            .unwrap();
        assert!(result.premises.is_empty());
        assert!(!result.used_fallback);
        assert!(r.is_empty());
    }

    #[test]
    fn test_fallback_error_propagates() {
        let (mut a, mut r) = setup();
        let err = a
            .process_clause("The tenant shall pay rent monthly.", &mut r, Some(&OfflineExtractor))
            .unwrap_err();
        assert!(matches!(err, LogicError::Extraction { .. }));
        assert_eq!(err.stage(), Stage::OracleCall);
    }

    #[test]
    fn test_clause_hash_is_stable() {
        assert_eq!(clause_hash("abc"), clause_hash("abc"));
        assert_eq!(clause_hash("abc").len(), 16);
        assert_ne!(clause_hash("abc"), clause_hash("abd"));
    }
}
