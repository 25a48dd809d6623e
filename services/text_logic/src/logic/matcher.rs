//! Recursive rule matcher: English sentence -> formula

use std::collections::BTreeMap;
use serde::Serialize;
use crate::error::{LogicError, Result};
use crate::logic::formula::Formula;
use crate::logic::negation::NegationTable;
use crate::logic::registry::Registry;
use crate::logic::pattern::Captures;
use crate::logic::rule_table::{Rule, RuleTable};
use crate::logic::text::{clean, split_sentences};

/// One sentence of a document and its translation
#[derive(Debug, Clone, Serialize)]
pub struct SentenceTranslation {
    pub english: String,
    pub formula: Formula,
}

#[derive(Debug, Clone)]
pub struct Translator {
    rules: RuleTable,
    negations: NegationTable,
}

impl Translator {
    pub fn new(rules: RuleTable, negations: NegationTable) -> Self {
        Self { rules, negations }
    }

    /// Standard rule and negation tables
    pub fn standard() -> Result<Self> {
        Ok(Self::new(RuleTable::standard()?, NegationTable::standard()?))
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Translate one sentence, registering its atoms in `registry`.
    ///
    /// The first rule whose pattern matches the whole sentence wins; its
    /// slots are translated recursively in slot-name order and the result is
    /// grouped. A match that leaves a slot with no words once negation
    /// markers are stripped ("I go or not") is skipped. With no usable match
    /// the sentence is an atom.
    pub fn translate(&self, sentence: &str, registry: &mut Registry) -> Result<Formula> {
        let sentence = clean(sentence);

        for rule in self.rules.rules() {
            for pattern in rule.patterns() {
                let Some(caps) = pattern.captures(&sentence) else {
                    continue;
                };
                let Some(texts) = self.slot_texts(rule, &caps) else {
                    tracing::debug!("{:?} leaves an empty slot in {:?}", sentence, pattern.source());
                    continue;
                };
                tracing::debug!("{:?} matched pattern {:?}", sentence, pattern.source());

                let mut slots = BTreeMap::new();
                for (key, text) in texts {
                    let formula = self.translate(&text, registry)?;
                    slots.insert(key, formula);
                }
                // Rule::new guarantees every template slot is captured
                if let Some(formula) = rule.template().instantiate(&slots) {
                    return Ok(Formula::group(formula));
                }
            }
        }

        self.translate_atom(&sentence, registry)
    }

    /// Slot key -> joined captured text; `None` if any slot has no content
    fn slot_texts(&self, rule: &Rule, caps: &Captures) -> Option<Vec<(String, String)>> {
        let mut texts = Vec::new();
        for key in rule.template().slot_keys() {
            let text = key
                .split('+')
                .filter_map(|name| caps.get(name).copied())
                .collect::<Vec<_>>()
                .join(" ");
            if self.negations.normalize(&text).text.is_empty() {
                return None;
            }
            texts.push((key, text));
        }
        Some(texts)
    }

    fn translate_atom(&self, sentence: &str, registry: &mut Registry) -> Result<Formula> {
        if sentence.is_empty() {
            return Err(LogicError::EmptySentence);
        }
        let normalized = self.negations.normalize(sentence);
        if normalized.text.is_empty() {
            // Nothing but negation markers: keep the words as the atom
            tracing::warn!("{:?} has no content besides negation; registering it as written", sentence);
            let symbol = registry.register(sentence, 0)?;
            return Ok(Formula::atom(&symbol));
        }
        let symbol = registry.register(&normalized.text, normalized.flips)?;
        Ok(Formula::atom(&symbol).with_parity(normalized.flips))
    }

    /// Translate every sentence of `text` against one shared registry
    pub fn translate_document(
        &self,
        text: &str,
        registry: &mut Registry,
    ) -> Result<Vec<SentenceTranslation>> {
        let mut out = Vec::new();
        for sentence in split_sentences(text) {
            let formula = self.translate(&sentence, registry)?;
            tracing::debug!("{} => {}", sentence, formula);
            out.push(SentenceTranslation {
                english: sentence,
                formula,
            });
        }
        tracing::info!(
            "Translated {} sentences into {} propositions",
            out.len(),
            registry.len()
        );
        Ok(out)
    }
}
