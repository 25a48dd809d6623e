use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::logic::assembler::{AssemblerConfig, ClauseAssembler};
use crate::logic::formula::Notation;
use crate::logic::matcher::Translator;
use crate::logic::negation::NegationTable;
use crate::logic::oracle::EquivalenceOracle;
use crate::logic::registry::{Alphabet, Registry, DEFAULT_ALPHABET, DEFAULT_SIMILARITY_THRESHOLD};
use crate::logic::rule_table::{Rule, RuleTable};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub assembler: AssemblerConfig,
    /// Extra rules, tried before the built-in table
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    /// Indexed names (`P1`, `P2`, ...) once the letters run out; with an
    /// empty alphabet every name is indexed
    #[serde(default)]
    pub overflow_prefix: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            alphabet: default_alphabet(),
            overflow_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub notation: Notation,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub template: String,
    pub patterns: Vec<String>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;
        let config: Config = toml::from_str(&content)
            .context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.registry.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("registry.threshold must be within [0, 1], got {}", threshold);
        }
        if self.registry.alphabet.trim().is_empty() && self.registry.overflow_prefix.is_none() {
            anyhow::bail!("registry.alphabet is empty and no overflow_prefix is set");
        }
        if let Some(prefix) = &self.registry.overflow_prefix {
            if prefix.trim().is_empty() {
                anyhow::bail!("registry.overflow_prefix must not be blank");
            }
        }
        Ok(())
    }

    pub fn alphabet(&self) -> Alphabet {
        let letters = Alphabet::letters(&self.registry.alphabet);
        match &self.registry.overflow_prefix {
            Some(prefix) => letters.with_overflow(prefix),
            None => letters,
        }
    }

    /// Built-in rule table with the configured rules in front
    pub fn translator(&self) -> Result<Translator> {
        let mut custom = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let compiled = Rule::new(&rule.template, rule.patterns.as_slice())
                .with_context(|| format!("Invalid configured rule {:?}", rule.template))?;
            custom.push(compiled);
        }
        let rules = RuleTable::standard()?.with_priority_rules(custom);
        Ok(Translator::new(rules, NegationTable::standard()?))
    }

    pub fn registry(&self, oracle: Box<dyn EquivalenceOracle>) -> Result<Registry> {
        Ok(Registry::new(oracle, NegationTable::standard()?)
            .with_alphabet(self.alphabet())
            .with_threshold(self.registry.threshold))
    }

    pub fn assembler(&self) -> Result<ClauseAssembler> {
        Ok(ClauseAssembler::new(&self.assembler)?)
    }
}

fn default_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_alphabet() -> String {
    DEFAULT_ALPHABET.to_string()
}
