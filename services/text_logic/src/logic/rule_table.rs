//! Ordered table of English connective templates

use crate::error::{LogicError, Result};
use crate::logic::pattern::{Captures, Pattern, Template};

/// A template plus the surface patterns that produce it
#[derive(Debug, Clone)]
pub struct Rule {
    template_source: String,
    template: Template,
    patterns: Vec<Pattern>,
}

impl Rule {
    pub fn new<S: AsRef<str>>(template: &str, patterns: &[S]) -> Result<Self> {
        let parsed = Template::parse(template)?;
        if patterns.is_empty() {
            return Err(LogicError::invalid_rule(template, "rule has no patterns"));
        }

        let expected = parsed.slot_names();
        let mut compiled = Vec::with_capacity(patterns.len());
        for source in patterns {
            let pattern = Pattern::parse(source.as_ref())?;
            let names: Vec<String> = pattern.slot_names().into_iter().map(str::to_string).collect();
            if names.len() != expected.len() || names.iter().any(|n| !expected.contains(n)) {
                return Err(LogicError::invalid_rule(
                    template,
                    format!("pattern '{}' does not use the template's slots", pattern.source()),
                ));
            }
            compiled.push(pattern);
        }

        Ok(Self {
            template_source: template.to_string(),
            template: parsed,
            patterns: compiled,
        })
    }

    pub fn template_source(&self) -> &str {
        &self.template_source
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// First pattern matching the whole text
    pub fn apply<'t>(&self, text: &'t str) -> Option<(&Pattern, Captures<'t>)> {
        self.patterns
            .iter()
            .find_map(|p| p.captures(text).map(|caps| (p, caps)))
    }
}

/// Rules in priority order
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Built-in English table.
    ///
    /// Qualified forms come first: "neither ... nor" before the conjunction
    /// rule, "only if" and "if and only if" before the bare "if" patterns.
    pub fn standard() -> Result<Self> {
        Ok(Self::new(vec![
            Rule::new("~{P} & ~{Q}", &["neither {P} nor {Q}"])?,
            Rule::new("~{A+P} & ~{A+Q}", &["{A} neither {P} nor {Q}"])?,
            Rule::new("{P} <=> {Q}", &["{P} if and only if {Q}", "{P} iff {Q}"])?,
            Rule::new("~{Q} => {P}", &["{P} unless {Q}"])?,
            Rule::new(
                "{P} => {Q}",
                &[
                    "{Q} provided that {P}",
                    "{Q} whenever {P}",
                    "{P} implies {Q}",
                    "{P} therefore {Q}",
                    "{P} only if {Q}",
                    "{Q}, if {P}",
                    "{Q} if {P}",
                    "if {P} then {Q}",
                    "if {P}, {Q}",
                    "given that {P}, it follows that {Q}",
                    "given that {P}, {Q}",
                    "provided that {P}, {Q}",
                    "whenever {P}, {Q}",
                    "when {P}, {Q}",
                    "{P} who {Q}",
                    "as long as {P}, {Q}",
                    "so long as {P}, {Q}",
                    "in the event that {P}, {Q}",
                    "on the condition that {P}, {Q}",
                    "assuming that {P}, {Q}",
                    "{P} is a sufficient condition for {Q}",
                    "{Q} is a necessary condition for {P}",
                ],
            )?,
            Rule::new(
                "{P} & {Q}",
                &[
                    "both {P} and {Q}",
                    "{P} and {Q}",
                    "{P} but {Q}",
                    "{P} although {Q}",
                    "{P} however {Q}",
                    "{P} whereas {Q}",
                    "{P} besides {Q}",
                    "{P} nevertheless {Q}",
                    "{P} even though {Q}",
                    "{P} while {Q}",
                    "{P} as well as {Q}",
                ],
            )?,
            Rule::new(
                "{P} | {Q}",
                &[
                    "either {P} or else {Q}",
                    "either {P} or {Q}",
                    "{P} or else {Q}",
                    "{P} or {Q}",
                    "{P} alternatively {Q}",
                    "{P} otherwise {Q}",
                ],
            )?,
        ]))
    }

    /// Put `rules` ahead of the existing ones
    pub fn with_priority_rules(mut self, rules: Vec<Rule>) -> Self {
        let mut combined = rules;
        combined.append(&mut self.rules);
        self.rules = combined;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule (and pattern) matching the whole text
    pub fn find<'t>(&self, text: &'t str) -> Option<(&Rule, &Pattern, Captures<'t>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(text).map(|(pattern, caps)| (rule, pattern, caps)))
    }
}
