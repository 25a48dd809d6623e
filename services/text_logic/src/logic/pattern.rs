//! Surface patterns and output templates for the rule table
//!
//! A pattern such as `if {P}, {Q}` is parsed into literal and slot segments
//! and matched against the whole input by a small backtracking search:
//! literals compare case-insensitively, slots take the shortest span of one
//! or more characters that still lets the rest of the pattern match.
//!
//! A template such as `~{P} & ~{Q}` describes the formula built from the
//! translated slots. A composite slot `{A+P}` joins the captured texts of
//! `A` and `P` with a space before translation, which lets a shared subject
//! distribute over both branches of "A neither P nor Q".

use std::collections::{BTreeMap, BTreeSet};
use crate::error::{LogicError, Result};
use crate::logic::formula::{Connective, Formula};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// Captured slot spans keyed by slot name
pub type Captures<'t> = BTreeMap<String, &'t str>;

#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars();

        while let Some(ch) = chars.next() {
            if ch != '{' {
                literal.extend(ch.to_lowercase());
                continue;
            }
            let mut name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            if !closed || !is_slot_name(&name) {
                return Err(LogicError::invalid_rule(source, format!("malformed slot '{{{}'", name)));
            }
            if literal.is_empty() && matches!(segments.last(), Some(Segment::Slot(_))) {
                return Err(LogicError::invalid_rule(source, "adjacent slots need a literal between them"));
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Slot(name));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        if !segments.iter().any(|s| matches!(s, Segment::Literal(_))) {
            return Err(LogicError::invalid_rule(source, "pattern needs at least one literal"));
        }

        let mut seen = BTreeSet::new();
        for segment in &segments {
            if let Segment::Slot(name) = segment {
                if !seen.insert(name.as_str()) {
                    return Err(LogicError::invalid_rule(source, format!("slot {} used twice", name)));
                }
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn slot_names(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Slot(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Match the entire text, returning slot spans on success
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        let mut spans = Vec::new();
        if self.match_from(0, text, 0, &mut spans) {
            Some(spans.into_iter().collect())
        } else {
            None
        }
    }

    fn match_from<'t>(
        &self,
        index: usize,
        text: &'t str,
        pos: usize,
        spans: &mut Vec<(String, &'t str)>,
    ) -> bool {
        let Some(segment) = self.segments.get(index) else {
            return pos == text.len();
        };

        match segment {
            Segment::Literal(literal) => match match_literal(text, pos, literal) {
                Some(end) => self.match_from(index + 1, text, end, spans),
                None => false,
            },
            Segment::Slot(name) => {
                if pos >= text.len() {
                    return false;
                }
                // Trailing slot: the rest of the input is the only candidate.
                if index + 1 == self.segments.len() {
                    spans.push((name.clone(), &text[pos..]));
                    return true;
                }
                for (offset, ch) in text[pos..].char_indices() {
                    let end = pos + offset + ch.len_utf8();
                    spans.push((name.clone(), &text[pos..end]));
                    if self.match_from(index + 1, text, end, spans) {
                        return true;
                    }
                    spans.pop();
                }
                false
            }
        }
    }
}

fn is_slot_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Case-insensitive literal match at `pos`; returns the end offset
fn match_literal(text: &str, pos: usize, literal: &str) -> Option<usize> {
    let mut expected = literal.chars().peekable();
    let mut end = pos;
    for (offset, ch) in text[pos..].char_indices() {
        if expected.peek().is_none() {
            break;
        }
        for lower in ch.to_lowercase() {
            if expected.next() != Some(lower) {
                return None;
            }
        }
        end = pos + offset + ch.len_utf8();
    }
    match expected.peek() {
        None => Some(end),
        Some(_) => None,
    }
}

/// Output shape of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    /// One or more slot names whose texts are joined before translation
    Slot(Vec<String>),
    Not(Box<Template>),
    Binary(Connective, Box<Template>, Box<Template>),
}

impl Template {
    /// Parse `unary (op unary)?` where `unary := '~'* '{' name ('+' name)* '}'`
    /// and `op` is one of `&`, `|`, `=>`, `<=>`.
    pub fn parse(source: &str) -> Result<Self> {
        let mut rest = source.trim();
        let lhs = parse_unary(source, &mut rest)?;
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(lhs);
        }

        let connective = [
            ("<=>", Connective::Iff),
            ("=>", Connective::Implies),
            ("&", Connective::And),
            ("|", Connective::Or),
        ]
        .into_iter()
        .find_map(|(op, connective)| rest.strip_prefix(op).map(|r| (r, connective)));

        let Some((after, connective)) = connective else {
            return Err(LogicError::invalid_rule(source, format!("unexpected '{}'", rest)));
        };
        rest = after;
        let rhs = parse_unary(source, &mut rest)?;
        if !rest.trim().is_empty() {
            return Err(LogicError::invalid_rule(source, format!("trailing input '{}'", rest.trim())));
        }
        Ok(Template::Binary(connective, Box::new(lhs), Box::new(rhs)))
    }

    /// Composite slot keys (`"P"`, `"A+P"`) in sorted order
    pub fn slot_keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        self.collect_keys(&mut keys);
        keys
    }

    /// Every individual slot name referenced
    pub fn slot_names(&self) -> BTreeSet<String> {
        self.slot_keys()
            .iter()
            .flat_map(|key| key.split('+').map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    fn collect_keys(&self, keys: &mut BTreeSet<String>) {
        match self {
            Template::Slot(names) => {
                keys.insert(names.join("+"));
            }
            Template::Not(inner) => inner.collect_keys(keys),
            Template::Binary(_, lhs, rhs) => {
                lhs.collect_keys(keys);
                rhs.collect_keys(keys);
            }
        }
    }

    /// Build the formula from translated slot formulas keyed by slot key
    pub fn instantiate(&self, slots: &BTreeMap<String, Formula>) -> Option<Formula> {
        match self {
            Template::Slot(names) => slots.get(&names.join("+")).cloned(),
            Template::Not(inner) => inner.instantiate(slots).map(Formula::negate),
            Template::Binary(connective, lhs, rhs) => Some(Formula::binary(
                *connective,
                lhs.instantiate(slots)?,
                rhs.instantiate(slots)?,
            )),
        }
    }
}

fn parse_unary(source: &str, rest: &mut &str) -> Result<Template> {
    let mut negations = 0;
    loop {
        *rest = rest.trim_start();
        match rest.strip_prefix('~') {
            Some(after) => {
                negations += 1;
                *rest = after;
            }
            None => break,
        }
    }

    let Some(after_open) = rest.strip_prefix('{') else {
        return Err(LogicError::invalid_rule(source, "expected a slot"));
    };
    let Some(close) = after_open.find('}') else {
        return Err(LogicError::invalid_rule(source, "unclosed slot"));
    };
    let names: Vec<String> = after_open[..close].split('+').map(|n| n.trim().to_string()).collect();
    if !names.iter().all(|n| is_slot_name(n)) {
        return Err(LogicError::invalid_rule(source, format!("malformed slot '{}'", &after_open[..close])));
    }
    *rest = &after_open[close + 1..];

    let mut template = Template::Slot(names);
    for _ in 0..negations {
        template = Template::Not(Box::new(template));
    }
    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_full_match_only() {
        let p = Pattern::parse("{P} and {Q}").unwrap();
        let caps = p.captures("A and B").unwrap();
        assert_eq!(caps["P"], "A");
        assert_eq!(caps["Q"], "B");
        assert!(Pattern::parse("if {P}, {Q}").unwrap().captures("so if A, B").is_none());
    }

    #[test]
    fn test_slots_are_non_greedy() {
        let p = Pattern::parse("{P} and {Q}").unwrap();
        let caps = p.captures("A and B and C").unwrap();
        assert_eq!(caps["P"], "A");
        assert_eq!(caps["Q"], "B and C");
    }

    #[test]
    fn test_case_insensitive_literals() {
        let p = Pattern::parse("if {P} then {Q}").unwrap();
        let caps = p.captures("If you liked it THEN you shoulda put a ring on it").unwrap();
        assert_eq!(caps["P"], "you liked it");
        assert_eq!(caps["Q"], "you shoulda put a ring on it");
    }

    #[test]
    fn test_slot_needs_one_char() {
        let p = Pattern::parse("{Q} if {P}").unwrap();
        assert!(p.captures("if A then B").is_none());
    }

    #[test]
    fn test_backtracking_over_literal() {
        let p = Pattern::parse("{Q}, if {P}").unwrap();
        let caps = p.captures("It don't mean a thing, if it ain't got that swing").unwrap();
        assert_eq!(caps["Q"], "It don't mean a thing");
        assert_eq!(caps["P"], "it ain't got that swing");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(Pattern::parse("{P}{Q} and").is_err());
        assert!(Pattern::parse("{P}").is_err());
        assert!(Pattern::parse("{P and").is_err());
        assert!(Pattern::parse("{P} or {P}").is_err());
    }

    #[test]
    fn test_template_parse() {
        let t = Template::parse("~{A+P} & ~{A+Q}").unwrap();
        assert_eq!(
            t.slot_keys().into_iter().collect::<Vec<_>>(),
            vec!["A+P".to_string(), "A+Q".to_string()]
        );
        assert_eq!(t.slot_names().len(), 3);

        let t = Template::parse("~{Q} => {P}").unwrap();
        let mut slots = BTreeMap::new();
        slots.insert("P".to_string(), Formula::atom("P"));
        slots.insert("Q".to_string(), Formula::atom("Q"));
        assert_eq!(t.instantiate(&slots).unwrap().to_string(), "～Q ⇒ P");
    }

    #[test]
    fn test_template_errors() {
        assert!(Template::parse("{P} ^ {Q}").is_err());
        assert!(Template::parse("P & Q").is_err());
        assert!(Template::parse("{P} & {Q} & {R}").is_err());
    }
}
