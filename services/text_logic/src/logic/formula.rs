//! Propositional formula tree and its surface notations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Surface syntax used when rendering formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notation {
    /// `～ ∧ ∨ ⇒ ⇔`
    #[default]
    Rules,
    /// `¬ ∧ ∨ -> <->`, accepted by the downstream solver parser
    Solver,
    /// `～ ⋀ ⋁ ⇒ ⇔`
    Symbolic,
}

impl Notation {
    pub fn negation(&self) -> &'static str {
        match self {
            Notation::Rules | Notation::Symbolic => "～",
            Notation::Solver => "¬",
        }
    }

    pub fn conjunction(&self) -> &'static str {
        match self {
            Notation::Rules | Notation::Solver => "∧",
            Notation::Symbolic => "⋀",
        }
    }

    pub fn disjunction(&self) -> &'static str {
        match self {
            Notation::Rules | Notation::Solver => "∨",
            Notation::Symbolic => "⋁",
        }
    }

    pub fn implication(&self) -> &'static str {
        match self {
            Notation::Rules | Notation::Symbolic => "⇒",
            Notation::Solver => "->",
        }
    }

    pub fn biconditional(&self) -> &'static str {
        match self {
            Notation::Rules | Notation::Symbolic => "⇔",
            Notation::Solver => "<->",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Notation::Rules => "rules",
            Notation::Solver => "solver",
            Notation::Symbolic => "symbolic",
        }
    }
}

impl FromStr for Notation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rules" => Ok(Notation::Rules),
            "solver" | "ascii" => Ok(Notation::Solver),
            "symbolic" => Ok(Notation::Symbolic),
            other => Err(format!("unknown notation '{}'", other)),
        }
    }
}

/// Binary connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    And,
    Or,
    Implies,
    Iff,
}

impl Connective {
    pub fn symbol(&self, notation: Notation) -> &'static str {
        match self {
            Connective::And => notation.conjunction(),
            Connective::Or => notation.disjunction(),
            Connective::Implies => notation.implication(),
            Connective::Iff => notation.biconditional(),
        }
    }
}

/// Immutable formula value, built bottom-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// Registered proposition symbol
    Atom(String),
    /// Subject term introduced by the clause assembler (e.g. `Agent`)
    Term(String),
    Not(Box<Formula>),
    Binary(Connective, Box<Formula>, Box<Formula>),
    /// Explicit parenthesis group
    Group(Box<Formula>),
    /// Formula text produced by an extraction oracle, kept as-is
    Verbatim(String),
}

impl Formula {
    pub fn atom(symbol: &str) -> Self {
        Formula::Atom(symbol.to_string())
    }

    pub fn term(name: &str) -> Self {
        Formula::Term(name.to_string())
    }

    pub fn negate(inner: Formula) -> Self {
        Formula::Not(Box::new(inner))
    }

    pub fn binary(connective: Connective, lhs: Formula, rhs: Formula) -> Self {
        Formula::Binary(connective, Box::new(lhs), Box::new(rhs))
    }

    pub fn and(lhs: Formula, rhs: Formula) -> Self {
        Self::binary(Connective::And, lhs, rhs)
    }

    pub fn or(lhs: Formula, rhs: Formula) -> Self {
        Self::binary(Connective::Or, lhs, rhs)
    }

    pub fn implies(lhs: Formula, rhs: Formula) -> Self {
        Self::binary(Connective::Implies, lhs, rhs)
    }

    pub fn group(inner: Formula) -> Self {
        Formula::Group(Box::new(inner))
    }

    /// Left-nested conjunction of all parts; `None` when empty
    pub fn conjunction(parts: Vec<Formula>) -> Option<Self> {
        parts.into_iter().reduce(Formula::and)
    }

    /// Wrap in `count % 2` negations
    pub fn with_parity(self, count: u32) -> Self {
        if count % 2 == 1 {
            Formula::negate(self)
        } else {
            self
        }
    }

    /// Strip enclosing groups
    pub fn ungrouped(&self) -> &Formula {
        let mut current = self;
        while let Formula::Group(inner) = current {
            current = inner;
        }
        current
    }

    /// Symbols referenced by this formula, in first-occurrence order
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Formula::Atom(symbol) => {
                if !out.contains(&symbol.as_str()) {
                    out.push(symbol);
                }
            }
            Formula::Not(inner) | Formula::Group(inner) => inner.collect_symbols(out),
            Formula::Binary(_, lhs, rhs) => {
                lhs.collect_symbols(out);
                rhs.collect_symbols(out);
            }
            Formula::Term(_) | Formula::Verbatim(_) => {}
        }
    }

    pub fn render(&self, notation: Notation) -> String {
        let mut out = String::new();
        self.write(&mut out, notation);
        out
    }

    fn write(&self, out: &mut String, notation: Notation) {
        match self {
            Formula::Atom(s) | Formula::Term(s) | Formula::Verbatim(s) => out.push_str(s),
            Formula::Not(inner) => {
                out.push_str(notation.negation());
                inner.write_operand(out, notation);
            }
            Formula::Binary(connective, lhs, rhs) => {
                lhs.write_operand(out, notation);
                out.push(' ');
                out.push_str(connective.symbol(notation));
                out.push(' ');
                rhs.write_operand(out, notation);
            }
            Formula::Group(inner) => {
                out.push('(');
                inner.write(out, notation);
                out.push(')');
            }
        }
    }

    // Bare binary operands get parentheses so precedence never matters.
    fn write_operand(&self, out: &mut String, notation: Notation) {
        if matches!(self, Formula::Binary(..)) {
            out.push('(');
            self.write(out, notation);
            out.push(')');
        } else {
            self.write(out, notation);
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Notation::Rules))
    }
}
