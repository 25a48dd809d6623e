//! Argument handoff to an external proof solver

use serde::Serialize;
use crate::logic::formula::{Formula, Notation};

/// Premises plus a conclusion, rendered as `p1, p2 / c`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub premises: Vec<Formula>,
    pub conclusion: Formula,
}

impl Argument {
    pub fn new(premises: Vec<Formula>, conclusion: Formula) -> Self {
        Self { premises, conclusion }
    }

    /// The last formula is the conclusion; `None` when empty
    pub fn from_formulas(mut formulas: Vec<Formula>) -> Option<Self> {
        let conclusion = formulas.pop()?;
        Some(Self::new(formulas, conclusion))
    }

    pub fn render(&self, notation: Notation) -> String {
        let premises = self
            .premises
            .iter()
            .map(|p| p.ungrouped().render(notation))
            .collect::<Vec<_>>()
            .join(", ");
        let conclusion = self.conclusion.ungrouped().render(notation);
        if premises.is_empty() {
            format!("/ {}", conclusion)
        } else {
            format!("{} / {}", premises, conclusion)
        }
    }
}
