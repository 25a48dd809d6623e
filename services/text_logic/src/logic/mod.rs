//! English → propositional logic pipeline
//!
//! This module implements:
//! 1. Sentence cleanup and segmentation
//! 2. Negation normalization with sign parity
//! 3. Rule-table matching into formula trees
//! 4. A symbol registry with oracle-backed equivalence
//! 5. Clause assembly for contract-style sentences
//! 6. Argument handoff to a proof solver

pub mod text;
pub mod formula;
pub mod negation;
pub mod pattern;
pub mod rule_table;
pub mod oracle;
pub mod registry;
pub mod matcher;
pub mod subject;
pub mod assembler;
pub mod handoff;

pub use text::*;
pub use formula::*;
pub use negation::*;
pub use pattern::*;
pub use rule_table::*;
pub use oracle::*;
pub use registry::*;
pub use matcher::*;
pub use subject::*;
pub use assembler::*;
pub use handoff::*;
