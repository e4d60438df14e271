//! evalb: PARSEVAL scoring for constituency parse trees
//!
//! Compares test parses against gold parses in Penn-style bracket notation
//! and reports labeled bracket recall, precision and F-measure, crossing
//! brackets and tagging accuracy. Core implementation in Rust with Python
//! bindings.

pub mod config; // Scoring policies
pub mod corpus; // Line-paired corpus driver, plain and gzip input
pub mod parser; // Bracket notation to Tree
pub mod report; // Markdown and JSON reports
pub mod scorer; // Sentence-level bracket matching
pub mod summary; // Corpus-level aggregation
pub mod tree; // Arena tree with span-annotated nodes

// Python bindings
#[cfg(feature = "pyo3")]
pub mod python;

// Re-exports for convenience
pub use config::{ScorerConfig, ZeroDivision};
pub use corpus::{CorpusError, CorpusScorer, score_files};
pub use parser::{ParsingError, parse, parse_many};
pub use scorer::{ScoreError, Scorer, SentenceResult, State};
pub use summary::{ScoreAggregator, Summary, aggregate};
pub use tree::{Bracket, Node, NodeId, NodeKind, Span, Tree, TreeBuilder, TreeError};
