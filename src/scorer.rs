//! Sentence-level PARSEVAL scoring
//!
//! Compares a test tree against its gold tree:
//! 1. Check that both trees cover the same words
//! 2. Match labeled brackets (constituent label + word span) as sets
//! 3. Count unmatched test brackets that cross a gold bracket
//! 4. Compare POS tags position by position

use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ScorerConfig;
use crate::parser::{ParsingError, parse};
use crate::tree::{Bracket, Span, Tree};

/// Column names of a sentence result, in report order
pub const STATISTICS_TABLE: [&str; 12] = [
    "ID",
    "length",
    "state",
    "recall",
    "prec",
    "matched_brackets",
    "gold_brackets",
    "test_brackets",
    "cross_brackets",
    "words",
    "correct_tags",
    "tag_accuracy",
];

/// Error during scoring of one sentence pair
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Length Unmatched !\ngold sentence:{gold}\ntest sentence:{test}")]
    LengthUnmatch { gold: usize, test: usize },

    #[error(
        "Words Unmatched !\ngold sentence:{}\ntest sentence:{}",
        .gold.join(" "),
        .test.join(" ")
    )]
    WordsUnmatch { gold: Vec<String>, test: Vec<String> },

    #[error(transparent)]
    Parsing(#[from] ParsingError),
}

/// Outcome of scoring one sentence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Ok,
    Skip,
    Error,
}

impl State {
    /// Numeric code used in reports: 0 ok, 1 skip, 2 error
    pub fn code(self) -> usize {
        match self {
            State::Ok => 0,
            State::Skip => 1,
            State::Error => 2,
        }
    }
}

/// A single report cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Count(usize),
    /// Fraction in [0, 1]; rendered as a percentage
    Ratio(f64),
}

/// Scores for one sentence pair
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentenceResult {
    pub id: usize,
    pub length: usize,
    pub state: State,
    pub recall: f64,
    pub precision: f64,
    pub matched_brackets: usize,
    pub gold_brackets: usize,
    pub test_brackets: usize,
    pub cross_brackets: usize,
    pub words: usize,
    pub correct_tags: usize,
    pub tag_accuracy: f64,
}

impl SentenceResult {
    /// Placeholder for a sentence that could not be scored; all statistics stay 0
    pub fn error(id: usize) -> Self {
        Self {
            id,
            state: State::Error,
            ..Default::default()
        }
    }

    /// Placeholder for a sentence outside the length cut-off
    pub fn skipped(id: usize, length: usize) -> Self {
        Self {
            id,
            length,
            state: State::Skip,
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == State::Ok
    }

    /// True if every gold and every test bracket was matched
    pub fn is_complete_match(&self) -> bool {
        self.matched_brackets == self.gold_brackets && self.matched_brackets == self.test_brackets
    }

    /// Cells in [`STATISTICS_TABLE`] order
    pub fn values(&self) -> [Value; 12] {
        [
            Value::Count(self.id),
            Value::Count(self.length),
            Value::Count(self.state.code()),
            Value::Ratio(self.recall),
            Value::Ratio(self.precision),
            Value::Count(self.matched_brackets),
            Value::Count(self.gold_brackets),
            Value::Count(self.test_brackets),
            Value::Count(self.cross_brackets),
            Value::Count(self.words),
            Value::Count(self.correct_tags),
            Value::Ratio(self.tag_accuracy),
        ]
    }
}

impl fmt::Display for SentenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in STATISTICS_TABLE.iter().zip(self.values()).enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match value {
                Value::Count(n) => write!(f, "{}:{:>3}", name, n)?,
                Value::Ratio(r) => write!(f, "{}:{:>5.2}", name, r * 100.0)?,
            }
        }
        Ok(())
    }
}

/// Bracket overlap between a gold and a test tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BracketCounts {
    matched: usize,
    crossing: usize,
}

/// Match labeled brackets and count crossings
///
/// Brackets are compared as sets, so a duplicated bracket (a unary chain
/// with a repeated label) matches at most once, while the bracket totals
/// still count every label node.
fn compare_brackets(gold: &Tree, test: &Tree) -> BracketCounts {
    let gold_set: FxHashSet<Bracket> = gold.brackets().collect();
    let test_set: FxHashSet<Bracket> = test.brackets().collect();
    let matched = gold_set.intersection(&test_set).count();

    let gold_spans: Vec<Span> = gold.brackets().map(|b| b.span).collect();
    let crossing = test
        .brackets()
        .filter(|b| !gold_set.contains(b))
        .filter(|b| gold_spans.iter().any(|g| b.span.crosses(g)))
        .count();

    BracketCounts { matched, crossing }
}

/// Scores sentence pairs under one configuration
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    config: ScorerConfig,
}

impl Scorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score a test tree against its gold tree
    ///
    /// The returned result has id 0; callers scoring a corpus set it.
    pub fn score_trees(&self, gold: &Tree, test: &Tree) -> Result<SentenceResult, ScoreError> {
        let length = gold.len();
        if self.config.skips(length) {
            return Ok(SentenceResult::skipped(0, length));
        }

        if length != test.len() {
            return Err(ScoreError::LengthUnmatch {
                gold: length,
                test: test.len(),
            });
        }
        if gold.words() != test.words() {
            return Err(ScoreError::WordsUnmatch {
                gold: gold.words().to_vec(),
                test: test.words().to_vec(),
            });
        }

        let counts = compare_brackets(gold, test);
        let gold_brackets = gold.label_count();
        let test_brackets = test.label_count();

        let correct_tags = gold
            .tags()
            .iter()
            .zip(test.tags())
            .filter(|(g, t)| g == t)
            .count();

        let policy = self.config.zero_division;
        Ok(SentenceResult {
            id: 0,
            length,
            state: State::Ok,
            recall: policy.ratio(counts.matched, gold_brackets),
            precision: policy.ratio(counts.matched, test_brackets),
            matched_brackets: counts.matched,
            gold_brackets,
            test_brackets,
            cross_brackets: counts.crossing,
            words: length,
            correct_tags,
            tag_accuracy: policy.ratio(correct_tags, gold.tags().len()),
        })
    }

    /// Parse and score one pair of bracketed lines
    pub fn try_score_lines(&self, gold: &str, test: &str) -> Result<SentenceResult, ScoreError> {
        let gold = parse(gold)?;
        let test = parse(test)?;
        self.score_trees(&gold, &test)
    }

    /// Parse and score one pair of lines, never failing
    ///
    /// Any parse or alignment error is logged and yields an `error`
    /// placeholder, so result ids stay aligned with corpus line numbers.
    pub fn score_lines(&self, id: usize, gold: &str, test: &str) -> SentenceResult {
        match self.try_score_lines(gold, test) {
            Ok(mut result) => {
                result.id = id;
                debug!(
                    sentence = id,
                    matched = result.matched_brackets,
                    gold = result.gold_brackets,
                    test = result.test_brackets,
                    crossing = result.cross_brackets,
                    "scored sentence"
                );
                result
            }
            Err(e) => {
                warn!(sentence = id, "{}", e);
                SentenceResult::error(id)
            }
        }
    }
}
