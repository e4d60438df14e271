//! Corpus-level aggregation of sentence results
//!
//! Only `ok` sentences contribute to the ratios; `skip` and `error`
//! sentences are counted and otherwise ignored. Ratios whose denominator is
//! zero (for instance a corpus without a single valid sentence) are `None`
//! rather than a made-up number.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::scorer::{SentenceResult, State};

/// Summary field names, in report order
pub const SUMMARY_TABLE: [&str; 11] = [
    "Number of sentence",
    "Number of Error sentence",
    "Number of Skip sentence",
    "Number of Valid sentence",
    "Bracketing Recall",
    "Bracketing Precision",
    "Bracketing FMeasure",
    "Complete match",
    "Average crossing",
    "No crossing",
    "Tagging accuracy",
];

/// A single summary figure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Figure {
    Count(usize),
    /// Percentage or average; `None` when undefined
    Measure(Option<f64>),
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Figure::Count(n) => write!(f, "{}", n),
            Figure::Measure(Some(x)) => write!(f, "{:.2}", x),
            Figure::Measure(None) => f.write_str("N/A"),
        }
    }
}

/// Corpus-level scores
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub sentences: usize,
    pub error_sentences: usize,
    pub skip_sentences: usize,
    pub valid_sentences: usize,
    /// Percent of gold brackets matched
    pub bracket_recall: Option<f64>,
    /// Percent of test brackets matched
    pub bracket_precision: Option<f64>,
    /// Harmonic mean of recall and precision; `None` when both are 0
    pub bracket_fmeasure: Option<f64>,
    /// Percent of valid sentences with every bracket matched
    pub complete_match: Option<f64>,
    /// Crossing brackets per valid sentence
    pub average_crossing: Option<f64>,
    /// Percent of valid sentences without crossing brackets
    pub no_crossing: Option<f64>,
    /// Percent of words with the gold tag
    pub tagging_accuracy: Option<f64>,
}

impl Summary {
    /// Figures in [`SUMMARY_TABLE`] order
    pub fn values(&self) -> [Figure; 11] {
        [
            Figure::Count(self.sentences),
            Figure::Count(self.error_sentences),
            Figure::Count(self.skip_sentences),
            Figure::Count(self.valid_sentences),
            Figure::Measure(self.bracket_recall),
            Figure::Measure(self.bracket_precision),
            Figure::Measure(self.bracket_fmeasure),
            Figure::Measure(self.complete_match),
            Figure::Measure(self.average_crossing),
            Figure::Measure(self.no_crossing),
            Figure::Measure(self.tagging_accuracy),
        ]
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in SUMMARY_TABLE.iter().zip(self.values()).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}:\t{}", name, value)?;
        }
        Ok(())
    }
}

fn percent(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64 * 100.0)
}

/// Running totals over a stream of sentence results
///
/// Holds only counters, so a corpus can be aggregated while it is scored.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    sentences: usize,
    errors: usize,
    skips: usize,
    valid: usize,
    matched: usize,
    gold: usize,
    test: usize,
    crossing: usize,
    complete: usize,
    no_crossing: usize,
    correct_tags: usize,
    words: usize,
}

impl ScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one sentence result
    pub fn push(&mut self, result: &SentenceResult) {
        self.sentences += 1;
        match result.state {
            State::Error => self.errors += 1,
            State::Skip => self.skips += 1,
            State::Ok => {
                self.valid += 1;
                self.matched += result.matched_brackets;
                self.gold += result.gold_brackets;
                self.test += result.test_brackets;
                self.crossing += result.cross_brackets;
                self.correct_tags += result.correct_tags;
                self.words += result.words;
                if result.is_complete_match() {
                    self.complete += 1;
                }
                if result.cross_brackets == 0 {
                    self.no_crossing += 1;
                }
            }
        }
    }

    /// Summary of everything pushed so far
    pub fn finish(&self) -> Summary {
        let recall = percent(self.matched, self.gold);
        let precision = percent(self.matched, self.test);
        let fmeasure = match (recall, precision) {
            (Some(r), Some(p)) if r + p > 0.0 => Some(2.0 * p * r / (p + r)),
            _ => None,
        };
        debug!(
            sentences = self.sentences,
            valid = self.valid,
            matched = self.matched,
            gold = self.gold,
            test = self.test,
            "summarized results"
        );

        Summary {
            sentences: self.sentences,
            error_sentences: self.errors,
            skip_sentences: self.skips,
            valid_sentences: self.valid,
            bracket_recall: recall,
            bracket_precision: precision,
            bracket_fmeasure: fmeasure,
            complete_match: percent(self.complete, self.valid),
            average_crossing: (self.valid > 0).then(|| self.crossing as f64 / self.valid as f64),
            no_crossing: percent(self.no_crossing, self.valid),
            tagging_accuracy: percent(self.correct_tags, self.words),
        }
    }
}

impl<'a> Extend<&'a SentenceResult> for ScoreAggregator {
    fn extend<I: IntoIterator<Item = &'a SentenceResult>>(&mut self, iter: I) {
        for result in iter {
            self.push(result);
        }
    }
}

/// Summarize a finished sequence of sentence results
pub fn aggregate<'a, I>(results: I) -> Summary
where
    I: IntoIterator<Item = &'a SentenceResult>,
{
    let mut aggregator = ScoreAggregator::new();
    aggregator.extend(results);
    aggregator.finish()
}
