//! Python bindings for evalb
//!
//! This module provides PyO3-based Python bindings for the Rust core.

use pyo3::exceptions::{PyIOError, PyIndexError, PyValueError};
use pyo3::prelude::*;

use crate::config::{ScorerConfig, ZeroDivision};
use crate::corpus::{CorpusError, open_lines};
use crate::parser::ParsingError;
use crate::scorer::{ScoreError, Scorer, SentenceResult};
use crate::summary::{Summary, aggregate};
use crate::tree::Tree;

/// Convert CorpusError to Python exception
impl From<CorpusError> for PyErr {
    fn from(err: CorpusError) -> PyErr {
        match err {
            CorpusError::Io(e) => PyIOError::new_err(e.to_string()),
            CorpusError::FileOpen { path, source } => PyIOError::new_err(format!(
                "Failed to open file {}: {}",
                path.display(),
                source
            )),
            CorpusError::Encoding { .. } => PyValueError::new_err(err.to_string()),
        }
    }
}

impl From<ParsingError> for PyErr {
    fn from(err: ParsingError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<ScoreError> for PyErr {
    fn from(err: ScoreError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn make_config(max_length: Option<usize>, zero_division: &str) -> PyResult<ScorerConfig> {
    let policy: ZeroDivision = zero_division.parse().map_err(PyValueError::new_err)?;
    let mut config = ScorerConfig::new().with_zero_division(policy);
    if let Some(max_length) = max_length {
        config = config.with_max_length(max_length);
    }
    Ok(config)
}

/// A parsed constituency tree.
#[pyclass(name = "Tree")]
#[derive(Clone)]
pub struct PyTree {
    pub(crate) inner: Tree,
}

#[pymethods]
impl PyTree {
    /// Terminal words, left to right
    #[getter]
    fn words(&self) -> Vec<String> {
        self.inner.words().to_vec()
    }

    /// Part-of-speech tag of each word
    #[getter]
    fn tags(&self) -> Vec<String> {
        self.inner.tags().to_vec()
    }

    /// Words joined to their tags as `word_TAG`
    #[getter]
    fn pos_sentence(&self) -> Vec<String> {
        self.inner.pos_sentence().to_vec()
    }

    #[getter]
    fn depth(&self) -> usize {
        self.inner.depth()
    }

    /// Labeled brackets as (label, start, end) tuples
    fn brackets(&self) -> Vec<(String, usize, usize)> {
        self.inner
            .brackets()
            .map(|b| (b.label.to_string(), b.span.start, b.span.end))
            .collect()
    }

    fn word(&self, i: usize) -> PyResult<String> {
        self.inner
            .words()
            .get(i)
            .cloned()
            .ok_or_else(|| PyIndexError::new_err(format!("word index out of range: {}", i)))
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        let words = self.inner.words();
        if words.len() > 3 {
            format!("<Tree len={} words='{} ...'>", words.len(), words[..3].join(" "))
        } else {
            format!("<Tree len={} words='{}'>", words.len(), words.join(" "))
        }
    }
}

/// Scores for one sentence pair.
#[pyclass(name = "Result")]
#[derive(Clone)]
pub struct PySentenceResult {
    inner: SentenceResult,
}

#[pymethods]
impl PySentenceResult {
    #[getter]
    fn id(&self) -> usize {
        self.inner.id
    }

    #[getter]
    fn length(&self) -> usize {
        self.inner.length
    }

    /// "ok", "skip" or "error"
    #[getter]
    fn state(&self) -> &'static str {
        match self.inner.state {
            crate::scorer::State::Ok => "ok",
            crate::scorer::State::Skip => "skip",
            crate::scorer::State::Error => "error",
        }
    }

    #[getter]
    fn recall(&self) -> f64 {
        self.inner.recall
    }

    #[getter]
    fn precision(&self) -> f64 {
        self.inner.precision
    }

    #[getter]
    fn matched_brackets(&self) -> usize {
        self.inner.matched_brackets
    }

    #[getter]
    fn gold_brackets(&self) -> usize {
        self.inner.gold_brackets
    }

    #[getter]
    fn test_brackets(&self) -> usize {
        self.inner.test_brackets
    }

    #[getter]
    fn cross_brackets(&self) -> usize {
        self.inner.cross_brackets
    }

    #[getter]
    fn words(&self) -> usize {
        self.inner.words
    }

    #[getter]
    fn correct_tags(&self) -> usize {
        self.inner.correct_tags
    }

    #[getter]
    fn tag_accuracy(&self) -> f64 {
        self.inner.tag_accuracy
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Corpus-level scores. Undefined ratios are None.
#[pyclass(name = "Summary")]
pub struct PySummary {
    inner: Summary,
}

#[pymethods]
impl PySummary {
    #[getter]
    fn sentences(&self) -> usize {
        self.inner.sentences
    }

    #[getter]
    fn error_sentences(&self) -> usize {
        self.inner.error_sentences
    }

    #[getter]
    fn skip_sentences(&self) -> usize {
        self.inner.skip_sentences
    }

    #[getter]
    fn valid_sentences(&self) -> usize {
        self.inner.valid_sentences
    }

    #[getter]
    fn bracket_recall(&self) -> Option<f64> {
        self.inner.bracket_recall
    }

    #[getter]
    fn bracket_precision(&self) -> Option<f64> {
        self.inner.bracket_precision
    }

    #[getter]
    fn bracket_fmeasure(&self) -> Option<f64> {
        self.inner.bracket_fmeasure
    }

    #[getter]
    fn complete_match(&self) -> Option<f64> {
        self.inner.complete_match
    }

    #[getter]
    fn average_crossing(&self) -> Option<f64> {
        self.inner.average_crossing
    }

    #[getter]
    fn no_crossing(&self) -> Option<f64> {
        self.inner.no_crossing
    }

    #[getter]
    fn tagging_accuracy(&self) -> Option<f64> {
        self.inner.tagging_accuracy
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "<Summary sentences={} valid={}>",
            self.inner.sentences, self.inner.valid_sentences
        )
    }
}

/// Iterator over sentence results from a corpus.
#[pyclass(name = "ResultIterator", unsendable)]
struct PyResultIterator {
    inner: Box<dyn Iterator<Item = SentenceResult> + Send>,
}

#[pymethods]
impl PyResultIterator {
    fn __iter__(slf: PyRef<Self>) -> PyRef<Self> {
        slf
    }

    fn __next__(&mut self) -> Option<PySentenceResult> {
        self.inner.next().map(|inner| PySentenceResult { inner })
    }
}

/// Parse one line of bracket notation.
///
/// Raises:
///     ValueError: If the line is not a well-formed tree
#[pyfunction(name = "parse")]
fn py_parse(line: &str) -> PyResult<PyTree> {
    Ok(PyTree {
        inner: crate::parser::parse(line)?,
    })
}

/// Score a test tree against its gold tree.
///
/// Args:
///     gold: Gold tree
///     test: Test tree
///     max_length: Mark sentences longer than this as skipped
///     zero_division: "zero", "one" or "both-empty"
///
/// Raises:
///     ValueError: If the trees do not cover the same words
#[pyfunction]
#[pyo3(signature = (gold, test, max_length=None, zero_division="both-empty"))]
fn score_trees(
    gold: &PyTree,
    test: &PyTree,
    max_length: Option<usize>,
    zero_division: &str,
) -> PyResult<PySentenceResult> {
    let scorer = Scorer::with_config(make_config(max_length, zero_division)?);
    let inner = scorer.score_trees(&gold.inner, &test.inner)?;
    Ok(PySentenceResult { inner })
}

/// Score a gold treebank file against a test treebank file.
///
/// Lines are paired by position. Sentences that fail to parse or align
/// come back with state "error". Gzipped files (.gz) are read directly.
///
/// Returns:
///     Iterator over Result objects
///
/// Example:
///     >>> results = list(evalb.score_corpus("gold.txt", "test.txt"))
///     >>> print(evalb.summary(results))
#[pyfunction]
#[pyo3(signature = (gold_path, test_path, max_length=None, zero_division="both-empty"))]
fn score_corpus(
    gold_path: &str,
    test_path: &str,
    max_length: Option<usize>,
    zero_division: &str,
) -> PyResult<PyResultIterator> {
    let scorer = Scorer::with_config(make_config(max_length, zero_division)?);
    let gold = open_lines(gold_path)?;
    let test = open_lines(test_path)?;
    Ok(PyResultIterator {
        inner: Box::new(scorer.score_corpus(gold, test)),
    })
}

/// Summarize a list of sentence results.
#[pyfunction]
fn summary(results: Vec<PySentenceResult>) -> PySummary {
    PySummary {
        inner: aggregate(results.iter().map(|r| &r.inner)),
    }
}

#[pymodule]
fn evalb(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTree>()?;
    m.add_class::<PySentenceResult>()?;
    m.add_class::<PySummary>()?;
    m.add_class::<PyResultIterator>()?;

    m.add_function(wrap_pyfunction!(py_parse, m)?)?;
    m.add_function(wrap_pyfunction!(score_trees, m)?)?;
    m.add_function(wrap_pyfunction!(score_corpus, m)?)?;
    m.add_function(wrap_pyfunction!(summary, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
