//! Corpus-level scoring
//!
//! Gold and test treebanks are files with one bracketed tree per line; line
//! `i` of the gold file is paired with line `i` of the test file. Pairs are
//! read and scored one at a time, so memory use does not grow with corpus
//! size. Files ending in `.gz` are decompressed on the fly.

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ScorerConfig;
use crate::scorer::{Scorer, SentenceResult};

/// Error opening or reading a treebank
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `line` counts from 1
    #[error("Line {line} of {path} is not valid UTF-8")]
    Encoding { path: PathBuf, line: usize },
}

/// One line of a corpus, or the reason it could not be read
pub trait CorpusLine {
    fn text(&self) -> Result<&str, &CorpusError>;
}

impl CorpusLine for str {
    fn text(&self) -> Result<&str, &CorpusError> {
        Ok(self)
    }
}

impl CorpusLine for String {
    fn text(&self) -> Result<&str, &CorpusError> {
        Ok(self)
    }
}

impl CorpusLine for Result<String, CorpusError> {
    fn text(&self) -> Result<&str, &CorpusError> {
        self.as_deref()
    }
}

impl<T: CorpusLine + ?Sized> CorpusLine for &T {
    fn text(&self) -> Result<&str, &CorpusError> {
        (**self).text()
    }
}

/// Lines of a treebank file
pub type LineIter = Box<dyn Iterator<Item = Result<String, CorpusError>> + Send>;

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Reads raw lines and decodes each one on its own, so a bad line costs
/// only that line
struct LineReader {
    reader: Box<dyn BufRead + Send>,
    path: PathBuf,
    line: usize,
    buf: Vec<u8>,
    done: bool,
}

impl Iterator for LineReader {
    type Item = Result<String, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.line += 1;
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                    if self.buf.last() == Some(&b'\r') {
                        self.buf.pop();
                    }
                }
                let decoded = std::str::from_utf8(&self.buf)
                    .map(str::to_string)
                    .map_err(|_| CorpusError::Encoding {
                        path: self.path.clone(),
                        line: self.line,
                    });
                Some(decoded)
            }
            // The stream position is unknown after a failed read
            Err(e) => {
                self.done = true;
                Some(Err(CorpusError::Io(e)))
            }
        }
    }
}

/// Open a treebank file as an iterator over its lines
///
/// A line that is not valid UTF-8 comes back as an error in its place. A
/// read error is returned once and ends the iteration.
pub fn open_lines(path: impl AsRef<Path>) -> Result<LineIter, CorpusError> {
    let path = path.as_ref().to_path_buf();
    let file = File::open(&path).map_err(|source| CorpusError::FileOpen {
        path: path.clone(),
        source,
    })?;

    let reader: Box<dyn BufRead + Send> = if is_gzip(&path) {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(Box::new(LineReader {
        reader,
        path,
        line: 0,
        buf: Vec::new(),
        done: false,
    }))
}

/// Lazily scores gold/test line pairs
///
/// Yields exactly one [`SentenceResult`] per pair, numbered from 0. A pair
/// with an unreadable line is an `error` result. If one side has more lines
/// than the other, the surplus is reported and ignored.
pub struct CorpusScorer<G, T> {
    scorer: Scorer,
    gold: G,
    test: T,
    next_id: usize,
    done: bool,
}

impl<G, T> CorpusScorer<G, T> {
    pub fn new(scorer: Scorer, gold: G, test: T) -> Self {
        Self {
            scorer,
            gold,
            test,
            next_id: 0,
            done: false,
        }
    }
}

impl<G, T> Iterator for CorpusScorer<G, T>
where
    G: Iterator,
    T: Iterator,
    G::Item: CorpusLine,
    T::Item: CorpusLine,
{
    type Item = SentenceResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let (gold, test) = match (self.gold.next(), self.test.next()) {
            (Some(gold), Some(test)) => (gold, test),
            (None, None) => {
                self.done = true;
                info!(sentences = self.next_id, "finished scoring corpus");
                return None;
            }
            (Some(_), None) => {
                self.done = true;
                let extra = 1 + self.gold.by_ref().count();
                warn!(
                    "Gold corpus has {} lines, test corpus has {}; ignoring the rest",
                    self.next_id + extra,
                    self.next_id
                );
                return None;
            }
            (None, Some(_)) => {
                self.done = true;
                let extra = 1 + self.test.by_ref().count();
                warn!(
                    "Gold corpus has {} lines, test corpus has {}; ignoring the rest",
                    self.next_id,
                    self.next_id + extra
                );
                return None;
            }
        };

        let id = self.next_id;
        self.next_id += 1;
        match (gold.text(), test.text()) {
            (Ok(gold), Ok(test)) => Some(self.scorer.score_lines(id, gold, test)),
            (Err(e), _) | (_, Err(e)) => {
                warn!(sentence = id, "{}", e);
                Some(SentenceResult::error(id))
            }
        }
    }
}

impl Scorer {
    /// Score paired gold and test lines, one result per pair
    pub fn score_corpus<G, T>(&self, gold: G, test: T) -> CorpusScorer<G::IntoIter, T::IntoIter>
    where
        G: IntoIterator,
        T: IntoIterator,
        G::Item: CorpusLine,
        T::Item: CorpusLine,
    {
        CorpusScorer::new(self.clone(), gold.into_iter(), test.into_iter())
    }

    /// Score a gold treebank file against a test treebank file
    pub fn score_files(
        &self,
        gold_path: impl AsRef<Path>,
        test_path: impl AsRef<Path>,
    ) -> Result<CorpusScorer<LineIter, LineIter>, CorpusError> {
        let (gold_path, test_path) = (gold_path.as_ref(), test_path.as_ref());
        let gold = open_lines(gold_path)?;
        let test = open_lines(test_path)?;
        info!(
            "Scoring {} against {}",
            test_path.display(),
            gold_path.display()
        );
        Ok(self.score_corpus(gold, test))
    }
}

/// Score two treebank files under `config`
pub fn score_files(
    gold_path: impl AsRef<Path>,
    test_path: impl AsRef<Path>,
    config: ScorerConfig,
) -> Result<CorpusScorer<LineIter, LineIter>, CorpusError> {
    Scorer::with_config(config).score_files(gold_path, test_path)
}
