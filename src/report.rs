//! Report rendering
//!
//! A report is one row per sentence followed by the corpus summary. Rows are
//! written as they arrive, and the summary is accumulated along the way.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::cell::{Cell, RefCell};
use std::io::{self, Write};

use crate::scorer::{STATISTICS_TABLE, SentenceResult, Value};
use crate::summary::{ScoreAggregator, Summary};

/// Width of the rule between the table and the summary
const RULE_WIDTH: usize = 145;

/// Output format of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Markdown,
    Json,
}

fn markdown_header() -> String {
    let header: String = STATISTICS_TABLE
        .iter()
        .map(|name| format!(" {} |", name))
        .collect();
    let rule: String = STATISTICS_TABLE
        .iter()
        .map(|name| format!("{}:|", "-".repeat(name.len() + 1)))
        .collect();
    format!("|{}\n|{}", header, rule)
}

/// One table row; counts as integers, ratios as percentages
pub fn markdown_row(result: &SentenceResult) -> String {
    let cells: String = result
        .values()
        .into_iter()
        .map(|value| match value {
            Value::Count(n) => format!(" {} |", n),
            Value::Ratio(r) => format!(" {:.2} |", r * 100.0),
        })
        .collect();
    format!("|{}", cells)
}

/// Write a markdown report and return the summary it ends with
pub fn write_markdown<W, I>(out: &mut W, results: I) -> io::Result<Summary>
where
    W: Write,
    I: IntoIterator<Item = SentenceResult>,
{
    let mut aggregator = ScoreAggregator::new();

    writeln!(out, "# Score Result")?;
    writeln!(out, "{}", markdown_header())?;
    for result in results {
        writeln!(out, "{}", markdown_row(&result))?;
        aggregator.push(&result);
    }

    let summary = aggregator.finish();
    writeln!(out)?;
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
    writeln!(out, "{}", summary)?;

    Ok(summary)
}

/// The `results` array, serialized straight from the iterator
///
/// Each row is pushed into `aggregator` once it has been written. The
/// iterator is consumed on the first serialization.
struct StreamedRows<'a, I> {
    rows: Cell<Option<I>>,
    aggregator: &'a RefCell<ScoreAggregator>,
}

impl<I> Serialize for StreamedRows<'_, I>
where
    I: Iterator<Item = SentenceResult>,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for result in self.rows.take().into_iter().flatten() {
            seq.serialize_element(&result)?;
            self.aggregator.borrow_mut().push(&result);
        }
        seq.end()
    }
}

/// Write `{"results": [...], "summary": {...}}` and return the summary
///
/// Rows are written as they arrive, as in [`write_markdown`].
pub fn write_json<W, I>(out: &mut W, results: I) -> io::Result<Summary>
where
    W: Write,
    I: IntoIterator<Item = SentenceResult>,
{
    let aggregator = RefCell::new(ScoreAggregator::new());
    let rows = StreamedRows {
        rows: Cell::new(Some(results.into_iter())),
        aggregator: &aggregator,
    };

    let mut serializer = serde_json::Serializer::pretty(&mut *out);
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("results", &rows)?;
    let summary = aggregator.into_inner().finish();
    map.serialize_entry("summary", &summary)?;
    SerializeMap::end(map)?;
    writeln!(out)?;

    Ok(summary)
}

/// Write a report in `format`
pub fn write_report<W, I>(format: Format, out: &mut W, results: I) -> io::Result<Summary>
where
    W: Write,
    I: IntoIterator<Item = SentenceResult>,
{
    match format {
        Format::Markdown => write_markdown(out, results),
        Format::Json => write_json(out, results),
    }
}
