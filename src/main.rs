//! evalb - PARSEVAL bracket scoring from the command line
//!
//! # Usage
//!
//! ```bash
//! # Score test.txt against gold.txt, write the table to result.md
//! evalb gold.txt test.txt result.md
//!
//! # Skip sentences longer than 40 words, write JSON
//! evalb gold.txt.gz test.txt result.json --max-length 40 --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use evalb::config::{ScorerConfig, ZeroDivision};
use evalb::corpus::score_files;
use evalb::report::{Format, write_report};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Score test parse trees against gold parse trees.
///
/// Both files hold one bracketed tree per line; line i of TEST is scored
/// against line i of GOLD. Gzipped files (.gz) are read directly.
#[derive(Parser)]
#[command(name = "evalb", version, about)]
struct Cli {
    /// Gold treebank
    gold: PathBuf,

    /// Test treebank
    test: PathBuf,

    /// Where to write the report
    result: PathBuf,

    /// Skip sentences with more gold words than this
    #[arg(long)]
    max_length: Option<usize>,

    /// Ratio to report when a sentence has no brackets: zero, one or both-empty
    #[arg(long, default_value = "both-empty")]
    zero_division: ZeroDivision,

    /// Write the report as JSON instead of markdown
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ScorerConfig::new().with_zero_division(cli.zero_division);
    if let Some(max_length) = cli.max_length {
        config = config.with_max_length(max_length);
    }

    let results = score_files(&cli.gold, &cli.test, config).with_context(|| {
        format!(
            "Failed to read {} or {}",
            cli.gold.display(),
            cli.test.display()
        )
    })?;

    let file = File::create(&cli.result)
        .with_context(|| format!("Failed to create {}", cli.result.display()))?;
    let mut out = BufWriter::new(file);

    let format = if cli.json {
        Format::Json
    } else {
        Format::Markdown
    };
    let summary = write_report(format, &mut out, results)
        .and_then(|summary| out.flush().map(|_| summary))
        .with_context(|| format!("Failed to write {}", cli.result.display()))?;

    println!("{}", summary);

    Ok(())
}
