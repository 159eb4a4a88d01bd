//! File scorer: append `pos`/`neg`/`neu`/`compound` columns to a delimited file.

use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::models::fmt_float;
use crate::progress::ProgressScope;
use crate::sentiment::{Lexicon, PolarityScores, SentimentAnalyzer};
use crate::util::{create_with_backoff, init_tracing_once, open_with_backoff, predicted_path};

pub const SCORE_COLUMNS: [&str; 4] = ["pos", "neg", "neu", "compound"];

/// Outcome of scoring one file.
#[derive(Debug, Clone)]
pub struct ScoreStats {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: u64,
    pub missing_text: u64,
}

#[derive(Clone, Debug)]
pub struct SentimentScorer {
    analyzer: SentimentAnalyzer,
    input_delimiter: u8,
    output_delimiter: u8,
    text_column: String,
    write_index: bool,
    progress: bool,
}

impl Default for SentimentScorer {
    fn default() -> Self {
        Self {
            analyzer: SentimentAnalyzer::default(),
            input_delimiter: b'|',
            output_delimiter: b',',
            text_column: "text".to_string(),
            write_index: true,
            progress: true,
        }
    }
}

impl SentimentScorer {
    pub fn new() -> Self {
        Self::default()
    }

    // -------- Builder methods --------
    pub fn lexicon(mut self, lexicon: Lexicon) -> Self { self.analyzer = SentimentAnalyzer::with_lexicon(lexicon); self }
    pub fn input_delimiter(mut self, d: u8) -> Self { self.input_delimiter = d; self }
    pub fn output_delimiter(mut self, d: u8) -> Self { self.output_delimiter = d; self }
    pub fn text_column(mut self, name: impl Into<String>) -> Self { self.text_column = name.into(); self }
    /// Leading unnamed row-number column in the output (on by default).
    pub fn write_index(mut self, yes: bool) -> Self { self.write_index = yes; self }
    pub fn progress(mut self, yes: bool) -> Self { self.progress = yes; self }

    pub fn analyzer(&self) -> &SentimentAnalyzer {
        &self.analyzer
    }

    /// Score `input` into `<stem>_predicted.<ext>` beside it.
    pub fn score_file(&self, input: &Path) -> Result<ScoreStats> {
        self.score_file_to(input, &predicted_path(input))
    }

    pub fn score_file_to(&self, input: &Path, output: &Path) -> Result<ScoreStats> {
        init_tracing_once();
        tracing::info!(input = %input.display(), "Sentiment scoring started");

        let f = open_with_backoff(input, 16, 50).with_context(|| format!("open {}", input.display()))?;
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.input_delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(f);

        let headers = rdr.headers().with_context(|| format!("read header of {}", input.display()))?.clone();
        let text_idx = headers
            .iter()
            .position(|h| h.trim() == self.text_column)
            .ok_or_else(|| anyhow!("{} has no '{}' column", input.display(), self.text_column))?;

        let records: Vec<csv::StringRecord> = rdr
            .records()
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("read rows of {}", input.display()))?;
        if let Some(rec) = records.iter().find(|r| r.len() > headers.len()) {
            let line = rec.position().map_or(0, |p| p.line());
            bail!(
                "{}: line {} has {} fields, header has {}",
                input.display(),
                line,
                rec.len(),
                headers.len()
            );
        }

        let pb = ProgressScope::count(self.progress, "Scoring rows", records.len() as u64);
        let scores: Vec<(PolarityScores, bool)> = records
            .par_iter()
            .enumerate()
            .map(|(row, rec)| {
                let text = rec.get(text_idx).unwrap_or("");
                let missing = text.trim().is_empty();
                if missing {
                    tracing::warn!(row, "Undefined text value, scoring as empty");
                }
                let s = self.analyzer.polarity_scores(if missing { "" } else { text });
                pb.inc(1);
                (s, missing)
            })
            .collect();
        pb.finish("scored");

        let out = create_with_backoff(output, 16, 50).with_context(|| format!("create {}", output.display()))?;
        let mut w = csv::WriterBuilder::new()
            .delimiter(self.output_delimiter)
            .flexible(true)
            .from_writer(out);

        let mut header_row: Vec<&str> = Vec::with_capacity(headers.len() + 5);
        if self.write_index {
            header_row.push("");
        }
        header_row.extend(headers.iter());
        header_row.extend(SCORE_COLUMNS);
        w.write_record(&header_row)?;

        let mut missing_text = 0u64;
        for (i, (rec, (s, missing))) in records.iter().zip(scores.iter()).enumerate() {
            if *missing {
                missing_text += 1;
            }
            let mut row: Vec<String> = Vec::with_capacity(headers.len() + 5);
            if self.write_index {
                row.push(i.to_string());
            }
            row.extend(rec.iter().map(str::to_string));
            // short rows get empty cells so the scores stay under their headers
            row.extend((rec.len()..headers.len()).map(|_| String::new()));
            row.extend([fmt_float(s.pos), fmt_float(s.neg), fmt_float(s.neu), fmt_float(s.compound)]);
            w.write_record(&row)?;
        }
        w.flush()?;

        tracing::info!(output = %output.display(), rows = records.len(), "Sentiment scoring finished");
        Ok(ScoreStats {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            rows: records.len() as u64,
            missing_text,
        })
    }

    /// Score every file under `dir` whose name matches `pattern`, skipping earlier outputs.
    pub fn score_dir(&self, dir: &Path, pattern: &Regex) -> Result<Vec<ScoreStats>> {
        let inputs = discover_inputs(dir, pattern);
        if inputs.is_empty() {
            tracing::warn!(dir = %dir.display(), "No files found matching selection.");
        } else {
            tracing::info!("Planned {} files for scoring.", inputs.len());
        }
        inputs.iter().map(|p| self.score_file(p)).collect()
    }
}

/// Files under `dir` (recursive, sorted) whose name matches `pattern`
/// and whose stem does not already end in `_predicted`.
pub fn discover_inputs(dir: &Path, pattern: &Regex) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let Some(name) = e.file_name().to_str() else { return false };
            let stem = e.path().file_stem().and_then(|s| s.to_str()).unwrap_or("");
            pattern.is_match(name) && !stem.ends_with("_predicted")
        })
        .map(|e| e.into_path())
        .collect();
    out.sort();
    out
}
