use anyhow::{Context, Result};
use csv::{QuoteStyle, Writer, WriterBuilder};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use crate::window::AgeWindow;

/// Pipe-delimited writers, one per age window, for a single output prefix.
///
/// File layout:
///   <dir>/_staging/<name>_<date>_<N>_hour.csv.inprogress  (temp)
///   <dir>/<name>_<date>_<N>_hour.csv                       (final, after finalize())
///
/// Every file starts with the same header row. A row goes to each window whose
/// age limit covers it, so narrower windows are subsets of wider ones.
pub struct WindowWriters {
    writers: Vec<Writer<File>>,
    tmp_paths: Vec<PathBuf>,
    final_paths: Vec<PathBuf>,
    staging: PathBuf,
    rows: [u64; AgeWindow::ALL.len()],
}

pub const DELIMITER: u8 = b'|';

impl WindowWriters {
    /// Create the six window files for `prefix` (e.g. `out/wsb_threads`) and `date`.
    pub fn create(prefix: &str, date: &str, header: &[&str], write_buf: usize) -> Result<Self> {
        let prefix_path = Path::new(prefix);
        let dir = match prefix_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let stem = prefix_path
            .file_name()
            .and_then(|s| s.to_str())
            .with_context(|| format!("output prefix '{}' has no file name", prefix))?;

        let staging = dir.join("_staging");
        fs::create_dir_all(&staging).with_context(|| format!("create {}", staging.display()))?;

        let mut writers = Vec::with_capacity(AgeWindow::ALL.len());
        let mut tmp_paths = Vec::with_capacity(AgeWindow::ALL.len());
        let mut final_paths = Vec::with_capacity(AgeWindow::ALL.len());

        for window in AgeWindow::ALL {
            let name = format!("{}_{}{}", stem, date, window.file_suffix());
            let tmp = staging.join(format!("{}.inprogress", name));
            let final_p = dir.join(name);
            let f = create_with_backoff(&tmp, 16, 50)
                .with_context(|| format!("create {}", tmp.display()))?;
            let mut w = WriterBuilder::new()
                .delimiter(DELIMITER)
                .quote_style(QuoteStyle::Necessary)
                .buffer_capacity(write_buf.max(8 * 1024))
                .from_writer(f);
            w.write_record(header)?;
            writers.push(w);
            tmp_paths.push(tmp);
            final_paths.push(final_p);
        }

        Ok(Self { writers, tmp_paths, final_paths, staging, rows: [0; AgeWindow::ALL.len()] })
    }

    /// Write `row` into a single window's file.
    pub fn write_row(&mut self, window: AgeWindow, row: &[String]) -> Result<()> {
        let idx = window.index();
        self.writers[idx].write_record(row)?;
        self.rows[idx] += 1;
        Ok(())
    }

    /// Write `row` into every window containing `created_utc` as seen from `now`.
    /// Returns how many windows took the row.
    pub fn write_windowed(&mut self, row: &[String], created_utc: f64, now: f64) -> Result<usize> {
        let mut n = 0;
        for window in crate::window::windows_for(now, created_utc) {
            self.write_row(window, row)?;
            n += 1;
        }
        Ok(n)
    }

    /// Data rows (header excluded) written so far to `window`.
    pub fn rows_in(&self, window: AgeWindow) -> u64 {
        self.rows[window.index()]
    }

    pub fn flush_all(&mut self) -> Result<()> {
        for w in &mut self.writers {
            w.flush()?;
        }
        Ok(())
    }

    /// Flush, close, and promote all `.inprogress` files to their final names.
    /// Returns the final paths in window order.
    pub fn finalize(mut self) -> Result<Vec<PathBuf>> {
        self.flush_all()?;
        // Ensure files are closed before rename/copy
        let writers = std::mem::take(&mut self.writers);
        drop(writers);

        for (tmp, final_p) in self.tmp_paths.iter().zip(self.final_paths.iter()) {
            replace_file_atomic_backoff(tmp, final_p)?;
        }
        // Shared with the other prefix in the same directory; only goes once empty.
        let _ = fs::remove_dir(&self.staging);

        Ok(self.final_paths)
    }
}
