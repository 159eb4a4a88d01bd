use anyhow::{Context, Result};
use std::fs;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

// -------- clock helpers --------

/// Current UTC time as fractional seconds since the epoch (same unit as `created_utc`).
pub fn now_utc_secs() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1_000_000_000.0
}

/// Today's UTC date as `YYYY-MM-DD`, the default run tag for output names.
pub fn today_utc_tag() -> String {
    let fmt = format_description!("[year]-[month]-[day]");
    OffsetDateTime::now_utc()
        .date()
        .format(&fmt)
        .unwrap_or_else(|_| "unknown-date".to_string())
}

/// Sleep for `secs` (fractional). Zero or negative is a no-op so tests can disable pauses.
pub fn sleep_secs(secs: f64) {
    if secs > 0.0 && secs.is_finite() {
        sleep(Duration::from_secs_f64(secs));
    }
}

/// `dir/name.ext` -> `dir/name_predicted.ext`; `dir/name` -> `dir/name_predicted`.
pub fn predicted_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let name = match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_predicted.{}", stem, ext),
        None => format!("{}_predicted", stem),
    };
    input.with_file_name(name)
}

// -------- retrying file ops --------

/// OS error codes worth another attempt: access denied, sharing and lock
/// violations, AV-blocked files, device not ready, stale volume handles.
const TRANSIENT_OS_ERRORS: [i32; 7] = [5, 21, 32, 33, 225, 1006, 1224];

fn is_retriable_io_error(e: &io::Error) -> bool {
    e.raw_os_error().is_some_and(|code| TRANSIENT_OS_ERRORS.contains(&code))
}

fn with_backoff<T>(
    tries: usize,
    delay_ms: u64,
    what: &str,
    mut op: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable_io_error(&e) => {
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, format!("{what} failed"))))
}

/// `File::open` with transient-error retries.
pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, "open", || File::open(path))
}

/// `File::create` with transient-error retries.
pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    with_backoff(tries, delay_ms, "create", || File::create(path))
}

/// Delete `path`, retrying transient failures. A missing file counts as removed.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    let res = with_backoff(tries, delay_ms, "remove", || match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    });
    res.with_context(|| format!("remove {}", path.display()))
}

/// Move a finished staging file over `dest`. Rename first, copy then delete
/// when the rename keeps failing.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let tries = 20usize;
    let delay_ms = 50u64;
    if dest.exists() {
        remove_with_backoff(dest, tries, delay_ms)?;
    }
    if with_backoff(tries, delay_ms, "rename", || fs::rename(tmp, dest)).is_ok() {
        return Ok(());
    }
    with_backoff(tries, delay_ms, "copy", || fs::copy(tmp, dest))
        .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
    remove_with_backoff(tmp, tries, delay_ms)
}
