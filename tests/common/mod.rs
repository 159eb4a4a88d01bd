#![allow(dead_code)]

use rharvest::{
    ApiError, CommentNode, CommentRecord, HarvestOptions, ListingKind, ListingPage, SubredditConfig,
    ThreadRecord, ThreadSource,
};
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

/// Reference "now" for every harvest test (seconds since epoch).
pub const NOW: f64 = 1_700_000_000.0;
pub const HOUR: f64 = 3600.0;
pub const DATE: &str = "2024-01-01";

/// Read a text file line-by-line into strings (skips empty lines, drops `\r`).
pub fn read_lines(path: &Path) -> Vec<String> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines()
        .map(|l| l.unwrap().trim_end_matches('\r').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// First column (`id`) of every data row of a pipe-delimited window file.
pub fn ids_in(path: &Path) -> Vec<String> {
    read_lines(path)
        .into_iter()
        .skip(1)
        .map(|l| l.split('|').next().unwrap().to_string())
        .collect()
}

pub fn thread(id: &str, age_secs: f64) -> ThreadRecord {
    ThreadRecord {
        id: id.to_string(),
        text: format!("body of {id}\nsecond line"),
        title: format!("title|{id}"),
        score: 10,
        num_comments: 2,
        ups: 12,
        downs: 2,
        upvote_ratio: 0.85,
        created_utc: NOW - age_secs,
    }
}

pub fn comment(id: &str, thread_id: &str, age_secs: f64) -> CommentRecord {
    CommentRecord {
        id: id.to_string(),
        parent_thread_id: thread_id.to_string(),
        text: format!("comment {id}"),
        score: 3,
        ups: 3,
        downs: 0,
        created_utc: NOW - age_secs,
    }
}

pub fn node(rec: CommentRecord, replies: Vec<CommentNode>) -> CommentNode {
    CommentNode::Comment { record: rec, replies }
}

/// No pauses, no retry sleeps, no progress bars.
pub fn quiet_options() -> HarvestOptions {
    HarvestOptions::default()
        .with_pause(0, 0.0)
        .with_listing_retry(0.0, 3)
        .with_comment_fetch("hot", 100, 3)
        .with_progress(false)
}

pub fn sub_config(dir: &Path, name: &str, limit: usize) -> SubredditConfig {
    SubredditConfig {
        subreddit_name: name.to_string(),
        threads_csv: dir.join(format!("{name}_threads")).to_string_lossy().into_owned(),
        comments_csv: dir.join(format!("{name}_comments")).to_string_lossy().into_owned(),
        kind: ListingKind::New,
        limit,
    }
}

/// In-memory `ThreadSource`: pages through `threads` `page_size` at a time,
/// serves canned forests, and can inject errors.
#[derive(Default)]
pub struct FakeSource {
    pub threads: Vec<ThreadRecord>,
    pub forests: HashMap<String, Vec<CommentNode>>,
    pub page_size: usize,
    pub listing_errors: VecDeque<ApiError>,
    /// Remaining failures per thread id before its comment fetch succeeds.
    pub comment_failures: HashMap<String, u32>,
    pub listing_calls: u32,
    pub comment_calls: u32,
}

impl FakeSource {
    pub fn new(threads: Vec<ThreadRecord>, page_size: usize) -> Self {
        Self { threads, page_size, ..Default::default() }
    }

    pub fn with_forest(mut self, thread_id: &str, forest: Vec<CommentNode>) -> Self {
        self.forests.insert(thread_id.to_string(), forest);
        self
    }
}

pub fn rate_limited() -> ApiError {
    ApiError::RateLimited { retry_after: Duration::ZERO }
}

impl ThreadSource for FakeSource {
    fn listing_page(
        &mut self,
        _subreddit: &str,
        _kind: ListingKind,
        limit: usize,
        after: Option<&str>,
    ) -> Result<ListingPage, ApiError> {
        self.listing_calls += 1;
        if let Some(e) = self.listing_errors.pop_front() {
            return Err(e);
        }
        let start: usize = after.map(|a| a.parse().unwrap()).unwrap_or(0);
        let end = (start + limit.min(self.page_size)).min(self.threads.len());
        let threads = self.threads[start..end].to_vec();
        let after = (end < self.threads.len()).then(|| end.to_string());
        Ok(ListingPage { threads, after })
    }

    fn comment_tree(&mut self, thread_id: &str, _sort: &str, _limit: usize) -> Result<Vec<CommentNode>, ApiError> {
        self.comment_calls += 1;
        if let Some(left) = self.comment_failures.get_mut(thread_id) {
            if *left > 0 {
                *left -= 1;
                return Err(ApiError::Status { status: 503, message: "busy".into() });
            }
        }
        Ok(self.forests.get(thread_id).cloned().unwrap_or_default())
    }
}

/// Fresh temp dir for one test's outputs.
pub fn out_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Final window file for `<dir>/<stem>_<DATE><suffix>`.
pub fn window_file(dir: &Path, stem: &str, window: rharvest::AgeWindow) -> std::path::PathBuf {
    dir.join(format!("{stem}_{DATE}{}", window.file_suffix()))
}
