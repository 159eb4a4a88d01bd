use crate::client::{ApiError, RedditClient, ThreadSource, MAX_PAGE_SIZE};
use crate::config::{HarvestConfig, HarvestOptions, SubredditConfig};
use crate::models::{ThreadRecord, COMMENT_HEADER, THREAD_HEADER};
use crate::progress::ProgressScope;
use crate::sink::WindowWriters;
use crate::tree::{BreadthFirst, CommentNode};
use crate::util::{init_tracing_once, now_utc_secs, sleep_secs, today_utc_tag};
use ahash::AHashSet;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Counters and output paths for one harvested channel.
#[derive(Debug, Clone, Default)]
pub struct HarvestStats {
    pub subreddit: String,
    pub threads_processed: u64,
    /// Threads that landed in at least one window.
    pub threads_windowed: u64,
    /// Thread rows across all window files.
    pub thread_rows: u64,
    pub comments_processed: u64,
    pub comments_windowed: u64,
    pub comment_rows: u64,
    /// Windowed comments whose parent thread was itself windowed.
    pub comments_on_windowed_threads: u64,
    pub duplicate_comments: u64,
    pub more_skipped: u64,
    pub thread_files: Vec<PathBuf>,
    pub comment_files: Vec<PathBuf>,
}

/// Harvests one subreddit: threads first, then every collected reply tree breadth-first.
pub struct SubredditHarvester<'a, S: ThreadSource> {
    source: &'a mut S,
    sub: SubredditConfig,
    opts: HarvestOptions,
    date: String,
    now: f64,
}

impl<'a, S: ThreadSource> SubredditHarvester<'a, S> {
    pub fn new(source: &'a mut S, sub: SubredditConfig) -> Self {
        Self {
            source,
            sub,
            opts: HarvestOptions::default(),
            date: today_utc_tag(),
            now: now_utc_secs(),
        }
    }

    // -------- Builder methods --------
    pub fn options(mut self, opts: HarvestOptions) -> Self { self.opts = opts; self }
    pub fn date(mut self, date: impl Into<String>) -> Self { self.date = date.into(); self }
    /// Reference time for the age windows (seconds since epoch). Defaults to construction time.
    pub fn now(mut self, now: f64) -> Self { self.now = now; self }

    pub fn parse(mut self) -> Result<HarvestStats> {
        let mut stats = HarvestStats { subreddit: self.sub.subreddit_name.clone(), ..Default::default() };
        let write_buf = self.opts.write_buffer_bytes;

        let mut thread_w = WindowWriters::create(&self.sub.threads_csv, &self.date, &THREAD_HEADER, write_buf)
            .with_context(|| format!("open thread outputs for r/{}", self.sub.subreddit_name))?;
        let mut comment_w = WindowWriters::create(&self.sub.comments_csv, &self.date, &COMMENT_HEADER, write_buf)
            .with_context(|| format!("open comment outputs for r/{}", self.sub.subreddit_name))?;

        let mut forests: Vec<Vec<CommentNode>> = Vec::new();
        let mut windowed_ids: AHashSet<String> = AHashSet::new();

        self.parse_threads(&mut thread_w, &mut forests, &mut windowed_ids, &mut stats)?;
        self.parse_comments(&mut comment_w, forests, &windowed_ids, &mut stats)?;

        stats.thread_files = thread_w.finalize()?;
        stats.comment_files = comment_w.finalize()?;
        Ok(stats)
    }

    fn parse_threads(
        &mut self,
        writers: &mut WindowWriters,
        forests: &mut Vec<Vec<CommentNode>>,
        windowed_ids: &mut AHashSet<String>,
        stats: &mut HarvestStats,
    ) -> Result<()> {
        let limit = self.sub.limit as u64;
        let pb = ProgressScope::count(self.opts.progress, format!("r/{} threads", self.sub.subreddit_name), limit);
        let mut after: Option<String> = None;
        let mut retries = 0u32;

        'pages: while stats.threads_processed < limit {
            let want = ((limit - stats.threads_processed) as usize).min(MAX_PAGE_SIZE);
            let page = match self.source.listing_page(&self.sub.subreddit_name, self.sub.kind, want, after.as_deref()) {
                Ok(page) => {
                    retries = 0;
                    page
                }
                Err(e) if e.is_response_error() && retries < self.opts.max_listing_retries => {
                    retries += 1;
                    tracing::info!("Got response exception {}", e);
                    sleep_secs(self.opts.listing_retry_secs);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(subreddit = %self.sub.subreddit_name, "Got unexpected exception {}", e);
                    break;
                }
            };
            if page.threads.is_empty() {
                break;
            }

            for thread in page.threads {
                if stats.threads_processed >= limit {
                    break 'pages;
                }
                self.process_thread(thread, writers, forests, windowed_ids, stats)?;
                pb.inc(1);

                let every = self.opts.pause_every as u64;
                if every > 0 && stats.threads_processed % every == 0 {
                    tracing::info!("Processed {} threads", stats.threads_processed);
                    sleep_secs(self.opts.pause_secs);
                }
            }

            match page.after {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        pb.finish("threads done");
        tracing::info!(
            subreddit = %self.sub.subreddit_name,
            processed = stats.threads_processed,
            windowed = stats.threads_windowed,
            "Finish threads parsing"
        );
        Ok(())
    }

    fn process_thread(
        &mut self,
        thread: ThreadRecord,
        writers: &mut WindowWriters,
        forests: &mut Vec<Vec<CommentNode>>,
        windowed_ids: &mut AHashSet<String>,
        stats: &mut HarvestStats,
    ) -> Result<()> {
        forests.push(self.fetch_comment_tree(&thread.id));
        stats.threads_processed += 1;

        let n = writers.write_windowed(&thread.csv_row(), thread.created_utc, self.now)?;
        if n > 0 {
            stats.threads_windowed += 1;
            stats.thread_rows += n as u64;
            windowed_ids.insert(thread.id);
        }
        Ok(())
    }

    /// Sleep-and-retry around the reply tree fetch; gives up (empty forest) after the retry budget.
    fn fetch_comment_tree(&mut self, thread_id: &str) -> Vec<CommentNode> {
        let mut attempts = 0u32;
        loop {
            match self.source.comment_tree(thread_id, &self.opts.comment_sort, self.opts.comment_limit) {
                Ok(forest) => return forest,
                Err(e) => {
                    attempts += 1;
                    if attempts > self.opts.max_comment_retries {
                        tracing::warn!(thread = thread_id, "Skipping comments after {} failed attempts: {}", attempts, e);
                        return Vec::new();
                    }
                    let wait = match &e {
                        ApiError::RateLimited { retry_after } => retry_after.as_secs_f64() + 0.5,
                        _ => self.opts.listing_retry_secs,
                    };
                    tracing::info!(thread = thread_id, "Handling comment fetch error {}, retry in {:.1}s", e, wait);
                    sleep_secs(wait);
                }
            }
        }
    }

    fn parse_comments(
        &mut self,
        writers: &mut WindowWriters,
        forests: Vec<Vec<CommentNode>>,
        windowed_ids: &AHashSet<String>,
        stats: &mut HarvestStats,
    ) -> Result<()> {
        let mut walk = BreadthFirst::new(forests);
        for comment in walk.by_ref() {
            stats.comments_processed += 1;
            let n = writers.write_windowed(&comment.csv_row(), comment.created_utc, self.now)?;
            if n > 0 {
                stats.comments_windowed += 1;
                stats.comment_rows += n as u64;
                if windowed_ids.contains(&comment.parent_thread_id) {
                    stats.comments_on_windowed_threads += 1;
                }
            }
        }
        let walked = walk.stats();
        stats.duplicate_comments = walked.duplicates;
        stats.more_skipped = walked.more_skipped;

        tracing::info!(
            subreddit = %self.sub.subreddit_name,
            processed = stats.comments_processed,
            windowed = stats.comments_windowed,
            "Finish comments parsing"
        );
        Ok(())
    }
}

/// Harvest every configured subreddit in order with one API client.
/// A failing channel is logged and skipped; the others still run.
pub fn harvest_all(cfg: &HarvestConfig, date: &str) -> Result<Vec<HarvestStats>> {
    init_tracing_once();
    tracing::info!("Reddit harvest started");

    let mut client = RedditClient::new(cfg).context("build API client")?;
    harvest_with(&mut client, cfg, date)
}

/// Same as `harvest_all`, against any `ThreadSource`.
pub fn harvest_with<S: ThreadSource>(source: &mut S, cfg: &HarvestConfig, date: &str) -> Result<Vec<HarvestStats>> {
    let mut done = Vec::with_capacity(cfg.subreddits.len());
    for sub in &cfg.subreddits {
        let name = sub.subreddit_name.clone();
        let res = SubredditHarvester::new(&mut *source, sub.clone())
            .options(cfg.options.clone())
            .date(date)
            .parse();
        match res {
            Ok(stats) => {
                tracing::info!(
                    subreddit = %name,
                    threads = stats.threads_processed,
                    comments = stats.comments_processed,
                    "Subreddit harvested"
                );
                done.push(stats);
            }
            Err(e) => tracing::error!(subreddit = %name, "Harvest failed: {:#}", e),
        }
    }
    Ok(done)
}
