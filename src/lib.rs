mod config;
mod models;
mod window;
mod util;
mod progress;
mod throttle;

mod client;
mod tree;
mod sink;
mod harvester;

pub mod sentiment;
mod score;

pub use crate::config::{HarvestConfig, HarvestOptions, ListingKind, SubredditConfig};
pub use crate::models::{CommentRecord, ThreadRecord, COMMENT_HEADER, THREAD_HEADER, sanitize_text, fmt_float};
pub use crate::window::{AgeWindow, windows_for};

// API client and the source seam the harvester runs against.
pub use crate::client::{ApiError, ListingPage, RedditClient, ThreadSource, parse_listing, parse_comment_forest, retry_after_from, MAX_PAGE_SIZE};
pub use crate::throttle::Cooldown;

// Reply-forest traversal.
pub use crate::tree::{BreadthFirst, CommentNode, WalkStats};

// Per-window CSV sink.
pub use crate::sink::WindowWriters;

// Collector entry points.
pub use crate::harvester::{HarvestStats, SubredditHarvester, harvest_all, harvest_with};

// Scorer entry points.
pub use crate::sentiment::{Lexicon, PolarityScores, SentimentAnalyzer};
pub use crate::score::{ScoreStats, SentimentScorer, discover_inputs, SCORE_COLUMNS};

//export robust file ops and clock helpers from util so binaries can import from crate root.
pub use crate::util::{init_tracing_once, open_with_backoff, create_with_backoff, remove_with_backoff, replace_file_atomic_backoff, predicted_path, now_utc_secs, today_utc_tag};

pub use crate::progress::{make_count_progress, ProgressScope};
