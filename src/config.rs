use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

/// Which subreddit listing to page through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingKind {
    Hot,
    New,
}

impl ListingKind {
    pub fn as_path(self) -> &'static str {
        match self {
            ListingKind::Hot => "hot",
            ListingKind::New => "new",
        }
    }
}

/// Exactly `"hot"` selects the hot listing; every other value falls back to new.
impl From<String> for ListingKind {
    fn from(s: String) -> Self {
        if s == "hot" { ListingKind::Hot } else { ListingKind::New }
    }
}

/// One channel to harvest.
#[derive(Clone, Debug, Deserialize)]
pub struct SubredditConfig {
    pub subreddit_name: String,
    pub threads_csv: String,
    pub comments_csv: String,
    #[serde(rename = "type", deserialize_with = "listing_kind")]
    pub kind: ListingKind,
    #[serde(deserialize_with = "number_or_string")]
    pub limit: usize,
}

/// Top-level JSON config for the collector.
#[derive(Clone, Debug, Deserialize)]
pub struct HarvestConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub user_agent: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub subreddits: Vec<SubredditConfig>,
    #[serde(default)]
    pub options: HarvestOptions,
}

/// Runtime knobs with sensible defaults and builder chaining.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HarvestOptions {
    pub pause_every: usize,           // processed threads between pauses (0 disables)
    pub pause_secs: f64,
    pub listing_retry_secs: f64,      // sleep after a listing response error
    pub max_listing_retries: u32,
    pub comment_sort: String,
    pub comment_limit: usize,
    pub max_comment_retries: u32,
    pub request_timeout_secs: u64,
    pub api_base: String,
    pub auth_base: String,
    pub write_buffer_bytes: usize,
    pub progress: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            pause_every: 90,
            pause_secs: 60.0,
            listing_retry_secs: 65.0,
            max_listing_retries: 10,
            comment_sort: "hot".to_string(),
            comment_limit: 100,
            max_comment_retries: 5,
            request_timeout_secs: 30,
            api_base: "https://oauth.reddit.com".to_string(),
            auth_base: "https://www.reddit.com".to_string(),
            write_buffer_bytes: 256 * 1024,
            progress: true,
        }
    }
}

impl HarvestOptions {
    pub fn with_pause(mut self, every: usize, secs: f64) -> Self {
        self.pause_every = every;
        self.pause_secs = secs.max(0.0);
        self
    }
    pub fn with_listing_retry(mut self, secs: f64, max_retries: u32) -> Self {
        self.listing_retry_secs = secs.max(0.0);
        self.max_listing_retries = max_retries;
        self
    }
    pub fn with_comment_fetch(mut self, sort: impl Into<String>, limit: usize, max_retries: u32) -> Self {
        self.comment_sort = sort.into();
        self.comment_limit = limit.max(1);
        self.max_comment_retries = max_retries;
        self
    }
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs.max(1);
        self
    }
    pub fn with_endpoints(mut self, api_base: impl Into<String>, auth_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.auth_base = auth_base.into().trim_end_matches('/').to_string();
        self
    }
    pub fn with_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}

impl HarvestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        check_required(&value)?;
        let cfg: HarvestConfig = serde_json::from_value(value).map_err(|e| {
            tracing::info!("Config check failed");
            anyhow::Error::new(e).context("invalid config")
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject empty credentials and incomplete channel entries.
    pub fn validate(&self) -> Result<()> {
        let common = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
            ("user_agent", &self.user_agent),
        ];
        for (field, value) in common {
            if value.trim().is_empty() {
                tracing::info!("Config common check failed");
                bail!("invalid config: '{}' is empty", field);
            }
        }
        if self.subreddits.is_empty() {
            tracing::info!("Config common check failed");
            bail!("invalid config: 'subreddits' is empty");
        }

        for (i, sub) in self.subreddits.iter().enumerate() {
            let fields = [
                ("subreddit_name", &sub.subreddit_name),
                ("threads_csv", &sub.threads_csv),
                ("comments_csv", &sub.comments_csv),
            ];
            for (field, value) in fields {
                if value.trim().is_empty() {
                    tracing::info!("Config subreddit check failed");
                    bail!("invalid config: subreddits[{}].{} is empty", i, field);
                }
            }
            if sub.limit == 0 {
                tracing::info!("Config subreddit check failed");
                bail!("invalid config: subreddits[{}].limit must be positive", i);
            }
        }
        Ok(())
    }

    /// Password grant when both user credentials are set; app-only otherwise.
    pub fn user_credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

const COMMON_FIELDS: [&str; 5] = ["client_id", "client_secret", "redirect_uri", "user_agent", "subreddits"];
const SUBREDDIT_FIELDS: [&str; 5] = ["subreddit_name", "threads_csv", "comments_csv", "type", "limit"];

/// Presence check ahead of typed decoding, so a missing key is reported by name.
fn check_required(value: &Value) -> Result<()> {
    let Some(root) = value.as_object() else {
        tracing::info!("Config common check failed");
        bail!("invalid config: expected a JSON object");
    };
    if let Some(field) = COMMON_FIELDS.iter().find(|f| !root.contains_key(**f)) {
        tracing::info!("Config common check failed");
        bail!("invalid config: missing '{}'", field);
    }
    let Some(subs) = root.get("subreddits").and_then(Value::as_array) else {
        tracing::info!("Config common check failed");
        bail!("invalid config: 'subreddits' must be a list");
    };
    for (i, sub) in subs.iter().enumerate() {
        let Some(obj) = sub.as_object() else {
            tracing::info!("Config subreddit check failed");
            bail!("invalid config: subreddits[{}] must be an object", i);
        };
        if let Some(field) = SUBREDDIT_FIELDS.iter().find(|f| !obj.contains_key(**f)) {
            tracing::info!("Config subreddit check failed");
            bail!("invalid config: missing subreddits[{}].{}", i, field);
        }
    }
    Ok(())
}

fn listing_kind<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<ListingKind, D::Error> {
    String::deserialize(d).map(ListingKind::from)
}

fn number_or_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n as usize),
        Raw::Str(s) => s
            .trim()
            .parse::<usize>()
            .map_err(|_| serde::de::Error::custom(format!("limit '{}' is not a number", s))),
    }
}
