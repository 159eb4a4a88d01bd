//! Blocking Reddit API client plus the `ThreadSource` seam the harvester runs against.

use crate::config::{HarvestConfig, HarvestOptions, ListingKind};
use crate::models::{CommentRecord, ThreadRecord};
use crate::throttle::Cooldown;
use crate::tree::CommentNode;
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Listing pages never carry more than this many things.
pub const MAX_PAGE_SIZE: usize = 100;

const DEFAULT_RATE_LIMIT_SECS: u64 = 60;

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("rate limited, retry after {:.1}s", .retry_after.as_secs_f64())]
    RateLimited { retry_after: Duration },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth: {0}")]
    Auth(String),

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    /// Errors the server produced in response to a request (worth a sleep-and-retry).
    pub fn is_response_error(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. } | ApiError::Status { .. })
    }
}

/// One page of a subreddit listing.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub threads: Vec<ThreadRecord>,
    pub after: Option<String>,
}

/// Where threads and reply trees come from.
pub trait ThreadSource {
    fn listing_page(
        &mut self,
        subreddit: &str,
        kind: ListingKind,
        limit: usize,
        after: Option<&str>,
    ) -> Result<ListingPage, ApiError>;

    fn comment_tree(&mut self, thread_id: &str, sort: &str, limit: usize) -> Result<Vec<CommentNode>, ApiError>;
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
}

pub struct RedditClient {
    http: Client,
    api_base: String,
    auth_base: String,
    client_id: String,
    client_secret: String,
    credentials: Option<(String, String)>,
    token: Option<AccessToken>,
    cooldown: Cooldown,
}

impl RedditClient {
    pub fn new(cfg: &HarvestConfig) -> Result<Self, ApiError> {
        let opts: &HarvestOptions = &cfg.options;
        let http = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_secs(opts.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: opts.api_base.trim_end_matches('/').to_string(),
            auth_base: opts.auth_base.trim_end_matches('/').to_string(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            credentials: cfg.user_credentials().map(|(u, p)| (u.to_string(), p.to_string())),
            token: None,
            cooldown: Cooldown::new(),
        })
    }

    fn access_token(&mut self) -> Result<String, ApiError> {
        if let Some(tok) = &self.token {
            if Instant::now() < tok.expires_at {
                return Ok(tok.value.clone());
            }
        }

        let url = format!("{}/api/v1/access_token", self.auth_base);
        let form: Vec<(&str, &str)> = match &self.credentials {
            Some((user, pass)) => vec![("grant_type", "password"), ("username", user.as_str()), ("password", pass.as_str())],
            None => vec![("grant_type", "client_credentials")],
        };
        let resp = self
            .http
            .post(&url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Auth(format!("token endpoint returned {}", status)));
        }
        let body: TokenResponse = resp.json().map_err(|e| ApiError::Decode(e.to_string()))?;
        if let Some(err) = body.error {
            return Err(ApiError::Auth(err));
        }
        let value = body.access_token.ok_or_else(|| ApiError::Auth("no access_token in response".into()))?;
        // Refresh a minute early so a token never expires mid-request.
        let ttl = body.expires_in.unwrap_or(3600).saturating_sub(60).max(1);
        tracing::debug!(ttl_secs = ttl, "Obtained API access token");
        self.token = Some(AccessToken { value: value.clone(), expires_at: Instant::now() + Duration::from_secs(ttl) });
        Ok(value)
    }

    fn get_json(&mut self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.api_base, path);
        let mut refreshed = false;
        loop {
            self.cooldown.wait();
            let token = self.access_token()?;
            let resp = self.http.get(&url).bearer_auth(&token).query(query).send()?;
            let status = resp.status();
            let headers = resp.headers().clone();
            self.cooldown.observe(
                header_f64(&headers, "x-ratelimit-remaining"),
                header_f64(&headers, "x-ratelimit-reset"),
            );

            if status == StatusCode::UNAUTHORIZED {
                self.token = None;
                if refreshed {
                    return Err(ApiError::Auth("access token rejected after refresh".into()));
                }
                tracing::debug!("Access token rejected, refreshing");
                refreshed = true;
                continue;
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(ApiError::RateLimited { retry_after: retry_after_from(&headers) });
            }
            if !status.is_success() {
                let message: String = resp.text().unwrap_or_default().chars().take(200).collect();
                return Err(ApiError::Status { status: status.as_u16(), message });
            }
            return resp.json::<Value>().map_err(|e| ApiError::Decode(e.to_string()));
        }
    }
}

impl ThreadSource for RedditClient {
    fn listing_page(
        &mut self,
        subreddit: &str,
        kind: ListingKind,
        limit: usize,
        after: Option<&str>,
    ) -> Result<ListingPage, ApiError> {
        let mut query = vec![
            ("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(a) = after {
            query.push(("after", a.to_string()));
        }
        let path = format!("/r/{}/{}", subreddit.trim_start_matches("r/"), kind.as_path());
        let v = self.get_json(&path, &query)?;
        parse_listing(&v)
    }

    fn comment_tree(&mut self, thread_id: &str, sort: &str, limit: usize) -> Result<Vec<CommentNode>, ApiError> {
        let query = vec![
            ("sort", sort.to_string()),
            ("limit", limit.to_string()),
            ("raw_json", "1".to_string()),
        ];
        let v = self.get_json(&format!("/comments/{}", thread_id), &query)?;
        parse_comment_forest(&v, thread_id)
    }
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// `Retry-After`, else `x-ratelimit-reset`, else a minute.
pub fn retry_after_from(headers: &HeaderMap) -> Duration {
    header_f64(headers, "retry-after")
        .or_else(|| header_f64(headers, "x-ratelimit-reset"))
        .filter(|s| s.is_finite() && *s >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::from_secs(DEFAULT_RATE_LIMIT_SECS))
}

// -------- JSON -> records --------

#[derive(Deserialize)]
struct RawThread {
    id: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    downs: i64,
    #[serde(default)]
    upvote_ratio: f64,
    #[serde(default)]
    created_utc: f64,
}

#[derive(Deserialize)]
struct RawComment {
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    ups: i64,
    #[serde(default)]
    downs: i64,
    #[serde(default)]
    created_utc: f64,
    // "" when there are no replies, a Listing otherwise
    #[serde(default)]
    replies: Value,
}

#[derive(Deserialize)]
struct RawMore {
    #[serde(default)]
    children: Vec<String>,
}

fn listing_children(v: &Value) -> Result<&Vec<Value>, ApiError> {
    v.pointer("/data/children")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Decode("expected a Listing with data.children".into()))
}

fn decode<T: serde::de::DeserializeOwned>(data: &Value, what: &str) -> Result<T, ApiError> {
    T::deserialize(data).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
}

/// Parse a subreddit Listing into thread records and the `after` cursor.
/// Non-`t3` children are ignored.
pub fn parse_listing(v: &Value) -> Result<ListingPage, ApiError> {
    let mut threads = Vec::new();
    for child in listing_children(v)? {
        if child.get("kind").and_then(Value::as_str) != Some("t3") {
            continue;
        }
        let raw: RawThread = decode(&child["data"], "thread")?;
        threads.push(ThreadRecord {
            id: raw.id,
            text: raw.selftext,
            title: raw.title,
            score: raw.score,
            num_comments: raw.num_comments,
            ups: raw.ups,
            downs: raw.downs,
            upvote_ratio: raw.upvote_ratio,
            created_utc: raw.created_utc,
        });
    }
    let after = v
        .pointer("/data/after")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(ListingPage { threads, after })
}

/// Parse a `/comments/<id>` response (`[link listing, comment listing]`, or a bare
/// comment listing) into the reply forest of `thread_id`.
pub fn parse_comment_forest(v: &Value, thread_id: &str) -> Result<Vec<CommentNode>, ApiError> {
    let listing = match v {
        Value::Array(parts) => parts
            .get(1)
            .ok_or_else(|| ApiError::Decode("comments response has no comment listing".into()))?,
        other => other,
    };
    parse_children(listing, thread_id)
}

fn parse_children(listing: &Value, thread_id: &str) -> Result<Vec<CommentNode>, ApiError> {
    let children = listing_children(listing)?;
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match child.get("kind").and_then(Value::as_str) {
            Some("t1") => {
                let raw: RawComment = decode(&child["data"], "comment")?;
                let replies = if raw.replies.is_object() {
                    parse_children(&raw.replies, thread_id)?
                } else {
                    Vec::new()
                };
                out.push(CommentNode::Comment {
                    record: CommentRecord {
                        id: raw.id,
                        parent_thread_id: thread_id.to_string(),
                        text: raw.body,
                        score: raw.score,
                        ups: raw.ups,
                        downs: raw.downs,
                        created_utc: raw.created_utc,
                    },
                    replies,
                });
            }
            Some("more") => {
                let raw: RawMore = decode(&child["data"], "more")?;
                out.push(CommentNode::More { ids: raw.children });
            }
            _ => {}
        }
    }
    Ok(out)
}
