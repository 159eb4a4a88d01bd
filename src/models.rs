//! Flat thread/comment rows as written to the per-window CSV files.

pub const THREAD_HEADER: [&str; 9] = [
    "id", "text", "title", "score",
    "num_comments", "ups", "downs",
    "upvote_ratio", "created_utc",
];

pub const COMMENT_HEADER: [&str; 7] = [
    "id", "parent_thread_id", "text",
    "score", "ups", "downs", "created_utc",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadRecord {
    pub id: String,
    pub text: String,
    pub title: String,
    pub score: i64,
    pub num_comments: i64,
    pub ups: i64,
    pub downs: i64,
    pub upvote_ratio: f64,
    pub created_utc: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRecord {
    pub id: String,
    pub parent_thread_id: String,
    pub text: String,
    pub score: i64,
    pub ups: i64,
    pub downs: i64,
    pub created_utc: f64,
}

impl ThreadRecord {
    pub fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            sanitize_text(&self.text),
            sanitize_text(&self.title),
            self.score.to_string(),
            self.num_comments.to_string(),
            self.ups.to_string(),
            self.downs.to_string(),
            fmt_float(self.upvote_ratio),
            fmt_float(self.created_utc),
        ]
    }
}

impl CommentRecord {
    pub fn csv_row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.parent_thread_id.clone(),
            sanitize_text(&self.text),
            self.score.to_string(),
            self.ups.to_string(),
            self.downs.to_string(),
            fmt_float(self.created_utc),
        ]
    }
}

/// Newlines, tabs and the `|` delimiter each become a single space.
pub fn sanitize_text(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\n' | '\t' | '|' => ' ',
            other => other,
        })
        .collect()
}

/// Floats keep a trailing `.0` when integral (`1700000000.0`, not `1700000000`).
pub fn fmt_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}
