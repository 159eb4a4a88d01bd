//! Lexicon-based sentiment: valence tables plus the rule engine that scores a text.

pub mod analyzer;
pub mod lexicon;

pub use analyzer::{normalize, PolarityScores, SentimentAnalyzer};
pub use lexicon::Lexicon;
