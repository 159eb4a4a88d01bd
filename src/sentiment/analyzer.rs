//! Rule-based valence scoring in the VADER style.

use ahash::AHashSet;
use serde::Serialize;

use super::lexicon::{booster, is_negation, special_case, Lexicon, B_DECR, C_INCR, N_SCALAR};

/// Normalization constant approximating the max expected raw sum.
const ALPHA: f64 = 15.0;

/// Per-text scores: `neg`/`neu`/`pos` proportions and the normalized `compound`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PolarityScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// Emphasis marks that may be glued to a word without changing its lookup.
const PUNC_LIST: &[&str] = &[
    ".", "!", "?", ",", ";", ":", "-", "'", "\"", "!!", "!!!", "??", "???", "?!?", "!?!", "?!?!", "!?!?",
];

/// Tokens of one text plus the lowercase forms used for lookups.
///
/// Whitespace-split tokens of one char are dropped. A token that is a word
/// with one `PUNC_LIST` mark before or after it is reduced to the word, so
/// emoticons and contractions survive intact.
struct Tokens {
    words: Vec<String>,
    lower: Vec<String>,
    cap_diff: bool,
}

impl Tokens {
    fn new(text: &str) -> Self {
        let bare: AHashSet<String> = text
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect::<String>()
            .split_whitespace()
            .filter(|w| w.chars().count() > 1)
            .map(str::to_string)
            .collect();
        let words: Vec<String> = text
            .split_whitespace()
            .filter(|w| w.chars().count() > 1)
            .map(|w| strip_glued_punc(w, &bare).to_string())
            .collect();
        let lower = words.iter().map(|w| w.to_lowercase()).collect();
        let cap_diff = allcap_differential(&words);
        Self { words, lower, cap_diff }
    }

    fn len(&self) -> usize {
        self.words.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SentimentAnalyzer {
    lexicon: Lexicon,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let toks = Tokens::new(text);
        let n = toks.len();
        let mut sentiments = Vec::with_capacity(n);

        for (pos, item) in toks.words.iter().enumerate() {
            // context is read around the first occurrence of an identical token
            let i = toks.words[..pos].iter().position(|w| w == item).unwrap_or(pos);
            let lw = toks.lower[i].as_str();
            // boosters carry no valence of their own
            if booster(lw).is_some() || (i + 1 < n && lw == "kind" && toks.lower[i + 1] == "of") {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.sentiment_valence(&toks, i));
        }

        but_check(&toks.lower, &mut sentiments);
        score_valence(&sentiments, text)
    }

    fn sentiment_valence(&self, toks: &Tokens, i: usize) -> f64 {
        let lower = &toks.lower;
        let Some(mut valence) = self.lexicon.get(&lower[i]) else {
            return 0.0;
        };

        if is_upper(&toks.words[i]) && toks.cap_diff {
            if valence > 0.0 { valence += C_INCR } else { valence -= C_INCR }
        }

        for start_i in 0..3 {
            if i > start_i && !self.lexicon.contains(&lower[i - (start_i + 1)]) {
                let j = i - (start_i + 1);
                let mut s = scalar_inc_dec(&toks.words[j], &lower[j], valence, toks.cap_diff);
                if start_i == 1 && s != 0.0 {
                    s *= 0.95;
                }
                if start_i == 2 && s != 0.0 {
                    s *= 0.9;
                }
                valence += s;
                valence = never_check(valence, &toks.words, lower, start_i, i);
                if start_i == 2 {
                    valence = special_idioms_check(valence, &toks.words, i);
                }
            }
        }

        least_check(valence, lower, i, &self.lexicon)
    }
}

/// `token` with one leading or trailing emphasis mark removed, when what is
/// left is a bare word of the text.
fn strip_glued_punc<'a>(token: &'a str, bare: &AHashSet<String>) -> &'a str {
    for p in PUNC_LIST {
        if let Some(w) = token.strip_suffix(p) {
            if bare.contains(w) {
                return w;
            }
        }
    }
    for p in PUNC_LIST {
        if let Some(w) = token.strip_prefix(p) {
            if bare.contains(w) {
                return w;
            }
        }
    }
    token
}

/// At least one cased char and no lowercase ones.
fn is_upper(word: &str) -> bool {
    let mut cased = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// True when some, but not all, words are ALL CAPS.
fn allcap_differential(words: &[String]) -> bool {
    let allcaps = words.iter().filter(|w| is_upper(w)).count();
    let diff = words.len() - allcaps;
    diff > 0 && diff < words.len()
}

fn scalar_inc_dec(word: &str, word_lower: &str, valence: f64, cap_diff: bool) -> f64 {
    let Some(mut scalar) = booster(word_lower) else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if is_upper(word) && cap_diff {
        if valence > 0.0 { scalar += C_INCR } else { scalar -= C_INCR }
    }
    scalar
}

/// Negation and "never so/this" emphasis for the word `start_i + 1` before `i`.
/// The "never" forms compare original-case tokens.
fn never_check(valence: f64, words: &[String], lower: &[String], start_i: usize, i: usize) -> f64 {
    let w = |k: usize| words[i - k].as_str();
    let so_or_this = |k: usize| matches!(w(k), "so" | "this");
    match start_i {
        0 => {
            if is_negation(&lower[i - 1]) {
                return valence * N_SCALAR;
            }
        }
        1 => {
            if w(2) == "never" && so_or_this(1) {
                return valence * 1.25;
            } else if is_negation(&lower[i - 2]) {
                return valence * N_SCALAR;
            }
        }
        2 => {
            if (w(3) == "never" && so_or_this(2)) || so_or_this(1) {
                return valence * 1.25;
            } else if is_negation(&lower[i - 3]) {
                return valence * N_SCALAR;
            }
        }
        _ => {}
    }
    valence
}

/// Idiom overrides around position `i` (only reached with `i >= 3`).
/// Idioms match original-case tokens.
fn special_idioms_check(mut valence: f64, words: &[String], i: usize) -> f64 {
    let n = words.len();
    let onezero = format!("{} {}", words[i - 1], words[i]);
    let twoonezero = format!("{} {} {}", words[i - 2], words[i - 1], words[i]);
    let twoone = format!("{} {}", words[i - 2], words[i - 1]);
    let threetwoone = format!("{} {} {}", words[i - 3], words[i - 2], words[i - 1]);
    let threetwo = format!("{} {}", words[i - 3], words[i - 2]);

    for seq in [&onezero, &twoonezero, &twoone, &threetwoone, &threetwo] {
        if let Some(v) = special_case(seq) {
            valence = v;
            break;
        }
    }
    if n - 1 > i {
        let zeroone = format!("{} {}", words[i], words[i + 1]);
        if let Some(v) = special_case(&zeroone) {
            valence = v;
        }
    }
    if n - 1 > i + 1 {
        let zeroonetwo = format!("{} {} {}", words[i], words[i + 1], words[i + 2]);
        if let Some(v) = special_case(&zeroonetwo) {
            valence = v;
        }
    }
    // two-word dampeners ("kind of", "sort of", ...)
    if booster(&threetwo).is_some() || booster(&twoone).is_some() {
        valence += B_DECR;
    }
    valence
}

fn least_check(valence: f64, lower: &[String], i: usize, lexicon: &Lexicon) -> f64 {
    if i > 1 && !lexicon.contains(&lower[i - 1]) && lower[i - 1] == "least" {
        if lower[i - 2] != "at" && lower[i - 2] != "very" {
            return valence * N_SCALAR;
        }
    } else if i > 0 && !lexicon.contains(&lower[i - 1]) && lower[i - 1] == "least" {
        return valence * N_SCALAR;
    }
    valence
}

/// Sentiment before the first "but" is halved, after it is weighted ×1.5.
fn but_check(lower: &[String], sentiments: &mut [f64]) {
    let Some(bi) = lower.iter().position(|w| w == "but") else {
        return;
    };
    for (si, s) in sentiments.iter_mut().enumerate() {
        if si < bi {
            *s *= 0.5;
        } else if si > bi {
            *s *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let ep = text.matches('!').count().min(4) as f64 * 0.292;
    let qm_count = text.matches('?').count();
    let qm = match qm_count {
        0 | 1 => 0.0,
        2..=3 => qm_count as f64 * 0.18,
        _ => 0.96,
    };
    ep + qm
}

/// `s / sqrt(s² + alpha)`, clamped to [-1, 1].
pub fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

/// Round to `places` decimals on the exact binary value, as decimal printing does.
fn round_to(v: f64, places: usize) -> f64 {
    format!("{v:.places$}").parse().unwrap_or(v)
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
    if sentiments.is_empty() {
        return PolarityScores::default();
    }
    let amp = punctuation_emphasis(text);

    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += amp;
    } else if sum < 0.0 {
        sum -= amp;
    }
    let compound = normalize(sum);

    let (mut pos_sum, mut neg_sum, mut neu_count) = (0.0f64, 0.0f64, 0u32);
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += amp;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= amp;
    }

    let total = pos_sum + neg_sum.abs() + neu_count as f64;
    if total == 0.0 {
        return PolarityScores { compound: round_to(compound, 4), ..Default::default() };
    }
    PolarityScores {
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count as f64 / total).abs(), 3),
        pos: round_to((pos_sum / total).abs(), 3),
        compound: round_to(compound, 4),
    }
}
