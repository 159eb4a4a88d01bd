//! Valence lexicon plus the rule tables (negations, boosters, idioms) the analyzer consults.

use ahash::AHashMap;
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::util::open_with_backoff;

/// Empirically derived booster/dampener increment.
pub const B_INCR: f64 = 0.293;
pub const B_DECR: f64 = -0.293;
/// Emphasis added to an ALL-CAPS sentiment word in mixed-case text.
pub const C_INCR: f64 = 0.733;
/// Scalar applied to a negated valence.
pub const N_SCALAR: f64 = -0.74;

pub const NEGATE: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt",
    "ain't", "aren't", "can't", "couldn't", "daren't", "didn't", "doesn't",
    "dont", "hadnt", "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither",
    "don't", "hadn't", "hasn't", "haven't", "isn't", "mightn't", "mustn't",
    "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing", "nowhere",
    "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent",
    "oughtn't", "shan't", "shouldn't", "uh-uh", "wasn't", "weren't",
    "without", "wont", "wouldnt", "won't", "wouldn't", "rarely", "seldom", "despite",
];

const BOOST_UP: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly",
    "deeply", "effing", "enormously", "entirely", "especially", "exceptionally",
    "extremely", "fabulously", "flipping", "flippin", "fricking", "frickin",
    "frigging", "friggin", "fully", "fucking", "greatly", "hella", "highly",
    "hugely", "incredibly", "intensely", "majorly", "more", "most", "particularly",
    "purely", "quite", "really", "remarkably", "so", "substantially", "thoroughly",
    "totally", "tremendously", "uber", "unbelievably", "unusually", "utterly", "very",
];

const BOOST_DOWN: &[&str] = &[
    "almost", "barely", "hardly", "just enough", "kind of", "kinda", "kindof", "kind-of",
    "less", "little", "marginally", "occasionally", "partly", "scarcely", "slightly",
    "somewhat", "sort of", "sorta", "sortof", "sort-of",
];

/// Matched against the original-case tokens, so "The bomb" is not an idiom.
const SPECIAL_CASES: &[(&str, f64)] = &[
    ("the shit", 3.0),
    ("the bomb", 3.0),
    ("bad ass", 1.5),
    ("yeah right", -2.0),
    ("cut the mustard", 2.0),
    ("kiss of death", -1.5),
    ("hand to mouth", -2.0),
];

/// Compact English lexicon on the -4..+4 valence scale. Means approximate the
/// VADER crowd ratings; load the full `vader_lexicon.txt` for exact scores.
const BUILTIN: &[(&str, f64)] = &[
    // positive
    ("abundant", 1.2), ("accept", 1.6), ("accepted", 1.1), ("accomplish", 1.8),
    ("accomplished", 1.9), ("achieve", 1.9), ("achievement", 2.1), ("admire", 2.1),
    ("admired", 2.3), ("adorable", 2.2), ("adore", 2.6), ("advantage", 1.0),
    ("affection", 2.4), ("agree", 1.5), ("agreed", 1.1), ("alive", 1.6),
    ("amazed", 2.2), ("amazing", 2.8), ("amuse", 1.8), ("amused", 1.6),
    ("amusing", 1.6), ("appreciate", 1.7), ("appreciated", 2.3), ("approval", 2.1),
    ("approve", 2.2), ("assured", 1.5), ("astonishing", 2.3), ("attractive", 1.9),
    ("awesome", 3.1), ("beautiful", 2.9), ("beauty", 2.8), ("believe", 1.2),
    ("benefit", 2.0), ("best", 3.2), ("better", 1.9), ("bless", 1.8),
    ("blessed", 2.9), ("bliss", 2.7), ("bold", 1.6), ("bonus", 2.5),
    ("brave", 2.4), ("bright", 1.9), ("brilliant", 2.8), ("bullish", 1.6),
    ("calm", 1.3), ("capable", 1.6), ("care", 2.2), ("careful", 0.6),
    ("celebrate", 2.7), ("celebration", 2.7), ("champion", 2.9), ("charm", 1.7),
    ("charming", 2.8), ("cheer", 2.3), ("cheerful", 2.5), ("cherish", 2.2),
    ("clean", 1.7), ("clever", 2.0), ("comfort", 1.5), ("comfortable", 2.3),
    ("confident", 2.2), ("congrats", 2.4), ("congratulations", 2.9), ("cool", 1.3),
    ("courage", 2.2), ("creative", 1.9), ("cute", 2.0), ("dear", 1.6),
    ("decent", 1.2), ("delight", 2.9), ("delighted", 2.9), ("delightful", 2.9),
    ("deserve", 0.8), ("desirable", 1.3), ("determined", 1.4), ("eager", 1.5),
    ("ease", 1.5), ("easy", 1.9), ("ecstatic", 2.3), ("effective", 2.1),
    ("efficient", 1.8), ("elegant", 2.1), ("encourage", 2.3), ("encouraged", 1.5),
    ("encouraging", 2.4), ("energetic", 1.9), ("engaging", 1.4), ("enjoy", 2.2),
    ("enjoyed", 2.3), ("enjoying", 2.4), ("enthusiastic", 1.9), ("entertaining", 1.9),
    ("excellent", 2.7), ("excited", 1.4), ("excitement", 2.2), ("exciting", 2.2),
    ("fabulous", 2.4), ("fair", 1.3), ("faith", 1.8), ("faithful", 1.9),
    ("fan", 1.3), ("fantastic", 2.6), ("fascinating", 2.5), ("favor", 1.7),
    ("favorite", 2.0), ("fine", 0.8), ("fortunate", 1.9), ("free", 2.3),
    ("freedom", 3.2), ("fresh", 1.3), ("friend", 2.2), ("friendly", 2.2),
    ("friendship", 1.9), ("fun", 2.3), ("funny", 1.9), ("generous", 2.3),
    ("genius", 1.9), ("gentle", 1.9), ("gift", 1.9), ("glad", 2.0),
    ("glorious", 3.2), ("glory", 2.3), ("good", 1.9), ("gorgeous", 3.0),
    ("grace", 1.8), ("grand", 2.0), ("grateful", 2.0), ("gratitude", 2.3),
    ("great", 3.1), ("greatest", 3.2), ("handsome", 2.2), ("happiness", 2.6),
    ("happy", 2.7), ("harmony", 1.7), ("haha", 2.0), ("hahaha", 2.6),
    ("healthy", 1.7), ("heaven", 2.5), ("helpful", 1.9), ("hero", 2.6),
    ("heroic", 2.6), ("honest", 2.3), ("honor", 2.2), ("hope", 1.9),
    ("hopeful", 2.3), ("hug", 2.1), ("humor", 1.1), ("ideal", 2.4),
    ("importance", 1.5), ("impressed", 2.1), ("impressive", 2.3), ("improve", 1.9),
    ("improved", 2.1), ("improvement", 2.0), ("incredible", 3.4), ("innovative", 1.9),
    ("inspiration", 2.4), ("inspired", 2.2), ("inspiring", 1.9), ("intelligent", 2.0),
    ("interest", 2.0), ("interested", 1.7), ("interesting", 1.7), ("invincible", 2.2),
    ("joke", 1.2), ("jolly", 2.3), ("joy", 2.8), ("joyful", 2.9),
    ("kind", 2.4), ("kindness", 2.0), ("kiss", 1.8), ("laugh", 2.6),
    ("laughing", 2.2), ("legend", 1.3), ("legendary", 2.3), ("like", 2.0),
    ("liked", 1.8), ("lmao", 2.0), ("lol", 1.8), ("love", 3.2),
    ("loved", 2.9), ("lovely", 2.8), ("loving", 2.9), ("loyal", 2.1),
    ("lucky", 1.8), ("magnificent", 2.9), ("marvelous", 2.9), ("masterpiece", 3.1),
    ("merry", 2.5), ("miracle", 2.8), ("motivated", 1.6), ("neat", 2.0),
    ("nice", 1.8), ("ok", 1.2), ("okay", 0.9), ("optimism", 2.5),
    ("optimistic", 1.3), ("outstanding", 3.0), ("paradise", 3.2), ("passion", 2.0),
    ("passionate", 2.4), ("peace", 2.5), ("peaceful", 2.2), ("perfect", 2.7),
    ("perfectly", 3.2), ("play", 1.4), ("pleasant", 2.3), ("please", 1.3),
    ("pleased", 1.9), ("pleasure", 2.7), ("popular", 1.8), ("positive", 2.6),
    ("powerful", 1.8), ("praise", 2.6), ("precious", 2.7), ("pretty", 2.2),
    ("pride", 1.4), ("progress", 1.8), ("prosperous", 2.1), ("protect", 1.3),
    ("proud", 2.1), ("radiant", 2.1), ("ready", 1.5), ("reassure", 1.4),
    ("recommend", 1.5), ("refreshing", 2.2), ("relax", 1.9), ("relaxed", 2.2),
    ("relief", 2.1), ("relieved", 1.6), ("remarkable", 2.6), ("respect", 2.1),
    ("reward", 2.0), ("rewarding", 2.4), ("rich", 2.6), ("romantic", 2.3),
    ("safe", 1.9), ("satisfied", 1.8), ("satisfying", 2.0), ("save", 2.2),
    ("secure", 1.4), ("sexy", 2.4), ("sincere", 1.7), ("smart", 1.7),
    ("smile", 1.5), ("smiling", 2.0), ("solid", 0.6), ("splendid", 2.8),
    ("stunning", 1.6), ("strength", 2.2), ("strong", 2.3), ("stylish", 2.3),
    ("succeed", 2.2), ("success", 2.7), ("successful", 2.8), ("sunshine", 2.2),
    ("super", 2.9), ("superb", 3.1), ("support", 1.7), ("supportive", 1.2),
    ("supreme", 2.6), ("sure", 1.3), ("surprise", 1.1), ("sweet", 2.0),
    ("sympathy", 0.3), ("talent", 1.5), ("talented", 2.3), ("terrific", 2.1),
    ("thank", 1.5), ("thanks", 1.9), ("thankful", 2.7), ("thoughtful", 1.6),
    ("thrilled", 1.9), ("thrilling", 2.1), ("top", 0.8), ("treasure", 1.2),
    ("triumph", 2.1), ("true", 1.8), ("trust", 2.3), ("trusted", 2.1),
    ("truth", 1.3), ("useful", 1.9), ("valuable", 2.1), ("victory", 2.8),
    ("vibrant", 2.4), ("vital", 1.2), ("warm", 0.9), ("wealth", 2.2),
    ("welcome", 2.0), ("win", 2.8), ("winner", 2.8), ("winning", 2.4),
    ("wins", 2.7), ("wisdom", 2.4), ("wise", 1.8), ("won", 2.7),
    ("wonderful", 2.7), ("worth", 0.9), ("worthy", 1.9), ("wow", 2.8),
    ("yay", 2.4), ("yes", 1.7), ("yummy", 2.4),
    // negative
    ("abandon", -1.9), ("abandoned", -2.0), ("abuse", -3.2), ("abused", -2.3),
    ("accident", -2.1), ("accused", -1.2), ("afraid", -2.2), ("aggressive", -0.6),
    ("agony", -1.8), ("alarm", -1.4), ("alarming", -0.5), ("alone", -1.0),
    ("anger", -2.7), ("angry", -2.3), ("anguish", -2.9), ("annoy", -1.9),
    ("annoyed", -1.6), ("annoying", -1.7), ("anxiety", -0.7), ("anxious", -1.0),
    ("apathy", -1.2), ("arrogant", -2.2), ("ashamed", -2.1), ("assault", -2.8),
    ("attack", -2.1), ("attacked", -2.0), ("avoid", -1.2), ("awful", -2.0),
    ("awkward", -0.6), ("bad", -2.5), ("badly", -2.1), ("bankruptcy", -2.6),
    ("bearish", -1.3), ("betrayed", -3.0), ("bitch", -2.8), ("bitter", -1.8),
    ("blame", -1.4), ("blamed", -2.1), ("bomb", -2.2), ("bored", -1.1),
    ("boring", -1.3), ("broke", -1.8), ("broken", -2.1), ("brutal", -3.1),
    ("bug", -1.6), ("bullshit", -2.8), ("burden", -1.9), ("cancel", -1.0),
    ("cancelled", -1.0), ("careless", -1.5), ("chaos", -2.7), ("cheat", -2.0),
    ("cheated", -1.9), ("clueless", -1.5), ("complain", -1.5), ("complaint", -1.2),
    ("confused", -1.3), ("confusing", -0.9), ("conflict", -1.3), ("corrupt", -3.0),
    ("coward", -2.0), ("crap", -1.6), ("crash", -1.7), ("crazy", -1.4),
    ("crime", -2.5), ("criminal", -2.4), ("crisis", -3.1), ("critical", -1.3),
    ("criticism", -1.9), ("cruel", -2.8), ("cry", -2.1), ("crying", -2.1),
    ("damage", -2.2), ("damaged", -1.9), ("damn", -1.7), ("danger", -2.4),
    ("dangerous", -2.1), ("dead", -3.3), ("deadly", -2.4), ("death", -2.9),
    ("debt", -1.5), ("deceived", -1.9), ("defeat", -2.0), ("defeated", -2.1),
    ("delay", -1.3), ("denied", -1.6), ("depressed", -2.3), ("depressing", -1.6),
    ("depression", -2.7), ("despair", -1.3), ("desperate", -1.3), ("destroy", -2.5),
    ("destroyed", -3.4), ("destruction", -2.7), ("devastated", -3.1), ("devastating", -3.3),
    ("die", -2.9), ("died", -2.6), ("difficult", -1.5), ("dirty", -1.9),
    ("disappointed", -1.9), ("disappointing", -2.2), ("disappointment", -2.3), ("disaster", -3.1),
    ("disgrace", -2.2), ("disgusted", -2.4), ("disgusting", -2.4), ("dislike", -1.6),
    ("dismal", -3.0), ("distress", -2.4), ("disturbed", -1.6), ("doom", -1.7),
    ("doubt", -1.5), ("dread", -2.0), ("dreadful", -1.9), ("dumb", -2.3),
    ("dump", -1.6), ("embarrassed", -1.5), ("embarrassing", -1.6), ("enemy", -2.5),
    ("error", -1.7), ("evil", -3.4), ("exhausted", -1.5), ("fail", -2.5),
    ("failed", -2.3), ("failing", -2.3), ("fails", -1.8), ("failure", -2.3),
    ("fake", -2.1), ("fatal", -2.5), ("fear", -2.2), ("fearful", -2.2),
    ("fight", -1.6), ("filthy", -2.4), ("fool", -1.9), ("foolish", -1.1),
    ("fraud", -2.8), ("frightened", -1.9), ("frustrated", -2.4), ("frustrating", -1.9),
    ("frustration", -2.1), ("fuck", -2.5), ("fucked", -3.4), ("furious", -2.7),
    ("garbage", -1.6), ("gloomy", -0.6), ("greed", -1.7), ("greedy", -1.3),
    ("grief", -2.2), ("gross", -2.1), ("guilt", -1.1), ("guilty", -1.8),
    ("harm", -2.5), ("harsh", -1.9), ("hate", -2.7), ("hated", -3.2),
    ("hateful", -3.5), ("hatred", -3.2), ("hell", -3.6), ("helpless", -2.0),
    ("hopeless", -2.0), ("horrible", -2.5), ("horrific", -3.4), ("hostile", -1.6),
    ("humiliated", -3.1), ("hurt", -2.4), ("hurting", -1.7), ("idiot", -2.3),
    ("idiotic", -2.6), ("ignorant", -1.1), ("ill", -1.8), ("illegal", -2.6),
    ("inferior", -1.7), ("injured", -1.7), ("injury", -1.8), ("insane", -1.7),
    ("insecure", -1.8), ("insult", -2.3), ("insulted", -2.3), ("irritated", -2.0),
    ("jealous", -2.0), ("kill", -3.7), ("killed", -3.5), ("lame", -1.8),
    ("liar", -2.5), ("lie", -1.6), ("lied", -1.6), ("lies", -1.8),
    ("lonely", -1.5), ("lose", -1.7), ("loser", -2.4), ("loss", -1.3),
    ("lost", -1.3), ("lousy", -2.5), ("mad", -2.2), ("mediocre", -0.3),
    ("mess", -1.5), ("messy", -1.5), ("miserable", -2.2), ("misery", -2.7),
    ("miss", -0.6), ("missed", -1.2), ("mistake", -1.4), ("moron", -2.2),
    ("murder", -3.7), ("nasty", -2.6), ("negative", -2.7), ("nervous", -1.1),
    ("no", -1.2), ("nonsense", -1.7), ("nightmare", -1.9), ("offended", -1.0),
    ("outrage", -2.3), ("outraged", -2.5), ("pain", -2.3), ("painful", -1.9),
    ("panic", -2.3), ("paranoid", -1.0), ("pathetic", -2.7), ("pessimistic", -1.5),
    ("pissed", -3.2), ("pity", -1.2), ("poor", -2.1), ("poverty", -2.3),
    ("problem", -1.7), ("problems", -1.7), ("punish", -2.4), ("racist", -3.1),
    ("rage", -2.6), ("reckless", -1.7), ("regret", -1.9), ("reject", -1.7),
    ("rejected", -2.3), ("ridiculous", -1.5), ("risk", -1.1), ("rotten", -2.3),
    ("rubbish", -1.9), ("rude", -2.0), ("ruin", -2.8), ("ruined", -2.4),
    ("sad", -2.1), ("sadly", -1.8), ("sadness", -1.9), ("scam", -2.7),
    ("scandal", -1.9), ("scared", -1.9), ("scary", -2.2), ("screwed", -2.2),
    ("selfish", -2.1), ("severe", -1.6), ("shame", -2.1), ("shameful", -2.2),
    ("shit", -2.6), ("shitty", -2.6), ("shock", -1.6), ("shocked", -1.3),
    ("sick", -2.3), ("sickening", -2.2), ("sin", -2.6), ("sorrow", -2.4),
    ("sorry", -0.3), ("stress", -1.8), ("stressed", -1.4), ("struggle", -1.3),
    ("stuck", -1.0), ("stupid", -2.4), ("stupidity", -1.9), ("suck", -1.9),
    ("sucks", -1.5), ("suffer", -2.5), ("suffering", -2.1), ("suicide", -3.5),
    ("suspicious", -1.5), ("terrible", -2.1), ("terrified", -3.0), ("terror", -3.0),
    ("terrorist", -3.7), ("threat", -2.4), ("threatened", -2.0), ("tired", -1.9),
    ("toxic", -2.4), ("tragedy", -3.4), ("tragic", -3.4), ("trap", -1.3),
    ("trash", -1.6), ("trouble", -1.7), ("troubled", -2.0), ("ugly", -2.3),
    ("unacceptable", -2.0), ("unfair", -2.1), ("unfortunate", -2.0), ("unfortunately", -1.4),
    ("unhappy", -1.8), ("upset", -1.6), ("useless", -1.8), ("victim", -2.4),
    ("violence", -3.1), ("violent", -2.9), ("war", -2.9), ("warn", -0.4),
    ("waste", -1.8), ("wasted", -2.2), ("weak", -1.9), ("weakness", -1.8),
    ("weird", -0.7), ("whore", -3.3), ("wicked", -2.4), ("worried", -1.2),
    ("worry", -1.9), ("worse", -2.1), ("worst", -3.1), ("worthless", -1.9),
    ("wrong", -2.1), ("wtf", -2.8),
    // emoticons
    (":)", 2.0), (":-)", 1.3), (":(", -1.9), (":-(", -1.5), (":d", 2.3),
    ("<3", 1.9), (";)", 0.9), (":/", -1.4), (":p", 1.4),
];

/// Trading and crypto slang common on finance subreddits. Only fills words the
/// general table lacks.
const MARKET: &[(&str, f64)] = &[
    ("moon", 2.7), ("mooning", 2.9), ("pump", 2.1), ("pumping", 2.4), ("ath", 2.6),
    ("breakout", 2.3), ("rally", 2.4), ("surge", 2.4), ("skyrocket", 2.7),
    ("skyrocketed", 2.7), ("lambo", 2.6), ("hodl", 1.8), ("gains", 2.3),
    ("millionaire", 2.4), ("bullrun", 2.6), ("adoption", 2.0), ("partnership", 1.8),
    ("undervalued", 1.8), ("gem", 2.1), ("opportunity", 1.7), ("rise", 1.5),
    ("rising", 1.5), ("recover", 1.5), ("recovery", 1.5), ("bounce", 1.4),
    ("stable", 1.1), ("growing", 1.5), ("growth", 1.5), ("promising", 1.7),
    ("potential", 1.4),
    ("crashing", -2.9), ("crashed", -2.7), ("dumping", -2.4), ("rugpull", -3.0),
    ("ponzi", -2.9), ("collapse", -2.7), ("collapsed", -2.7), ("catastrophe", -2.9),
    ("rekt", -2.6), ("liquidated", -2.4), ("liquidation", -2.4), ("bankrupt", -2.7),
    ("fud", -1.5), ("hacked", -2.7), ("exploit", -2.6), ("stolen", -2.7),
    ("losing", -2.1), ("losses", -1.8), ("fall", -1.5), ("falling", -1.5),
    ("decline", -1.5), ("drop", -1.5), ("dropping", -1.7), ("correction", -1.2),
    ("dip", -1.1), ("risky", -1.4), ("volatile", -0.9), ("uncertainty", -1.2),
    ("concern", -1.4), ("warning", -1.5), ("caution", -1.2), ("overvalued", -1.5),
    ("bubble", -1.8), ("plummet", -2.4), ("plummeted", -2.4), ("plunge", -2.2),
    ("plunged", -2.2), ("tanked", -2.0), ("bagholder", -1.8),
];

/// Conventional file name of the full crowd-rated lexicon.
pub const LEXICON_FILE_NAME: &str = "vader_lexicon.txt";
/// Environment variable naming a lexicon file to use by default.
pub const LEXICON_ENV: &str = "RHARVEST_LEXICON";

fn booster_table() -> &'static AHashMap<&'static str, f64> {
    static TABLE: OnceLock<AHashMap<&'static str, f64>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut m = AHashMap::with_capacity(BOOST_UP.len() + BOOST_DOWN.len());
        m.extend(BOOST_UP.iter().map(|w| (*w, B_INCR)));
        m.extend(BOOST_DOWN.iter().map(|w| (*w, B_DECR)));
        m
    })
}

/// Booster/dampener increment for a lowercase word or n-gram.
pub fn booster(word_lower: &str) -> Option<f64> {
    booster_table().get(word_lower).copied()
}

/// Idiom override for an n-gram of original-case tokens.
pub fn special_case(seq: &str) -> Option<f64> {
    SPECIAL_CASES.iter().find(|(k, _)| *k == seq).map(|(_, v)| *v)
}

/// True if the lowercase word negates what follows it (`n't` forms included).
pub fn is_negation(word_lower: &str) -> bool {
    NEGATE.contains(&word_lower) || word_lower.contains("n't")
}

/// Token → mean valence. Keys are stored lowercase.
#[derive(Clone, Debug)]
pub struct Lexicon {
    valences: AHashMap<String, f64>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lexicon {
    /// The embedded general table plus market slang.
    pub fn builtin() -> Self {
        let mut valences = AHashMap::with_capacity(BUILTIN.len() + MARKET.len());
        for (word, v) in BUILTIN {
            valences.insert(word.to_lowercase(), *v);
        }
        for (word, v) in MARKET {
            valences.entry(word.to_lowercase()).or_insert(*v);
        }
        Self { valences }
    }

    /// Full lexicon if one can be found, else the built-in table.
    ///
    /// Looks at `$RHARVEST_LEXICON`, then `vader_lexicon.txt` in the working
    /// directory, then next to the executable.
    pub fn discover() -> Self {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(p) = std::env::var_os(LEXICON_ENV) {
            candidates.push(PathBuf::from(p));
        }
        candidates.push(PathBuf::from(LEXICON_FILE_NAME));
        if let Some(dir) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
            candidates.push(dir.join(LEXICON_FILE_NAME));
        }
        Self::first_loadable(&candidates)
    }

    /// First candidate that exists and loads; the built-in table otherwise.
    pub fn first_loadable(candidates: &[PathBuf]) -> Self {
        for path in candidates.iter().filter(|p| p.is_file()) {
            match Self::from_path(path) {
                Ok(lex) if !lex.is_empty() => return lex,
                Ok(_) => tracing::warn!(path = %path.display(), "Lexicon file has no entries, skipping"),
                Err(e) => tracing::warn!(path = %path.display(), "Could not load lexicon: {:#}", e),
            }
        }
        let lex = Self::builtin();
        tracing::info!(entries = lex.len(), "Using built-in sentiment lexicon");
        lex
    }

    /// Parse VADER-format text: `token<TAB>mean[<TAB>...]` per line.
    /// Blank, comment, or malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut valences = AHashMap::new();
        for line in text.lines() {
            if let Some((token, v)) = parse_entry(line) {
                valences.insert(token, v);
            }
        }
        Self { valences }
    }

    /// Load a full VADER-format lexicon file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let f = open_with_backoff(path, 16, 50)
            .with_context(|| format!("open lexicon {}", path.display()))?;
        let mut valences = AHashMap::new();
        let mut skipped = 0usize;
        for line in BufReader::new(f).lines() {
            let line = line.with_context(|| format!("read lexicon {}", path.display()))?;
            match parse_entry(&line) {
                Some((token, v)) => { valences.insert(token, v); }
                None if !line.trim().is_empty() => skipped += 1,
                None => {}
            }
        }
        if skipped > 0 {
            tracing::warn!(path = %path.display(), skipped, "Skipped malformed lexicon lines");
        }
        tracing::info!(path = %path.display(), entries = valences.len(), "Loaded sentiment lexicon");
        Ok(Self { valences })
    }

    #[inline]
    pub fn get(&self, word_lower: &str) -> Option<f64> {
        self.valences.get(word_lower).copied()
    }

    #[inline]
    pub fn contains(&self, word_lower: &str) -> bool {
        self.valences.contains_key(word_lower)
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }

    /// Add or override entries (keys are lowercased).
    pub fn extend<I, S>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        for (k, v) in entries {
            self.valences.insert(k.as_ref().to_lowercase(), v);
        }
    }
}

fn parse_entry(line: &str) -> Option<(String, f64)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.split('\t');
    let token = parts.next()?.trim();
    let mean: f64 = parts.next()?.trim().parse().ok()?;
    if token.is_empty() {
        return None;
    }
    Some((token.to_lowercase(), mean))
}
