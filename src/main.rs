use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use regex::Regex;
use rharvest::{harvest_all, init_tracing_once, today_utc_tag, HarvestConfig, Lexicon, SentimentScorer};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collect Reddit threads/comments into recency-window CSVs and score them for sentiment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch threads and comments for every configured subreddit.
    Harvest {
        #[arg(short = 'c', long = "config_path", alias = "config")]
        config_path: PathBuf,

        /// Tag used in output file names; defaults to today's UTC date.
        #[arg(short = 'd', long)]
        date: Option<String>,

        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },
    /// Append pos/neg/neu/compound columns to a delimited file (or every match in a directory).
    Score {
        #[arg(short = 'f', long = "file_path", alias = "file", conflicts_with = "dir")]
        file_path: Option<PathBuf>,

        #[arg(long)]
        dir: Option<PathBuf>,

        /// File-name regex for --dir mode.
        #[arg(long, default_value = r"\.csv$")]
        pattern: String,

        /// VADER-format lexicon file. Without it, $RHARVEST_LEXICON or a nearby
        /// vader_lexicon.txt is used if present, else the built-in table.
        #[arg(long)]
        lexicon: Option<PathBuf>,

        #[arg(long, default_value = "|")]
        in_delimiter: char,

        #[arg(long, default_value = ",")]
        out_delimiter: char,

        #[arg(long, default_value = "text")]
        text_column: String,

        #[arg(long, default_value_t = false)]
        no_index: bool,

        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },
}

fn delimiter_byte(c: char) -> Result<u8> {
    if c.is_ascii() { Ok(c as u8) } else { bail!("delimiter '{}' must be a single ASCII character", c) }
}

fn main() -> Result<()> {
    init_tracing_once();
    let cli = Cli::parse();

    match cli.command {
        Command::Harvest { config_path, date, no_progress } => {
            let mut cfg = HarvestConfig::load(&config_path)?;
            if no_progress {
                cfg.options = cfg.options.with_progress(false);
            }
            tracing::info!("Successfully parsed arguments");
            let date = date.unwrap_or_else(today_utc_tag);
            let done = harvest_all(&cfg, &date)?;
            let threads: u64 = done.iter().map(|s| s.threads_processed).sum();
            let comments: u64 = done.iter().map(|s| s.comments_processed).sum();
            println!(
                "Harvested {}/{} subreddits: {} threads, {} comments",
                done.len(),
                cfg.subreddits.len(),
                threads,
                comments
            );
        }
        Command::Score {
            file_path, dir, pattern, lexicon, in_delimiter, out_delimiter, text_column, no_index, no_progress,
        } => {
            let lexicon = match lexicon {
                Some(path) => Lexicon::from_path(&path)?,
                None => Lexicon::discover(),
            };
            let scorer = SentimentScorer::new()
                .lexicon(lexicon)
                .input_delimiter(delimiter_byte(in_delimiter)?)
                .output_delimiter(delimiter_byte(out_delimiter)?)
                .text_column(text_column)
                .write_index(!no_index)
                .progress(!no_progress);
            tracing::info!(entries = scorer.analyzer().lexicon().len(), "Sentiment lexicon ready");

            match (file_path, dir) {
                (Some(file), _) => {
                    let stats = scorer.score_file(&file)?;
                    println!("Scored {} rows -> {}", stats.rows, stats.output.display());
                }
                (None, Some(dir)) => {
                    let re = Regex::new(&pattern).with_context(|| format!("invalid --pattern '{}'", pattern))?;
                    let all = scorer.score_dir(&dir, &re)?;
                    let rows: u64 = all.iter().map(|s| s.rows).sum();
                    println!("Scored {} files, {} rows", all.len(), rows);
                }
                (None, None) => bail!("either --file_path or --dir is required"),
            }
        }
    }
    Ok(())
}
