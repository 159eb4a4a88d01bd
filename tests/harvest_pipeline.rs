#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{harvest_with, AgeWindow, CommentNode, HarvestConfig, HarvestOptions, SubredditHarvester};

/// Three threads of different ages, reply trees with a duplicate id and a "more" stub.
/// t1: 30 min old, t2: 3 h old, t3: 8 days old, t4: beyond the limit.
fn fixture() -> FakeSource {
    let threads = vec![
        thread("t1", 0.5 * HOUR),
        thread("t2", 3.0 * HOUR),
        thread("t3", 8.0 * 24.0 * HOUR),
        thread("t4", 0.1 * HOUR),
    ];
    FakeSource::new(threads, 2)
        .with_forest(
            "t1",
            vec![
                node(comment("c1", "t1", 600.0), vec![CommentNode::leaf(comment("c3", "t1", 100.0))]),
                CommentNode::More { ids: vec!["x".into(), "y".into()] },
                CommentNode::leaf(comment("c2", "t1", 5.0 * HOUR)),
            ],
        )
        .with_forest(
            "t2",
            vec![
                node(comment("c4", "t2", 10.0 * 24.0 * HOUR), vec![CommentNode::leaf(comment("c5", "t2", 60.0))]),
                // same id as a t1 comment: walked once only
                CommentNode::leaf(comment("c1", "t2", 600.0)),
            ],
        )
}

/// Full run against the in-memory source:
/// - Pages of 2 are requested until the limit of 3 threads is reached.
/// - Threads and comments land in every window whose age limit covers them.
/// - Comments come out breadth-first across all threads, deduplicated, "more" stubs dropped.
#[test]
fn harvests_threads_and_comments_into_window_files() {
    let tmp = out_dir();
    let dir = tmp.path().join("out");
    let sub = sub_config(&dir, "wsb", 3);
    let mut src = fixture();

    let stats = SubredditHarvester::new(&mut src, sub)
        .options(quiet_options())
        .date(DATE)
        .now(NOW)
        .parse()
        .unwrap();

    assert_eq!(src.listing_calls, 2);
    assert_eq!(src.comment_calls, 3, "one reply-tree fetch per processed thread");

    assert_eq!(stats.threads_processed, 3);
    assert_eq!(stats.threads_windowed, 2);
    assert_eq!(stats.thread_rows, 6 + 4);

    assert_eq!(stats.comments_processed, 5);
    assert_eq!(stats.comments_windowed, 4);
    assert_eq!(stats.comment_rows, 6 + 3 + 6 + 6);
    assert_eq!(stats.comments_on_windowed_threads, 4);
    assert_eq!(stats.duplicate_comments, 1);
    assert_eq!(stats.more_skipped, 2);

    assert_eq!(stats.thread_files.len(), 6);
    assert_eq!(stats.comment_files.len(), 6);
    assert!(!dir.join("_staging").exists(), "staging dir removed once both prefixes are promoted");

    assert_eq!(ids_in(&window_file(&dir, "wsb_threads", AgeWindow::OneHour)), vec!["t1"]);
    assert_eq!(ids_in(&window_file(&dir, "wsb_threads", AgeWindow::FourHours)), vec!["t1", "t2"]);
    assert_eq!(ids_in(&window_file(&dir, "wsb_threads", AgeWindow::SevenDays)), vec!["t1", "t2"]);

    assert_eq!(ids_in(&window_file(&dir, "wsb_comments", AgeWindow::OneHour)), vec!["c1", "c3", "c5"]);
    assert_eq!(ids_in(&window_file(&dir, "wsb_comments", AgeWindow::SixHours)), vec!["c1", "c2", "c3", "c5"]);
    assert_eq!(ids_in(&window_file(&dir, "wsb_comments", AgeWindow::SevenDays)), vec!["c1", "c2", "c3", "c5"]);
}

/// Window files are pipe-delimited with a header, and free text cannot break the columns:
/// newlines and `|` inside a body or title are flattened to spaces.
#[test]
fn window_rows_keep_column_count() {
    let tmp = out_dir();
    let sub = sub_config(tmp.path(), "wsb", 1);
    let mut src = fixture();

    SubredditHarvester::new(&mut src, sub)
        .options(quiet_options())
        .date(DATE)
        .now(NOW)
        .parse()
        .unwrap();

    let lines = read_lines(&window_file(tmp.path(), "wsb_threads", AgeWindow::TwoHours));
    assert_eq!(lines[0], "id|text|title|score|num_comments|ups|downs|upvote_ratio|created_utc");
    assert_eq!(lines[1], "t1|body of t1 second line|title t1|10|2|12|2|0.85|1699998200.0");

    let comments = read_lines(&window_file(tmp.path(), "wsb_comments", AgeWindow::OneHour));
    assert_eq!(comments[0], "id|parent_thread_id|text|score|ups|downs|created_utc");
    for line in &comments {
        assert_eq!(line.split('|').count(), 7, "bad row: {line}");
    }
}

/// A rate-limit response on the listing is retried after the configured sleep,
/// and the harvest continues from the same cursor.
#[test]
fn listing_rate_limit_is_retried() {
    let tmp = out_dir();
    let sub = sub_config(tmp.path(), "wsb", 3);
    let mut src = fixture();
    src.listing_errors.push_back(rate_limited());
    src.listing_errors.push_back(rate_limited());

    let stats = SubredditHarvester::new(&mut src, sub)
        .options(quiet_options())
        .date(DATE)
        .now(NOW)
        .parse()
        .unwrap();

    assert_eq!(src.listing_calls, 4);
    assert_eq!(stats.threads_processed, 3);
}

/// A non-response failure (bad payload) stops paging for this channel, but the
/// window files are still produced with their headers.
#[test]
fn unexpected_listing_error_stops_paging() {
    let tmp = out_dir();
    let sub = sub_config(tmp.path(), "wsb", 3);
    let mut src = fixture();
    src.listing_errors.push_back(rharvest::ApiError::Decode("garbage".into()));

    let stats = SubredditHarvester::new(&mut src, sub)
        .options(quiet_options())
        .date(DATE)
        .now(NOW)
        .parse()
        .unwrap();

    assert_eq!(stats.threads_processed, 0);
    assert_eq!(stats.comments_processed, 0);
    let lines = read_lines(&window_file(tmp.path(), "wsb_threads", AgeWindow::SevenDays));
    assert_eq!(lines.len(), 1, "header only");
}

/// Listing retries are bounded: once the budget is spent the channel ends.
#[test]
fn listing_retries_are_bounded() {
    let tmp = out_dir();
    let sub = sub_config(tmp.path(), "wsb", 3);
    let mut src = fixture();
    for _ in 0..10 {
        src.listing_errors.push_back(rate_limited());
    }

    let opts = quiet_options().with_listing_retry(0.0, 2);
    let stats = SubredditHarvester::new(&mut src, sub).options(opts).date(DATE).now(NOW).parse().unwrap();

    assert_eq!(src.listing_calls, 3, "first try plus two retries");
    assert_eq!(stats.threads_processed, 0);
}

/// Reply-tree fetches retry transient failures; a thread that keeps failing
/// contributes no comments but does not abort the run.
#[test]
fn comment_fetch_failures_are_retried_then_skipped() {
    let tmp = out_dir();
    let sub = sub_config(tmp.path(), "wsb", 2);
    let mut src = fixture();
    src.comment_failures.insert("t1".into(), 100);
    src.comment_failures.insert("t2".into(), 1);

    let opts = quiet_options().with_comment_fetch("hot", 100, 2);
    let stats = SubredditHarvester::new(&mut src, sub).options(opts).date(DATE).now(NOW).parse().unwrap();

    // t1: 1 + 2 retries, t2: 1 failure + 1 success
    assert_eq!(src.comment_calls, 5);
    assert_eq!(stats.threads_processed, 2);
    // only t2's forest: c4, c1, c5
    assert_eq!(stats.comments_processed, 3);
    assert_eq!(
        ids_in(&window_file(tmp.path(), "wsb_comments", AgeWindow::SevenDays)),
        vec!["c1", "c5"]
    );
}

/// The periodic pause kicks in on thread-count multiples without changing the output.
#[test]
fn pause_every_does_not_change_results() {
    let tmp = out_dir();
    let sub = sub_config(tmp.path(), "wsb", 3);
    let mut src = fixture();

    let opts = quiet_options().with_pause(1, 0.0);
    let stats = SubredditHarvester::new(&mut src, sub).options(opts).date(DATE).now(NOW).parse().unwrap();
    assert_eq!(stats.threads_processed, 3);
    assert_eq!(stats.thread_rows, 10);
}

/// `harvest_with` walks every configured channel in order with the same source.
#[test]
fn harvest_with_runs_every_subreddit() {
    let tmp = out_dir();
    let cfg = HarvestConfig {
        client_id: "id".into(),
        client_secret: "secret".into(),
        redirect_uri: "http://localhost:8080".into(),
        user_agent: "rharvest-tests".into(),
        username: None,
        password: None,
        subreddits: vec![sub_config(tmp.path(), "alpha", 1), sub_config(tmp.path(), "beta", 2)],
        options: HarvestOptions::default().with_pause(0, 0.0).with_listing_retry(0.0, 1).with_progress(false),
    };
    let mut src = fixture();

    let done = harvest_with(&mut src, &cfg, DATE).unwrap();
    assert_eq!(done.len(), 2);
    assert_eq!(done[0].subreddit, "alpha");
    assert_eq!(done[0].threads_processed, 1);
    assert_eq!(done[1].subreddit, "beta");
    assert_eq!(done[1].threads_processed, 2);
    assert!(tmp.path().join(format!("beta_threads_{DATE}_12_hour.csv")).exists());
}

/// A channel whose output cannot be created is logged and skipped;
/// the channels after it still run.
#[test]
fn failing_channel_does_not_stop_the_run() {
    let tmp = out_dir();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let cfg = HarvestConfig {
        client_id: "id".into(),
        client_secret: "secret".into(),
        redirect_uri: "http://localhost:8080".into(),
        user_agent: "rharvest-tests".into(),
        username: None,
        password: None,
        subreddits: vec![sub_config(&blocker.join("nested"), "bad", 2), sub_config(tmp.path(), "good", 2)],
        options: HarvestOptions::default().with_pause(0, 0.0).with_listing_retry(0.0, 1).with_progress(false),
    };
    let mut src = fixture();

    let done = harvest_with(&mut src, &cfg, DATE).unwrap();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].subreddit, "good");
    assert_eq!(done[0].threads_processed, 2);
    assert!(window_file(tmp.path(), "good_threads", AgeWindow::FourHours).exists());
    assert!(window_file(tmp.path(), "good_comments", AgeWindow::SevenDays).exists());
    assert!(!tmp.path().join(format!("bad_threads_{DATE}_1_hour.csv")).exists());
    assert!(blocker.is_file());
}
