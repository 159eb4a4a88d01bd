#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{fmt_float, sanitize_text, windows_for, AgeWindow, WindowWriters, THREAD_HEADER};

/// Window membership is `now - created <= length`, inclusive at the boundary.
#[test]
fn window_boundaries_are_inclusive() {
    assert!(AgeWindow::OneHour.contains(NOW, NOW - 3600.0));
    assert!(!AgeWindow::OneHour.contains(NOW, NOW - 3600.5));
    assert!(AgeWindow::SevenDays.contains(NOW, NOW - 7.0 * 24.0 * HOUR));
    assert!(!AgeWindow::SevenDays.contains(NOW, NOW - 7.0 * 24.0 * HOUR - 1.0));
}

/// Narrow windows are subsets of wider ones; future timestamps fall everywhere.
#[test]
fn windows_for_nests_and_accepts_future() {
    let got: Vec<AgeWindow> = windows_for(NOW, NOW - 5.0 * HOUR).collect();
    assert_eq!(got, vec![AgeWindow::SixHours, AgeWindow::TwelveHours, AgeWindow::SevenDays]);

    assert_eq!(windows_for(NOW, NOW + 120.0).count(), 6);
    assert_eq!(windows_for(NOW, NOW - 30.0 * 24.0 * HOUR).count(), 0);
}

#[test]
fn window_names_and_parsing() {
    let suffixes: Vec<&str> = AgeWindow::ALL.iter().map(|w| w.file_suffix()).collect();
    assert_eq!(
        suffixes,
        vec!["_1_hour.csv", "_2_hour.csv", "_4_hour.csv", "_6_hour.csv", "_12_hour.csv", "_7_day.csv"]
    );
    for w in AgeWindow::ALL {
        assert_eq!(w.to_string().parse::<AgeWindow>().unwrap(), w);
    }
    assert_eq!("168h".parse::<AgeWindow>().unwrap(), AgeWindow::SevenDays);
    assert!("3h".parse::<AgeWindow>().is_err());
}

#[test]
fn text_and_float_formatting() {
    assert_eq!(sanitize_text("a\nb\tc|d"), "a b c d");
    assert_eq!(fmt_float(1700000000.0), "1700000000.0");
    assert_eq!(fmt_float(0.5), "0.5");
    assert_eq!(fmt_float(1.0), "1.0");
}

/// The sink writes a header into all six files, fans a row out to matching windows,
/// and promotes the staged files only on finalize.
#[test]
fn window_writers_fan_out_and_promote() {
    let tmp = out_dir();
    let prefix = tmp.path().join("nested").join("wsb_threads");
    std::fs::create_dir_all(prefix.parent().unwrap()).unwrap();

    let mut w = WindowWriters::create(prefix.to_str().unwrap(), DATE, &THREAD_HEADER, 0).unwrap();
    let row = thread("t9", 3.0 * HOUR).csv_row();
    let n = w.write_windowed(&row, NOW - 3.0 * HOUR, NOW).unwrap();
    assert_eq!(n, 4);
    assert_eq!(w.rows_in(AgeWindow::TwoHours), 0);
    assert_eq!(w.rows_in(AgeWindow::FourHours), 1);

    let final_dir = tmp.path().join("nested");
    assert!(!window_file(&final_dir, "wsb_threads", AgeWindow::FourHours).exists(), "not promoted yet");

    let paths = w.finalize().unwrap();
    assert_eq!(paths.len(), 6);
    assert_eq!(paths[5], window_file(&final_dir, "wsb_threads", AgeWindow::SevenDays));
    assert_eq!(ids_in(&paths[0]), Vec::<String>::new());
    assert_eq!(ids_in(&paths[2]), vec!["t9"]);
    assert!(!final_dir.join("_staging").exists());
}

/// A rerun with the same date replaces earlier files instead of appending.
#[test]
fn finalize_replaces_existing_outputs() {
    let tmp = out_dir();
    let prefix = tmp.path().join("wsb_threads");
    let prefix = prefix.to_str().unwrap();

    let mut first = WindowWriters::create(prefix, DATE, &THREAD_HEADER, 1024).unwrap();
    first.write_row(AgeWindow::OneHour, &thread("old", 0.0).csv_row()).unwrap();
    first.finalize().unwrap();

    let mut second = WindowWriters::create(prefix, DATE, &THREAD_HEADER, 1024).unwrap();
    second.write_row(AgeWindow::OneHour, &thread("new", 0.0).csv_row()).unwrap();
    let paths = second.finalize().unwrap();

    assert_eq!(ids_in(&paths[0]), vec!["new"]);
}
