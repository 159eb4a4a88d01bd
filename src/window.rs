use std::fmt;
use std::str::FromStr;

/// Fixed recency windows a record is bucketed into, narrowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeWindow {
    OneHour,
    TwoHours,
    FourHours,
    SixHours,
    TwelveHours,
    SevenDays,
}

impl AgeWindow {
    pub const ALL: [AgeWindow; 6] = [
        AgeWindow::OneHour,
        AgeWindow::TwoHours,
        AgeWindow::FourHours,
        AgeWindow::SixHours,
        AgeWindow::TwelveHours,
        AgeWindow::SevenDays,
    ];

    pub fn seconds(self) -> i64 {
        const HOUR: i64 = 60 * 60;
        match self {
            AgeWindow::OneHour => HOUR,
            AgeWindow::TwoHours => 2 * HOUR,
            AgeWindow::FourHours => 4 * HOUR,
            AgeWindow::SixHours => 6 * HOUR,
            AgeWindow::TwelveHours => 12 * HOUR,
            AgeWindow::SevenDays => 7 * 24 * HOUR,
        }
    }

    /// Suffix appended to `<prefix>_<date>` to name this window's output file.
    pub fn file_suffix(self) -> &'static str {
        match self {
            AgeWindow::OneHour => "_1_hour.csv",
            AgeWindow::TwoHours => "_2_hour.csv",
            AgeWindow::FourHours => "_4_hour.csv",
            AgeWindow::SixHours => "_6_hour.csv",
            AgeWindow::TwelveHours => "_12_hour.csv",
            AgeWindow::SevenDays => "_7_day.csv",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// `now - created <= len`. Future timestamps (negative age) fall in every window.
    #[inline]
    pub fn contains(self, now: f64, created_utc: f64) -> bool {
        now - created_utc <= self.seconds() as f64
    }
}

/// All windows containing a record created at `created_utc`, as seen from `now`.
pub fn windows_for(now: f64, created_utc: f64) -> impl Iterator<Item = AgeWindow> {
    AgeWindow::ALL.into_iter().filter(move |w| w.contains(now, created_utc))
}

impl fmt::Display for AgeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgeWindow::OneHour => "1h",
            AgeWindow::TwoHours => "2h",
            AgeWindow::FourHours => "4h",
            AgeWindow::SixHours => "6h",
            AgeWindow::TwelveHours => "12h",
            AgeWindow::SevenDays => "7d",
        };
        f.write_str(s)
    }
}

impl FromStr for AgeWindow {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(AgeWindow::OneHour),
            "2h" => Ok(AgeWindow::TwoHours),
            "4h" => Ok(AgeWindow::FourHours),
            "6h" => Ok(AgeWindow::SixHours),
            "12h" => Ok(AgeWindow::TwelveHours),
            "7d" | "168h" => Ok(AgeWindow::SevenDays),
            other => Err(format!("unknown window '{other}', expected one of 1h/2h/4h/6h/12h/7d")),
        }
    }
}
