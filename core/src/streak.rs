use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const STREAK_RULE_SETTING: &str = "streak_rule";

/// Whether an inactive (or missing) today ends the streak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakRule {
    /// Today is still in progress: it neither counts nor breaks the run.
    #[default]
    TodayExempt,
    /// Today must already have activity for any streak to exist.
    Strict,
}

impl StreakRule {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TodayExempt => "today_exempt",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for StreakRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreakRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "today_exempt" => Ok(Self::TodayExempt),
            "strict" => Ok(Self::Strict),
            other => Err(Error::validation(format!(
                "Invalid streak rule '{other}'. Must be one of: today_exempt, strict"
            ))),
        }
    }
}

/// Count consecutive active days ending at `today`.
///
/// `logs` must be ordered by date descending, one entry per logged date, each paired
/// with whether that day had at least one completed exercise or meal.
#[must_use]
pub fn walk_streak(today: NaiveDate, logs: &[(NaiveDate, bool)], rule: StreakRule) -> i64 {
    let yesterday = today - Duration::days(1);
    let mut streak = 0;
    let mut expected = today;
    let mut i = 0;

    while let Some(&(date, active)) = logs.get(i) {
        if date > expected {
            // future-dated row
            i += 1;
            continue;
        }

        let today_pending = expected == today && rule == StreakRule::TodayExempt;

        if date == expected {
            if active {
                streak += 1;
                expected -= Duration::days(1);
            } else if today_pending {
                expected = yesterday;
            } else {
                break;
            }
            i += 1;
        } else if today_pending {
            // no row for today; re-examine this row against yesterday
            expected = yesterday;
        } else {
            break;
        }
    }

    streak
}

/// Longest run of consecutive calendar days in `dates`. Order and duplicates don't matter.
#[must_use]
pub fn longest_run(dates: &[NaiveDate]) -> i64 {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for date in sorted {
        run = match prev {
            Some(p) if date - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(date);
    }
    best
}
