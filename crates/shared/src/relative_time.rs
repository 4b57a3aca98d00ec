//! Localized relative-time rendering ("5 minutes ago").
//!
//! Bucketing follows the conventions most UI date libraries use: sub-minute
//! differences collapse to "less than a minute", hours and months are
//! approximate, and multi-year spans are described as about/over/almost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 1_440;
const MINUTES_PER_MONTH: i64 = 43_200;
const MINUTES_PER_TWO_MONTHS: i64 = 86_400;

/// Display locale for elapsed-time strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    He,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::He => "he",
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "he" | "he-il" => Ok(Locale::He),
            _ => Err(format!("Unsupported locale: {}", s)),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Approximate span between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    LessThanMinute,
    Minutes(i64),
    AboutHours(i64),
    Days(i64),
    AboutMonths(i64),
    Months(i64),
    AboutYears(i64),
    OverYears(i64),
    AlmostYears(i64),
}

impl Span {
    fn between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> Self {
        let seconds = (later - earlier).num_seconds().abs();
        let minutes = rounded_div(seconds, 60);

        if minutes == 0 {
            Span::LessThanMinute
        } else if minutes < 45 {
            Span::Minutes(minutes)
        } else if minutes < 90 {
            Span::AboutHours(1)
        } else if minutes < MINUTES_PER_DAY {
            Span::AboutHours(rounded_div(minutes, MINUTES_PER_HOUR))
        } else if minutes < 2_520 {
            Span::Days(1)
        } else if minutes < MINUTES_PER_MONTH {
            Span::Days(rounded_div(minutes, MINUTES_PER_DAY))
        } else if minutes < MINUTES_PER_TWO_MONTHS {
            Span::AboutMonths(rounded_div(minutes, MINUTES_PER_MONTH))
        } else {
            let months = minutes / MINUTES_PER_MONTH;
            if months < 12 {
                Span::Months(rounded_div(minutes, MINUTES_PER_MONTH))
            } else {
                let years = months / 12;
                match months % 12 {
                    0..=2 => Span::AboutYears(years),
                    3..=8 => Span::OverYears(years),
                    _ => Span::AlmostYears(years + 1),
                }
            }
        }
    }

    fn render(self, locale: Locale) -> String {
        match locale {
            Locale::En => self.render_en(),
            Locale::He => self.render_he(),
        }
    }

    fn render_en(self) -> String {
        fn plural(n: i64, unit: &str) -> String {
            if n == 1 {
                format!("1 {}", unit)
            } else {
                format!("{} {}s", n, unit)
            }
        }

        match self {
            Span::LessThanMinute => "less than a minute".to_string(),
            Span::Minutes(n) => plural(n, "minute"),
            Span::AboutHours(n) => format!("about {}", plural(n, "hour")),
            Span::Days(n) => plural(n, "day"),
            Span::AboutMonths(n) => format!("about {}", plural(n, "month")),
            Span::Months(n) => plural(n, "month"),
            Span::AboutYears(n) => format!("about {}", plural(n, "year")),
            Span::OverYears(n) => format!("over {}", plural(n, "year")),
            Span::AlmostYears(n) => format!("almost {}", plural(n, "year")),
        }
    }

    fn render_he(self) -> String {
        fn forms(n: i64, one: &str, two: &str, other: &str) -> String {
            match n {
                1 => one.to_string(),
                2 => two.to_string(),
                _ => other.replace("{}", &n.to_string()),
            }
        }

        match self {
            Span::LessThanMinute => "פחות מדקה".to_string(),
            Span::Minutes(n) => forms(n, "דקה", "שתי דקות", "{} דקות"),
            Span::AboutHours(n) => forms(n, "כשעה", "כשעתיים", "כ{} שעות"),
            Span::Days(n) => forms(n, "יום אחד", "יומיים", "{} ימים"),
            Span::AboutMonths(n) => forms(n, "כחודש", "כחודשיים", "כ{} חודשים"),
            Span::Months(n) => forms(n, "חודש", "חודשיים", "{} חודשים"),
            Span::AboutYears(n) => forms(n, "כשנה", "כשנתיים", "כ{} שנים"),
            Span::OverYears(n) => forms(n, "מעל שנה", "מעל שנתיים", "מעל {} שנים"),
            Span::AlmostYears(n) => forms(n, "כמעט שנה", "כמעט שנתיים", "כמעט {} שנים"),
        }
    }
}

fn rounded_div(value: i64, divisor: i64) -> i64 {
    (value + divisor / 2) / divisor
}

/// Renders how long ago `at` was, relative to `now`, with a locale suffix.
///
/// Instants in the future (clock skew between devices) render as "in ...".
pub fn format_elapsed(at: DateTime<Utc>, now: DateTime<Utc>, locale: Locale) -> String {
    let body = Span::between(at, now).render(locale);
    let in_past = at <= now;

    match (locale, in_past) {
        (Locale::En, true) => format!("{} ago", body),
        (Locale::En, false) => format!("in {}", body),
        (Locale::He, true) => format!("לפני {}", body),
        (Locale::He, false) => format!("בעוד {}", body),
    }
}
