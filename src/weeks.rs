//! Calendar bucketing: ISO-week (Monday start) assignment, report period
//! boundaries, and lookback windows.
//!
//! Everything here is pure calendar arithmetic on `NaiveDate`, with no
//! time-of-day and no timezone. Training and health records go through the
//! same bucketing so their weekly aggregates align by `week_start`.

use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;

/// ---------------------------------------------------------------------------
/// Week bucketing
/// ---------------------------------------------------------------------------

/// Anything carrying a calendar date can be bucketed into weeks/periods.
pub trait Dated {
  fn date(&self) -> NaiveDate;
}

impl Dated for crate::models::TrainingRecord {
  fn date(&self) -> NaiveDate {
    self.date
  }
}

impl Dated for crate::models::HealthRecord {
  fn date(&self) -> NaiveDate {
    self.date
  }
}

/// The Monday on or before `date`. Idempotent: `week_start(week_start(d))`
/// is always `week_start(d)`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
  let offset = date.weekday().num_days_from_monday() as u64;
  date - Days::new(offset)
}

/// Group records into weeks. Only weeks that contain at least one record
/// appear in the result; callers must treat missing weeks as gaps, never as
/// zero-valued weeks.
pub fn group_by_week<T: Dated>(records: &[T]) -> BTreeMap<NaiveDate, Vec<&T>> {
  let mut buckets: BTreeMap<NaiveDate, Vec<&T>> = BTreeMap::new();
  for r in records {
    buckets.entry(week_start(r.date())).or_default().push(r);
  }
  buckets
}

/// Every Monday from the week containing `from` through the week containing
/// `to`, chronological. Empty when `from > to`.
pub fn week_range(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
  let mut weeks = Vec::new();
  let mut monday = week_start(from);
  let last = week_start(to);
  while monday <= last {
    weeks.push(monday);
    monday = monday + Days::new(7);
  }
  weeks
}

/// ---------------------------------------------------------------------------
/// Report periods (week / month / quarter / year)
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodType {
  Week,
  Month,
  Quarter,
  Year,
}

/// One report period with a human label ("Feb 03 – Feb 09", "Q1 2026", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub label: String,
}

impl Period {
  pub fn contains(&self, date: NaiveDate) -> bool {
    self.start <= date && date <= self.end
  }
}

fn month_period(year: i32, month: u32) -> Period {
  // First of next month minus one day gives the month end without a
  // days-in-month table.
  let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default();
  let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  let end = NaiveDate::from_ymd_opt(ny, nm, 1).unwrap_or_default() - Days::new(1);
  Period {
    start,
    end,
    label: start.format("%b %Y").to_string(),
  }
}

/// The last `count` periods of the given type, most recent first. The most
/// recent period is the one containing `today`.
pub fn period_boundaries(today: NaiveDate, period_type: PeriodType, count: usize) -> Vec<Period> {
  let mut periods = Vec::with_capacity(count);

  match period_type {
    PeriodType::Week => {
      let current_monday = week_start(today);
      for i in 0..count {
        let monday = current_monday - Days::new(7 * i as u64);
        let sunday = monday + Days::new(6);
        periods.push(Period {
          start: monday,
          end: sunday,
          label: format!("{} – {}", monday.format("%b %d"), sunday.format("%b %d")),
        });
      }
    }
    PeriodType::Month => {
      let mut y = today.year();
      let mut m = today.month();
      for _ in 0..count {
        periods.push(month_period(y, m));
        if m == 1 {
          m = 12;
          y -= 1;
        } else {
          m -= 1;
        }
      }
    }
    PeriodType::Quarter => {
      let mut y = today.year();
      let mut q = (today.month0() / 3) + 1;
      for _ in 0..count {
        let first_month = (q - 1) * 3 + 1;
        let start = NaiveDate::from_ymd_opt(y, first_month, 1).unwrap_or_default();
        let end = month_period(y, first_month + 2).end;
        periods.push(Period {
          start,
          end,
          label: format!("Q{} {}", q, y),
        });
        if q == 1 {
          q = 4;
          y -= 1;
        } else {
          q -= 1;
        }
      }
    }
    PeriodType::Year => {
      let mut y = today.year();
      for _ in 0..count {
        periods.push(Period {
          start: NaiveDate::from_ymd_opt(y, 1, 1).unwrap_or_default(),
          end: NaiveDate::from_ymd_opt(y, 12, 31).unwrap_or_default(),
          label: y.to_string(),
        });
        y -= 1;
      }
    }
  }

  periods
}

/// Bucket records into periods. One bucket per period, same order. A record
/// lands in the first period containing its date.
pub fn group_by_period<'a, T: Dated>(records: &'a [T], periods: &[Period]) -> Vec<Vec<&'a T>> {
  let mut buckets: Vec<Vec<&T>> = periods.iter().map(|_| Vec::new()).collect();
  for r in records {
    if let Some(idx) = periods.iter().position(|p| p.contains(r.date())) {
      buckets[idx].push(r);
    }
  }
  buckets
}

/// ---------------------------------------------------------------------------
/// Lookback windows
/// ---------------------------------------------------------------------------

/// How far back from the latest record the analysis should reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookback {
  FourWeeks,
  ThreeMonths,
  SixMonths,
  OneYear,
  #[default]
  All,
}

impl Lookback {
  /// The earliest date still in scope, relative to `latest`. `None` means
  /// everything is in scope.
  pub fn cutoff(&self, latest: NaiveDate) -> Option<NaiveDate> {
    match self {
      Lookback::FourWeeks => Some(latest - Days::new(28)),
      Lookback::ThreeMonths => Some(latest - Days::new(91)),
      Lookback::SixMonths => Some(latest - Days::new(182)),
      Lookback::OneYear => Some(latest - Days::new(365)),
      Lookback::All => None,
    }
  }

  /// Records dated on or after the cutoff. The cutoff date itself is in
  /// scope; records strictly before it are dropped.
  pub fn slice<'a, T: Dated>(&self, records: &'a [T], latest: NaiveDate) -> Vec<&'a T> {
    match self.cutoff(latest) {
      Some(cutoff) => records.iter().filter(|r| r.date() >= cutoff).collect(),
      None => records.iter().collect(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
