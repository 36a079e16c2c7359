//! Time-bucket aggregation for charting and reports.
//!
//! Two reductions live here:
//!
//! - [`aggregate`] folds intraday samples into fixed hour-of-day buckets
//!   (fluid intake per two-hour slot).
//! - [`monthly_series`] lays day-keyed values for one calendar month out by
//!   day-of-month (the weight chart). Nothing is summed there, since a
//!   day-keyed tracker holds at most one record per date.
//!
//! Both are pure functions of their inputs.

use chrono::{Datelike, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  record::Record,
  tracker::{FluidSample, WeightEntry},
};

/// Slot starts used by the fluid chart when nothing else is configured.
pub const DEFAULT_FLUID_SLOTS: [u32; 6] = [8, 10, 12, 14, 16, 18];

const HOURS_PER_DAY: u32 = 24;

// ─── Boundaries ──────────────────────────────────────────────────────────────

/// Ascending hour-of-day bucket starts.
///
/// Bucket `i` covers `[starts[i], starts[i + 1])`; the last bucket runs to
/// 24:00. Hours before the first start belong to no bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct BucketBoundaries(Vec<u32>);

impl BucketBoundaries {
  pub fn new(starts: Vec<u32>) -> Result<Self> {
    if starts.is_empty() {
      return Err(Error::InvalidBoundaries("at least one bucket is required"));
    }
    if starts.iter().any(|&h| h >= HOURS_PER_DAY) {
      return Err(Error::InvalidBoundaries("bucket starts must be hours 0-23"));
    }
    if starts.windows(2).any(|w| w[0] >= w[1]) {
      return Err(Error::InvalidBoundaries("bucket starts must be strictly ascending"));
    }
    Ok(Self(starts))
  }

  pub fn starts(&self) -> &[u32] { &self.0 }

  /// `(start, end)` hours of bucket `index`, end exclusive.
  pub fn range(&self, index: usize) -> Option<(u32, u32)> {
    let start = *self.0.get(index)?;
    let end = self.0.get(index + 1).copied().unwrap_or(HOURS_PER_DAY);
    Some((start, end))
  }

  /// The bucket containing `hour`, if any.
  pub fn bucket_for(&self, hour: u32) -> Option<usize> {
    if hour >= HOURS_PER_DAY {
      return None;
    }
    // Number of starts <= hour; the bucket is the last of those.
    self.0.partition_point(|&start| start <= hour).checked_sub(1)
  }
}

impl Default for BucketBoundaries {
  fn default() -> Self { Self(DEFAULT_FLUID_SLOTS.to_vec()) }
}

impl TryFrom<Vec<u32>> for BucketBoundaries {
  type Error = Error;

  fn try_from(starts: Vec<u32>) -> Result<Self> { Self::new(starts) }
}

impl From<BucketBoundaries> for Vec<u32> {
  fn from(b: BucketBoundaries) -> Self { b.0 }
}

// ─── Hour buckets ────────────────────────────────────────────────────────────

/// Something with an hour of day and an amount to add up.
pub trait Sample {
  /// Local hour of day, 0-23.
  fn hour(&self) -> u32;

  /// The amount this sample contributes. Non-finite values count as zero.
  fn amount(&self) -> f64;
}

impl Sample for Record<FluidSample> {
  fn hour(&self) -> u32 { self.occurred_at.hour() }

  fn amount(&self) -> f64 { self.payload.amount }
}

/// Sum `samples` into one total per bucket, same length and order as
/// `boundaries`.
///
/// An empty input yields all zeros; callers that need to tell "no data" from
/// "everything was zero" must look at the input, or use [`DayBuckets`].
pub fn aggregate<'a, S>(
  samples: impl IntoIterator<Item = &'a S>,
  boundaries: &BucketBoundaries,
) -> Vec<f64>
where
  S: Sample + 'a,
{
  let mut per_bucket: Vec<Vec<f64>> = vec![Vec::new(); boundaries.starts().len()];

  for sample in samples {
    let amount = sample.amount();
    if !amount.is_finite() {
      continue;
    }
    if let Some(index) = boundaries.bucket_for(sample.hour()) {
      per_bucket[index].push(amount);
    }
  }

  // Floating-point addition is not associative; summing each bucket in
  // sorted order keeps the result independent of input order.
  per_bucket
    .into_iter()
    .map(|mut amounts| {
      amounts.sort_by(f64::total_cmp);
      // `Sum for f64` starts at -0.0; an empty bucket must read as 0.
      amounts.into_iter().fold(0.0, |acc, a| acc + a)
    })
    .collect()
}

/// One bucket of a [`DayBuckets`] series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
  pub start_hour: u32,
  pub end_hour:   u32,
  pub total:      f64,
}

/// A day's samples reduced to hour buckets, keeping the sample count so the
/// caller can distinguish an empty day from a day of zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBuckets {
  pub date:    NaiveDate,
  pub buckets: Vec<Bucket>,
  /// Raw samples on `date` that went into the reduction.
  pub samples: usize,
}

impl DayBuckets {
  /// Aggregate the samples that fall on `date`; others are ignored.
  pub fn for_day(
    date: NaiveDate,
    samples: &[Record<FluidSample>],
    boundaries: &BucketBoundaries,
  ) -> Self {
    let on_day: Vec<&Record<FluidSample>> =
      samples.iter().filter(|s| s.occurred_at.date() == date).collect();
    let totals = aggregate(on_day.iter().copied(), boundaries);

    let buckets = totals
      .into_iter()
      .enumerate()
      .filter_map(|(i, total)| {
        let (start_hour, end_hour) = boundaries.range(i)?;
        Some(Bucket { start_hour, end_hour, total })
      })
      .collect();

    Self { date, buckets, samples: on_day.len() }
  }

  pub fn has_data(&self) -> bool { self.samples > 0 }

  pub fn totals(&self) -> Vec<f64> { self.buckets.iter().map(|b| b.total).collect() }

  pub fn day_total(&self) -> f64 { self.buckets.iter().fold(0.0, |acc, b| acc + b.total) }
}

// ─── Monthly series ──────────────────────────────────────────────────────────

/// A value pinned to a calendar date.
pub trait DailyValue {
  fn day(&self) -> NaiveDate;
  fn value(&self) -> f64;
}

impl DailyValue for Record<WeightEntry> {
  fn day(&self) -> NaiveDate { self.occurred_at }

  fn value(&self) -> f64 { self.payload.weight }
}

/// One point of a [`monthly_series`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
  pub date:  NaiveDate,
  /// Day of month, 1-based; the chart label.
  pub day:   u32,
  pub value: f64,
}

/// Points for every record dated in `year`-`month`, ordered by day of month.
pub fn monthly_series<'a, D>(
  records: impl IntoIterator<Item = &'a D>,
  year: i32,
  month: u32,
) -> Result<Vec<MonthlyPoint>>
where
  D: DailyValue + 'a,
{
  if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
    return Err(Error::InvalidMonth { year, month });
  }

  let mut points: Vec<MonthlyPoint> = records
    .into_iter()
    .filter(|r| {
      let d = r.day();
      d.year() == year && d.month() == month
    })
    .map(|r| MonthlyPoint { date: r.day(), day: r.day().day(), value: r.value() })
    .collect();

  points.sort_by_key(|p| p.date);
  Ok(points)
}
