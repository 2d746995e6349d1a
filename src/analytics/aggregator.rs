//! Period-bucketed financial aggregation.
//!
//! Sales, purchases and expenses are summed into calendar buckets and each
//! bucket gets a profit figure. The aggregation is a pure function of its
//! inputs, the granularity and the reference instant.

use crate::analytics::period::{periods, Granularity, Period};
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// An entry that carries an optional timestamp and an amount.
///
/// Entries whose timestamp is `None` (missing or unparseable) are left out of
/// every bucket.
pub trait Dated {
    /// When the entry happened, if known.
    fn timestamp(&self) -> Option<NaiveDateTime>;

    /// The entry's amount; absent amounts count as zero.
    fn amount(&self) -> Decimal;
}

/// Aggregated totals for one time interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// Display label, e.g. "Jan 2024", "Q1 2024" or "2024".
    pub label: String,
    /// First instant of the interval (inclusive).
    pub start: NaiveDateTime,
    /// Last instant of the interval (inclusive).
    pub end: NaiveDateTime,
    pub sales_total: Decimal,
    pub purchases_total: Decimal,
    pub expenses_total: Decimal,
    /// `sales_total - purchases_total - expenses_total`, may be negative.
    pub profit: Decimal,
}

/// Bucket the three collections by `granularity`, relative to `now`.
///
/// Always returns at least one bucket, ordered oldest to newest.
pub fn aggregate<S, P, E>(
    sales: &[S],
    purchases: &[P],
    expenses: &[E],
    granularity: Granularity,
    now: NaiveDateTime,
) -> Vec<Bucket>
where
    S: Dated,
    P: Dated,
    E: Dated,
{
    periods(granularity, now)
        .into_iter()
        .map(|period| {
            let sales_total = sum_within(sales, &period);
            let purchases_total = sum_within(purchases, &period);
            let expenses_total = sum_within(expenses, &period);

            Bucket {
                profit: sales_total - purchases_total - expenses_total,
                label: period.label,
                start: period.start,
                end: period.end,
                sales_total,
                purchases_total,
                expenses_total,
            }
        })
        .collect()
}

/// [`aggregate`] with the current UTC time as the reference instant.
pub fn aggregate_as_of_now<S, P, E>(
    sales: &[S],
    purchases: &[P],
    expenses: &[E],
    granularity: Granularity,
) -> Vec<Bucket>
where
    S: Dated,
    P: Dated,
    E: Dated,
{
    aggregate(sales, purchases, expenses, granularity, Utc::now().naive_utc())
}

fn sum_within<T: Dated>(entries: &[T], period: &Period) -> Decimal {
    entries
        .iter()
        .filter(|entry| entry.timestamp().is_some_and(|ts| period.contains(ts)))
        .map(Dated::amount)
        .sum()
}

/// Number of entries that carry no usable timestamp.
pub fn count_undated<T: Dated>(entries: &[T]) -> usize {
    entries.iter().filter(|e| e.timestamp().is_none()).count()
}

/// Totals across all buckets, used for the summary cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub sales_total: Decimal,
    pub purchases_total: Decimal,
    pub expenses_total: Decimal,
    pub profit: Decimal,
    /// Profit as a percentage of sales; `None` when there were no sales.
    pub margin_percent: Option<Decimal>,
    /// Label of the bucket with the highest profit.
    pub best_period: Option<String>,
}

impl Summary {
    /// Summarize a bucket sequence.
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        let mut summary = Self::default();

        for bucket in buckets {
            summary.sales_total += bucket.sales_total;
            summary.purchases_total += bucket.purchases_total;
            summary.expenses_total += bucket.expenses_total;
            summary.profit += bucket.profit;
        }

        if !summary.sales_total.is_zero() {
            let margin = summary.profit / summary.sales_total * Decimal::ONE_HUNDRED;
            summary.margin_percent = Some(margin.round_dp(2));
        }

        // Ties go to the earliest bucket.
        summary.best_period = buckets
            .iter()
            .fold(None::<&Bucket>, |best, b| match best {
                Some(current) if current.profit >= b.profit => Some(current),
                _ => Some(b),
            })
            .map(|b| b.label.clone());

        summary
    }
}
