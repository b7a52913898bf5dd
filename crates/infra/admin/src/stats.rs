//! Statistics and analytics.
//!
//! Pure aggregation over already-fetched records: date-range filtering,
//! global counters, per-bucket time series, the ride status breakdown and
//! the merged activity feed. Nothing here touches a store.

use chrono::{FixedOffset, Offset, Utc};
use ride_admin_core::{
    DateRange, Document, Granularity, Ride, RideStatus, Transaction, User,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Records loaded for the analytics views, normalized once at load time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardData {
    pub rides: Vec<Ride>,
    pub transactions: Vec<Transaction>,
    pub users: Vec<User>,
}

impl DashboardData {
    /// Normalizes raw documents. `now_ms` stands in for missing ride and
    /// transaction timestamps.
    pub fn from_documents(
        rides: &[Document],
        transactions: &[Document],
        users: &[Document],
        now_ms: i64,
    ) -> Self {
        Self {
            rides: rides.iter().map(|d| Ride::from_document(d, now_ms)).collect(),
            transactions: transactions
                .iter()
                .map(|d| Transaction::from_document(d, now_ms))
                .collect(),
            users: users.iter().map(User::from_document).collect(),
        }
    }
}

/// Records that carry a normalized timestamp.
pub trait Timestamped {
    /// Normalized epoch milliseconds, or `None` if the record has no date.
    fn timestamp_ms(&self) -> Option<i64>;
}

impl Timestamped for Ride {
    fn timestamp_ms(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

impl Timestamped for Transaction {
    fn timestamp_ms(&self) -> Option<i64> {
        Some(self.timestamp)
    }
}

impl Timestamped for User {
    fn timestamp_ms(&self) -> Option<i64> {
        self.created_at
    }
}

/// Keeps the records whose timestamp lies in `[startOfDay(from), endOfDay(to)]`.
///
/// Without a range every record is kept, dated or not. With a range,
/// undated records are dropped.
pub fn filter_by_range<'a, T: Timestamped>(
    records: &'a [T],
    range: Option<&DateRange>,
    offset: FixedOffset,
) -> Vec<&'a T> {
    let Some(range) = range else {
        return records.iter().collect();
    };
    let (start, end) = range.bounds_ms(offset);
    records
        .iter()
        .filter(|r| r.timestamp_ms().is_some_and(|ts| ts >= start && ts <= end))
        .collect()
}

/// Borrowed, date-restricted view of [`DashboardData`].
#[derive(Debug, Clone, Default)]
pub struct FilteredData<'a> {
    pub rides: Vec<&'a Ride>,
    pub transactions: Vec<&'a Transaction>,
    pub users: Vec<&'a User>,
}

impl<'a> FilteredData<'a> {
    /// Applies the same range to all three record sets.
    pub fn new(data: &'a DashboardData, range: Option<&DateRange>, offset: FixedOffset) -> Self {
        Self {
            rides: filter_by_range(&data.rides, range, offset),
            transactions: filter_by_range(&data.transactions, range, offset),
            users: filter_by_range(&data.users, range, offset),
        }
    }

    /// Completed share of the filtered rides, in percent.
    pub fn completion_rate(&self) -> f64 {
        completion_rate(
            self.rides.iter().filter(|r| r.status == RideStatus::Completed).count(),
            self.rides.len(),
        )
    }

    /// Filtered revenue in major units.
    pub fn revenue(&self) -> f64 {
        minor_to_major(self.transactions.iter().map(|t| t.amount).sum())
    }
}

fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

fn minor_to_major(amount: i64) -> f64 {
    amount as f64 / 100.0
}

/// Headline counters over the unfiltered data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalSummary {
    pub total_users: usize,
    pub total_rides: usize,
    /// Rides still pending.
    pub active_rides: usize,
    pub completed_rides: usize,
    pub cancelled_rides: usize,
    /// Completed rides as a percentage of all rides.
    pub completion_rate: f64,
    /// Sum of all transaction amounts in major units.
    pub total_revenue: f64,
}

impl GlobalSummary {
    /// Computes the summary. Always unfiltered.
    pub fn compute(data: &DashboardData) -> Self {
        let count = |status: RideStatus| data.rides.iter().filter(|r| r.status == status).count();
        let completed = count(RideStatus::Completed);
        Self {
            total_users: data.users.len(),
            total_rides: data.rides.len(),
            active_rides: count(RideStatus::Pending),
            completed_rides: completed,
            cancelled_rides: count(RideStatus::Cancelled),
            completion_rate: completion_rate(completed, data.rides.len()),
            total_revenue: minor_to_major(data.transactions.iter().map(|t| t.amount).sum()),
        }
    }
}

/// Ride counts by the three known statuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub completed: usize,
    pub pending: usize,
    pub cancelled: usize,
    /// Rides with any other status. Not part of the chart.
    pub unrecognized: usize,
}

impl StatusBreakdown {
    /// Counts rides by status.
    pub fn compute<'a>(rides: impl IntoIterator<Item = &'a Ride>) -> Self {
        let mut breakdown = Self::default();
        for ride in rides {
            match ride.status {
                RideStatus::Completed => breakdown.completed += 1,
                RideStatus::Pending => breakdown.pending += 1,
                RideStatus::Cancelled => breakdown.cancelled += 1,
                RideStatus::Other(_) => breakdown.unrecognized += 1,
            }
        }
        breakdown
    }

    /// Doughnut chart data: completed, pending, cancelled.
    pub fn chart(&self) -> ChartData {
        ChartData::new(
            "Ride Status Distribution",
            vec!["Completed".into(), "Pending".into(), "Cancelled".into()],
            vec![self.completed as f64, self.pending as f64, self.cancelled as f64],
        )
    }
}

/// Chart-ready series: one label per value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Dataset label.
    pub label: String,
    /// Axis labels.
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

impl ChartData {
    /// Creates new chart data.
    pub fn new(label: impl Into<String>, labels: Vec<String>, data: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            labels,
            data,
        }
    }

    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Per-bucket accumulations for one granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketAggregates {
    pub rides: BTreeMap<String, u64>,
    /// Revenue in minor units.
    pub revenue: BTreeMap<String, i64>,
    pub new_users: BTreeMap<String, u64>,
}

impl BucketAggregates {
    /// Groups filtered records into buckets.
    pub fn compute(filtered: &FilteredData<'_>, granularity: Granularity, offset: FixedOffset) -> Self {
        let mut aggregates = Self::default();
        for ride in &filtered.rides {
            if let Some(key) = granularity.bucket_key(ride.timestamp, offset) {
                *aggregates.rides.entry(key).or_default() += 1;
            }
        }
        for txn in &filtered.transactions {
            if let Some(key) = granularity.bucket_key(txn.timestamp, offset) {
                *aggregates.revenue.entry(key).or_default() += txn.amount;
            }
        }
        for user in &filtered.users {
            let key = user
                .created_at
                .and_then(|ts| granularity.bucket_key(ts, offset));
            if let Some(key) = key {
                *aggregates.new_users.entry(key).or_default() += 1;
            }
        }
        aggregates
    }

    /// Sorted union of every key present in any aggregate.
    pub fn present_keys(&self) -> Vec<String> {
        let keys: BTreeSet<&String> = self
            .rides
            .keys()
            .chain(self.revenue.keys())
            .chain(self.new_users.keys())
            .collect();
        keys.into_iter().cloned().collect()
    }
}

/// Bucket labels for a chart.
///
/// With a range, every bucket it spans (empty ones included); without, the
/// buckets that actually hold data.
pub fn bucket_labels(
    aggregates: &BucketAggregates,
    range: Option<&DateRange>,
    granularity: Granularity,
) -> Vec<String> {
    match range {
        Some(range) => range.bucket_keys(granularity),
        None => aggregates.present_keys(),
    }
}

/// Time series for the rides, revenue and registration charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub granularity: Granularity,
    /// Bucket keys (`yyyy-MM-dd`, `yyyy-MM` or `yyyy`).
    pub buckets: Vec<String>,
    pub rides: ChartData,
    pub revenue: ChartData,
    pub new_users: ChartData,
}

impl TimeSeries {
    /// Builds the three series over a common label set. Buckets without
    /// records are zero.
    pub fn build(
        filtered: &FilteredData<'_>,
        range: Option<&DateRange>,
        granularity: Granularity,
        offset: FixedOffset,
    ) -> Self {
        let aggregates = BucketAggregates::compute(filtered, granularity, offset);
        let buckets = bucket_labels(&aggregates, range, granularity);
        let display: Vec<String> = buckets.iter().map(|k| granularity.display_label(k)).collect();

        let series = |label: String, value: &dyn Fn(&str) -> f64| {
            ChartData::new(label, display.clone(), buckets.iter().map(|k| value(k.as_str())).collect())
        };

        let rides = series(format!("Total Rides ({granularity})"), &|k| {
            aggregates.rides.get(k).copied().unwrap_or(0) as f64
        });
        let revenue = series(format!("Revenue (₦) ({granularity})"), &|k| {
            minor_to_major(aggregates.revenue.get(k).copied().unwrap_or(0))
        });
        let new_users = series(format!("New Users ({granularity})"), &|k| {
            aggregates.new_users.get(k).copied().unwrap_or(0) as f64
        });

        Self {
            granularity,
            buckets,
            rides,
            revenue,
            new_users,
        }
    }
}

/// One row of the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActivityEntry {
    Ride(Ride),
    Transaction(Transaction),
}

impl ActivityEntry {
    /// Normalized timestamp of the underlying record.
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::Ride(r) => r.timestamp,
            Self::Transaction(t) => t.timestamp,
        }
    }
}

/// Rides followed by transactions, newest first.
///
/// The sort is stable, so equal timestamps keep rides ahead of
/// transactions and otherwise keep input order.
pub fn recent_activity<'a>(
    rides: impl IntoIterator<Item = &'a Ride>,
    transactions: impl IntoIterator<Item = &'a Transaction>,
    limit: Option<usize>,
) -> Vec<ActivityEntry> {
    let mut entries: Vec<ActivityEntry> = rides
        .into_iter()
        .cloned()
        .map(ActivityEntry::Ride)
        .chain(transactions.into_iter().cloned().map(ActivityEntry::Transaction))
        .collect();
    entries.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Parameters for an analytics pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyticsQuery {
    /// `None` disables date filtering.
    pub range: Option<DateRange>,
    pub granularity: Granularity,
    /// Offset that calendar days are read in.
    pub offset: FixedOffset,
    /// Maximum activity entries; `None` for all.
    pub activity_limit: Option<usize>,
}

impl Default for AnalyticsQuery {
    fn default() -> Self {
        Self {
            range: None,
            granularity: Granularity::Day,
            offset: Utc.fix(),
            activity_limit: None,
        }
    }
}

/// Counters over the date-restricted data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredSummary {
    pub rides: usize,
    pub transactions: usize,
    pub new_users: usize,
    pub completion_rate: f64,
    pub revenue: f64,
}

/// Everything the analytics page renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Unfiltered headline counters.
    pub summary: GlobalSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<DateRange>,
    pub filtered: FilteredSummary,
    pub status_breakdown: StatusBreakdown,
    pub status_chart: ChartData,
    pub series: TimeSeries,
    pub recent_activity: Vec<ActivityEntry>,
}

impl AnalyticsReport {
    /// Runs a full analytics pass.
    pub fn build(data: &DashboardData, query: &AnalyticsQuery) -> Self {
        let range = query.range.as_ref();
        let filtered = FilteredData::new(data, range, query.offset);
        let status_breakdown = StatusBreakdown::compute(filtered.rides.iter().copied());

        Self {
            summary: GlobalSummary::compute(data),
            range: query.range,
            filtered: FilteredSummary {
                rides: filtered.rides.len(),
                transactions: filtered.transactions.len(),
                new_users: filtered.users.len(),
                completion_rate: filtered.completion_rate(),
                revenue: filtered.revenue(),
            },
            status_chart: status_breakdown.chart(),
            status_breakdown,
            series: TimeSeries::build(&filtered, range, query.granularity, query.offset),
            recent_activity: recent_activity(
                filtered.rides.iter().copied(),
                filtered.transactions.iter().copied(),
                query.activity_limit,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use ride_admin_core::AccountType;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn ms(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp_millis()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ride(id: &str, status: &str, timestamp: i64) -> Ride {
        Ride {
            id: id.to_string(),
            status: RideStatus::parse(status),
            timestamp,
            pickup: None,
            dropoff: None,
            driver_id: None,
            passenger_id: None,
            fare: None,
        }
    }

    fn txn(id: &str, amount: i64, timestamp: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            amount,
            timestamp,
            customer: None,
            status: None,
            reference: None,
        }
    }

    fn user(id: &str, created_at: Option<i64>) -> User {
        User {
            id: id.to_string(),
            created_at,
            account_type: Some(AccountType::Rider),
            account_status: None,
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
        }
    }

    fn sample() -> DashboardData {
        DashboardData {
            rides: vec![
                ride("r1", "completed", ms(2024, 1, 1, 9)),
                ride("r2", "completed", ms(2024, 1, 1, 18)),
                ride("r3", "pending", ms(2024, 1, 3, 7)),
                ride("r4", "cancelled", ms(2024, 2, 10, 7)),
            ],
            transactions: vec![
                txn("t1", 150000, ms(2024, 1, 1, 10)),
                txn("t2", 2550, ms(2024, 1, 3, 8)),
                txn("t3", 1000, ms(2023, 12, 31, 23)),
            ],
            users: vec![
                user("u1", Some(ms(2024, 1, 2, 12))),
                user("u2", None),
                user("u3", Some(ms(2025, 6, 1, 0))),
            ],
        }
    }

    #[test]
    fn test_filter_without_range_keeps_everything() {
        let data = sample();
        assert_eq!(filter_by_range(&data.users, None, utc()).len(), 3);
    }

    #[test]
    fn test_filter_drops_undated_and_out_of_range() {
        let data = sample();
        let range = DateRange::new(day(2024, 1, 1), day(2024, 1, 3)).unwrap();
        let filtered = FilteredData::new(&data, Some(&range), utc());

        let ride_ids: Vec<&str> = filtered.rides.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ride_ids, vec!["r1", "r2", "r3"]);
        assert_eq!(filtered.transactions.len(), 2);
        assert_eq!(filtered.users.len(), 1);
    }

    #[test]
    fn test_filter_boundaries_inclusive() {
        let range = DateRange::new(day(2024, 1, 1), day(2024, 1, 1)).unwrap();
        let (start, end) = range.bounds_ms(utc());
        let rides = vec![
            ride("a", "pending", start - 1),
            ride("b", "pending", start),
            ride("c", "pending", end),
            ride("d", "pending", end + 1),
        ];
        let kept: Vec<&str> = filter_by_range(&rides, Some(&range), utc())
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(kept, vec!["b", "c"]);
    }

    #[test]
    fn test_global_summary_ignores_range() {
        let data = sample();
        let summary = GlobalSummary::compute(&data);
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.total_rides, 4);
        assert_eq!(summary.active_rides, 1);
        assert_eq!(summary.completion_rate, 50.0);
        assert_eq!(summary.total_revenue, 1535.5);
    }

    #[test]
    fn test_status_breakdown_exact_counts() {
        let rides = vec![
            ride("1", "completed", 0),
            ride("2", "completed", 0),
            ride("3", "completed", 0),
            ride("4", "pending", 0),
            ride("5", "pending", 0),
            ride("6", "cancelled", 0),
        ];
        let breakdown = StatusBreakdown::compute(&rides);
        assert_eq!(
            breakdown,
            StatusBreakdown {
                completed: 3,
                pending: 2,
                cancelled: 1,
                unrecognized: 0
            }
        );
        assert_eq!(breakdown.chart().data, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_status_breakdown_excludes_unknown_from_chart() {
        let rides = vec![ride("1", "accepted", 0), ride("2", "completed", 0)];
        let breakdown = StatusBreakdown::compute(&rides);
        assert_eq!(breakdown.unrecognized, 1);
        assert_eq!(breakdown.chart().total(), 1.0);
    }

    #[test]
    fn test_range_labels_include_empty_days() {
        let data = sample();
        let range = DateRange::new(day(2024, 1, 1), day(2024, 1, 3)).unwrap();
        let filtered = FilteredData::new(&data, Some(&range), utc());
        let series = TimeSeries::build(&filtered, Some(&range), Granularity::Day, utc());

        assert_eq!(series.buckets, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        assert_eq!(series.rides.data, vec![2.0, 0.0, 1.0]);
        assert_eq!(series.revenue.data, vec![1500.0, 0.0, 25.5]);
        assert_eq!(series.new_users.data, vec![0.0, 1.0, 0.0]);
        assert_eq!(series.rides.labels, vec!["Jan 1", "Jan 2", "Jan 3"]);
        assert_eq!(series.rides.label, "Total Rides (day)");
    }

    #[test]
    fn test_labels_without_range_are_present_keys() {
        let data = sample();
        let filtered = FilteredData::new(&data, None, utc());
        let series = TimeSeries::build(&filtered, None, Granularity::Month, utc());
        assert_eq!(series.buckets, vec!["2023-12", "2024-01", "2024-02", "2025-06"]);
        assert_eq!(series.rides.data, vec![0.0, 3.0, 1.0, 0.0]);
        assert_eq!(series.revenue.data, vec![10.0, 1525.5, 0.0, 0.0]);
    }

    #[test]
    fn test_ride_counts_sum_to_filtered_length() {
        let data = sample();
        for granularity in [Granularity::Day, Granularity::Month, Granularity::Year] {
            for range in [None, Some(DateRange::new(day(2023, 6, 1), day(2024, 3, 1)).unwrap())] {
                let filtered = FilteredData::new(&data, range.as_ref(), utc());
                let series = TimeSeries::build(&filtered, range.as_ref(), granularity, utc());
                assert_eq!(series.rides.total() as usize, filtered.rides.len());
            }
        }
    }

    #[test]
    fn test_recent_activity_sorted_descending() {
        let rides = vec![ride("r1", "pending", 10), ride("r2", "pending", 40)];
        let txns = vec![txn("t1", 1, 30), txn("t2", 1, 20)];
        let feed = recent_activity(&rides, &txns, None);

        let stamps: Vec<i64> = feed.iter().map(ActivityEntry::timestamp).collect();
        assert_eq!(stamps, vec![40, 30, 20, 10]);
        assert!(matches!(feed[1], ActivityEntry::Transaction(_)));
    }

    #[test]
    fn test_recent_activity_ties_keep_order() {
        let rides = vec![ride("r1", "pending", 5)];
        let txns = vec![txn("t1", 1, 5)];
        let feed = recent_activity(&rides, &txns, Some(1));
        assert_eq!(feed.len(), 1);
        assert!(matches!(&feed[0], ActivityEntry::Ride(r) if r.id == "r1"));
    }

    #[test]
    fn test_report_serializes_activity_kind() {
        let data = sample();
        let report = AnalyticsReport::build(&data, &AnalyticsQuery::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recent_activity"][0]["kind"], "ride");
        assert_eq!(json["filtered"]["rides"], 4);
        assert!(json.get("range").is_none());
    }
}
