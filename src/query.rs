// 🔎 Region Query Engine
//
// Pure function from (dataset snapshot, selector) to (label, rows). Nothing
// is cached; every call recomputes from the snapshot.

use crate::error::QueryError;
use crate::records::{DerivedSalesRecord, Region};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// SELECTOR
// ============================================================================

/// RegionSelector - "all" or one known region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionSelector {
    All,
    Region(Region),
}

impl RegionSelector {
    /// The closed set of choices offered to the UI, in display order
    pub fn choices() -> Vec<RegionSelector> {
        let mut choices = vec![RegionSelector::All];
        choices.extend(Region::ALL.into_iter().map(RegionSelector::Region));
        choices
    }

    pub fn code(&self) -> &'static str {
        match self {
            RegionSelector::All => "all",
            RegionSelector::Region(region) => region.code(),
        }
    }

    /// Display label for a query result
    pub fn label(&self) -> String {
        match self {
            RegionSelector::All => "Sales Across All Regions".to_string(),
            RegionSelector::Region(region) => format!("Sales in {} Region", region.name()),
        }
    }

    fn matches(&self, record: &DerivedSalesRecord) -> bool {
        match self {
            RegionSelector::All => true,
            RegionSelector::Region(region) => record.region == region.code(),
        }
    }
}

impl fmt::Display for RegionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RegionSelector {
    type Err = QueryError;

    /// Case-insensitive at the boundary; stored values are lowercase
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(RegionSelector::All);
        }
        s.parse::<Region>()
            .map(RegionSelector::Region)
            .map_err(|_| QueryError::InvalidSelector(s.to_string()))
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Immutable, shareable view of the derived dataset
#[derive(Debug, Clone)]
pub struct SalesSnapshot {
    records: Arc<[DerivedSalesRecord]>,
}

impl SalesSnapshot {
    pub fn new(records: Vec<DerivedSalesRecord>) -> Self {
        SalesSnapshot {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[DerivedSalesRecord] {
        &self.records
    }

    pub fn query(&self, selector: RegionSelector) -> QueryResult {
        query(&self.records, selector)
    }
}

impl Deref for SalesSnapshot {
    type Target = [DerivedSalesRecord];

    fn deref(&self) -> &Self::Target {
        &self.records
    }
}

// ============================================================================
// QUERY RESULT
// ============================================================================

/// One point of an aggregated time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub label: String,
    #[serde(skip)]
    pub selector: RegionSelector,
    pub rows: Vec<DerivedSalesRecord>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_sales(&self) -> Decimal {
        self.rows.iter().map(|r| r.sales).sum()
    }

    /// Sales summed per date, ascending by date
    pub fn series(&self) -> Vec<SeriesPoint> {
        aggregate_by_date(self.rows.iter())
    }

    /// Per-region series, keyed by stored region value
    pub fn series_by_region(&self) -> BTreeMap<String, Vec<SeriesPoint>> {
        let mut grouped: BTreeMap<String, Vec<&DerivedSalesRecord>> = BTreeMap::new();
        for row in &self.rows {
            grouped.entry(row.region.clone()).or_default().push(row);
        }

        grouped
            .into_iter()
            .map(|(region, rows)| (region, aggregate_by_date(rows.into_iter())))
            .collect()
    }
}

fn aggregate_by_date<'a>(rows: impl Iterator<Item = &'a DerivedSalesRecord>) -> Vec<SeriesPoint> {
    let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.date).or_insert(Decimal::ZERO) += row.sales;
    }

    totals
        .into_iter()
        .map(|(date, sales)| SeriesPoint { date, sales })
        .collect()
}

// ============================================================================
// QUERY
// ============================================================================

/// Rows relevant to `selector`, in dataset order, plus a display label
pub fn query(dataset: &[DerivedSalesRecord], selector: RegionSelector) -> QueryResult {
    QueryResult {
        label: selector.label(),
        selector,
        rows: dataset
            .iter()
            .filter(|r| selector.matches(r))
            .cloned()
            .collect(),
    }
}

/// Query boundary for callers holding a raw selector string
pub fn query_region(dataset: &[DerivedSalesRecord], selector: &str) -> Result<QueryResult, QueryError> {
    let selector: RegionSelector = selector.parse()?;
    Ok(query(dataset, selector))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    fn record(date: &str, region: &str, sales: &str) -> DerivedSalesRecord {
        DerivedSalesRecord::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            region,
            Decimal::from_str(sales).unwrap(),
        )
    }

    fn sample_dataset() -> Vec<DerivedSalesRecord> {
        vec![
            record("2021-01-14", "north", "10.00"),
            record("2021-01-14", "east", "5.00"),
            record("2021-01-15", "north", "7.50"),
            record("2021-01-15", "west", "3.00"),
            record("2021-01-14", "north", "2.00"),
        ]
    }

    #[test]
    fn test_query_all_returns_everything_in_order() {
        let dataset = sample_dataset();
        let result = query(&dataset, RegionSelector::All);

        assert_eq!(result.label, "Sales Across All Regions");
        assert_eq!(result.rows, dataset);
    }

    #[test]
    fn test_query_region_filters_exactly() {
        let dataset = sample_dataset();
        let result = query(&dataset, RegionSelector::Region(Region::North));

        assert_eq!(result.label, "Sales in North Region");
        assert_eq!(result.rows.len(), 3);
        assert!(result.rows.iter().all(|r| r.region == "north"));
        assert_eq!(result.rows[0].sales, Decimal::from_str("10.00").unwrap());
        assert_eq!(result.rows[2].sales, Decimal::from_str("2.00").unwrap());
    }

    #[test]
    fn test_union_of_regions_equals_all() {
        let dataset = sample_dataset();
        let all: HashSet<DerivedSalesRecord> = query(&dataset, RegionSelector::All).rows.into_iter().collect();

        let union: HashSet<DerivedSalesRecord> = Region::ALL
            .into_iter()
            .flat_map(|r| query(&dataset, RegionSelector::Region(r)).rows)
            .collect();

        assert_eq!(union, all);
    }

    #[test]
    fn test_empty_match_is_not_an_error() {
        let dataset = sample_dataset();
        let result = query_region(&dataset, "south").unwrap();

        assert!(result.is_empty());
        assert_eq!(result.label, "Sales in South Region");
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("all".parse::<RegionSelector>().unwrap(), RegionSelector::All);
        assert_eq!("ALL".parse::<RegionSelector>().unwrap(), RegionSelector::All);
        assert_eq!(
            "East".parse::<RegionSelector>().unwrap(),
            RegionSelector::Region(Region::East)
        );
        assert_eq!(
            "central".parse::<RegionSelector>(),
            Err(QueryError::InvalidSelector("central".to_string()))
        );
    }

    #[test]
    fn test_invalid_selector_is_recoverable() {
        let dataset = sample_dataset();
        assert!(query_region(&dataset, "mars").is_err());
        assert_eq!(query_region(&dataset, "west").unwrap().rows.len(), 1);
    }

    #[test]
    fn test_choices_cover_closed_set() {
        let codes: Vec<&str> = RegionSelector::choices().iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec!["all", "north", "south", "east", "west"]);
    }

    #[test]
    fn test_query_is_deterministic_and_does_not_mutate() {
        let dataset = sample_dataset();
        let before = dataset.clone();

        let first = query(&dataset, RegionSelector::Region(Region::West));
        let second = query(&dataset, RegionSelector::Region(Region::West));

        assert_eq!(first, second);
        assert_eq!(dataset, before);
    }

    #[test]
    fn test_series_aggregates_per_date() {
        let result = query(&sample_dataset(), RegionSelector::All);
        let series = result.series();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date.to_string(), "2021-01-14");
        assert_eq!(series[0].sales, Decimal::from_str("17.00").unwrap());
        assert_eq!(series[1].sales, Decimal::from_str("10.50").unwrap());
        assert_eq!(result.total_sales(), Decimal::from_str("27.50").unwrap());
    }

    #[test]
    fn test_series_by_region() {
        let result = query(&sample_dataset(), RegionSelector::All);
        let by_region = result.series_by_region();

        let regions: Vec<&str> = by_region.keys().map(String::as_str).collect();
        assert_eq!(regions, vec!["east", "north", "west"]);
        assert_eq!(by_region["north"].len(), 2);
        assert_eq!(by_region["north"][0].sales, Decimal::from_str("12.00").unwrap());
    }

    #[test]
    fn test_snapshot_shared_across_threads() {
        let snapshot = SalesSnapshot::new(sample_dataset());

        let handles: Vec<_> = Region::ALL
            .into_iter()
            .map(|region| {
                let snapshot = snapshot.clone();
                thread::spawn(move || snapshot.query(RegionSelector::Region(region)).rows.len())
            })
            .collect();

        let counts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, vec![3, 0, 1, 1]);
        assert_eq!(snapshot.len(), 5);
    }
}
