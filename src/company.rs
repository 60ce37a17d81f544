//! Company identity and XBRL company-facts endpoints.
//!
//! Most flows start by resolving a ticker into a CIK with `company_cik("PGR")`,
//! then call `company_facts(cik)` for the full XBRL dataset or
//! `company_concept(cik, taxonomy, tag)` for a single concept.
//!
//! The ticker table (`company_tickers.json`, roughly 10k entries) is downloaded
//! once per client and shared by all clones, so resolving many tickers costs a
//! single request.

use super::Edgar;
use super::error::{EdgarError, Result};
use super::traits::CompanyOperations;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Mapping between a stock ticker and a company CIK, as published by the SEC.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompanyTicker {
    #[serde(rename = "cik_str")]
    pub cik: u64,
    pub ticker: String,
    pub title: String,
}

impl CompanyTicker {
    /// CIK left-padded to the 10 digits the data API expects.
    pub fn padded_cik(&self) -> String {
        format!("{:010}", self.cik)
    }
}

/// Ticker lookup table keyed by normalized ticker.
#[derive(Debug, Clone, Default)]
pub struct TickerIndex {
    by_ticker: HashMap<String, CompanyTicker>,
}

impl TickerIndex {
    /// Parses the `company_tickers.json` layout:
    /// `{"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}`
    pub fn from_json(content: &str) -> Result<Self> {
        let map: HashMap<String, CompanyTicker> = serde_json::from_str(content)?;
        Ok(map.into_values().collect())
    }

    pub fn get(&self, ticker: &str) -> Option<&CompanyTicker> {
        self.by_ticker.get(&normalize_ticker(ticker))
    }

    pub fn len(&self) -> usize {
        self.by_ticker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompanyTicker> {
        self.by_ticker.values()
    }
}

impl FromIterator<CompanyTicker> for TickerIndex {
    fn from_iter<I: IntoIterator<Item = CompanyTicker>>(iter: I) -> Self {
        let by_ticker = iter
            .into_iter()
            .map(|t| (normalize_ticker(&t.ticker), t))
            .collect();
        Self { by_ticker }
    }
}

/// Upper-cases a ticker and folds share-class separators, so `brk.b`, `BRK/B`
/// and `BRK-B` (the SEC spelling) all resolve to the same entry.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker
        .trim()
        .chars()
        .map(|c| match c {
            '.' | '/' => '-',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Complete set of XBRL facts reported by a company across all filings.
///
/// Facts are grouped by taxonomy (US-GAAP, DEI) and then by concept tag. Each
/// concept holds data points for many periods and filings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFacts {
    pub cik: u64,
    #[serde(rename = "entityName")]
    pub entity_name: String,
    #[serde(rename = "facts")]
    pub taxonomies: TaxonomyGroups,
}

impl CompanyFacts {
    /// Looks up a US-GAAP concept, e.g. `"Revenues"`.
    pub fn us_gaap(&self, concept: &str) -> Option<&Fact> {
        self.taxonomies.us_gaap.get(concept)
    }
}

/// Facts grouped by taxonomy. Foreign filers and funds often lack one of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyGroups {
    #[serde(rename = "us-gaap", default)]
    pub us_gaap: HashMap<String, Fact>,
    #[serde(default)]
    pub dei: HashMap<String, Fact>,
}

/// A single XBRL concept with its data points grouped by unit of measure.
///
/// Units are kept sorted by name so iteration order is stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub units: BTreeMap<String, Vec<DataPoint>>,
}

impl Fact {
    /// All data points across units, each paired with its unit name, units in name order.
    pub fn data_points(&self) -> impl Iterator<Item = (&str, &DataPoint)> {
        self.units
            .iter()
            .flat_map(|(unit, points)| points.iter().map(move |p| (unit.as_str(), p)))
    }
}

/// One reported value for a period, as it appeared in one filing.
///
/// Balance sheet items are instants (no `start`); income statement items span
/// a period. `val` is usually a number but some concepts are textual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    pub end: String,
    pub val: serde_json::Value,
    pub accn: String,
    #[serde(default)]
    pub fy: Option<i32>,
    #[serde(default)]
    pub fp: Option<String>,
    pub form: String,
    pub filed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl DataPoint {
    /// Numeric value, accepting numbers and numeric strings.
    pub fn value(&self) -> Option<f64> {
        match &self.val {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.end, "%Y-%m-%d").ok()
    }

    /// Length of the reporting period in days; `None` for instants.
    pub fn duration_days(&self) -> Option<i64> {
        let start = NaiveDate::parse_from_str(self.start.as_deref()?, "%Y-%m-%d").ok()?;
        Some((self.end_date()? - start).num_days())
    }

    /// Year of the period end, read from the leading `YYYY`.
    pub fn end_year(&self) -> Option<i32> {
        self.end.get(..4)?.parse().ok()
    }

    pub fn is_annual_report_form(&self) -> bool {
        self.form.contains("10-K")
    }

    /// Full-year fiscal period. Some filers write `Y`; a missing `fp` is accepted too.
    pub fn is_full_year(&self) -> bool {
        matches!(self.fp.as_deref(), None | Some("FY") | Some("Y"))
    }
}

/// Historical data for a single XBRL concept of one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyConcept {
    pub cik: u64,
    pub taxonomy: String,
    pub tag: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub units: BTreeMap<String, Vec<DataPoint>>,
}

#[derive(Debug)]
enum CompanyUrlType {
    CompanyTickers,
    CompanyFacts,
    CompanyConcept,
}

impl Edgar {
    fn build_company_url(&self, url_type: CompanyUrlType, params: &[&str]) -> String {
        match url_type {
            CompanyUrlType::CompanyTickers => {
                format!("{}/company_tickers.json", self.edgar_files_url)
            }
            CompanyUrlType::CompanyFacts => format!(
                "{}/api/xbrl/companyfacts/CIK{:0>10}.json",
                self.edgar_data_url, params[0]
            ),
            CompanyUrlType::CompanyConcept => {
                let (cik, taxonomy, tag) = (params[0], params[1], params[2]);
                format!(
                    "{}/api/xbrl/companyconcept/CIK{:0>10}/{}/{}.json",
                    self.edgar_data_url, cik, taxonomy, tag
                )
            }
        }
    }

    /// The cached ticker table, downloading it on first use.
    pub async fn ticker_index(&self) -> Result<&TickerIndex> {
        self.tickers
            .get_or_try_init(|| async {
                let url = self.build_company_url(CompanyUrlType::CompanyTickers, &[]);
                let response = self.get(&url).await?;
                let index = TickerIndex::from_json(&response)?;
                tracing::debug!("Loaded {} tickers from {}", index.len(), url);
                Ok::<_, EdgarError>(index)
            })
            .await
    }
}

#[async_trait]
impl CompanyOperations for Edgar {
    /// All company tickers known to the SEC.
    async fn company_tickers(&self) -> Result<Vec<CompanyTicker>> {
        Ok(self.ticker_index().await?.iter().cloned().collect())
    }

    /// Ticker entry for `ticker`, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::TickerNotFound` if the SEC table has no such ticker.
    async fn company(&self, ticker: &str) -> Result<CompanyTicker> {
        self.ticker_index()
            .await?
            .get(ticker)
            .cloned()
            .ok_or_else(|| EdgarError::TickerNotFound(ticker.to_string()))
    }

    /// Central Index Key for a ticker symbol.
    async fn company_cik(&self, ticker: &str) -> Result<u64> {
        Ok(self.company(ticker).await?.cik)
    }

    /// Every XBRL fact a company has reported, from the `companyfacts` API.
    ///
    /// # Errors
    ///
    /// `EdgarError::NotFound` when the CIK has no XBRL data (common for funds
    /// and very old registrants).
    async fn company_facts(&self, cik: u64) -> Result<CompanyFacts> {
        let url = self.build_company_url(CompanyUrlType::CompanyFacts, &[&cik.to_string()]);
        let response = self.get(&url).await?;
        Ok(serde_json::from_str(&response)?)
    }

    /// A single concept's history, e.g. `("us-gaap", "Revenues")`.
    async fn company_concept(&self, cik: u64, taxonomy: &str, tag: &str) -> Result<CompanyConcept> {
        let url = self.build_company_url(
            CompanyUrlType::CompanyConcept,
            &[&cik.to_string(), taxonomy, tag],
        );
        let response = self.get(&url).await?;
        Ok(serde_json::from_str(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICKERS_JSON: &str = r#"{
        "0": {"cik_str": 80661, "ticker": "PGR", "title": "PROGRESSIVE CORP/OH/"},
        "1": {"cik_str": 1067983, "ticker": "BRK-B", "title": "BERKSHIRE HATHAWAY INC"},
        "2": {"cik_str": 909832, "ticker": "COST", "title": "COSTCO WHOLESALE CORP /NEW"}
    }"#;

    fn point(val: serde_json::Value) -> DataPoint {
        DataPoint {
            start: Some("2023-01-01".to_string()),
            end: "2023-12-31".to_string(),
            val,
            accn: "0000080661-24-000010".to_string(),
            fy: Some(2023),
            fp: Some("FY".to_string()),
            form: "10-K".to_string(),
            filed: "2024-02-27".to_string(),
            frame: None,
        }
    }

    #[test]
    fn test_normalize_ticker() {
        assert_eq!(normalize_ticker(" pgr "), "PGR");
        assert_eq!(normalize_ticker("brk.b"), "BRK-B");
        assert_eq!(normalize_ticker("BRK/B"), "BRK-B");
    }

    #[test]
    fn test_ticker_index_lookup() {
        let index = TickerIndex::from_json(TICKERS_JSON).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("pgr").unwrap().cik, 80661);
        assert_eq!(index.get("BRK.B").unwrap().cik, 1067983);
        assert_eq!(index.get("COST").unwrap().padded_cik(), "0000909832");
        assert!(index.get("INVALID").is_none());
    }

    #[test]
    fn test_ticker_index_rejects_garbage() {
        assert!(matches!(
            TickerIndex::from_json("invalid json"),
            Err(EdgarError::JsonError(_))
        ));
    }

    #[test]
    fn test_company_urls() {
        let edgar = Edgar::new("test_agent example@example.com").unwrap();
        assert_eq!(
            edgar.build_company_url(CompanyUrlType::CompanyFacts, &["80661"]),
            "https://data.sec.gov/api/xbrl/companyfacts/CIK0000080661.json"
        );
        assert_eq!(
            edgar.build_company_url(
                CompanyUrlType::CompanyConcept,
                &["320193", "us-gaap", "Revenues"]
            ),
            "https://data.sec.gov/api/xbrl/companyconcept/CIK0000320193/us-gaap/Revenues.json"
        );
        assert_eq!(
            edgar.build_company_url(CompanyUrlType::CompanyTickers, &[]),
            "https://www.sec.gov/files/company_tickers.json"
        );
    }

    #[test]
    fn test_data_point_value() {
        assert_eq!(point(serde_json::json!(1512000000)).value(), Some(1512000000.0));
        assert_eq!(point(serde_json::json!("-42.5")).value(), Some(-42.5));
        assert_eq!(point(serde_json::json!("n/a")).value(), None);
        assert_eq!(point(serde_json::Value::Null).value(), None);
    }

    #[test]
    fn test_data_point_period() {
        let p = point(serde_json::json!(1));
        assert_eq!(p.duration_days(), Some(364));
        assert_eq!(p.end_year(), Some(2023));
        assert!(p.is_annual_report_form());
        assert!(p.is_full_year());

        let instant = DataPoint {
            start: None,
            fp: Some("Q3".to_string()),
            form: "10-Q".to_string(),
            ..p
        };
        assert_eq!(instant.duration_days(), None);
        assert!(!instant.is_annual_report_form());
        assert!(!instant.is_full_year());
    }

    #[test]
    fn test_parse_fact_with_null_fields() {
        let json = r#"{
                "label": null,
                "description": null,
                "units": {
                    "USD": [
                        {
                            "end": "2021-12-31",
                            "val": 1000000,
                            "accn": "0001234567-21-000001",
                            "fy": 2021,
                            "fp": "FY",
                            "form": "10-K",
                            "filed": "2022-01-31"
                        }
                    ]
                }
            }"#;

        let fact: Fact = serde_json::from_str(json).unwrap();
        assert!(fact.label.is_none());
        assert_eq!(fact.data_points().count(), 1);
        let (unit, _) = fact.data_points().next().unwrap();
        assert_eq!(unit, "USD");
    }

    #[test]
    fn test_missing_taxonomies_default() {
        let facts: CompanyFacts =
            serde_json::from_str(r#"{"cik": 1, "entityName": "Shell Co", "facts": {}}"#).unwrap();
        assert!(facts.taxonomies.us_gaap.is_empty());
        assert!(facts.us_gaap("Revenues").is_none());
    }
}
