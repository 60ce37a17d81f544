//! Financial metrics from XBRL company facts.
//!
//! Companies tag the same line item with different US-GAAP concepts
//! (`Revenues`, `SalesRevenueNet`, `PremiumsEarnedNet` for insurers, ...), and
//! the company-facts dataset repeats every value once per filing that reported
//! it. Extraction therefore walks a ranked list of concepts per metric and, for
//! each concept, narrows the facts through increasingly relaxed stages until one
//! survives:
//!
//! 1. period end equals the 10-K's report date, 10-K form, full fiscal year
//! 2. period end equals the report date, 10-K form
//! 3. 10-K form, full fiscal year
//! 4. 10-K form
//! 5. period ends in the report date's year
//!
//! The most recently filed survivor wins, so restated values beat originals.
//!
//! ```rust,no_run
//! use tenk::{Edgar, FinancialOperations};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let edgar = Edgar::new("app_name contact@example.com")?;
//! let report = edgar.financial_report("PGR", Some(2024)).await?;
//! if let Some(margin) = report.margins.net_margin {
//!     println!("net margin {:.2}%", margin * 100.0);
//! }
//! # Ok(())
//! # }
//! ```

use super::Edgar;
use super::company::{CompanyFacts, DataPoint};
use super::error::{EdgarError, Result};
use super::traits::{CompanyOperations, FilingOperations, FinancialOperations};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const NET_SALES_CONCEPTS: &[&str] = &[
    "Revenues",
    "RevenueFromContractWithCustomerExcludingAssessedTax",
    "SalesRevenueNet",
    "SalesRevenueGoodsNet",
    "SalesRevenueServicesNet",
    "PremiumsEarnedNet",
    "TotalRevenuesAndOtherIncome",
];

pub const COST_OF_REVENUE_CONCEPTS: &[&str] = &[
    "CostOfRevenue",
    "CostOfGoodsAndServicesSold",
    "CostOfGoodsSold",
    "CostOfGoodsSoldExcludingDepreciationDepletionAndAmortization",
    "CostOfServices",
];

pub const GROSS_PROFIT_CONCEPTS: &[&str] = &[
    "GrossProfit",
    "GrossProfitExcludingDepreciationDepletionAndAmortization",
];

pub const OPERATING_INCOME_CONCEPTS: &[&str] = &[
    "OperatingIncomeLoss",
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
    "IncomeLossFromContinuingOperationsBeforeIncomeTaxesMinorityInterestAndIncomeLossFromEquityMethodInvestments",
];

pub const NET_INCOME_CONCEPTS: &[&str] = &[
    "NetIncomeLoss",
    "ProfitLoss",
    "NetIncomeLossAvailableToCommonStockholdersBasic",
    "NetIncomeLossAvailableToCommonStockholdersDiluted",
];

pub const DEPRECIATION_AND_AMORTIZATION_CONCEPTS: &[&str] = &[
    "DepreciationAndAmortization",
    "DepreciationDepletionAndAmortization",
    "Depreciation",
    "AmortizationOfIntangibleAssets",
];

pub const EBITDA_CONCEPTS: &[&str] = &[
    "EarningsBeforeInterestTaxesDepreciationAndAmortization",
    "EarningsBeforeInterestTaxesDepreciationAndAmortizationEBITDA",
];

pub const TOTAL_ASSETS_CONCEPTS: &[&str] = &["Assets"];

pub const TOTAL_LIABILITIES_CONCEPTS: &[&str] = &["Liabilities"];

/// Full-year duration window, in days, for growth series.
const ANNUAL_PERIOD_DAYS: std::ops::RangeInclusive<i64> = 350..=380;

/// A metric the crate knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    NetSales,
    CostOfRevenue,
    GrossProfit,
    OperatingIncome,
    NetIncome,
    DepreciationAndAmortization,
    Ebitda,
    TotalAssets,
    TotalLiabilities,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::NetSales,
        Metric::CostOfRevenue,
        Metric::GrossProfit,
        Metric::OperatingIncome,
        Metric::NetIncome,
        Metric::DepreciationAndAmortization,
        Metric::Ebitda,
        Metric::TotalAssets,
        Metric::TotalLiabilities,
    ];

    /// Candidate US-GAAP concepts, most preferred first.
    pub fn concepts(self) -> &'static [&'static str] {
        match self {
            Metric::NetSales => NET_SALES_CONCEPTS,
            Metric::CostOfRevenue => COST_OF_REVENUE_CONCEPTS,
            Metric::GrossProfit => GROSS_PROFIT_CONCEPTS,
            Metric::OperatingIncome => OPERATING_INCOME_CONCEPTS,
            Metric::NetIncome => NET_INCOME_CONCEPTS,
            Metric::DepreciationAndAmortization => DEPRECIATION_AND_AMORTIZATION_CONCEPTS,
            Metric::Ebitda => EBITDA_CONCEPTS,
            Metric::TotalAssets => TOTAL_ASSETS_CONCEPTS,
            Metric::TotalLiabilities => TOTAL_LIABILITIES_CONCEPTS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::NetSales => "net_sales",
            Metric::CostOfRevenue => "cost_of_revenue",
            Metric::GrossProfit => "gross_profit",
            Metric::OperatingIncome => "operating_income",
            Metric::NetIncome => "net_income",
            Metric::DepreciationAndAmortization => "depreciation_and_amortization",
            Metric::Ebitda => "ebitda",
            Metric::TotalAssets => "total_assets",
            Metric::TotalLiabilities => "total_liabilities",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    /// Accepts snake_case or kebab-case names, e.g. `net_income` or `net-income`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| format!("unknown metric '{}'", s))
    }
}

/// The fact chosen for a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickedFact {
    pub value: f64,
    pub concept: String,
    pub unit: String,
    pub end: String,
    pub form: String,
    pub filed: String,
}

#[derive(Debug, Clone, Copy)]
struct Stage {
    same_end: bool,
    annual_form: bool,
    full_year: bool,
    same_year: bool,
}

const STAGES: [Stage; 5] = [
    Stage {
        same_end: true,
        annual_form: true,
        full_year: true,
        same_year: false,
    },
    Stage {
        same_end: true,
        annual_form: true,
        full_year: false,
        same_year: false,
    },
    Stage {
        same_end: false,
        annual_form: true,
        full_year: true,
        same_year: false,
    },
    Stage {
        same_end: false,
        annual_form: true,
        full_year: false,
        same_year: false,
    },
    Stage {
        same_end: false,
        annual_form: false,
        full_year: false,
        same_year: true,
    },
];

impl Stage {
    fn needs_target(&self) -> bool {
        self.same_end || self.same_year
    }

    fn accepts(&self, point: &DataPoint, target_end: Option<&str>) -> bool {
        if self.same_end && target_end != Some(point.end.as_str()) {
            return false;
        }
        if self.annual_form && !point.is_annual_report_form() {
            return false;
        }
        if self.full_year && !point.is_full_year() {
            return false;
        }
        if self.same_year {
            let target_year = target_end.and_then(|end| end.get(..4)?.parse::<i32>().ok());
            if target_year.is_none() || point.end_year() != target_year {
                return false;
            }
        }
        true
    }
}

/// Picks the best US-GAAP fact for the first usable concept in `candidates`.
///
/// `target_end` is the 10-K's period of report (`YYYY-MM-DD`); without it only
/// the form-based stages run. A concept whose chosen fact is not numeric is
/// abandoned in favour of the next candidate.
pub fn pick_fact(
    facts: &CompanyFacts,
    candidates: &[&str],
    target_end: Option<&str>,
) -> Option<PickedFact> {
    for &concept in candidates {
        let Some(fact) = facts.us_gaap(concept) else {
            continue;
        };
        let points: Vec<(&str, &DataPoint)> = fact.data_points().collect();
        if points.is_empty() {
            continue;
        }

        let chosen = STAGES
            .iter()
            .filter(|stage| !stage.needs_target() || target_end.is_some())
            .find_map(|stage| {
                latest_filed(points.iter().filter(|(_, p)| stage.accepts(p, target_end)))
            });

        let Some((unit, point)) = chosen else {
            continue;
        };
        match point.value() {
            Some(value) => {
                return Some(PickedFact {
                    value,
                    concept: concept.to_string(),
                    unit: unit.to_string(),
                    end: point.end.clone(),
                    form: point.form.clone(),
                    filed: point.filed.clone(),
                });
            }
            None => {
                tracing::debug!(
                    "{} has a non-numeric value {:?}, trying next concept",
                    concept,
                    point.val
                );
            }
        }
    }
    None
}

/// Most recently filed point; the first one wins ties.
fn latest_filed<'a, I>(points: I) -> Option<(&'a str, &'a DataPoint)>
where
    I: Iterator<Item = &'a (&'a str, &'a DataPoint)>,
{
    points
        .copied()
        .reduce(|best, next| if next.1.filed > best.1.filed { next } else { best })
}

/// Where a metric value came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricSource {
    Reported(PickedFact),
    Derived { formula: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    pub value: f64,
    pub source: MetricSource,
}

impl MetricValue {
    fn derived(value: f64, formula: &str) -> Self {
        Self {
            value,
            source: MetricSource::Derived {
                formula: formula.to_string(),
            },
        }
    }

    /// The concept name, or the formula for derived values.
    pub fn origin(&self) -> &str {
        match &self.source {
            MetricSource::Reported(fact) => &fact.concept,
            MetricSource::Derived { formula } => formula,
        }
    }
}

impl From<PickedFact> for MetricValue {
    fn from(fact: PickedFact) -> Self {
        Self {
            value: fact.value,
            source: MetricSource::Reported(fact),
        }
    }
}

/// Key line items for one fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Financials {
    /// Period of report the facts were aligned to
    pub fiscal_year_end: Option<String>,
    pub net_sales: Option<MetricValue>,
    pub cost_of_revenue: Option<MetricValue>,
    pub gross_profit: Option<MetricValue>,
    pub operating_income: Option<MetricValue>,
    pub net_income: Option<MetricValue>,
    pub depreciation_and_amortization: Option<MetricValue>,
    pub ebitda: Option<MetricValue>,
    pub total_assets: Option<MetricValue>,
    pub total_liabilities: Option<MetricValue>,
}

impl Financials {
    /// Extracts every metric, aligned to `target_end` when given.
    ///
    /// Gross profit falls back to `net_sales - cost_of_revenue` and EBITDA to
    /// `operating_income + depreciation_and_amortization` when not tagged.
    pub fn extract(facts: &CompanyFacts, target_end: Option<&str>) -> Self {
        let pick = |metric: Metric| {
            pick_fact(facts, metric.concepts(), target_end).map(MetricValue::from)
        };

        let net_sales = pick(Metric::NetSales);
        let cost_of_revenue = pick(Metric::CostOfRevenue);
        let operating_income = pick(Metric::OperatingIncome);
        let depreciation_and_amortization = pick(Metric::DepreciationAndAmortization);

        let gross_profit = pick(Metric::GrossProfit).or_else(|| {
            let (sales, cost) = (net_sales.as_ref()?, cost_of_revenue.as_ref()?);
            Some(MetricValue::derived(
                sales.value - cost.value,
                "net_sales - cost_of_revenue",
            ))
        });

        let ebitda = pick(Metric::Ebitda).or_else(|| {
            let (income, da) = (
                operating_income.as_ref()?,
                depreciation_and_amortization.as_ref()?,
            );
            Some(MetricValue::derived(
                income.value + da.value,
                "operating_income + depreciation_and_amortization",
            ))
        });

        Self {
            fiscal_year_end: target_end.map(str::to_string),
            net_income: pick(Metric::NetIncome),
            total_assets: pick(Metric::TotalAssets),
            total_liabilities: pick(Metric::TotalLiabilities),
            net_sales,
            cost_of_revenue,
            gross_profit,
            operating_income,
            depreciation_and_amortization,
            ebitda,
        }
    }

    pub fn get(&self, metric: Metric) -> Option<&MetricValue> {
        match metric {
            Metric::NetSales => self.net_sales.as_ref(),
            Metric::CostOfRevenue => self.cost_of_revenue.as_ref(),
            Metric::GrossProfit => self.gross_profit.as_ref(),
            Metric::OperatingIncome => self.operating_income.as_ref(),
            Metric::NetIncome => self.net_income.as_ref(),
            Metric::DepreciationAndAmortization => self.depreciation_and_amortization.as_ref(),
            Metric::Ebitda => self.ebitda.as_ref(),
            Metric::TotalAssets => self.total_assets.as_ref(),
            Metric::TotalLiabilities => self.total_liabilities.as_ref(),
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.get(metric).map(|m| m.value)
    }
}

/// Margins as fractions of net sales (`0.25` is 25%).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Margins {
    pub net_margin: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub ebitda_margin: Option<f64>,
}

impl Margins {
    pub fn compute(financials: &Financials) -> Self {
        let sales = financials.value(Metric::NetSales);
        let ratio = |metric: Metric| safe_div(financials.value(metric), sales);
        Self {
            net_margin: ratio(Metric::NetIncome),
            gross_margin: ratio(Metric::GrossProfit),
            operating_margin: ratio(Metric::OperatingIncome),
            ebitda_margin: ratio(Metric::Ebitda),
        }
    }
}

fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// One fiscal year of a growth series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub end: String,
    pub fiscal_year: Option<i32>,
    pub value: f64,
    /// Change against the previous year as a fraction of its magnitude
    pub change: Option<f64>,
    pub concept: String,
}

/// Annual values of the first concept in `candidates` with any, oldest first.
///
/// Only full-year 10-K facts count: durations of 350 to 380 days, or instants
/// for balance-sheet concepts. When several filings report the same period the
/// latest filing wins.
pub fn growth_series(facts: &CompanyFacts, candidates: &[&str]) -> Vec<GrowthPoint> {
    for &concept in candidates {
        let Some(fact) = facts.us_gaap(concept) else {
            continue;
        };

        let mut by_end: BTreeMap<&str, (&DataPoint, f64)> = BTreeMap::new();
        for (_, point) in fact.data_points() {
            let annual = point.is_annual_report_form()
                && point.is_full_year()
                && point
                    .duration_days()
                    .is_none_or(|days| ANNUAL_PERIOD_DAYS.contains(&days));
            let Some(value) = point.value().filter(|_| annual) else {
                continue;
            };
            let newer = by_end
                .get(point.end.as_str())
                .is_none_or(|(existing, _)| point.filed > existing.filed);
            if newer {
                by_end.insert(point.end.as_str(), (point, value));
            }
        }

        if by_end.is_empty() {
            continue;
        }

        let mut series = Vec::with_capacity(by_end.len());
        let mut previous: Option<f64> = None;
        for (end, (point, value)) in by_end {
            let change = previous.and_then(|prev| safe_div(Some(value - prev), Some(prev.abs())));
            series.push(GrowthPoint {
                end: end.to_string(),
                fiscal_year: point.end_year(),
                value,
                change,
                concept: concept.to_string(),
            });
            previous = Some(value);
        }
        return series;
    }
    Vec::new()
}

/// Metrics, margins and the filing they are aligned to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialReport {
    pub ticker: String,
    pub cik: u64,
    pub entity_name: String,
    pub accession_number: String,
    pub primary_document: Option<String>,
    pub report_date: Option<String>,
    pub financials: Financials,
    pub margins: Margins,
}

#[async_trait]
impl FinancialOperations for Edgar {
    /// Resolves the ticker, picks the 10-K for `year`, and aligns facts to its period.
    ///
    /// # Errors
    ///
    /// * `EdgarError::TickerNotFound` - unknown ticker.
    /// * `EdgarError::NoAnnualReport` - the company has no dated 10-K.
    /// * `EdgarError::NotFound` - no XBRL facts for the company.
    async fn financial_report(&self, ticker: &str, year: Option<i32>) -> Result<FinancialReport> {
        let company = self.company(ticker).await?;
        let filing = self.latest_annual_report(company.cik, year).await?;
        let target_end = filing.report_date().map(str::to_string);

        let facts = self.company_facts(company.cik).await?;
        let financials = Financials::extract(&facts, target_end.as_deref());
        let margins = Margins::compute(&financials);
        tracing::info!(
            "Extracted financials for {} (CIK {}) period {:?}",
            company.ticker,
            company.cik,
            target_end
        );

        Ok(FinancialReport {
            ticker: company.ticker,
            cik: company.cik,
            entity_name: facts.entity_name,
            accession_number: filing.accession_number,
            primary_document: filing.primary_document,
            report_date: target_end,
            financials,
            margins,
        })
    }

    /// Year-over-year series for `metric`.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::InvalidResponse` if none of the metric's concepts has annual data.
    async fn growth(&self, ticker: &str, metric: Metric) -> Result<Vec<GrowthPoint>> {
        let cik = self.company_cik(ticker).await?;
        let facts = self.company_facts(cik).await?;
        let series = growth_series(&facts, metric.concepts());
        if series.is_empty() {
            return Err(EdgarError::InvalidResponse(format!(
                "No annual {} data for {}",
                metric, ticker
            )));
        }
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts(us_gaap: serde_json::Value) -> CompanyFacts {
        serde_json::from_value(json!({
            "cik": 80661,
            "entityName": "PROGRESSIVE CORP/OH/",
            "facts": { "us-gaap": us_gaap }
        }))
        .unwrap()
    }

    fn dp(
        start: Option<&str>,
        end: &str,
        val: serde_json::Value,
        fp: &str,
        form: &str,
        filed: &str,
    ) -> serde_json::Value {
        let mut point = json!({
            "end": end, "val": val, "accn": "0000080661-24-000010",
            "fy": 2023, "fp": fp, "form": form, "filed": filed
        });
        if let Some(start) = start {
            point["start"] = json!(start);
        }
        point
    }

    fn concept(points: Vec<serde_json::Value>) -> serde_json::Value {
        json!({ "label": null, "description": null, "units": { "USD": points } })
    }

    #[test]
    fn test_stage_one_prefers_exact_period() {
        let f = facts(json!({
            "Revenues": concept(vec![
                dp(Some("2022-01-01"), "2022-12-31", json!(100), "FY", "10-K", "2023-02-28"),
                dp(Some("2023-01-01"), "2023-12-31", json!(120), "FY", "10-K", "2024-02-27"),
                dp(Some("2023-07-01"), "2023-09-30", json!(30), "Q3", "10-Q", "2023-11-01"),
            ])
        }));

        let picked = pick_fact(&f, NET_SALES_CONCEPTS, Some("2022-12-31")).unwrap();
        assert_eq!(picked.value, 100.0);
        assert_eq!(picked.concept, "Revenues");
        assert_eq!(picked.unit, "USD");
    }

    #[test]
    fn test_latest_filing_wins() {
        let f = facts(json!({
            "NetIncomeLoss": concept(vec![
                dp(Some("2022-01-01"), "2022-12-31", json!(10), "FY", "10-K", "2023-02-28"),
                dp(Some("2022-01-01"), "2022-12-31", json!(11), "FY", "10-K/A", "2023-06-01"),
            ])
        }));
        let picked = pick_fact(&f, NET_INCOME_CONCEPTS, Some("2022-12-31")).unwrap();
        assert_eq!(picked.value, 11.0);
        assert_eq!(picked.form, "10-K/A");
    }

    #[test]
    fn test_unit_ties_resolve_in_unit_order() {
        let point = dp(Some("2023-01-01"), "2023-12-31", json!(7), "FY", "10-K", "2024-02-27");
        let f = facts(json!({
            "Revenues": {
                "label": null,
                "description": null,
                "units": { "USD": [point.clone()], "EUR": [point] }
            }
        }));
        for _ in 0..5 {
            let picked = pick_fact(&f, NET_SALES_CONCEPTS, Some("2023-12-31")).unwrap();
            assert_eq!(picked.unit, "EUR");
        }
    }

    #[test]
    fn test_stage_two_relaxes_fiscal_period() {
        let f = facts(json!({
            "Revenues": concept(vec![
                dp(Some("2023-10-01"), "2023-12-31", json!(40), "Q4", "10-K", "2024-02-27"),
                dp(Some("2021-01-01"), "2021-12-31", json!(90), "FY", "10-K", "2022-02-27"),
            ])
        }));
        let picked = pick_fact(&f, NET_SALES_CONCEPTS, Some("2023-12-31")).unwrap();
        assert_eq!(picked.value, 40.0);
    }

    #[test]
    fn test_stage_three_without_matching_end() {
        let f = facts(json!({
            "Revenues": concept(vec![
                dp(Some("2021-01-01"), "2021-12-31", json!(90), "FY", "10-K", "2022-02-27"),
                dp(Some("2022-01-01"), "2022-12-31", json!(95), "FY", "10-K", "2023-02-27"),
            ])
        }));
        let picked = pick_fact(&f, NET_SALES_CONCEPTS, Some("2024-12-31")).unwrap();
        assert_eq!(picked.value, 95.0);
        assert_eq!(pick_fact(&f, NET_SALES_CONCEPTS, None).unwrap().value, 95.0);
    }

    #[test]
    fn test_stage_five_matches_year_only() {
        let f = facts(json!({
            "Revenues": concept(vec![
                dp(Some("2023-01-01"), "2023-06-30", json!(55), "Q2", "10-Q", "2023-08-01"),
                dp(Some("2022-01-01"), "2022-06-30", json!(50), "Q2", "10-Q", "2022-08-01"),
            ])
        }));
        let picked = pick_fact(&f, NET_SALES_CONCEPTS, Some("2023-12-31")).unwrap();
        assert_eq!(picked.value, 55.0);
        assert!(pick_fact(&f, NET_SALES_CONCEPTS, None).is_none());
    }

    #[test]
    fn test_non_numeric_moves_to_next_concept() {
        let f = facts(json!({
            "Revenues": concept(vec![
                dp(Some("2023-01-01"), "2023-12-31", json!("n/a"), "FY", "10-K", "2024-02-27"),
            ]),
            "PremiumsEarnedNet": concept(vec![
                dp(Some("2023-01-01"), "2023-12-31", json!(61000), "FY", "10-K", "2024-02-27"),
            ])
        }));
        let picked = pick_fact(&f, NET_SALES_CONCEPTS, Some("2023-12-31")).unwrap();
        assert_eq!(picked.concept, "PremiumsEarnedNet");
        assert_eq!(picked.value, 61000.0);
    }

    #[test]
    fn test_extract_derives_gross_profit_and_ebitda() {
        let year = |v: i64| {
            vec![dp(Some("2023-01-01"), "2023-12-31", json!(v), "FY", "10-K", "2024-02-27")]
        };
        let f = facts(json!({
            "Revenues": concept(year(1000)),
            "CostOfRevenue": concept(year(600)),
            "OperatingIncomeLoss": concept(year(200)),
            "DepreciationAndAmortization": concept(year(50)),
            "NetIncomeLoss": concept(year(150)),
        }));

        let fin = Financials::extract(&f, Some("2023-12-31"));
        let gross = fin.gross_profit.as_ref().unwrap();
        assert_eq!(gross.value, 400.0);
        assert_eq!(gross.origin(), "net_sales - cost_of_revenue");
        assert_eq!(fin.value(Metric::Ebitda), Some(250.0));
        assert_eq!(fin.net_sales.as_ref().unwrap().origin(), "Revenues");
        assert!(fin.total_assets.is_none());

        let margins = Margins::compute(&fin);
        assert_eq!(margins.net_margin, Some(0.15));
        assert_eq!(margins.gross_margin, Some(0.4));
        assert_eq!(margins.operating_margin, Some(0.2));
        assert_eq!(margins.ebitda_margin, Some(0.25));
    }

    #[test]
    fn test_margins_without_sales() {
        let fin = Financials {
            net_income: Some(MetricValue::derived(5.0, "test")),
            net_sales: Some(MetricValue::derived(0.0, "test")),
            ..Default::default()
        };
        assert_eq!(Margins::compute(&fin), Margins::default());
        assert_eq!(Margins::compute(&Financials::default()).net_margin, None);
    }

    #[test]
    fn test_growth_series() {
        let f = facts(json!({
            "Revenues": concept(vec![
                dp(Some("2021-01-01"), "2021-12-31", json!(100), "FY", "10-K", "2022-02-27"),
                dp(Some("2022-01-01"), "2022-12-31", json!(110), "FY", "10-K", "2023-02-27"),
                dp(Some("2022-01-01"), "2022-12-31", json!(120), "FY", "10-K", "2024-02-27"),
                dp(Some("2023-01-01"), "2023-12-31", json!(90), "FY", "10-K", "2024-02-27"),
                dp(Some("2023-10-01"), "2023-12-31", json!(25), "FY", "10-K", "2024-02-27"),
                dp(Some("2023-01-01"), "2023-09-30", json!(70), "Q3", "10-Q", "2023-11-01"),
            ])
        }));

        let series = growth_series(&f, NET_SALES_CONCEPTS);
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 120.0, 90.0]);
        assert_eq!(series[0].change, None);
        assert_eq!(series[1].change, Some(0.2));
        assert_eq!(series[2].change, Some(-0.25));
        assert_eq!(series[2].fiscal_year, Some(2023));
    }

    #[test]
    fn test_growth_series_empty() {
        let f = facts(json!({}));
        assert!(growth_series(&f, NET_SALES_CONCEPTS).is_empty());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("net-income".parse::<Metric>().unwrap(), Metric::NetIncome);
        assert_eq!("EBITDA".parse::<Metric>().unwrap(), Metric::Ebitda);
        assert!("revenue_per_employee".parse::<Metric>().is_err());
        assert_eq!(Metric::TotalAssets.to_string(), "total_assets");
    }
}
