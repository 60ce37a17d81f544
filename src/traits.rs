//! Trait definitions grouping client operations by area.
//!
//! `Edgar` implements every trait; they exist to make the API surface easy
//! to discover and to let callers substitute their own implementation in tests.

use super::company::{CompanyConcept, CompanyFacts, CompanyTicker};
use super::error::Result;
use super::filings::{DetailedFiling, Submission};
use super::financials::{FinancialReport, GrowthPoint, Metric};
use super::options::FilingOptions;
#[cfg(feature = "query")]
use super::query::{QueryFiling, QueryOptions, QueryResponse};
use async_trait::async_trait;

/// Company identifiers and XBRL facts.
#[async_trait]
pub trait CompanyOperations {
    /// Retrieves all company tickers known to the SEC.
    async fn company_tickers(&self) -> Result<Vec<CompanyTicker>>;
    /// Retrieves the ticker entry (CIK and title) for a ticker symbol.
    async fn company(&self, ticker: &str) -> Result<CompanyTicker>;
    /// Retrieves the Central Index Key (CIK) for a ticker symbol.
    async fn company_cik(&self, ticker: &str) -> Result<u64>;
    /// Retrieves every XBRL fact reported by a company.
    async fn company_facts(&self, cik: u64) -> Result<CompanyFacts>;
    /// Retrieves one concept's history using taxonomy and tag.
    async fn company_concept(&self, cik: u64, taxonomy: &str, tag: &str) -> Result<CompanyConcept>;
}

/// Submissions, filing lists and filing documents.
#[async_trait]
pub trait FilingOperations {
    /// Retrieves company metadata and recent filings for a CIK.
    async fn submissions(&self, cik: u64) -> Result<Submission>;
    /// Recent filings as a flat list, newest first.
    async fn get_recent_filings(&self, cik: u64) -> Result<Vec<DetailedFiling>>;
    /// Recent filings filtered by options.
    async fn filings(&self, cik: u64, opts: Option<FilingOptions>) -> Result<Vec<DetailedFiling>>;
    /// Up to `limit` 10-K filings, newest first.
    async fn annual_reports(&self, cik: u64, limit: usize) -> Result<Vec<DetailedFiling>>;
    /// The 10-K covering fiscal `year`, or the most recent one.
    async fn latest_annual_report(&self, cik: u64, year: Option<i32>) -> Result<DetailedFiling>;
    /// Archive URL of a document inside a filing.
    fn filing_url(&self, cik: u64, accession_number: &str, document: &str) -> String;
    /// Archive URL of a filing's primary document.
    fn primary_document_url(&self, cik: u64, filing: &DetailedFiling) -> Result<String>;
    /// Downloads a filing's primary document.
    async fn get_filing_content(&self, cik: u64, filing: &DetailedFiling) -> Result<String>;
}

/// Financial metrics, margins and growth derived from XBRL facts.
#[async_trait]
pub trait FinancialOperations {
    /// Metrics and margins for the 10-K covering fiscal `year` (latest if `None`).
    async fn financial_report(&self, ticker: &str, year: Option<i32>) -> Result<FinancialReport>;
    /// Year-over-year series for one metric.
    async fn growth(&self, ticker: &str, metric: Metric) -> Result<Vec<GrowthPoint>>;
}

/// Full-text filing queries through sec-api.io.
#[cfg(feature = "query")]
#[async_trait]
pub trait QueryOperations {
    /// Runs one query page.
    async fn query_filings(&self, options: &QueryOptions) -> Result<QueryResponse>;
    /// Pages through results until exhausted or `max` filings are collected.
    async fn query_all(&self, options: QueryOptions, max: usize) -> Result<Vec<QueryFiling>>;
}
