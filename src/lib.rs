//! # tenk - 10-K filings and XBRL financials from SEC EDGAR
//!
//! tenk downloads annual reports (Form 10-K) from the SEC's EDGAR system and
//! turns the XBRL data companies file alongside them into comparable metrics.
//!
//! ## Features
//!
//! - **Rate-limited HTTP client** - Complies with SEC.gov fair access rules (10 requests/second)
//! - **Company lookup** - Ticker to CIK resolution with a per-client cache
//! - **Filing discovery** - Submissions, 10-K selection by fiscal year, document URLs
//! - **Downloads** - Filing documents written to disk, several tickers at once
//! - **Financials** - Revenue, income, EBITDA and balance sheet totals from XBRL facts,
//!   with margins and growth
//! - **Income statements** - The statement table located inside 10-K HTML (`statements` feature)
//! - **Filing queries** - sec-api.io Query API client (`query` feature)
//!
//! ## Requirements
//!
//! tenk is async and needs a runtime; the crate is built and tested with
//! [tokio](https://tokio.rs). The SEC requires every client to identify itself
//! with a name and contact email in the User-Agent header.
//!
//! ## Basic Usage
//!
//! ```ignore
//! use tenk::{Edgar, FilingOperations, FinancialOperations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let edgar = Edgar::new("YourAppName contact@example.com")?;
//!
//!     // The five most recent 10-K filings of Progressive
//!     for filing in edgar.annual_reports(80661, 5).await? {
//!         println!("10-K filed {} for period {:?}", filing.filing_date, filing.report_date);
//!     }
//!
//!     // Margins for fiscal 2024
//!     let report = edgar.financial_report("PGR", Some(2024)).await?;
//!     println!("{:#?}", report.margins);
//!
//!     Ok(())
//! }
//! ```

mod company;
mod config;
mod core;
mod download;
mod error;
mod filings;
mod financials;
mod options;
#[cfg(feature = "query")]
mod query;
#[cfg(feature = "statements")]
mod statements;
mod traits;

pub use config::{EdgarConfig, EdgarUrls, MAX_RATE_LIMIT, validate_user_agent};
pub use core::Edgar;
pub use error::{EdgarError, Result};
pub use options::{FilingOptions, parse_date};

pub use company::{
    CompanyConcept, CompanyFacts, CompanyTicker, DataPoint, Fact, TaxonomyGroups, TickerIndex,
    normalize_ticker,
};
pub use download::{
    DEFAULT_DOWNLOAD_DIR, DownloadOptions, DownloadedFiling, Downloader, filing_file_name,
};
pub use filings::{
    ANNUAL_REPORT_FORM, DetailedFiling, FilingFile, FilingsData, RecentFilings, Submission,
    apply_options, select_annual_report,
};
pub use financials::{
    FinancialReport, Financials, GrowthPoint, Margins, Metric, MetricSource, MetricValue,
    PickedFact, growth_series, pick_fact,
};
#[cfg(feature = "query")]
pub use query::{
    MAX_PAGE_SIZE, MAX_RESULT_WINDOW, QueryFiling, QueryOptions, QueryResponse, QueryTotal,
    parse_query_response,
};
#[cfg(feature = "statements")]
pub use statements::{Scale, StatementTable, find_income_statement, parse_amount};

pub use traits::{CompanyOperations, FilingOperations, FinancialOperations};
#[cfg(feature = "query")]
pub use traits::QueryOperations;

/// Current crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
