//! Company submissions and 10-K discovery.
//!
//! EDGAR's submissions API returns a company's recent filings as parallel
//! arrays (`form[i]`, `accessionNumber[i]`, `filingDate[i]`, ...). This module
//! zips those into [`DetailedFiling`] rows, filters them with
//! [`FilingOptions`], and picks the 10-K that matches a fiscal year.

use super::Edgar;
use super::error::{EdgarError, Result};
use super::options::FilingOptions;
use super::traits::FilingOperations;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;

pub const ANNUAL_REPORT_FORM: &str = "10-K";

#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub cik: String,
    #[serde(rename = "entityType", default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub sic: Option<String>,
    #[serde(rename = "sicDescription", default)]
    pub sic_description: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub exchanges: Vec<String>,
    #[serde(rename = "fiscalYearEnd", default)]
    pub fiscal_year_end: Option<String>,
    pub filings: FilingsData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilingsData {
    pub recent: RecentFilings,
    /// Older filings live in separate paginated files
    #[serde(default)]
    pub files: Vec<FilingFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilingFile {
    pub name: String,
    #[serde(rename = "filingCount")]
    pub filing_count: u64,
    #[serde(rename = "filingFrom")]
    pub filing_from: String,
    #[serde(rename = "filingTo")]
    pub filing_to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentFilings {
    #[serde(rename = "accessionNumber")]
    pub accession_number: Vec<String>,
    #[serde(rename = "filingDate")]
    pub filing_date: Vec<String>,
    #[serde(rename = "reportDate")]
    pub report_date: Option<Vec<String>>,
    #[serde(rename = "acceptanceDateTime")]
    pub acceptance_date_time: Vec<String>,
    pub form: Vec<String>,
    #[serde(rename = "fileNumber")]
    pub file_number: Option<Vec<String>>,
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub size: Vec<u64>,
    #[serde(rename = "isXBRL")]
    pub is_xbrl: Option<Vec<i32>>,
    #[serde(rename = "isInlineXBRL")]
    pub is_inline_xbrl: Option<Vec<i32>>,
    #[serde(rename = "primaryDocument")]
    pub primary_document: Option<Vec<String>>,
    #[serde(rename = "primaryDocDescription")]
    pub primary_doc_description: Option<Vec<String>>,
}

/// One row of a company's recent filings.
#[derive(Debug, Clone)]
pub struct DetailedFiling {
    pub accession_number: String,
    pub filing_date: String,
    /// Period of report, e.g. the fiscal year end of a 10-K
    pub report_date: Option<String>,
    pub acceptance_date_time: DateTime<FixedOffset>,
    pub form: String,
    pub file_number: Option<String>,
    pub items: Option<String>,
    pub size: u64,
    pub is_xbrl: bool,
    pub is_inline_xbrl: bool,
    pub primary_document: Option<String>,
    pub primary_doc_description: Option<String>,
}

impl DetailedFiling {
    /// Accession number as used in archive paths:
    /// `0000080661-24-000010` -> `000008066124000010`.
    pub fn accession_no_dashes(&self) -> String {
        self.accession_number.replace('-', "")
    }

    pub fn filing_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.filing_date, "%Y-%m-%d").ok()
    }

    /// Report dates the SEC left blank come through as empty strings.
    pub fn report_date(&self) -> Option<&str> {
        self.report_date.as_deref().filter(|d| !d.is_empty())
    }

    fn report_year(&self) -> Option<i32> {
        self.report_date()?.get(..4)?.parse().ok()
    }
}

impl RecentFilings {
    fn get_vec_item_at<T: Clone>(&self, vec_opt: &Option<Vec<T>>, idx: usize) -> Option<T> {
        vec_opt.as_ref().and_then(|v| v.get(idx).cloned())
    }

    fn get_bool_at(&self, vec_opt: &Option<Vec<i32>>, idx: usize) -> bool {
        vec_opt
            .as_ref()
            .and_then(|x| x.get(idx))
            .is_some_and(|v| *v == 1)
    }

    pub fn len(&self) -> usize {
        self.accession_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accession_number.is_empty()
    }
}

impl TryFrom<(&RecentFilings, usize)> for DetailedFiling {
    type Error = EdgarError;

    fn try_from((recent, idx): (&RecentFilings, usize)) -> Result<Self> {
        let acceptance = column_at(&recent.acceptance_date_time, idx, "acceptanceDateTime")?;
        let acceptance_date_time = DateTime::parse_from_rfc3339(&acceptance).map_err(|e| {
            EdgarError::InvalidResponse(format!("Bad acceptanceDateTime {:?}: {}", acceptance, e))
        })?;

        Ok(DetailedFiling {
            accession_number: column_at(&recent.accession_number, idx, "accessionNumber")?,
            filing_date: column_at(&recent.filing_date, idx, "filingDate")?,
            report_date: recent.get_vec_item_at(&recent.report_date, idx),
            acceptance_date_time,
            form: column_at(&recent.form, idx, "form")?,
            file_number: recent.get_vec_item_at(&recent.file_number, idx),
            items: recent.get_vec_item_at(&recent.items, idx),
            size: recent.size.get(idx).copied().unwrap_or(0),
            is_xbrl: recent.get_bool_at(&recent.is_xbrl, idx),
            is_inline_xbrl: recent.get_bool_at(&recent.is_inline_xbrl, idx),
            primary_document: recent
                .get_vec_item_at(&recent.primary_document, idx)
                .filter(|d| !d.is_empty()),
            primary_doc_description: recent.get_vec_item_at(&recent.primary_doc_description, idx),
        })
    }
}

fn column_at(column: &[String], idx: usize, name: &str) -> Result<String> {
    column.get(idx).cloned().ok_or_else(|| {
        EdgarError::InvalidResponse(format!("Filing row {} is missing '{}'", idx, name))
    })
}

impl Submission {
    /// Recent filings as rows. Malformed rows are skipped with a warning.
    pub fn recent_filings(&self) -> Vec<DetailedFiling> {
        let recent = &self.filings.recent;
        (0..recent.len())
            .filter_map(|idx| match DetailedFiling::try_from((recent, idx)) {
                Ok(filing) => Some(filing),
                Err(e) => {
                    tracing::warn!("Skipping filing row {} for CIK {}: {}", idx, self.cik, e);
                    None
                }
            })
            .collect()
    }
}

/// Applies form, date, offset and limit filters in that order.
pub fn apply_options(filings: Vec<DetailedFiling>, opts: &FilingOptions) -> Vec<DetailedFiling> {
    let has_date_window = opts.after.is_some() || opts.before.is_some();

    filings
        .into_iter()
        .filter(|f| opts.matches_form(&f.form))
        .filter(|f| {
            !has_date_window || f.filing_date().is_some_and(|date| opts.matches_date(date))
        })
        .skip(opts.offset.unwrap_or(0))
        .take(opts.limit.unwrap_or(usize::MAX))
        .collect()
}

/// Picks the 10-K that best matches `year` by period of report.
///
/// Only 10-K rows with a report date take part:
/// - no year: the latest report date;
/// - the latest report date within `year`;
/// - otherwise the latest report date before `year`;
/// - otherwise the latest report date overall.
pub fn select_annual_report(
    filings: &[DetailedFiling],
    year: Option<i32>,
) -> Option<&DetailedFiling> {
    let candidates: Vec<&DetailedFiling> = filings
        .iter()
        .filter(|f| f.form.trim() == ANNUAL_REPORT_FORM)
        .filter(|f| f.report_year().is_some())
        .collect();

    match year {
        None => latest_report(&candidates, |_| true),
        Some(year) => latest_report(&candidates, |y| y == year)
            .or_else(|| latest_report(&candidates, |y| y <= year))
            .or_else(|| latest_report(&candidates, |_| true)),
    }
}

/// Latest report date among `candidates`; on a tie the earlier row, i.e. the
/// most recently filed one, wins.
fn latest_report<'a>(
    candidates: &[&'a DetailedFiling],
    pred: impl Fn(i32) -> bool,
) -> Option<&'a DetailedFiling> {
    candidates
        .iter()
        .copied()
        .filter(|f| f.report_year().is_some_and(&pred))
        .reduce(|best, next| {
            if next.report_date() > best.report_date() {
                next
            } else {
                best
            }
        })
}

#[derive(Debug)]
enum UrlType {
    Submission,
    FilingDocument,
}

impl Edgar {
    fn build_url(&self, url_type: UrlType, params: &[&str]) -> String {
        match url_type {
            UrlType::Submission => {
                format!("{}/submissions/CIK{:0>10}.json", self.edgar_data_url, params[0])
            }
            UrlType::FilingDocument => {
                let (cik, acc_no, filename) = (params[0], params[1], params[2]);
                format!(
                    "{}/data/{}/{}/{}",
                    self.edgar_archives_url,
                    cik.trim_start_matches('0'),
                    acc_no.replace('-', ""),
                    filename
                )
            }
        }
    }
}

#[async_trait]
impl FilingOperations for Edgar {
    /// Company metadata plus the most recent filings (up to about a thousand rows).
    ///
    /// # Errors
    ///
    /// * `EdgarError::NotFound` - no such CIK.
    /// * `EdgarError::JsonError` - the response could not be parsed.
    async fn submissions(&self, cik: u64) -> Result<Submission> {
        let url = self.build_url(UrlType::Submission, &[&cik.to_string()]);
        let response = self.get(&url).await?;
        Ok(serde_json::from_str::<Submission>(&response)?)
    }

    async fn get_recent_filings(&self, cik: u64) -> Result<Vec<DetailedFiling>> {
        Ok(self.submissions(cik).await?.recent_filings())
    }

    /// Recent filings filtered by `opts`, newest first.
    async fn filings(&self, cik: u64, opts: Option<FilingOptions>) -> Result<Vec<DetailedFiling>> {
        let all_filings = self.get_recent_filings(cik).await?;
        Ok(match opts {
            Some(opts) => apply_options(all_filings, &opts),
            None => all_filings,
        })
    }

    /// Up to `limit` 10-K filings, newest first.
    async fn annual_reports(&self, cik: u64, limit: usize) -> Result<Vec<DetailedFiling>> {
        let opts = FilingOptions::new()
            .with_form_type(ANNUAL_REPORT_FORM)
            .with_limit(limit);
        self.filings(cik, Some(opts)).await
    }

    /// The 10-K for fiscal `year` (see [`select_annual_report`]), or the latest one.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::NoAnnualReport` if the company has no 10-K with a report date.
    async fn latest_annual_report(&self, cik: u64, year: Option<i32>) -> Result<DetailedFiling> {
        let filings = self.get_recent_filings(cik).await?;
        let selected = select_annual_report(&filings, year)
            .cloned()
            .ok_or_else(|| EdgarError::NoAnnualReport(cik.to_string()))?;
        tracing::debug!(
            "Selected 10-K {} (period {:?}) for CIK {} year {:?}",
            selected.accession_number,
            selected.report_date,
            cik,
            year
        );
        Ok(selected)
    }

    /// Archive URL for any document of a filing.
    fn filing_url(&self, cik: u64, accession_number: &str, document: &str) -> String {
        self.build_url(
            UrlType::FilingDocument,
            &[&cik.to_string(), accession_number, document],
        )
    }

    /// Archive URL of a filing's primary document.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::MissingPrimaryDocument` if the SEC lists none.
    fn primary_document_url(&self, cik: u64, filing: &DetailedFiling) -> Result<String> {
        let document = filing
            .primary_document
            .as_deref()
            .ok_or_else(|| EdgarError::MissingPrimaryDocument(filing.accession_number.clone()))?;
        Ok(self.filing_url(cik, &filing.accession_number, document))
    }

    /// Downloads a filing's primary document as text.
    async fn get_filing_content(&self, cik: u64, filing: &DetailedFiling) -> Result<String> {
        let url = self.primary_document_url(cik, filing)?;
        self.get(&url).await
    }
}
