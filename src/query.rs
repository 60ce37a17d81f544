//! Filing queries through the sec-api.io Query API.
//!
//! sec-api.io indexes EDGAR filings and accepts Lucene query strings such as
//! `formType:"10-K" AND filedAt:[2025-01-01 TO 2025-01-09]`. Requests need an
//! API key, set with [`EdgarConfig::with_sec_api_key`](crate::EdgarConfig::with_sec_api_key)
//! or the `SEC_API_KEY` environment variable.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tenk::{Edgar, EdgarConfig, QueryOperations, QueryOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EdgarConfig::new("app_name contact@example.com").with_sec_api_key("YOUR_KEY");
//! let edgar = Edgar::with_config(config)?;
//!
//! let options = QueryOptions::new()
//!     .with_form_type("10-K")
//!     .with_date_range("2025-01-01", "2025-01-09")?
//!     .with_size(10);
//!
//! for filing in edgar.query_filings(&options).await?.filings {
//!     println!("{} filed {} ({})", filing.company_name, filing.filed_at, filing.form_type);
//! }
//! # Ok(())
//! # }
//! ```

use super::Edgar;
use super::error::{EdgarError, Result};
use super::options::parse_date;
use super::traits::QueryOperations;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

/// Largest page the Query API returns.
pub const MAX_PAGE_SIZE: usize = 50;
/// The API refuses to page past this many results for one query.
pub const MAX_RESULT_WINDOW: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub total: QueryTotal,
    #[serde(default)]
    pub filings: Vec<QueryFiling>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryTotal {
    pub value: u64,
    /// `"gte"` when the count is a lower bound
    #[serde(default)]
    pub relation: Option<String>,
}

/// One filing as indexed by sec-api.io.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFiling {
    #[serde(default)]
    pub id: Option<String>,
    pub accession_no: String,
    pub cik: String,
    #[serde(default)]
    pub ticker: Option<String>,
    pub company_name: String,
    pub form_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Acceptance timestamp with offset, e.g. `2025-01-08T16:30:12-05:00`
    pub filed_at: String,
    #[serde(default)]
    pub period_of_report: Option<String>,
    #[serde(default)]
    pub link_to_txt: Option<String>,
    #[serde(default)]
    pub link_to_html: Option<String>,
    #[serde(default)]
    pub link_to_filing_details: Option<String>,
}

/// Query builder. Results are sorted by `filedAt`, newest first unless changed.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub form_types: Vec<String>,
    pub ticker: Option<String>,
    pub cik: Option<u64>,
    pub filed_from: Option<NaiveDate>,
    pub filed_to: Option<NaiveDate>,
    /// Offset of the first result
    pub from: usize,
    pub size: usize,
    pub newest_first: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            form_types: Vec::new(),
            ticker: None,
            cik: None,
            filed_from: None,
            filed_to: None,
            from: 0,
            size: MAX_PAGE_SIZE,
            newest_first: true,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        self.form_types = vec![form_type.into()];
        self
    }

    pub fn with_form_types(mut self, form_types: Vec<String>) -> Self {
        self.form_types = form_types;
        self
    }

    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    pub fn with_cik(mut self, cik: u64) -> Self {
        self.cik = Some(cik);
        self
    }

    /// Restricts `filedAt` to an inclusive `YYYY-MM-DD` range.
    pub fn with_date_range(mut self, from: &str, to: &str) -> Result<Self> {
        self.filed_from = Some(parse_date(from)?);
        self.filed_to = Some(parse_date(to)?);
        Ok(self)
    }

    pub fn with_from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    /// Page size, clamped to `1..=50`.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_newest_first(mut self, newest_first: bool) -> Self {
        self.newest_first = newest_first;
        self
    }

    /// Renders the Lucene query string.
    pub fn to_lucene(&self) -> String {
        let mut clauses = Vec::new();

        match self.form_types.as_slice() {
            [] => {}
            [form] => clauses.push(format!("formType:\"{}\"", form)),
            forms => {
                let quoted: Vec<String> = forms.iter().map(|f| format!("\"{}\"", f)).collect();
                clauses.push(format!("formType:({})", quoted.join(" OR ")));
            }
        }

        if let Some(ref ticker) = self.ticker {
            clauses.push(format!("ticker:{}", ticker.to_uppercase()));
        }

        if let Some(cik) = self.cik {
            clauses.push(format!("cik:{}", cik));
        }

        if self.filed_from.is_some() || self.filed_to.is_some() {
            let bound = |d: Option<NaiveDate>| d.map_or_else(|| "*".to_string(), |d| d.to_string());
            clauses.push(format!(
                "filedAt:[{} TO {}]",
                bound(self.filed_from),
                bound(self.filed_to)
            ));
        }

        if clauses.is_empty() {
            "*:*".to_string()
        } else {
            clauses.join(" AND ")
        }
    }

    /// JSON request body for the Query API.
    pub fn to_body(&self) -> serde_json::Value {
        json!({
            "query": { "query_string": { "query": self.to_lucene() } },
            "from": self.from.to_string(),
            "size": self.size.clamp(1, MAX_PAGE_SIZE).to_string(),
            "sort": [{ "filedAt": { "order": if self.newest_first { "desc" } else { "asc" } } }]
        })
    }
}

/// Parses a Query API body, surfacing `{"error": ...}` replies as `ApiError`.
pub fn parse_query_response(body: &str) -> Result<QueryResponse> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(error) = value.get("error") {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(EdgarError::ApiError(message));
    }
    Ok(serde_json::from_value(value)?)
}

impl Edgar {
    fn query_url(&self) -> Result<String> {
        let key = self.sec_api_key.as_deref().ok_or(EdgarError::MissingApiKey)?;
        let query = serde_urlencoded::to_string(&[("token", key)])
            .map_err(|e| EdgarError::InvalidResponse(e.to_string()))?;
        Ok(format!("{}?{}", self.sec_api_url, query))
    }
}

#[async_trait]
impl QueryOperations for Edgar {
    /// Runs one page of a query.
    ///
    /// # Errors
    ///
    /// * `EdgarError::MissingApiKey` - no sec-api.io key configured.
    /// * `EdgarError::ApiError` - the API answered with an error message.
    async fn query_filings(&self, options: &QueryOptions) -> Result<QueryResponse> {
        let url = self.query_url()?;
        tracing::debug!("Query API: {}", options.to_lucene());
        let body = self.post_json(&url, &options.to_body()).await?;
        parse_query_response(&body)
    }

    /// Pages through a query until the total, `max`, or the API's result window is reached.
    async fn query_all(&self, mut options: QueryOptions, max: usize) -> Result<Vec<QueryFiling>> {
        let mut filings = Vec::new();

        while filings.len() < max && options.from < MAX_RESULT_WINDOW {
            let page = self.query_filings(&options).await?;
            let total = usize::try_from(page.total.value).unwrap_or(usize::MAX);
            let received = page.filings.len();
            filings.extend(page.filings);

            tracing::debug!(
                "Query page from {}: {} filings ({} total)",
                options.from,
                received,
                total
            );

            options.from += received;
            if received == 0 || options.from >= total {
                break;
            }
        }

        filings.truncate(max);
        tracing::info!("Query returned {} filings", filings.len());
        Ok(filings)
    }
}
