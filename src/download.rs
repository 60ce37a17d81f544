//! Saving filings to disk.
//!
//! Files land in `{root}/{TICKER}/{FORM}_{filing_date}_{accession}.{ext}`, e.g.
//! `10K_downloads/PGR/10K_2024-02-27_000008066124000010.htm`. The extension
//! follows the filing's primary document, so HTML filings stay viewable.
//!
//! ```rust,no_run
//! use tenk::{DownloadOptions, Downloader, Edgar, FilingOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let edgar = Edgar::new("app_name contact@example.com")?;
//! let downloader = Downloader::new(edgar, "10K_downloads");
//! let filings = FilingOptions::new().with_form_type("10-K").with_limit(3);
//! let opts = DownloadOptions::new().with_filings(filings);
//! for file in downloader.download("PGR", &opts).await? {
//!     println!("{}", file.path.display());
//! }
//! # Ok(())
//! # }
//! ```

use super::Edgar;
use super::error::Result;
use super::filings::{ANNUAL_REPORT_FORM, DetailedFiling};
use super::options::FilingOptions;
use super::traits::{CompanyOperations, FilingOperations};
use futures_util::stream::{self, StreamExt};
use std::path::{Path, PathBuf};

pub const DEFAULT_DOWNLOAD_DIR: &str = "10K_downloads";
const DEFAULT_EXTENSION: &str = "txt";

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Which filings to fetch; without a form filter only 10-Ks are downloaded
    pub filings: FilingOptions,
    /// Re-download files that already exist
    pub overwrite: bool,
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filings(mut self, filings: FilingOptions) -> Self {
        self.filings = filings;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    fn filing_options(&self) -> FilingOptions {
        match self.filings.form_types {
            Some(_) => self.filings.clone(),
            None => self.filings.clone().with_form_type(ANNUAL_REPORT_FORM),
        }
    }
}

/// A filing document on disk.
#[derive(Debug, Clone)]
pub struct DownloadedFiling {
    pub ticker: String,
    pub path: PathBuf,
    pub filing: DetailedFiling,
    /// The file already existed and was left untouched
    pub skipped: bool,
}

/// Writes filing documents under a root directory, one folder per ticker.
#[derive(Debug, Clone)]
pub struct Downloader {
    edgar: Edgar,
    root: PathBuf,
}

impl Downloader {
    pub fn new(edgar: Edgar, root: impl Into<PathBuf>) -> Self {
        Self {
            edgar,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Downloads the primary documents of a ticker's filings matching `opts`.
    ///
    /// A document that fails to download is logged and skipped; the rest of
    /// the ticker's filings are still fetched.
    ///
    /// # Errors
    ///
    /// * `EdgarError::TickerNotFound` - the ticker is not in the SEC table.
    /// * `EdgarError::FileError` - the ticker directory cannot be created.
    /// * Any error from fetching the company's submissions.
    pub async fn download(
        &self,
        ticker: &str,
        opts: &DownloadOptions,
    ) -> Result<Vec<DownloadedFiling>> {
        let company = self.edgar.company(ticker).await?;
        let filings = self
            .edgar
            .filings(company.cik, Some(opts.filing_options()))
            .await?;
        tracing::info!(
            "Found {} matching filings for {} (CIK {})",
            filings.len(),
            company.ticker,
            company.cik
        );

        let dir = self.root.join(&company.ticker);
        tokio::fs::create_dir_all(&dir).await?;

        let mut downloaded = Vec::with_capacity(filings.len());
        for filing in filings {
            let path = dir.join(filing_file_name(&filing));

            if !opts.overwrite && tokio::fs::try_exists(&path).await? {
                tracing::debug!("Skipping existing {}", path.display());
                downloaded.push(DownloadedFiling {
                    ticker: company.ticker.clone(),
                    path,
                    filing,
                    skipped: true,
                });
                continue;
            }

            match self.save(company.cik, &filing, &path).await {
                Ok(bytes) => {
                    tracing::info!("Saved {} ({} bytes)", path.display(), bytes);
                    downloaded.push(DownloadedFiling {
                        ticker: company.ticker.clone(),
                        path,
                        filing,
                        skipped: false,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to download {} {} for {}: {}",
                        filing.form,
                        filing.accession_number,
                        company.ticker,
                        e
                    );
                }
            }
        }

        Ok(downloaded)
    }

    /// Writes to a `.part` sibling first, so an interrupted run never leaves a
    /// truncated file under the final name.
    async fn save(&self, cik: u64, filing: &DetailedFiling, path: &Path) -> Result<usize> {
        let url = self.edgar.primary_document_url(cik, filing)?;
        let content = self.edgar.get_bytes(&url).await?;

        let partial = partial_path(path);
        let written = async {
            tokio::fs::write(&partial, &content).await?;
            tokio::fs::rename(&partial, path).await
        }
        .await;
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                tracing::debug!("Could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(content.len())
    }

    /// Downloads several tickers, at most `concurrency` at a time.
    ///
    /// Results come back in input order. One ticker failing does not affect the
    /// others, and all requests still share the client's rate limit.
    pub async fn download_many<S>(
        &self,
        tickers: &[S],
        opts: &DownloadOptions,
        concurrency: usize,
    ) -> Vec<(String, Result<Vec<DownloadedFiling>>)>
    where
        S: AsRef<str>,
    {
        stream::iter(tickers)
            .map(|ticker| async move {
                let ticker = ticker.as_ref();
                let result = self.download(ticker, opts).await;
                if let Err(e) = &result {
                    tracing::error!("{} failed: {}", ticker, e);
                }
                (ticker.to_string(), result)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// File name for a filing: form without punctuation, filing date, accession
/// number without dashes, and the primary document's extension.
pub fn filing_file_name(filing: &DetailedFiling) -> String {
    let form: String = filing
        .form
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let extension = filing
        .primary_document
        .as_deref()
        .and_then(|doc| Path::new(doc).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(DEFAULT_EXTENSION);

    format!(
        "{}_{}_{}.{}",
        form,
        filing.filing_date,
        filing.accession_no_dashes(),
        extension.to_ascii_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn filing(form: &str, primary_document: Option<&str>) -> DetailedFiling {
        DetailedFiling {
            accession_number: "0000080661-24-000010".to_string(),
            filing_date: "2024-02-27".to_string(),
            report_date: Some("2023-12-31".to_string()),
            acceptance_date_time: DateTime::parse_from_rfc3339("2024-02-27T16:05:11.000Z").unwrap(),
            form: form.to_string(),
            file_number: None,
            items: None,
            size: 0,
            is_xbrl: true,
            is_inline_xbrl: true,
            primary_document: primary_document.map(str::to_string),
            primary_doc_description: None,
        }
    }

    #[test]
    fn test_filing_file_name() {
        assert_eq!(
            filing_file_name(&filing("10-K", Some("pgr-20231231.htm"))),
            "10K_2024-02-27_000008066124000010.htm"
        );
        assert_eq!(
            filing_file_name(&filing("10-K/A", Some("amendment.HTML"))),
            "10KA_2024-02-27_000008066124000010.html"
        );
        assert_eq!(
            filing_file_name(&filing("10-K", None)),
            "10K_2024-02-27_000008066124000010.txt"
        );
        assert_eq!(
            filing_file_name(&filing("10-K405", Some("0000950123-02-001234"))),
            "10K405_2024-02-27_000008066124000010.txt"
        );
    }

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("10K_downloads/PGR/10K_2024-02-27_000008066124000010.htm")),
            Path::new("10K_downloads/PGR/10K_2024-02-27_000008066124000010.htm.part")
        );
    }

    #[test]
    fn test_default_form_is_annual_report() {
        let opts = DownloadOptions::new();
        assert_eq!(
            opts.filing_options().form_types,
            Some(vec![ANNUAL_REPORT_FORM.to_string()])
        );

        let opts = DownloadOptions::new().with_filings(FilingOptions::new().with_form_type("10-Q"));
        assert_eq!(opts.filing_options().form_types, Some(vec!["10-Q".to_string()]));
    }
}
