use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    #[error("No 10-K filings found for CIK {0}")]
    NoAnnualReport(String),

    #[error("Filing {0} has no primary document")]
    MissingPrimaryDocument(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTML parsing error: {0}")]
    HtmlError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("An API key is required for sec-api.io queries (set SEC_API_KEY)")]
    MissingApiKey,

    #[error("sec-api.io returned an error: {0}")]
    ApiError(String),

    #[error(
        "Unexpected content type from URL {url}. Expected pattern {expected_pattern}, but got Content-Type: {got_content_type}. Content preview: {content_preview}..."
    )]
    UnexpectedContentType {
        url: String,
        expected_pattern: String,
        got_content_type: String,
        content_preview: String,
    },
}

pub type Result<T> = std::result::Result<T, EdgarError>;
