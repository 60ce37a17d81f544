use std::time::Duration;

use super::error::{EdgarError, Result};

/// SEC fair-access ceiling, in requests per second.
pub const MAX_RATE_LIMIT: u32 = 10;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Edgar client
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// User agent sent with every request, e.g. `"Jane Doe jane@example.com"`
    pub user_agent: String,
    /// Rate limit in requests per second
    pub rate_limit: u32,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Base URLs for the EDGAR services and sec-api.io
    pub base_urls: EdgarUrls,
    /// sec-api.io token, only needed for full-text queries
    pub sec_api_key: Option<String>,
}

/// Base URLs for the services the client talks to
#[derive(Debug, Clone)]
pub struct EdgarUrls {
    /// Base URL for EDGAR archives
    pub archives: String,
    /// Base URL for the EDGAR data API (submissions, XBRL)
    pub data: String,
    /// Base URL for EDGAR files (ticker mappings)
    pub files: String,
    /// sec-api.io query endpoint
    pub sec_api: String,
}

impl Default for EdgarUrls {
    fn default() -> Self {
        Self {
            archives: "https://www.sec.gov/Archives/edgar".to_string(),
            data: "https://data.sec.gov".to_string(),
            files: "https://www.sec.gov/files".to_string(),
            sec_api: "https://api.sec-api.io".to_string(),
        }
    }
}

impl EdgarConfig {
    /// Creates a config with SEC defaults: 10 requests/second and a 30 second timeout.
    ///
    /// ```rust
    /// use tenk::{Edgar, EdgarConfig};
    ///
    /// let config = EdgarConfig::new("Jane Doe jane@example.com");
    /// let edgar = Edgar::with_config(config)?;
    /// # Ok::<(), tenk::EdgarError>(())
    /// ```
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            rate_limit: MAX_RATE_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_urls: EdgarUrls::default(),
            sec_api_key: None,
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_urls(mut self, base_urls: EdgarUrls) -> Self {
        self.base_urls = base_urls;
        self
    }

    pub fn with_sec_api_key(mut self, key: impl Into<String>) -> Self {
        self.sec_api_key = Some(key.into());
        self
    }

    /// Reads the configuration from the process environment.
    ///
    /// | Variable             | Meaning                         | Default  |
    /// |----------------------|---------------------------------|----------|
    /// | `EDGAR_USER_AGENT`   | SEC-mandated identification     | required |
    /// | `EDGAR_RATE_LIMIT`   | requests per second             | `10`     |
    /// | `EDGAR_TIMEOUT_SECS` | HTTP timeout                    | `30`     |
    /// | `SEC_API_KEY`        | sec-api.io token                | none     |
    ///
    /// Loading a `.env` file is left to the caller.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading the same keys through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_agent = lookup("EDGAR_USER_AGENT").ok_or_else(|| {
            EdgarError::ConfigError(
                "EDGAR_USER_AGENT is required, e.g. \"Jane Doe jane@example.com\"".to_string(),
            )
        })?;

        let mut config = Self::new(user_agent);

        if let Some(raw) = lookup("EDGAR_RATE_LIMIT") {
            config.rate_limit = raw.trim().parse().map_err(|_| {
                EdgarError::ConfigError(format!("EDGAR_RATE_LIMIT is not a number: {}", raw))
            })?;
        }

        if let Some(raw) = lookup("EDGAR_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                EdgarError::ConfigError(format!("EDGAR_TIMEOUT_SECS is not a number: {}", raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        config.sec_api_key = lookup("SEC_API_KEY").filter(|k| !k.trim().is_empty());

        Ok(config)
    }

    /// Checks the settings the SEC cares about before any request is made.
    pub fn validate(&self) -> Result<()> {
        validate_user_agent(&self.user_agent)?;

        if self.rate_limit == 0 {
            return Err(EdgarError::ConfigError(
                "Rate limit must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit > MAX_RATE_LIMIT {
            return Err(EdgarError::ConfigError(format!(
                "Rate limit {} exceeds the SEC maximum of {} requests per second",
                self.rate_limit, MAX_RATE_LIMIT
            )));
        }

        Ok(())
    }
}

/// SEC.gov rejects anonymous automated traffic: the user agent has to name the
/// caller and carry a contact email, as in `"Sample Company admin@sample.com"`.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    let trimmed = user_agent.trim();
    let invalid = |reason: &str| {
        Err(EdgarError::ConfigError(format!(
            "Invalid user agent {:?}: {}. Expected \"Name email@example.com\"",
            user_agent, reason
        )))
    };

    if trimmed.is_empty() {
        return invalid("empty");
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return invalid("contains control characters");
    }

    match trimmed.split_whitespace().position(is_email) {
        None => invalid("no contact email"),
        Some(0) => invalid("no name before the email"),
        Some(_) => Ok(()),
    }
}

/// An `@` with text on both sides; `(...)` and `<...>` wrappers are ignored.
fn is_email(token: &str) -> bool {
    let token = token.trim_matches(|c| c == '(' || c == ')' || c == '<' || c == '>');
    token
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_user_agent_formats() {
        assert!(validate_user_agent("Jane Doe jane@example.com").is_ok());
        assert!(validate_user_agent("MyXBRLMarginsScript/1.0 me@example.org").is_ok());
        assert!(validate_user_agent("my_app/1.0 (my@email.com)").is_ok());

        assert!(validate_user_agent("").is_err());
        assert!(validate_user_agent("test_agent").is_err());
        assert!(validate_user_agent("jane@example.com").is_err());
        assert!(validate_user_agent("Jane jane@").is_err());
        assert!(validate_user_agent("Jane @example.com").is_err());
    }

    #[test]
    fn test_user_agent_domain_without_dot() {
        assert!(validate_user_agent("Jane jane@localhost").is_ok());
        assert!(validate_user_agent("Build bot <ci@intranet>").is_ok());
    }

    #[test]
    fn test_rate_limit_bounds() {
        let config = EdgarConfig::new("Jane jane@example.com");
        assert!(config.clone().with_rate_limit(0).validate().is_err());
        assert!(config.clone().with_rate_limit(11).validate().is_err());
        assert!(config.with_rate_limit(5).validate().is_ok());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = EdgarConfig::from_lookup(lookup_from(&[(
            "EDGAR_USER_AGENT",
            "Jane jane@example.com",
        )]))
        .unwrap();

        assert_eq!(config.rate_limit, 10);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.sec_api_key.is_none());
        assert_eq!(config.base_urls.data, "https://data.sec.gov");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = EdgarConfig::from_lookup(lookup_from(&[
            ("EDGAR_USER_AGENT", "Jane jane@example.com"),
            ("EDGAR_RATE_LIMIT", "4"),
            ("EDGAR_TIMEOUT_SECS", "90"),
            ("SEC_API_KEY", "abc123"),
        ]))
        .unwrap();

        assert_eq!(config.rate_limit, 4);
        assert_eq!(config.timeout, Duration::from_secs(90));
        assert_eq!(config.sec_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_from_lookup_errors() {
        assert!(matches!(
            EdgarConfig::from_lookup(lookup_from(&[])),
            Err(EdgarError::ConfigError(_))
        ));
        assert!(matches!(
            EdgarConfig::from_lookup(lookup_from(&[
                ("EDGAR_USER_AGENT", "Jane jane@example.com"),
                ("EDGAR_RATE_LIMIT", "fast"),
            ])),
            Err(EdgarError::ConfigError(_))
        ));
    }
}
