use chrono::NaiveDate;

use super::error::{EdgarError, Result};

/// Options for filtering a company's filings.
///
/// Filters apply in this order: form type, filing-date window, offset, limit.
/// The filing list keeps EDGAR's newest-first order throughout.
///
/// ```rust
/// use tenk::FilingOptions;
///
/// let opts = FilingOptions::new()
///     .with_form_type("10-K")
///     .with_date_range("2019-01-01", "2024-12-31")?
///     .with_limit(5);
/// # Ok::<(), tenk::EdgarError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilingOptions {
    pub form_types: Option<Vec<String>>,
    /// Also match amendments, so `10-K` matches `10-K/A`. Defaults to false.
    pub include_amendments: bool,
    /// Earliest filing date, inclusive
    pub after: Option<NaiveDate>,
    /// Latest filing date, inclusive
    pub before: Option<NaiveDate>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl FilingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form_type(mut self, form_type: impl Into<String>) -> Self {
        self.form_types = Some(vec![form_type.into()]);
        self
    }

    pub fn with_form_types(mut self, form_types: Vec<String>) -> Self {
        self.form_types = Some(form_types);
        self
    }

    pub fn with_include_amendments(mut self, include_amendments: bool) -> Self {
        self.include_amendments = include_amendments;
        self
    }

    pub fn with_after(mut self, after: NaiveDate) -> Self {
        self.after = Some(after);
        self
    }

    pub fn with_before(mut self, before: NaiveDate) -> Self {
        self.before = Some(before);
        self
    }

    /// Sets both bounds from `YYYY-MM-DD` strings.
    pub fn with_date_range(self, after: &str, before: &str) -> Result<Self> {
        Ok(self
            .with_after(parse_date(after)?)
            .with_before(parse_date(before)?))
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `form` passes the form-type filter. No filter matches everything.
    pub fn matches_form(&self, form: &str) -> bool {
        let form = form.trim();
        match &self.form_types {
            None => true,
            Some(types) => types.iter().any(|ft| {
                let ft = ft.trim();
                form.eq_ignore_ascii_case(ft)
                    || (self.include_amendments
                        && form
                            .strip_suffix("/A")
                            .is_some_and(|base| base.eq_ignore_ascii_case(ft)))
            }),
        }
    }

    /// Whether a filing date falls inside the `after`/`before` window.
    pub fn matches_date(&self, filing_date: NaiveDate) -> bool {
        self.after.is_none_or(|after| filing_date >= after)
            && self.before.is_none_or(|before| filing_date <= before)
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| EdgarError::InvalidDate(format!("{:?}: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_filter_exact() {
        let opts = FilingOptions::new().with_form_type("10-K");
        assert!(opts.matches_form("10-K"));
        assert!(opts.matches_form(" 10-k "));
        assert!(!opts.matches_form("10-K/A"));
        assert!(!opts.matches_form("10-KT"));
        assert!(!opts.matches_form("10-Q"));
    }

    #[test]
    fn test_form_filter_with_amendments() {
        let opts = FilingOptions::new()
            .with_form_type("10-K")
            .with_include_amendments(true);
        assert!(opts.matches_form("10-K"));
        assert!(opts.matches_form("10-K/A"));
        assert!(!opts.matches_form("10-Q/A"));
    }

    #[test]
    fn test_no_form_filter_matches_all() {
        assert!(FilingOptions::new().matches_form("8-K"));
    }

    #[test]
    fn test_date_window_is_inclusive() {
        let opts = FilingOptions::new()
            .with_date_range("2020-01-01", "2020-12-31")
            .unwrap();
        assert!(opts.matches_date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
        assert!(opts.matches_date(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap()));
        assert!(!opts.matches_date(NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()));
        assert!(!opts.matches_date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()));
    }

    #[test]
    fn test_invalid_date() {
        assert!(matches!(
            FilingOptions::new().with_date_range("2020-13-01", "2020-12-31"),
            Err(EdgarError::InvalidDate(_))
        ));
    }
}
