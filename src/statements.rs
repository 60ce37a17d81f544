//! Locating the income statement inside a 10-K HTML document.
//!
//! 10-K primary documents are large hand-formatted HTML files with hundreds of
//! tables. The income statement is found heuristically: the first table that
//! follows a text node naming the statement, falling back to the table with the
//! most text when no heading matches.

use super::Edgar;
use super::error::{EdgarError, Result};
use super::traits::{CompanyOperations, FilingOperations};
use scraper::{ElementRef, Html, Node, Selector};

const STATEMENT_HEADINGS: &[&str] = &[
    "CONSOLIDATED STATEMENTS OF OPERATIONS",
    "CONSOLIDATED STATEMENTS OF INCOME",
    "CONSOLIDATED STATEMENTS OF EARNINGS",
    "CONSOLIDATED STATEMENTS OF COMPREHENSIVE INCOME",
    "STATEMENTS OF OPERATIONS",
    "STATEMENTS OF INCOME",
];

const MAX_NOTES: usize = 8;

/// Scale declared by a statement, e.g. "(in millions, except per share data)".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Thousands,
    Millions,
    Billions,
}

impl Scale {
    pub fn multiplier(self) -> f64 {
        match self {
            Scale::Thousands => 1e3,
            Scale::Millions => 1e6,
            Scale::Billions => 1e9,
        }
    }
}

/// An HTML table reduced to rows of cell text.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTable {
    /// Heading text the table was found under, if any
    pub heading: Option<String>,
    /// Text between the heading and the table, such as the units line
    pub notes: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Raw HTML of the `<table>` element
    pub html: String,
}

impl StatementTable {
    fn from_element(
        table: ElementRef<'_>,
        heading: Option<String>,
        notes: Vec<String>,
    ) -> Result<Self> {
        let sel_tr = selector("tr")?;
        let sel_cell = selector("td, th")?;

        let rows = table
            .select(&sel_tr)
            .map(|tr| {
                tr.select(&sel_cell)
                    .map(|cell| norm_text(&cell.text().collect::<Vec<_>>().join(" ")))
                    .collect()
            })
            .collect();

        Ok(Self {
            heading,
            notes,
            rows,
            html: table.html(),
        })
    }

    /// Tab-separated rows; rows without any text are dropped.
    pub fn to_tsv(&self) -> String {
        self.rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The declared scale, looked up around the heading and then in the table text.
    pub fn units_note(&self) -> Option<Scale> {
        self.heading
            .iter()
            .chain(&self.notes)
            .chain(self.rows.iter().flatten())
            .find_map(|text| detect_scale(text))
    }

    /// First row whose label contains `label` (case-insensitive), with its amounts parsed.
    pub fn find_row(&self, label: &str) -> Option<(&str, Vec<f64>)> {
        let wanted = label.to_lowercase();
        self.rows.iter().find_map(|row| {
            let (first, rest) = row.split_first()?;
            if !first.to_lowercase().contains(&wanted) {
                return None;
            }
            Some((first.as_str(), rest.iter().filter_map(|c| parse_amount(c)).collect()))
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| EdgarError::HtmlError(format!("Bad selector {:?}: {:?}", css, e)))
}

fn norm_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Matches "in millions" as well as the bare "(millions" some filers use.
fn detect_scale(text: &str) -> Option<Scale> {
    let text = text.to_lowercase();
    let says = |unit: &str| {
        text.contains(&format!("in {}", unit)) || text.contains(&format!("({}", unit))
    };
    if says("thousands") {
        Some(Scale::Thousands)
    } else if says("millions") {
        Some(Scale::Millions)
    } else if says("billions") {
        Some(Scale::Billions)
    } else {
        None
    }
}

/// Finds the income statement table in a 10-K HTML document.
///
/// Returns `Ok(None)` only when the document has no tables at all.
pub fn find_income_statement(html: &str) -> Result<Option<StatementTable>> {
    let document = Html::parse_document(html);

    let mut heading: Option<String> = None;
    let mut notes = Vec::new();
    for node in document.root_element().descendants() {
        match node.value() {
            Node::Text(text) => {
                let text = norm_text(text);
                if text.is_empty() {
                    continue;
                }
                if heading.is_some() {
                    if notes.len() < MAX_NOTES {
                        notes.push(text);
                    }
                } else if STATEMENT_HEADINGS
                    .iter()
                    .any(|h| text.to_uppercase().contains(h))
                {
                    heading = Some(text);
                }
            }
            Node::Element(element) if heading.is_some() && element.name() == "table" => {
                if let Some(table) = ElementRef::wrap(node) {
                    tracing::debug!("Income statement table found under {:?}", heading);
                    return StatementTable::from_element(table, heading, notes).map(Some);
                }
            }
            _ => {}
        }
    }

    let sel_table = selector("table")?;
    let largest = document
        .select(&sel_table)
        .max_by_key(|table| norm_text(&table.text().collect::<Vec<_>>().join(" ")).len());

    match largest {
        Some(table) => {
            tracing::debug!("No statement heading found, using the largest table");
            StatementTable::from_element(table, None, Vec::new()).map(Some)
        }
        None => Ok(None),
    }
}

/// Parses a financial statement amount.
///
/// Parentheses mean negative, currency signs and thousands separators are
/// ignored, and dashes or blanks mean no value: `"(1,234)"` is `-1234.0`.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    let negative = cleaned.starts_with('(');
    let digits = cleaned.trim_start_matches('(').trim_end_matches(')');
    if digits.is_empty() || digits.chars().all(|c| matches!(c, '-' | '—' | '–')) {
        return None;
    }

    let value = digits.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negative { -value } else { value })
}

impl Edgar {
    /// Downloads the 10-K for `year` (latest if `None`) and extracts its income statement.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::HtmlError` when the document contains no tables.
    pub async fn income_statement(
        &self,
        ticker: &str,
        year: Option<i32>,
    ) -> Result<StatementTable> {
        let cik = self.company_cik(ticker).await?;
        let filing = self.latest_annual_report(cik, year).await?;
        let html = self.get_filing_content(cik, &filing).await?;

        find_income_statement(&html)?.ok_or_else(|| {
            EdgarError::HtmlError(format!("No tables in 10-K {}", filing.accession_number))
        })
    }
}
