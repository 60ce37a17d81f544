use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tenk::{
    CompanyOperations, DEFAULT_DOWNLOAD_DIR, DownloadOptions, Downloader, Edgar, EdgarConfig,
    FilingOptions, FinancialOperations, Margins, Metric, MetricValue, QueryOperations,
    QueryOptions, parse_date,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tenk")]
#[command(about = "Download 10-K filings and compute financial metrics from SEC EDGAR")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Identification sent to the SEC, e.g. "Jane Doe jane@example.com"
    #[arg(long, global = true)]
    user_agent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the CIK and registered name for a ticker
    Cik { ticker: String },
    /// Download filing documents for one or more tickers
    Download {
        #[arg(required = true)]
        tickers: Vec<String>,

        #[arg(long, default_value = "10-K")]
        form: String,

        /// Maximum filings per ticker
        #[arg(short, long)]
        limit: Option<usize>,

        /// Earliest filing date (YYYY-MM-DD)
        #[arg(long)]
        after: Option<String>,

        /// Latest filing date (YYYY-MM-DD)
        #[arg(long)]
        before: Option<String>,

        /// Include amendments such as 10-K/A
        #[arg(long)]
        amendments: bool,

        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,

        #[arg(short, long, default_value = DEFAULT_DOWNLOAD_DIR)]
        out: PathBuf,

        /// Tickers downloaded at the same time
        #[arg(long, default_value_t = 3)]
        concurrency: usize,
    },
    /// Key financial metrics from XBRL facts
    Financials {
        ticker: String,
        /// Fiscal year (latest 10-K if omitted)
        year: Option<i32>,
        #[arg(long)]
        json: bool,
    },
    /// Net, gross, operating and EBITDA margins
    Margins { ticker: String, year: Option<i32> },
    /// Year-over-year series for one metric
    Growth {
        ticker: String,
        #[arg(short, long, default_value = "net_sales")]
        metric: Metric,
    },
    /// Income statement table from the 10-K document
    Statement {
        ticker: String,
        year: Option<i32>,
        /// Write the table as TSV instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Query filings through sec-api.io (needs SEC_API_KEY)
    Query {
        #[arg(long, default_value = "10-K")]
        form: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = 10)]
        size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenk=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let edgar = client(cli.user_agent)?;

    match cli.command {
        Commands::Cik { ticker } => {
            let company = edgar.company(&ticker).await?;
            println!("{}\t{}\t{}", company.ticker, company.padded_cik(), company.title);
        }
        Commands::Download {
            tickers,
            form,
            limit,
            after,
            before,
            amendments,
            overwrite,
            out,
            concurrency,
        } => {
            let mut filings = FilingOptions::new()
                .with_form_type(form)
                .with_include_amendments(amendments);
            if let Some(limit) = limit {
                filings = filings.with_limit(limit);
            }
            if let Some(after) = after {
                filings = filings.with_after(parse_date(&after)?);
            }
            if let Some(before) = before {
                filings = filings.with_before(parse_date(&before)?);
            }
            let opts = DownloadOptions::new()
                .with_filings(filings)
                .with_overwrite(overwrite);

            let downloader = Downloader::new(edgar, out);
            let mut failed = 0;
            let results = downloader
                .download_many(tickers.as_slice(), &opts, concurrency)
                .await;
            for (ticker, result) in results {
                match result {
                    Ok(files) => {
                        let skipped = files.iter().filter(|f| f.skipped).count();
                        println!(
                            "{}: {} files ({} already present)",
                            ticker,
                            files.len(),
                            skipped
                        );
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}: {}", ticker, e);
                    }
                }
            }
            println!("Files saved in {}", downloader.root().display());
            if failed == tickers.len() {
                anyhow::bail!("all downloads failed");
            }
        }
        Commands::Financials { ticker, year, json } => {
            let report = edgar.financial_report(&ticker, year).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} (CIK {}) 10-K {} period {}",
                    report.entity_name,
                    report.cik,
                    report.accession_number,
                    report.report_date.as_deref().unwrap_or("unknown")
                );
                for metric in Metric::ALL {
                    print_metric(metric, report.financials.get(metric));
                }
                print_margins(&report.margins);
            }
        }
        Commands::Margins { ticker, year } => {
            let report = edgar.financial_report(&ticker, year).await?;
            println!(
                "{} fiscal year ending {}",
                report.ticker,
                report.report_date.as_deref().unwrap_or("unknown")
            );
            print_margins(&report.margins);
        }
        Commands::Growth { ticker, metric } => {
            for point in edgar.growth(&ticker, metric).await? {
                let change = point
                    .change
                    .map(|c| format!("{:+.2}%", c * 100.0))
                    .unwrap_or_else(|| "N/A".to_string());
                println!("{}\t{:>20.0}\t{}", point.end, point.value, change);
            }
        }
        Commands::Statement { ticker, year, out } => {
            let table = edgar.income_statement(&ticker, year).await?;
            if let Some(scale) = table.units_note() {
                eprintln!("Amounts in {:?}", scale);
            }
            match out {
                Some(path) => {
                    std::fs::write(&path, table.to_tsv())
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Saved {}", path.display());
                }
                None => println!("{}", table.to_tsv()),
            }
        }
        Commands::Query {
            form,
            from,
            to,
            size,
        } => {
            let options = QueryOptions::new()
                .with_form_type(form)
                .with_date_range(&from, &to)?
                .with_size(size);
            let response = edgar.query_filings(&options).await?;
            println!("{} matching filings", response.total.value);
            for filing in response.filings {
                println!("Company: {}", filing.company_name);
                println!("Filing Date: {}", filing.filed_at);
                println!("URL: {}", filing.link_to_filing_details.as_deref().unwrap_or("-"));
                println!("{}", "-".repeat(50));
            }
        }
    }

    Ok(())
}

/// `--user-agent` wins over `EDGAR_USER_AGENT`; everything else comes from the environment.
fn client(user_agent: Option<String>) -> anyhow::Result<Edgar> {
    let config = EdgarConfig::from_lookup(|key| match key {
        "EDGAR_USER_AGENT" => user_agent.clone().or_else(|| std::env::var(key).ok()),
        _ => std::env::var(key).ok(),
    })
    .context("set EDGAR_USER_AGENT or pass --user-agent")?;
    Ok(Edgar::with_config(config)?)
}

fn print_metric(metric: Metric, value: Option<&MetricValue>) {
    match value {
        Some(v) => println!("  {:<30} {:>20.0}  ({})", metric.as_str(), v.value, v.origin()),
        None => println!("  {:<30} {:>20}", metric.as_str(), "N/A"),
    }
}

fn print_margins(margins: &Margins) {
    let rows = [
        ("net_margin", margins.net_margin),
        ("gross_margin", margins.gross_margin),
        ("operating_margin", margins.operating_margin),
        ("ebitda_margin", margins.ebitda_margin),
    ];
    for (name, value) in rows {
        match value {
            Some(v) => println!("  {}: {:.4} ({:.2}%)", name, v, v * 100.0),
            None => println!("  {}: N/A", name),
        }
    }
}
