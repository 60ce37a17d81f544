mod common;

use common::{edgar_for, json_fixture};
use std::path::Path;
use tenk::{DownloadOptions, Downloader, EdgarError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NEWEST: &str = "10K_2024-02-26_000008066124000010.htm";
const PRIOR: &str = "10K_2023-02-27_000008066123000012.htm";
const OLDEST: &str = "10K_2022-02-28_000008066122000009.htm";

/// Serves PGR's ticker entry and submissions plus two of its three 10-K
/// documents; the 2022 filing's document answers 404.
async fn sec_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/company_tickers.json"))
        .respond_with(json_fixture("tickers/company_tickers.json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/submissions/CIK0000080661.json"))
        .respond_with(json_fixture("submissions/submission.json"))
        .mount(&server)
        .await;

    for (accession, document) in [
        ("000008066124000010", "pgr-20231231.htm"),
        ("000008066123000012", "pgr-20221231.htm"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/Archives/edgar/data/80661/{}/{}", accession, document)))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<html>{}</html>", document)),
            )
            .mount(&server)
            .await;
    }
    server
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn failed_document_does_not_stop_the_rest() {
    let server = sec_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(edgar_for(&server), dir.path());

    let files = downloader.download("pgr", &DownloadOptions::new()).await.unwrap();

    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.ticker == "PGR" && !f.skipped));
    assert_eq!(files[0].path, dir.path().join("PGR").join(NEWEST));
    assert_eq!(
        std::fs::read_to_string(&files[1].path).unwrap(),
        "<html>pgr-20221231.htm</html>"
    );

    // Only finished documents land on disk, no leftovers from the failed one
    assert_eq!(file_names(&dir.path().join("PGR")), vec![PRIOR, NEWEST]);
    assert!(!dir.path().join("PGR").join(OLDEST).exists());
}

#[tokio::test]
async fn existing_files_are_skipped_unless_overwriting() {
    let server = sec_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(edgar_for(&server), dir.path());
    let newest = dir.path().join("PGR").join(NEWEST);

    downloader.download("PGR", &DownloadOptions::new()).await.unwrap();
    std::fs::write(&newest, "edited locally").unwrap();

    let again = downloader.download("PGR", &DownloadOptions::new()).await.unwrap();
    assert_eq!(again.len(), 2);
    assert!(again.iter().all(|f| f.skipped));
    assert_eq!(std::fs::read_to_string(&newest).unwrap(), "edited locally");

    let overwrite = DownloadOptions::new().with_overwrite(true);
    let replaced = downloader.download("PGR", &overwrite).await.unwrap();
    assert!(replaced.iter().all(|f| !f.skipped));
    assert_eq!(
        std::fs::read_to_string(&newest).unwrap(),
        "<html>pgr-20231231.htm</html>"
    );
}

#[tokio::test]
async fn interrupted_partial_file_is_not_counted_as_downloaded() {
    let server = sec_server().await;
    let dir = tempfile::tempdir().unwrap();
    let ticker_dir = dir.path().join("PGR");
    std::fs::create_dir_all(&ticker_dir).unwrap();
    std::fs::write(ticker_dir.join(format!("{}.part", NEWEST)), "<html>trunc").unwrap();

    let downloader = Downloader::new(edgar_for(&server), dir.path());
    let files = downloader.download("PGR", &DownloadOptions::new()).await.unwrap();

    assert!(files.iter().all(|f| !f.skipped));
    assert_eq!(
        std::fs::read_to_string(ticker_dir.join(NEWEST)).unwrap(),
        "<html>pgr-20231231.htm</html>"
    );
    assert_eq!(file_names(&ticker_dir), vec![PRIOR, NEWEST]);
}

#[tokio::test]
async fn download_many_keeps_input_order_and_isolates_failures() {
    let server = sec_server().await;
    let dir = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(edgar_for(&server), dir.path());

    let results = downloader
        .download_many(["NOPE", "pgr", "BRK-B"].as_slice(), &DownloadOptions::new(), 2)
        .await;

    let tickers: Vec<&str> = results.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(tickers, vec!["NOPE", "pgr", "BRK-B"]);

    assert!(matches!(&results[0].1, Err(EdgarError::TickerNotFound(t)) if t == "NOPE"));
    assert_eq!(results[1].1.as_ref().unwrap().len(), 2);
    // Berkshire's submissions are not served
    assert!(matches!(results[2].1, Err(EdgarError::NotFound)));
}
