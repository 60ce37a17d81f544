use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn fixture_path(relative: impl AsRef<Path>) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(relative)
}

pub fn read_fixture(relative: impl AsRef<Path>) -> String {
    fs::read_to_string(fixture_path(relative)).expect("fixture file should be readable")
}

#[allow(dead_code)]
pub fn edgar() -> tenk::Edgar {
    tenk::Edgar::new("test_agent example@example.com").unwrap()
}

#[allow(dead_code)]
pub fn company_facts() -> tenk::CompanyFacts {
    serde_json::from_str(&read_fixture("tickers/companyfacts.json")).unwrap()
}

#[allow(dead_code)]
pub fn submission() -> tenk::Submission {
    serde_json::from_str(&read_fixture("submissions/submission.json")).unwrap()
}

/// Client whose EDGAR and sec-api.io base URLs all point at `server`.
#[allow(dead_code)]
pub fn edgar_for(server: &wiremock::MockServer) -> tenk::Edgar {
    let uri = server.uri();
    let urls = tenk::EdgarUrls {
        archives: format!("{}/Archives/edgar", uri),
        data: uri.clone(),
        files: format!("{}/files", uri),
        sec_api: format!("{}/query", uri),
    };
    let config = tenk::EdgarConfig::new("test_agent example@example.com")
        .with_base_urls(urls)
        .with_sec_api_key("test-key");
    tenk::Edgar::with_config(config).unwrap()
}

#[allow(dead_code)]
pub fn json_fixture(relative: impl AsRef<Path>) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200).set_body_raw(read_fixture(relative), "application/json")
}
