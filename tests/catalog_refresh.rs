use httpmock::Method::GET;
use httpmock::MockServer;

use reqwest::blocking::Client;
use std::fs;
use std::time::{Duration, SystemTime};

use randmap::catalog::refresh_catalog_with_client;
use randmap::config::Config;

const CATALOG: &str = r#"<?xml version="1.0"?><files><file id="czg07" type="1"><title>Insomnia</title></file></files>"#;

fn config_for(server: &MockServer, dir: &std::path::Path) -> Config {
    Config {
        catalog_url: server.url("/reviews/quaddicted_database.xml"),
        catalog_path: dir.join("database.xml"),
        quiet: 1,
        ..Default::default()
    }
}

fn age_file(path: &std::path::Path, age: Duration) {
    let f = fs::File::options().write(true).open(path).unwrap();
    f.set_modified(SystemTime::now() - age).unwrap();
}

#[test]
fn second_refresh_within_window_is_a_no_op() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/reviews/quaddicted_database.xml");
        then.status(200).body(CATALOG);
    });
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&server, tmp.path());
    let client = Client::new();

    assert!(refresh_catalog_with_client(&config, &client).unwrap());
    assert!(!refresh_catalog_with_client(&config, &client).unwrap());

    assert_eq!(mock.calls(), 1);
    assert_eq!(fs::read_to_string(&config.catalog_path).unwrap(), CATALOG);
}

#[test]
fn stale_catalog_is_overwritten() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/reviews/quaddicted_database.xml");
        then.status(200).body(CATALOG);
    });
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&server, tmp.path());
    fs::write(&config.catalog_path, "<files>old contents that are longer than the new ones, much longer</files>").unwrap();
    age_file(&config.catalog_path, Duration::from_secs(25 * 3600));

    assert!(refresh_catalog_with_client(&config, &Client::new()).unwrap());

    mock.assert();
    assert_eq!(fs::read_to_string(&config.catalog_path).unwrap(), CATALOG);
}

#[test]
fn fresh_catalog_skips_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/reviews/quaddicted_database.xml");
        then.status(200).body(CATALOG);
    });
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&server, tmp.path());
    fs::write(&config.catalog_path, "<files/>").unwrap();
    age_file(&config.catalog_path, Duration::from_secs(3600));

    assert!(!refresh_catalog_with_client(&config, &Client::new()).unwrap());
    assert_eq!(mock.calls(), 0);
    assert_eq!(fs::read_to_string(&config.catalog_path).unwrap(), "<files/>");
}

#[test]
fn http_failure_is_fatal_and_leaves_file_alone() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reviews/quaddicted_database.xml");
        then.status(503).body("maintenance");
    });
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&server, tmp.path());

    let err = refresh_catalog_with_client(&config, &Client::new()).unwrap_err();
    assert!(err.to_string().contains("503"));
    assert!(!config.catalog_path.exists());
}

#[test]
fn invalid_utf8_is_dropped() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reviews/quaddicted_database.xml");
        then.status(200)
            .header("content-type", "text/xml; charset=ISO-8859-1")
            .body(b"<files><file id=\"a\" type=\"1\"><title>Caf\xe9</title></file></files>".to_vec());
    });
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&server, tmp.path());

    refresh_catalog_with_client(&config, &Client::new()).unwrap();

    let text = fs::read_to_string(&config.catalog_path).unwrap();
    assert!(text.contains("<title>Caf</title>"));
}
