use httpmock::Method::GET;
use httpmock::MockServer;

use reqwest::blocking::Client;
use std::fs;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

use randmap::cache::ResolutionCache;
use randmap::catalog::CatalogIndex;
use randmap::config::Config;
use randmap::picker::pick_map_with_client;
use randmap::types::MapRecord;

fn single_map_zip(name: &str) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zipw = zip::ZipWriter::new(&mut buf);
        zipw.start_file(name, SimpleFileOptions::default()).unwrap();
        zipw.write_all(b"bsp").unwrap();
        zipw.finish().unwrap();
    }
    buf.into_inner()
}

fn records(ids: &[&str]) -> CatalogIndex {
    CatalogIndex::from_records(
        ids.iter()
            .map(|id| MapRecord::new(*id, "1").with_title(format!("{id} title")))
            .collect(),
    )
}

fn config_for(server: &MockServer, root: &std::path::Path) -> Config {
    let maps_dir = root.join("maps");
    fs::create_dir_all(&maps_dir).unwrap();
    Config {
        maps_dir,
        cache_path: root.join("cache.json"),
        archive_url_template: server.url("/filebase/{id}.zip"),
        quiet: 1,
        ..Default::default()
    }
}

#[test]
fn skips_unplayable_candidates() {
    let server = MockServer::start();
    let bad = server.mock(|when, then| {
        when.method(GET).path("/filebase/bad.zip");
        then.status(200).body("not a zip");
    });
    let good = server.mock(|when, then| {
        when.method(GET).path("/filebase/good.zip");
        then.status(200).body(single_map_zip("Good.bsp"));
    });
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&server, tmp.path());
    let mut cache = ResolutionCache::new(&config.cache_path);
    let mut catalog = records(&["bad", "good", "later"]);

    let picked = pick_map_with_client(&mut catalog, &config, &Client::new(), &mut cache).unwrap();

    assert_eq!(picked.record.id, "good");
    assert_eq!(picked.map_file, "good.bsp");
    assert_eq!(picked.attempts, 2);
    assert_eq!(catalog.len(), 1);
    bad.assert();
    good.assert();
    assert_eq!(cache.get("bad"), Some(""));
}

#[test]
fn starting_index_is_honoured_once() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/filebase/third.zip");
        then.status(200).body("not a zip");
    });
    server.mock(|when, then| {
        when.method(GET).path("/filebase/first.zip");
        then.status(200).body(single_map_zip("start.bsp"));
    });
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config_for(&server, tmp.path());
    config.index = 2;
    let mut cache = ResolutionCache::new(&config.cache_path);
    let mut catalog = records(&["first", "second", "third"]);

    let picked = pick_map_with_client(&mut catalog, &config, &Client::new(), &mut cache).unwrap();

    assert_eq!(picked.record.id, "first");
    assert_eq!(picked.map_file, "start.bsp");
    assert_eq!(picked.attempts, 2);
}

#[test]
fn exhausted_catalog_is_an_error() {
    let server = MockServer::start();
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(&server, tmp.path());
    let mut cache = ResolutionCache::new(&config.cache_path);
    cache.set("a", "").unwrap();
    cache.set("b", "").unwrap();
    let mut catalog = records(&["a", "b"]);

    let err = pick_map_with_client(&mut catalog, &config, &Client::new(), &mut cache).unwrap_err();

    assert!(format!("{err:#}").contains("no playable map found after 2 attempts"));
    assert!(catalog.is_empty());
}
