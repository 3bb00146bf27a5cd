use std::collections::VecDeque;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Local};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng, rngs::StdRng};
use reqwest::blocking::Client;

use crate::cache::ResolutionCache;
use crate::config::Config;
use crate::http::{build_client, fetch_bytes};
use crate::types::MapRecord;

/// Whether the catalog at `path` must be downloaded again. A missing file is stale.
pub fn catalog_is_stale(
    path: &Path,
    max_age: chrono::Duration,
    now: DateTime<Local>,
) -> anyhow::Result<bool> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(true),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("reading catalog metadata: {}", path.display()));
        }
    };
    let modified: DateTime<Local> = metadata
        .modified()
        .with_context(|| format!("reading catalog mtime: {}", path.display()))?
        .into();

    Ok(now > modified + max_age)
}

/// Decode a downloaded catalog as UTF-8, dropping invalid byte sequences.
pub fn decode_catalog_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

pub fn refresh_catalog(config: &Config) -> anyhow::Result<bool> {
    let client = build_client(config)?;
    refresh_catalog_with_client(config, &client)
}

/// Same as `refresh_catalog` but accepts a reqwest blocking client for test injection.
/// Returns `true` when the catalog was downloaded.
pub fn refresh_catalog_with_client(config: &Config, client: &Client) -> anyhow::Result<bool> {
    if !catalog_is_stale(&config.catalog_path, config.catalog_max_age(), Local::now())? {
        vprintln!(
            config.verbose,
            1,
            "catalog {} is fresh, skipping download",
            config.catalog_path.display()
        );
        return Ok(false);
    }

    if config.quiet == 0 {
        println!("> Updating maps database from {} ...", config.catalog_url);
    }
    let body = fetch_bytes(client, &config.catalog_url, config, "[CATALOG]")?;
    let text = decode_catalog_text(&body);
    fs::write(&config.catalog_path, text)
        .with_context(|| format!("writing catalog: {}", config.catalog_path.display()))?;
    Ok(true)
}

/// Ordered working set of catalog entries. Entries leave the set as they are chosen.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    records: VecDeque<MapRecord>,
}

/// Read the local catalog, load the resolution cache and order the entries.
pub fn load_catalog(
    config: &Config,
    cache: &mut ResolutionCache,
    shuffle: bool,
) -> anyhow::Result<CatalogIndex> {
    let xml = fs::read_to_string(&config.catalog_path)
        .with_context(|| format!("reading catalog: {}", config.catalog_path.display()))?;
    let mut index = CatalogIndex::parse(&xml)
        .with_context(|| format!("parsing catalog: {}", config.catalog_path.display()))?;
    vprintln!(config.verbose, 1, "catalog lists {} maps", index.len());

    if shuffle {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        index.shuffle(&mut rng);
    }

    cache.load()?;
    vprintln!(
        config.verbose,
        1,
        "resolution cache {} holds {} entries",
        cache.path().display(),
        cache.len()
    );

    Ok(index)
}

impl CatalogIndex {
    pub fn from_records(records: Vec<MapRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn parse(xml: &str) -> anyhow::Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut records = VecDeque::new();
        let mut current: Option<MapRecord> = None;
        let mut depth = 0usize;
        let mut record_depth = 0usize;
        let mut field: Option<String> = None;
        let mut text = String::new();

        loop {
            let event = reader
                .read_event()
                .with_context(|| format!("malformed XML at byte {}", reader.buffer_position()))?;
            match event {
                Event::Start(ref e) => {
                    depth += 1;
                    if current.is_none() {
                        if let Some(record) = record_from_element(e) {
                            current = Some(record);
                            record_depth = depth;
                        }
                    } else if depth == record_depth + 1 {
                        field = Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                        text.clear();
                    }
                }
                Event::Empty(ref e) => {
                    if current.is_none() {
                        if let Some(record) = record_from_element(e) {
                            records.push_back(record);
                        }
                    }
                }
                Event::Text(e) if field.is_some() && depth == record_depth + 1 => {
                    match e.unescape() {
                        Ok(value) => text.push_str(&value),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&e)),
                    }
                }
                Event::CData(e) if field.is_some() && depth == record_depth + 1 => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Event::End(_) => {
                    if depth == record_depth + 1 {
                        if let (Some(record), Some(name)) = (current.as_mut(), field.take()) {
                            let value = std::mem::take(&mut text);
                            match name.as_str() {
                                "title" => record.title = value,
                                "description" => record.description = value,
                                _ => {
                                    record.metadata.insert(name, value);
                                }
                            }
                        }
                    } else if depth == record_depth {
                        if let Some(done) = current.take() {
                            records.push_back(done);
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { records })
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.records.make_contiguous().shuffle(rng);
    }

    /// Remove and return the entry at `index`. Fails once `index` is past the end, which
    /// includes every call on an exhausted index.
    pub fn choose(&mut self, index: usize) -> anyhow::Result<MapRecord> {
        let remaining = self.records.len();
        match self.records.remove(index) {
            Some(record) => Ok(record),
            None => anyhow::bail!(
                "map index {index} is out of range ({remaining} maps left to choose from)"
            ),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &MapRecord> {
        self.records.iter()
    }
}

// Only `<file>` elements carrying both `id` and `type` are catalog entries; the
// `<file id=".."/>` children listing requirements have no type.
fn record_from_element(e: &BytesStart<'_>) -> Option<MapRecord> {
    if e.name().as_ref() != b"file" {
        return None;
    }

    let mut record = MapRecord::default();
    let mut id = None;
    let mut kind = None;
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        match key.as_str() {
            "id" => id = Some(value),
            "type" => kind = Some(value),
            _ => {
                record.attributes.insert(key, value);
            }
        }
    }

    record.id = id?;
    record.kind = kind?;
    Some(record)
}
