use reqwest::blocking::Client;

use crate::archives::resolve_map_with_client;
use crate::cache::ResolutionCache;
use crate::catalog::CatalogIndex;
use crate::config::Config;
use crate::http::build_client;
use crate::types::MapRecord;

#[derive(Debug, Clone)]
pub struct PickedMap {
    pub record: MapRecord,
    pub map_file: String,
    /// Candidates consumed before this one, including it.
    pub attempts: usize,
}

pub fn pick_map(
    catalog: &mut CatalogIndex,
    config: &Config,
    cache: &mut ResolutionCache,
) -> anyhow::Result<PickedMap> {
    let client = build_client(config)?;
    pick_map_with_client(catalog, config, &client, cache)
}

/// Pop candidates until one resolves to a playable map file. The first pop uses
/// `config.index`, later ones take the next entry. Running out of candidates is an error.
pub fn pick_map_with_client(
    catalog: &mut CatalogIndex,
    config: &Config,
    client: &Client,
    cache: &mut ResolutionCache,
) -> anyhow::Result<PickedMap> {
    let mut index = config.index;
    let mut attempts = 0usize;

    loop {
        let record = catalog.choose(index).map_err(|err| {
            if attempts == 0 {
                err
            } else {
                err.context(format!("no playable map found after {attempts} attempts"))
            }
        })?;
        index = 0;
        attempts += 1;

        if config.quiet == 0 {
            println!("> Checking Map '{}'...", record.display_title());
        }
        let map_file = resolve_map_with_client(&record, config, client, cache)?;
        if !map_file.is_empty() {
            return Ok(PickedMap {
                record,
                map_file,
                attempts,
            });
        }
        vprintln!(config.verbose, 1, "{} has no playable map, trying next", record.id);
    }
}
