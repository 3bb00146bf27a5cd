use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;

use randmap::archives::screenshot_url;
use randmap::cache::ResolutionCache;
use randmap::catalog::{load_catalog, refresh_catalog_with_client};
use randmap::cli::Cli;
use randmap::config::Config;
use randmap::engine::launch_engine;
use randmap::http::build_client;
use randmap::picker::pick_map_with_client;

fn wait_for_enter(map_file: &str) -> anyhow::Result<()> {
    print!("\n-=[ Press Enter to start Quake with map '{map_file}' ]=-");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::try_from(cli)?;

    println!("Quaddicted.com Random Map");

    if !config.maps_dir.is_dir() {
        anyhow::bail!(
            "maps directory {} does not exist; run from the Quake install directory or pass --maps-dir",
            config.maps_dir.display()
        );
    }

    let client = build_client(&config)?;
    refresh_catalog_with_client(&config, &client)?;

    let mut cache = ResolutionCache::new(&config.cache_path);
    let mut catalog = load_catalog(&config, &mut cache, config.shuffle)?;
    let picked = pick_map_with_client(&mut catalog, &config, &client, &mut cache)?;

    println!();
    println!("Map name:    {}", picked.record.display_title());
    println!("Screenshot:  {}", screenshot_url(&config, &picked.record));
    println!("Description: {}\n", picked.record.description);

    if config.no_launch {
        println!("{}", picked.map_file);
        return Ok(());
    }

    if !config.no_prompt {
        wait_for_enter(&picked.map_file)?;
    }

    let status = launch_engine(&config, &picked.map_file)
        .with_context(|| format!("starting {} with map {}", config.engine, picked.map_file))?;
    if !status.success() {
        anyhow::bail!("{} exited with {status}", config.engine);
    }
    Ok(())
}
