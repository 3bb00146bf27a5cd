use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config;

#[derive(Parser, Debug, serde::Serialize)]
#[command(
    name = "randmap",
    version,
    about = "Pick a random map from the Quaddicted.com database and start Quake with it"
)]
pub struct Cli {
    /// Engine binary to launch (looked up in the current directory)
    #[arg(long = "engine", value_name = "NAME", default_value = config::DEFAULT_ENGINE)]
    pub engine: String,

    /// Extra engine argument (can specify multiple; replaces the defaults)
    #[arg(long = "engine-arg", value_name = "ARG", action = ArgAction::Append, allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Directory the map archives are extracted into; must already exist
    #[arg(long = "maps-dir", value_name = "PATH", default_value = config::DEFAULT_MAPS_DIR)]
    pub maps_dir: PathBuf,

    /// Local copy of the catalog XML
    #[arg(long = "catalog-file", value_name = "PATH", default_value = config::DEFAULT_CATALOG_FILE)]
    pub catalog_file: PathBuf,

    /// JSON file remembering which map file each archive resolved to
    #[arg(long = "cache-file", value_name = "PATH", default_value = config::DEFAULT_CACHE_FILE)]
    pub cache_file: PathBuf,

    #[arg(long = "catalog-url", value_name = "URL", default_value = config::DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Archive URL template; `{id}` is replaced with the map id
    #[arg(long = "archive-url", value_name = "TEMPLATE", default_value = config::DEFAULT_ARCHIVE_URL)]
    pub archive_url: String,

    /// Screenshot URL template; `{id}` is replaced with the map id
    #[arg(long = "screenshot-url", value_name = "TEMPLATE", default_value = config::DEFAULT_SCREENSHOT_URL)]
    pub screenshot_url: String,

    /// Re-download the catalog once the local copy is older than this
    #[arg(long = "catalog-max-age-hours", value_name = "HOURS", default_value_t = config::DEFAULT_CATALOG_MAX_AGE_HOURS)]
    pub catalog_max_age_hours: u64,

    /// Archive member extension to skip when extracting (can specify multiple; replaces the defaults)
    #[arg(long = "ignore-ext", value_name = "EXT", action = ArgAction::Append)]
    pub ignore_ext: Vec<String>,

    /// Keep catalog order instead of shuffling
    #[arg(long = "no-shuffle")]
    pub no_shuffle: bool,

    /// Position of the first candidate to try
    #[arg(long = "index", value_name = "N", default_value_t = 0)]
    pub index: usize,

    /// Seed for the shuffle, for reproducible picks
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// HTTP timeout in seconds
    #[arg(long = "timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Don't wait for Enter before launching
    #[arg(long = "no-prompt")]
    pub no_prompt: bool,

    /// Print the chosen map file instead of launching the engine
    #[arg(long = "no-launch")]
    pub no_launch: bool,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,
}
