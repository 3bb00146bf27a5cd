use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

pub const DEFAULT_ENGINE: &str = "vkquake";
pub const DEFAULT_ENGINE_ARGS: &[&str] = &["-nojoy", "+skill", "3"];
pub const DEFAULT_MAPS_DIR: &str = "id1/maps";
pub const DEFAULT_CATALOG_FILE: &str = "database.xml";
pub const DEFAULT_CACHE_FILE: &str = "database_cache.json";
pub const DEFAULT_CATALOG_URL: &str = "https://www.quaddicted.com/reviews/quaddicted_database.xml";
pub const DEFAULT_ARCHIVE_URL: &str = "https://www.quaddicted.com/filebase/{id}.zip";
pub const DEFAULT_SCREENSHOT_URL: &str = "https://www.quaddicted.com/reviews/screenshots/{id}.jpg";
pub const DEFAULT_CATALOG_MAX_AGE_HOURS: u64 = 24;
pub const DEFAULT_IGNORE_EXTENSIONS: &[&str] = &[
    ".map", ".dmm", ".bmp", ".gif", ".cfg", ".bat", ".html", ".jpg", ".diz",
];

/// Placeholder substituted with the map id in URL templates.
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, serde::Serialize)]
pub struct Config {
    pub engine: String,
    pub engine_args: Vec<String>,
    pub maps_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub cache_path: PathBuf,
    pub catalog_url: String,
    pub archive_url_template: String,
    pub screenshot_url_template: String,
    pub catalog_max_age_hours: u64,
    /// Lowercased, each with a leading dot.
    pub ignore_extensions: Vec<String>,
    pub shuffle: bool,
    pub index: usize,
    pub seed: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub no_prompt: bool,
    pub no_launch: bool,
    pub verbose: u8,
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            engine_args: DEFAULT_ENGINE_ARGS.iter().map(|s| s.to_string()).collect(),
            maps_dir: PathBuf::from(DEFAULT_MAPS_DIR),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_FILE),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            archive_url_template: DEFAULT_ARCHIVE_URL.to_string(),
            screenshot_url_template: DEFAULT_SCREENSHOT_URL.to_string(),
            catalog_max_age_hours: DEFAULT_CATALOG_MAX_AGE_HOURS,
            ignore_extensions: DEFAULT_IGNORE_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            shuffle: true,
            index: 0,
            seed: None,
            timeout_secs: None,
            no_prompt: false,
            no_launch: false,
            verbose: 0,
            quiet: 0,
        }
    }
}

/// Lowercase an extension and make sure it starts with a dot.
pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

impl Config {
    pub fn catalog_max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.catalog_max_age_hours as i64)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    fn validate_engine(&self) -> anyhow::Result<()> {
        if self.engine.trim().is_empty() {
            anyhow::bail!("--engine cannot be empty");
        }
        Ok(())
    }

    fn validate_templates(&self) -> anyhow::Result<()> {
        if !self.archive_url_template.contains(ID_PLACEHOLDER) {
            anyhow::bail!("--archive-url must contain the {ID_PLACEHOLDER} placeholder");
        }
        if !self.screenshot_url_template.contains(ID_PLACEHOLDER) {
            anyhow::bail!("--screenshot-url must contain the {ID_PLACEHOLDER} placeholder");
        }
        Ok(())
    }

    fn validate_catalog_age(&self) -> anyhow::Result<()> {
        if self.catalog_max_age_hours == 0 {
            anyhow::bail!("--catalog-max-age-hours must be at least 1");
        }
        if self.catalog_max_age_hours > i64::MAX as u64 / 3600 {
            anyhow::bail!("--catalog-max-age-hours is out of range");
        }
        Ok(())
    }

    fn validate_ignore_extensions(&self) -> anyhow::Result<()> {
        if self.ignore_extensions.iter().any(|ext| ext.len() < 2) {
            anyhow::bail!("--ignore-ext values must name an extension");
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_engine()?;
        self.validate_templates()?;
        self.validate_catalog_age()?;
        self.validate_ignore_extensions()?;
        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let defaults = Config::default();
        let config = Self {
            engine: cli.engine.trim().to_lowercase(),
            engine_args: if cli.engine_args.is_empty() {
                defaults.engine_args
            } else {
                cli.engine_args
            },
            maps_dir: cli.maps_dir,
            catalog_path: cli.catalog_file,
            cache_path: cli.cache_file,
            catalog_url: cli.catalog_url,
            archive_url_template: cli.archive_url,
            screenshot_url_template: cli.screenshot_url,
            catalog_max_age_hours: cli.catalog_max_age_hours,
            ignore_extensions: if cli.ignore_ext.is_empty() {
                defaults.ignore_extensions
            } else {
                cli.ignore_ext
                    .iter()
                    .map(|ext| normalize_extension(ext))
                    .collect()
            },
            shuffle: !cli.no_shuffle,
            index: cli.index,
            seed: cli.seed,
            timeout_secs: cli.timeout_secs,
            no_prompt: cli.no_prompt,
            no_launch: cli.no_launch,
            verbose: cli.verbose,
            quiet: cli.quiet,
        };

        config.validate()?;

        Ok(config)
    }
}
