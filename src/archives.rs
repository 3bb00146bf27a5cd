use anyhow::Context;
use std::fmt;
use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use walkdir::WalkDir;
use zip::read::ZipArchive;

use crate::cache::ResolutionCache;
use crate::config::{Config, ID_PLACEHOLDER};
use crate::http::{build_client, fetch_bytes};
use crate::types::{ArchiveMember, MapRecord, MemberKind};

pub fn archive_url(config: &Config, id: &str) -> String {
    config.archive_url_template.replace(ID_PLACEHOLDER, id)
}

pub fn screenshot_url(config: &Config, record: &MapRecord) -> String {
    config.screenshot_url_template.replace(ID_PLACEHOLDER, &record.id)
}

/// Drop members whose name ends with one of the ignored extensions.
pub fn filter_unwanted_members(members: &[String], ignore_extensions: &[String]) -> Vec<String> {
    members
        .iter()
        .filter(|name| {
            ArchiveMember::new(name.as_str()).classify(ignore_extensions) != MemberKind::Ignorable
        })
        .cloned()
        .collect()
}

pub fn contains_any_map(members: &[String]) -> bool {
    members
        .iter()
        .any(|name| ArchiveMember::new(name.as_str()).is_playable())
}

/// Pick the map to start from an archive listing.
///
/// Only `.bsp` files at the archive root qualify; maps in subfolders are not supported.
/// The first one mentioning "start" wins, otherwise the first in listing order. The
/// name is returned lowercased, matching the file on disk after `lowercase_files`.
/// An empty string means nothing playable.
pub fn find_suitable_map(members: &[String]) -> String {
    let map_files: Vec<String> = members
        .iter()
        .map(|name| ArchiveMember::new(name.to_lowercase()))
        .filter(|member| member.is_playable() && !member.is_nested())
        .map(|member| member.path)
        .collect();

    map_files
        .iter()
        .find(|name| name.contains("start"))
        .or_else(|| map_files.first())
        .cloned()
        .unwrap_or_default()
}

/// Rename every entry directly inside `dir` to its lowercase name.
pub fn lowercase_files(dir: &Path, verbose: u8) -> anyhow::Result<()> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing maps directory: {}", dir.display()))?;
        entries.push(entry.into_path());
    }

    for path in entries {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let lower = name.to_lowercase();
        if lower == name {
            continue;
        }
        let target = dir.join(&lower);
        vprintln!(verbose, 2, "renaming {} -> {}", name, lower);
        fs::rename(&path, &target)
            .with_context(|| format!("renaming {} to {}", path.display(), target.display()))?;
    }
    Ok(())
}

/// List archive members in central directory order. `None` when `bytes` is not a zip.
pub fn list_zip_members(bytes: &[u8]) -> Option<Vec<String>> {
    let mut zip = ZipArchive::new(Cursor::new(bytes)).ok()?;
    let mut names = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let entry = zip.by_index_raw(i).ok()?;
        names.push(entry.name().to_string());
    }
    Some(names)
}

/// A member of a downloaded archive could not be read back.
#[derive(Debug)]
pub struct CorruptArchive {
    pub member: String,
    pub reason: String,
}

impl fmt::Display for CorruptArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "archive member {} is unreadable: {}", self.member, self.reason)
    }
}

impl std::error::Error for CorruptArchive {}

// Undo a partial extraction before reporting the unreadable member.
fn discard_partial(written: &[PathBuf], member: &str, reason: String) -> anyhow::Error {
    for path in written {
        let _ = fs::remove_file(path);
    }
    CorruptArchive {
        member: member.to_string(),
        reason,
    }
    .into()
}

/// Extract the named members of the zip at `archive` into `dest`, keeping their relative
/// paths. Members whose names would escape `dest` are skipped.
///
/// Each member is read completely before its destination file is created. When a member
/// cannot be read the files already written are removed and a [`CorruptArchive`] error is
/// returned; failures writing into `dest` are reported as ordinary errors.
pub fn extract_members(
    archive: &Path,
    members: &[String],
    dest: &Path,
    verbose: u8,
) -> anyhow::Result<usize> {
    let f = File::open(archive).with_context(|| format!("opening archive: {:?}", archive))?;
    let mut zip = match ZipArchive::new(f) {
        Ok(zip) => zip,
        Err(err) => return Err(discard_partial(&[], "central directory", err.to_string())),
    };
    let mut written: Vec<PathBuf> = Vec::new();

    for name in members {
        let mut entry = match zip.by_name(name) {
            Ok(entry) => entry,
            Err(err) => return Err(discard_partial(&written, name, err.to_string())),
        };
        let Some(relative) = entry.enclosed_name() else {
            vprintln!(verbose, 1, "skipping unsafe archive path: {}", name);
            continue;
        };
        let out_path: PathBuf = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .with_context(|| format!("creating {}", out_path.display()))?;
            continue;
        }

        let mut data = Vec::with_capacity(entry.size() as usize);
        if let Err(err) = entry.read_to_end(&mut data) {
            return Err(discard_partial(&written, name, err.to_string()));
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&out_path, &data)
            .with_context(|| format!("extracting {name} to {}", out_path.display()))?;
        vprintln!(verbose, 2, "extracted {}", out_path.display());
        written.push(out_path);
    }

    Ok(written.len())
}

pub fn resolve_map(
    record: &MapRecord,
    config: &Config,
    cache: &mut ResolutionCache,
) -> anyhow::Result<String> {
    let client = build_client(config)?;
    resolve_map_with_client(record, config, &client, cache)
}

/// Same as `resolve_map` but accepts a reqwest blocking client for test injection.
///
/// Returns the map file to launch, or an empty string when the archive has nothing
/// playable. A download that is not a zip, or whose members cannot be read, counts as
/// nothing playable. Both outcomes are cached under the record id.
pub fn resolve_map_with_client(
    record: &MapRecord,
    config: &Config,
    client: &Client,
    cache: &mut ResolutionCache,
) -> anyhow::Result<String> {
    if let Some(cached) = cache.get(&record.id) {
        vprintln!(config.verbose, 1, "cache hit for {}: {:?}", record.id, cached);
        return Ok(cached.to_string());
    }

    let url = archive_url(config, &record.id);
    let bytes = fetch_bytes(client, &url, config, "[ARCHIVE]")?;

    let zip_path = config.maps_dir.join(format!("{}.zip", record.id));
    fs::write(&zip_path, &bytes)
        .with_context(|| format!("writing archive: {}", zip_path.display()))?;

    let members = match list_zip_members(&bytes) {
        Some(all) => {
            let kept = filter_unwanted_members(&all, &config.ignore_extensions);
            vprintln!(
                config.verbose,
                2,
                "{}: {} members, {} after filtering",
                record.id,
                all.len(),
                kept.len()
            );
            kept
        }
        None => {
            vprintln!(config.verbose, 1, "{}: download is not a zip archive", record.id);
            Vec::new()
        }
    };

    let extracted = if contains_any_map(&members) {
        extract_members(&zip_path, &members, &config.maps_dir, config.verbose)
    } else {
        vprintln!(config.verbose, 1, "{}: no playable map, skipping extraction", record.id);
        Ok(0)
    };

    let removed = fs::remove_file(&zip_path)
        .with_context(|| format!("removing archive: {}", zip_path.display()));
    let readable = match extracted {
        Ok(_) => true,
        Err(err) => match err.downcast_ref::<CorruptArchive>() {
            Some(corrupt) => {
                vprintln!(config.verbose, 1, "{}: {}, nothing playable", record.id, corrupt);
                false
            }
            None => return Err(err),
        },
    };
    removed?;

    lowercase_files(&config.maps_dir, config.verbose)?;

    let chosen = if readable {
        find_suitable_map(&members)
    } else {
        String::new()
    };
    cache.set(&record.id, &chosen)?;
    Ok(chosen)
}
