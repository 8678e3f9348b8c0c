pub mod cache;
pub mod client;

pub use cache::*;
pub use client::*;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::ui::{Phase, Ui};
use crate::writer::ensure_parent;

/// Download the airport database into the cache unless it is already there.
///
/// Returns the path of the cached file.
pub fn ensure_airports_database(
    cache_dir: Option<PathBuf>,
    force: bool,
    ui: &mut impl Ui,
) -> Result<PathBuf> {
    let cache = CacheManager::new(cache_dir)?;
    ui.set_phase(Phase::Checking);

    if cache.is_cached() && !force {
        let path = cache.database_path();
        info!("airport database cached at {}", path.display());
        ui.log(format!("Using cached airport database {}", path.display()));
        return Ok(path);
    }

    cache.ensure_dir()?;
    ui.set_phase(Phase::Downloading);
    ui.set_info(AIRPORTS_URL);

    let client = AirportsClient::new()?;
    let bytes = client.download(&cache.partial_path(), ui)?;
    let path = cache.commit_partial()?;

    info!("downloaded {} bytes to {}", bytes, path.display());
    ui.clear_progress();
    Ok(path)
}

/// Make the cached database available at `dest`, downloading it first when
/// the cache is empty or `force` is set.
pub fn install_airports_database(
    dest: &Path,
    cache_dir: Option<PathBuf>,
    force: bool,
    ui: &mut impl Ui,
) -> Result<PathBuf> {
    let cached = ensure_airports_database(cache_dir, force, ui)?;
    ensure_parent(dest)?;
    fs::copy(&cached, dest)
        .with_context(|| format!("Failed to copy {:?} to {:?}", cached, dest))?;

    info!("airport database installed at {}", dest.display());
    ui.log(format!("Airport database installed at {}", dest.display()));
    Ok(dest.to_path_buf())
}
