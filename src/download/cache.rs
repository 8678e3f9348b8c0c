use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

const DATABASE_FILE: &str = "airports.csv";

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "accidents-sql")
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        Ok(Self { cache_dir })
    }

    /// Create the cache directory if needed
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).context("Failed to create cache directory")
    }

    /// Path of the cached airport database
    pub fn database_path(&self) -> PathBuf {
        self.cache_dir.join(DATABASE_FILE)
    }

    /// Temporary path used while a download is in flight
    pub fn partial_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.part", DATABASE_FILE))
    }

    /// Check if the airport database is already cached
    pub fn is_cached(&self) -> bool {
        let path = self.database_path();
        fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false)
    }

    /// Move a completed download into place
    pub fn commit_partial(&self) -> Result<PathBuf> {
        let dest = self.database_path();
        fs::rename(self.partial_path(), &dest)
            .with_context(|| format!("Failed to move download into {:?}", dest))?;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cached_requires_non_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(Some(dir.path().to_path_buf())).unwrap();
        assert!(!cache.is_cached());

        fs::write(cache.database_path(), "").unwrap();
        assert!(!cache.is_cached());

        fs::write(cache.partial_path(), "ident,gps_code,name\n").unwrap();
        cache.commit_partial().unwrap();
        assert!(cache.is_cached());
        assert!(!cache.partial_path().exists());
    }
}
