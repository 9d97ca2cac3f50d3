//! Downloaded-asset cache
//!
//! One-shot blocking downloads for opaque external assets (environment
//! lighting maps, legend fonts). Files are kept under a cache directory
//! and re-used on later runs.

use crate::{AssetFetcher, ProviderError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Filesystem-backed asset fetcher.
pub struct AssetCache {
    dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl AssetCache {
    /// Cache rooted at `dir` (created on demand)
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            dir: dir.into(),
            client,
        })
    }

    /// The cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local file name an URL caches under (its last path segment)
    pub fn local_name(url: &str) -> Result<String> {
        let trimmed = url.split(['?', '#']).next().unwrap_or(url);
        let name = trimmed.rsplit('/').next().unwrap_or("");
        if name.is_empty() {
            return Err(ProviderError::AssetFetch(format!(
                "cannot derive a file name from '{url}'"
            )));
        }
        Ok(name.to_string())
    }
}

impl AssetFetcher for AssetCache {
    fn fetch(&self, url: &str) -> Result<PathBuf> {
        let path = self.dir.join(Self::local_name(url)?);
        if path.is_file() {
            debug!(?path, "asset cache hit");
            return Ok(path);
        }

        info!(url, "downloading asset");
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(ProviderError::AssetFetch(format!(
                "HTTP {} fetching {url}",
                response.status()
            )));
        }
        let bytes = response.bytes()?;

        std::fs::create_dir_all(&self.dir).map_err(terravista_core::Error::Io)?;
        std::fs::write(&path, &bytes).map_err(terravista_core::Error::Io)?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_names_come_from_the_url_path() {
        assert_eq!(
            AssetCache::local_name("https://example.org/hdri/alps_2k.hdr").unwrap(),
            "alps_2k.hdr"
        );
        assert_eq!(
            AssetCache::local_name("https://example.org/a/b.png?token=x").unwrap(),
            "b.png"
        );
    }

    #[test]
    fn url_without_file_name_is_rejected() {
        assert!(AssetCache::local_name("https://example.org/").is_err());
    }

    #[test]
    fn cached_file_short_circuits_the_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("light.hdr"), b"cached").unwrap();

        let cache = AssetCache::new(dir.path()).unwrap();
        // an unroutable URL proves no request is attempted
        let path = cache
            .fetch("http://127.0.0.1:1/assets/light.hdr")
            .unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"cached");
    }
}
