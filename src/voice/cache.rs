//! Content-addressed storage for synthesized speech
//!
//! Audio is written to `<dir>/<digest>.wav`, where the digest is the first 16
//! hex characters of the SHA-256 of the spoken text, and served under
//! `/audio/<digest>.wav`. Re-storing the same text rewrites identical bytes.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::Result;
use crate::config::AudioConfig;

/// URL prefix the cache directory is served under
pub const URL_PREFIX: &str = "/audio";

const DIGEST_LEN: usize = 16;
const EXTENSION: &str = "wav";

/// Retention policy for cached audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Keep every file for the life of the directory
    #[default]
    Never,
    /// Keep at most `max_entries` files, dropping the least recently used
    Lru { max_entries: NonZeroUsize },
}

impl EvictionPolicy {
    #[must_use]
    pub const fn from_max_entries(max_entries: Option<NonZeroUsize>) -> Self {
        match max_entries {
            Some(max_entries) => Self::Lru { max_entries },
            None => Self::Never,
        }
    }
}

/// Persists synthesized audio under content-derived names
///
/// The recency index lock is held across every change to the directory
/// (rename into place, eviction, stale-entry removal) so a file is only ever
/// deleted while the index agrees it is gone.
pub struct AudioCache {
    dir: PathBuf,
    policy: EvictionPolicy,
    recency: Mutex<LruCache<String, ()>>,
}

impl AudioCache {
    /// Open (and create if needed) the cache directory
    ///
    /// Existing files are indexed oldest-modified first. With an LRU policy,
    /// files beyond the cap are removed.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or listed
    pub async fn open(config: &AudioConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.dir).await?;

        let policy = EvictionPolicy::from_max_entries(config.max_entries);
        let recency = match policy {
            EvictionPolicy::Never => LruCache::unbounded(),
            EvictionPolicy::Lru { max_entries } => LruCache::new(max_entries),
        };

        let cache = Self {
            dir: config.dir.clone(),
            policy,
            recency: Mutex::new(recency),
        };

        let existing = cache.scan().await?;
        let indexed = existing.len();
        {
            let mut recency = cache.recency.lock().await;
            for name in existing {
                cache.record(&mut recency, name).await;
            }
        }

        tracing::info!(
            dir = %cache.dir.display(),
            indexed,
            policy = ?cache.policy,
            "audio cache ready"
        );
        Ok(cache)
    }

    /// Cache directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Retention policy in effect
    #[must_use]
    pub const fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Number of indexed files
    pub async fn len(&self) -> usize {
        self.recency.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Deterministic cache key for `text`
    #[must_use]
    pub fn key(text: &str) -> String {
        let digest = Sha256::digest(text.as_bytes());
        let mut key = hex::encode(digest);
        key.truncate(DIGEST_LEN);
        key
    }

    /// File name for `text` (`<key>.wav`)
    #[must_use]
    pub fn file_name(text: &str) -> String {
        format!("{}.{EXTENSION}", Self::key(text))
    }

    /// Persist `audio` for `text`, returning its reference path
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub async fn store(&self, text: &str, audio: &[u8]) -> Result<String> {
        let name = Self::file_name(text);
        let path = self.dir.join(&name);

        // Write beside the target then rename, so readers never see a partial file
        let tmp = self
            .dir
            .join(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, audio).await?;

        let mut recency = self.recency.lock().await;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            drop(recency);
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        self.record(&mut recency, name.clone()).await;
        drop(recency);

        tracing::debug!(key = %name, bytes = audio.len(), "audio cached");
        Ok(format!("{URL_PREFIX}/{name}"))
    }

    /// Reference path and byte length of previously stored audio for `text`
    ///
    /// Counts as an access for eviction purposes.
    pub async fn lookup(&self, text: &str) -> Option<(String, u64)> {
        let name = Self::file_name(text);
        let mut recency = self.recency.lock().await;
        recency.get(&name)?;

        match tokio::fs::metadata(self.dir.join(&name)).await {
            Ok(meta) if meta.is_file() => Some((format!("{URL_PREFIX}/{name}"), meta.len())),
            _ => {
                // Removed behind our back
                recency.pop(&name);
                None
            }
        }
    }

    /// Record a read of `file_name`; returns false for names the cache never issues
    pub async fn touch(&self, file_name: &str) -> bool {
        if !is_cache_file_name(file_name) {
            return false;
        }
        self.recency.lock().await.get(file_name).is_some()
    }

    /// Whether `file_name` is currently indexed
    pub async fn contains(&self, file_name: &str) -> bool {
        self.recency.lock().await.contains(file_name)
    }

    /// Index `name` as most recent, deleting whatever the policy pushes out
    async fn record(&self, recency: &mut LruCache<String, ()>, name: String) {
        let evicted = match recency.push(name.clone(), ()) {
            Some((old, ())) if old != name => Some(old),
            _ => None,
        };

        if let Some(old) = evicted {
            match tokio::fs::remove_file(self.dir.join(&old)).await {
                Ok(()) => tracing::debug!(key = %old, "evicted cached audio"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(key = %old, error = %e, "failed to evict cached audio"),
            }
        }
    }

    /// List cache files, oldest-modified first
    async fn scan(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut found: Vec<(SystemTime, String)> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_cache_file_name(&name) {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, name));
        }

        found.sort();
        Ok(found.into_iter().map(|(_, name)| name).collect())
    }
}

/// Whether `name` has the shape of a cache file (`<16 lowercase hex>.wav`)
#[must_use]
pub fn is_cache_file_name(name: &str) -> bool {
    name.strip_suffix(".wav").is_some_and(|stem| {
        stem.len() == DIGEST_LEN
            && stem
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}
