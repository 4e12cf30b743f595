use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use getbin_fs::AtomicWriteOptions;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{CacheError, Fingerprint, Result};

/// One successfully fetched URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub binary_path: PathBuf,
    pub content_hash: String,
    pub total_size: u64,
}

impl CacheEntry {
    pub fn new(binary_path: impl Into<PathBuf>, fingerprint: Fingerprint) -> Self {
        Self {
            binary_path: binary_path.into(),
            content_hash: fingerprint.content_hash,
            total_size: fingerprint.total_size,
        }
    }

    /// Whether a freshly computed fingerprint reproduces this entry exactly.
    pub fn matches(&self, fingerprint: &Fingerprint) -> bool {
        self.content_hash == fingerprint.content_hash && self.total_size == fingerprint.total_size
    }
}

type Document = BTreeMap<String, CacheEntry>;

/// The persisted `url -> CacheEntry` document.
///
/// Every mutation loads the whole document, changes it and rewrites it
/// atomically while holding the writer section, so concurrent writers in
/// one process never lose each other's updates.
#[derive(Debug)]
pub struct CacheIndex {
    path: PathBuf,
    writer: Mutex<()>,
}

impl CacheIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, url: &str) -> Result<Option<CacheEntry>> {
        Ok(self.load().await?.remove(url))
    }

    /// Insert or replace the entry for `url`.
    pub async fn put(&self, url: &str, entry: CacheEntry) -> Result<()> {
        let _guard = self.writer.lock().await;
        let mut doc = self.load().await?;
        doc.insert(url.to_string(), entry);
        self.store(&doc).await?;
        tracing::debug!(url, index = %self.path.display(), "cache entry written");
        Ok(())
    }

    /// All entries, ordered by URL.
    pub async fn entries(&self) -> Result<Vec<(String, CacheEntry)>> {
        Ok(self.load().await?.into_iter().collect())
    }

    pub async fn remove(&self, url: &str) -> Result<Option<CacheEntry>> {
        let _guard = self.writer.lock().await;
        let mut doc = self.load().await?;
        let removed = doc.remove(url);
        if removed.is_some() {
            self.store(&doc).await?;
        }
        Ok(removed)
    }

    /// Drop entries whose recorded path no longer exists. Returns their URLs.
    pub async fn prune(&self) -> Result<Vec<String>> {
        let _guard = self.writer.lock().await;
        let mut doc = self.load().await?;
        let mut stale = Vec::new();
        for (url, entry) in &doc {
            if !tokio::fs::try_exists(&entry.binary_path).await.unwrap_or(false) {
                stale.push(url.clone());
            }
        }
        if !stale.is_empty() {
            for url in &stale {
                doc.remove(url);
            }
            self.store(&doc).await?;
        }
        Ok(stale)
    }

    /// Remove every entry. Returns how many there were.
    pub async fn clear(&self) -> Result<usize> {
        let _guard = self.writer.lock().await;
        let count = self.load().await?.len();
        self.store(&Document::new()).await?;
        Ok(count)
    }

    async fn load(&self) -> Result<Document> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    async fn store(&self, doc: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc).map_err(CacheError::Serialize)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            getbin_fs::atomic_write(&path, &bytes, AtomicWriteOptions::new().sync(true))
        })
        .await??;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(path: &Path, hash: &str) -> CacheEntry {
        CacheEntry {
            binary_path: path.to_path_buf(),
            content_hash: hash.to_string(),
            total_size: 1,
        }
    }

    #[tokio::test]
    async fn missing_document_is_empty() {
        let dir = tempdir().unwrap();
        let index = CacheIndex::new(dir.path().join("index.json"));
        assert!(index.entries().await.unwrap().is_empty());
        assert_eq!(index.get("https://x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_then_get() {
        let dir = tempdir().unwrap();
        let index = CacheIndex::new(dir.path().join("nested/index.json"));
        let e = entry(dir.path(), "abc");
        index.put("https://example.test/a.zip", e.clone()).await.unwrap();
        assert_eq!(index.get("https://example.test/a.zip").await.unwrap(), Some(e));
    }

    #[tokio::test]
    async fn document_uses_camel_case_keys() {
        let dir = tempdir().unwrap();
        let index = CacheIndex::new(dir.path().join("index.json"));
        index
            .put("https://example.test/a.zip", entry(dir.path(), "abc"))
            .await
            .unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(index.path()).unwrap()).unwrap();
        let row = &raw["https://example.test/a.zip"];
        assert_eq!(row["contentHash"], "abc");
        assert_eq!(row["totalSize"], 1);
        assert!(row["binaryPath"].is_string());
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, b"{not json").unwrap();
        let index = CacheIndex::new(&path);
        let err = index.get("https://x").await.unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn remove_prune_clear() {
        let dir = tempdir().unwrap();
        let index = CacheIndex::new(dir.path().join("index.json"));
        let alive = dir.path().join("alive");
        std::fs::create_dir(&alive).unwrap();

        index.put("https://a", entry(&alive, "1")).await.unwrap();
        index
            .put("https://b", entry(&dir.path().join("gone"), "2"))
            .await
            .unwrap();
        index.put("https://c", entry(&alive, "3")).await.unwrap();

        assert_eq!(index.prune().await.unwrap(), vec!["https://b".to_string()]);
        assert!(index.remove("https://c").await.unwrap().is_some());
        assert!(index.remove("https://c").await.unwrap().is_none());

        let urls: Vec<_> = index.entries().await.unwrap().into_iter().map(|(u, _)| u).collect();
        assert_eq!(urls, vec!["https://a".to_string()]);

        assert_eq!(index.clear().await.unwrap(), 1);
        assert!(index.entries().await.unwrap().is_empty());
    }

    #[test]
    fn entry_matches_fingerprint() {
        let fp = Fingerprint {
            content_hash: "h".into(),
            total_size: 10,
        };
        let e = CacheEntry::new("/x", fp.clone());
        assert!(e.matches(&fp));
        assert!(!e.matches(&Fingerprint {
            content_hash: "h".into(),
            total_size: 11,
        }));
    }
}
