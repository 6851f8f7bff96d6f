//! Object storage for plant photos and avatars.
//!
//! Objects live in one of two public-read [`Bucket`]s under
//! `{owner_id}/{uuid}.{ext}`. A bucket is created on first upload. Public
//! URLs follow `{base}/storage/v1/object/public/{bucket}/{path}`, which is
//! also the route the HTTP server uses to serve [`LocalBlobStore`] files.

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::UserId;
use crate::error::MarketError;

/// URL prefix under which public objects are served.
pub const PUBLIC_OBJECT_PREFIX: &str = "/storage/v1/object/public";

/// Accepted upload types and the extension each is stored under.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// A public-read object bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Plant photos, 10 MB cap.
    Plants,
    /// Profile avatars, 5 MB cap.
    Avatars,
}

impl Bucket {
    /// Bucket name as it appears in paths and URLs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plants => "plants",
            Self::Avatars => "avatars",
        }
    }

    /// Largest accepted object, in bytes.
    #[must_use]
    pub const fn max_bytes(self) -> usize {
        match self {
            Self::Plants => 10 * 1024 * 1024,
            Self::Avatars => 5 * 1024 * 1024,
        }
    }

    /// Checks an upload against this bucket's rules and returns the file
    /// extension for `content_type`.
    ///
    /// # Errors
    ///
    /// [`MarketError::PayloadTooLarge`] past the size cap,
    /// [`MarketError::UnsupportedMediaType`] for anything but the accepted
    /// image types, and [`MarketError::InvalidRequest`] for an empty body.
    pub fn check_upload(self, len: usize, content_type: &str) -> Result<&'static str, MarketError> {
        if len > self.max_bytes() {
            return Err(MarketError::PayloadTooLarge {
                bucket: self.name(),
                limit_bytes: self.max_bytes(),
            });
        }
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let Some(&(_, ext)) = IMAGE_TYPES.iter().find(|(mime, _)| *mime == essence) else {
            return Err(MarketError::UnsupportedMediaType(content_type.to_string()));
        };
        if len == 0 {
            return Err(MarketError::InvalidRequest("upload is empty".to_string()));
        }
        Ok(ext)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Fresh object path for an upload by `owner`.
#[must_use]
pub fn object_path(owner: UserId, ext: &str) -> String {
    format!("{owner}/{}.{ext}", Uuid::new_v4())
}

/// Public URL of `path` in `bucket` under `base_url`.
#[must_use]
pub fn public_url(base_url: &str, bucket: Bucket, path: &str) -> String {
    format!(
        "{}{PUBLIC_OBJECT_PREFIX}/{}/{path}",
        base_url.trim_end_matches('/'),
        bucket.name()
    )
}

/// Object-storage collaborator.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Creates `bucket` if missing. Idempotent.
    async fn ensure_bucket(&self, bucket: Bucket) -> Result<(), MarketError>;

    /// Stores `bytes` at `path` in `bucket`, creating the bucket first, and
    /// returns the public URL.
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, MarketError>;

    /// Public URL for `path` in `bucket`.
    fn public_url(&self, bucket: Bucket, path: &str) -> String;
}

/// Objects kept in process memory.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    buckets: RwLock<HashSet<Bucket>>,
    objects: RwLock<HashMap<(Bucket, String), StoredObject>>,
}

/// One stored object in a [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// MIME type recorded at upload.
    pub content_type: String,
}

impl MemoryBlobStore {
    /// Creates an empty store whose URLs start with `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            buckets: RwLock::new(HashSet::new()),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a copy of the object at `path`, if any.
    pub async fn get(&self, bucket: Bucket, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .await
            .get(&(bucket, path.to_string()))
            .cloned()
    }

    /// Returns `true` once `bucket` has been created.
    pub async fn has_bucket(&self, bucket: Bucket) -> bool {
        self.buckets.read().await.contains(&bucket)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn ensure_bucket(&self, bucket: Bucket) -> Result<(), MarketError> {
        self.buckets.write().await.insert(bucket);
        Ok(())
    }

    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, MarketError> {
        self.ensure_bucket(bucket).await?;
        self.objects.write().await.insert(
            (bucket, path.to_string()),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        public_url(&self.base_url, bucket, path)
    }
}

/// Objects written under a directory, one subdirectory per bucket.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    /// Creates a store rooted at `root`, creating the directory.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::StorageError`] if `root` cannot be created.
    pub async fn new(
        root: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Result<Self, MarketError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), "local blob storage ready");
        Ok(Self {
            root,
            base_url: base_url.into(),
        })
    }

    /// Directory that holds every bucket.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_file(&self, bucket: Bucket, path: &str) -> Result<PathBuf, MarketError> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || path.is_empty() {
            return Err(MarketError::InvalidRequest(format!("bad object path: {path}")));
        }
        Ok(self.root.join(bucket.name()).join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn ensure_bucket(&self, bucket: Bucket) -> Result<(), MarketError> {
        tokio::fs::create_dir_all(self.root.join(bucket.name())).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()), err)]
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, MarketError> {
        let file = self.object_file(bucket, path)?;
        self.ensure_bucket(bucket).await?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file, bytes).await?;
        tracing::debug!(file = %file.display(), "object written");
        Ok(self.public_url(bucket, path))
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        public_url(&self.base_url, bucket, path)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn size_caps_are_enforced_before_type() {
        let over = Bucket::Avatars.max_bytes() + 1;
        assert!(matches!(
            Bucket::Avatars.check_upload(over, "image/png"),
            Err(MarketError::PayloadTooLarge { bucket: "avatars", .. })
        ));
        assert!(Bucket::Plants.check_upload(over, "image/png").is_ok());
    }

    #[test]
    fn only_images_are_accepted() {
        assert_eq!(
            Bucket::Plants.check_upload(3, "image/jpeg; charset=binary").ok(),
            Some("jpg")
        );
        assert_eq!(Bucket::Plants.check_upload(3, "IMAGE/WEBP").ok(), Some("webp"));
        assert!(matches!(
            Bucket::Plants.check_upload(3, "application/pdf"),
            Err(MarketError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            Bucket::Plants.check_upload(0, "image/gif"),
            Err(MarketError::InvalidRequest(_))
        ));
    }

    #[test]
    fn object_paths_are_owner_scoped() {
        let owner = UserId::new();
        let path = object_path(owner, "png");
        assert!(path.starts_with(&format!("{owner}/")));
        assert!(path.ends_with(".png"));
        assert_ne!(path, object_path(owner, "png"));
    }

    #[test]
    fn public_url_layout() {
        assert_eq!(
            public_url("http://localhost:3000/", Bucket::Plants, "u/a.png"),
            "http://localhost:3000/storage/v1/object/public/plants/u/a.png"
        );
    }

    #[tokio::test]
    async fn memory_upload_creates_bucket() {
        let store = MemoryBlobStore::new("http://cdn.test");
        assert!(!store.has_bucket(Bucket::Avatars).await);

        let Ok(url) = store
            .upload(Bucket::Avatars, "u/me.gif", b"GIF89a", "image/gif")
            .await
        else {
            panic!("upload failed");
        };
        assert_eq!(url, "http://cdn.test/storage/v1/object/public/avatars/u/me.gif");
        assert!(store.has_bucket(Bucket::Avatars).await);
        let stored = store.get(Bucket::Avatars, "u/me.gif").await;
        assert_eq!(stored.map(|o| o.bytes), Some(b"GIF89a".to_vec()));
    }

    #[tokio::test]
    async fn local_upload_writes_under_bucket_dir() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let Ok(store) = LocalBlobStore::new(dir.path(), "http://localhost").await else {
            panic!("store");
        };
        let result = store
            .upload(Bucket::Plants, "owner/leaf.png", b"\x89PNG", "image/png")
            .await;
        assert!(result.is_ok());

        let written = tokio::fs::read(dir.path().join("plants/owner/leaf.png")).await;
        assert_eq!(written.ok(), Some(b"\x89PNG".to_vec()));
    }

    #[tokio::test]
    async fn local_store_rejects_escaping_paths() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let Ok(store) = LocalBlobStore::new(dir.path(), "http://localhost").await else {
            panic!("store");
        };
        let result = store
            .upload(Bucket::Plants, "../outside.png", b"x", "image/png")
            .await;
        assert!(matches!(result, Err(MarketError::InvalidRequest(_))));
    }
}
