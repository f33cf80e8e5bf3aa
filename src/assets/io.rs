use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::Result;

/// Where a model comes from.
///
/// A locator is the identity of a load request: equal locators resolve to
/// the same cached prefab. In-memory payloads carry a label for logging
/// and are keyed by content hash.
#[derive(Debug, Clone)]
pub enum Locator {
    /// Remote model, fetched over HTTP(S).
    Url(String),
    /// Local file on disk.
    Path(PathBuf),
    /// Raw glTF or GLB bytes already in memory.
    Bytes { label: String, data: Arc<[u8]> },
}

impl Locator {
    /// Auto-detects URL versus filesystem path.
    #[must_use]
    pub fn auto(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::Path(PathBuf::from(source))
        }
    }

    #[must_use]
    pub fn from_bytes(label: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes {
            label: label.into(),
            data: data.into(),
        }
    }

    /// Stable cache key. Byte payloads hash their content so two different
    /// uploads under the same label do not collide.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::Url(url) => format!("url:{url}"),
            Self::Path(path) => format!("path:{}", path.display()),
            Self::Bytes { label, data } => {
                let mut hasher = rustc_hash::FxHasher::default();
                data.hash(&mut hasher);
                format!("bytes:{label}:{:016x}", hasher.finish())
            }
        }
    }

    /// Short human-readable name, used for prefab and log labels.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Url(url) => AssetReaderVariant::source_filename(url).to_string(),
            Self::Path(path) => path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("model")
                .to_string(),
            Self::Bytes { label, .. } => label.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes { label, data } => write!(f, "bytes:{label} ({} bytes)", data.len()),
        }
    }
}

/// Async byte source for model files and their sibling resources.
pub trait AssetReader: Send + Sync {
    /// Reads `uri`, resolved relative to the reader's root.
    fn read_bytes(&self, uri: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// Local filesystem reader rooted at a directory.
pub struct FileAssetReader {
    root_path: PathBuf,
}

impl FileAssetReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

impl AssetReader for FileAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.root_path.join(uri);
        let data = tokio::fs::read(&path).await?;
        Ok(data)
    }
}

/// HTTP reader rooted at the model's directory URL.
#[cfg(feature = "http")]
pub struct HttpAssetReader {
    root_url: url::Url,
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpAssetReader {
    pub fn new(url_str: &str) -> Result<Self> {
        let url = url::Url::parse(url_str)?;
        // Relative sibling resolution needs a trailing slash on the root
        let root_url = if url.path().ends_with('/') {
            url
        } else {
            let mut u = url.clone();
            if let Ok(mut segments) = u.path_segments_mut() {
                segments.pop();
                segments.push("");
            }
            u
        };

        Ok(Self {
            root_url,
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
        })
    }

    #[inline]
    #[must_use]
    pub fn root_url(&self) -> &url::Url {
        &self.root_url
    }
}

#[cfg(feature = "http")]
impl AssetReader for HttpAssetReader {
    async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        let url = self.root_url.join(uri)?;
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(crate::errors::ReviewError::HttpResponseError {
                status: resp.status().as_u16(),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Reader dispatch without trait object overhead.
#[derive(Clone)]
pub enum AssetReaderVariant {
    File(Arc<FileAssetReader>),
    #[cfg(feature = "http")]
    Http(Arc<HttpAssetReader>),
}

impl AssetReaderVariant {
    /// Picks the reader kind from the source string.
    pub fn from_source(source: &str) -> Result<Self> {
        if source.starts_with("http://") || source.starts_with("https://") {
            #[cfg(feature = "http")]
            {
                Ok(Self::Http(Arc::new(HttpAssetReader::new(source)?)))
            }
            #[cfg(not(feature = "http"))]
            {
                Err(crate::errors::ReviewError::FeatureNotEnabled(
                    "http (enable it with `features = [\"http\"]`)".to_string(),
                ))
            }
        } else {
            Ok(Self::File(Arc::new(FileAssetReader::new(source))))
        }
    }

    pub async fn read_bytes(&self, uri: &str) -> Result<Vec<u8>> {
        match self {
            Self::File(r) => r.read_bytes(uri).await,
            #[cfg(feature = "http")]
            Self::Http(r) => r.read_bytes(uri).await,
        }
    }

    /// Final path segment of a source string.
    #[must_use]
    pub fn source_filename(source: &str) -> &str {
        if source.starts_with("http://") || source.starts_with("https://") {
            source.rsplit('/').next().unwrap_or(source)
        } else {
            Path::new(source)
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_distinguish_sources() {
        let a = Locator::Url("https://host/organoid/7/inner".to_string());
        let b = Locator::Url("https://host/organoid/7/outer".to_string());
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), a.cache_key());
    }

    #[test]
    fn byte_locators_key_on_content() {
        let a = Locator::from_bytes("upload.glb", vec![1u8, 2, 3]);
        let b = Locator::from_bytes("upload.glb", vec![9u8, 9, 9]);
        assert_ne!(
            a.cache_key(),
            b.cache_key(),
            "same label, different payloads must not alias"
        );
    }

    #[test]
    fn source_filename_strips_directories() {
        assert_eq!(
            AssetReaderVariant::source_filename("https://host/api/organoid/3/inner"),
            "inner"
        );
        assert_eq!(
            AssetReaderVariant::source_filename("models/organoid.glb"),
            "organoid.glb"
        );
    }
}
