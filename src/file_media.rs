//! FileMedia - byte sources holding compressed containers.

use crate::container::decompress_to_vec;
use crate::error::Result;

/// Local file source.
#[derive(Debug, Clone)]
pub struct LocalFileMedia {
    path: String,
    name: String,
    length: u64,
}

impl LocalFileMedia {
    pub fn new(path: &str) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            path: path.to_string(),
            name,
            length: metadata.len(),
        })
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sync read of the whole file
    pub fn read_all_sync(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    /// Read and decode the container stored in this file.
    pub fn decompress_sync(&self) -> Result<Vec<u8>> {
        let compressed = self.read_all_sync()?;
        let decoded = decompress_to_vec(&compressed)?;
        tracing::debug!(
            file = %self.name,
            compressed = compressed.len(),
            decoded = decoded.len(),
            "decompressed file"
        );
        Ok(decoded)
    }
}

// Async FileMedia trait (requires 'async' feature)
#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use std::pin::Pin;

/// Abstract source that can provide its bytes asynchronously.
///
/// Implement this trait for custom byte sources (e.g., HTTP downloads).
/// The library provides [`LocalFileMedia`] for local files.
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub trait FileMedia: Send + Sync {
    fn length(&self) -> u64;
    fn name(&self) -> &str;
    fn read_all(&self) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>>;
}

#[cfg(feature = "async")]
impl FileMedia for LocalFileMedia {
    fn length(&self) -> u64 {
        self.length
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_all(&self) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>> {
        let path = self.path.clone();
        Box::pin(async move {
            use tokio::io::AsyncReadExt;
            let mut file = tokio::fs::File::open(&path).await?;
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer).await?;
            Ok(buffer)
        })
    }
}

/// Fetch a container from `media` and decode it.
///
/// Decoding is synchronous once the bytes are in memory.
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub async fn decompress_media<M: FileMedia + ?Sized>(media: &M) -> Result<Vec<u8>> {
    let compressed = media.read_all().await?;
    decompress_to_vec(&compressed)
}
