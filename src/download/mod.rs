//! Remote content download abstraction

mod http;

pub use http::HttpDownloader;

use crate::error::DownloadError;
use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// Fetches remote content into a sink.
///
/// Chunks are written to the sink in the order they arrive and the future
/// resolves only after the last chunk has been written.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// GET `url`, following at most `max_redirects` redirects.
    ///
    /// Returns the number of bytes written to `sink`.
    async fn get(
        &self,
        url: &str,
        max_redirects: usize,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError>;
}
