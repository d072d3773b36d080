//! HTTP downloader backed by reqwest

use super::Downloader;
use crate::config::DownloadConfig;
use crate::error::DownloadError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::LOCATION, redirect, Client, Response};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Streams HTTP responses into a sink.
///
/// Automatic redirects are disabled on the client so that every request can
/// choose its own redirect budget.
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Create a downloader with its own connection pool
    pub fn new(config: &DownloadConfig) -> Result<Self, DownloadError> {
        Self::with_timeouts(config.connect_timeout(), config.read_timeout())
    }

    /// A stalled connection or body read fails the download after the given limits
    pub fn with_timeouts(
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Issue the request, following redirects up to `max_redirects` hops
    async fn resolve(&self, url: &str, max_redirects: usize) -> Result<Response, DownloadError> {
        let mut target = url.to_string();
        let mut hops = 0;

        loop {
            let response = self.client.get(&target).send().await?;
            let status = response.status();

            if status.is_redirection() {
                if hops >= max_redirects {
                    return Err(DownloadError::TooManyRedirects(max_redirects));
                }

                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        DownloadError::InvalidRedirect(format!("{} without Location", status))
                    })?;
                let next = response
                    .url()
                    .join(location)
                    .map_err(|_| DownloadError::InvalidRedirect(location.to_string()))?;

                debug!("[DOWNLOAD] {} redirected to {}", target, next);
                target = next.to_string();
                hops += 1;
                continue;
            }

            if !status.is_success() {
                return Err(DownloadError::Status(status.as_u16()));
            }

            return Ok(response);
        }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn get(
        &self,
        url: &str,
        max_redirects: usize,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, DownloadError> {
        let response = self.resolve(url, max_redirects).await?;

        let mut stream = response.bytes_stream();
        let mut total_bytes = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            total_bytes += chunk.len() as u64;
        }
        sink.flush().await?;

        debug!("[DOWNLOAD] {} complete, {} bytes", url, total_bytes);
        Ok(total_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve canned responses keyed by request path, one connection per request
    async fn start_test_server(
        routes: Vec<(&'static str, String)>,
    ) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let response = routes
                    .iter()
                    .find(|(p, _)| *p == path)
                    .map(|(_, r)| r.clone())
                    .unwrap_or_else(|| not_found());
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (addr, handle)
    }

    fn ok(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }

    fn redirect_to(location: &str) -> String {
        format!(
            "HTTP/1.1 302 Found\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            location
        )
    }

    fn not_found() -> String {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    }

    #[tokio::test]
    async fn test_download_streams_body() {
        let (addr, _server) = start_test_server(vec![("/fw.bin", ok("firmware bytes"))]).await;
        let downloader = HttpDownloader::new(&DownloadConfig::default()).unwrap();

        let mut sink: Vec<u8> = Vec::new();
        let written = downloader
            .get(&format!("http://{}/fw.bin", addr), 0, &mut sink)
            .await
            .unwrap();

        assert_eq!(written, 14);
        assert_eq!(sink, b"firmware bytes");
    }

    #[tokio::test]
    async fn test_download_follows_one_redirect() {
        let (addr, _server) = start_test_server(vec![
            ("/latest", redirect_to("/fw-2.bin")),
            ("/fw-2.bin", ok("v2")),
        ])
        .await;
        let downloader = HttpDownloader::new(&DownloadConfig::default()).unwrap();

        let mut sink: Vec<u8> = Vec::new();
        downloader
            .get(&format!("http://{}/latest", addr), 1, &mut sink)
            .await
            .unwrap();

        assert_eq!(sink, b"v2");
    }

    #[tokio::test]
    async fn test_download_redirect_budget_exceeded() {
        let (addr, _server) = start_test_server(vec![
            ("/a", redirect_to("/b")),
            ("/b", redirect_to("/c")),
            ("/c", ok("never")),
        ])
        .await;
        let downloader = HttpDownloader::new(&DownloadConfig::default()).unwrap();

        let mut sink: Vec<u8> = Vec::new();
        let err = downloader
            .get(&format!("http://{}/a", addr), 1, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::TooManyRedirects(1)));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let (addr, _server) = start_test_server(vec![]).await;
        let downloader = HttpDownloader::new(&DownloadConfig::default()).unwrap();

        let mut sink: Vec<u8> = Vec::new();
        let err = downloader
            .get(&format!("http://{}/missing", addr), 1, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status(404)));
    }

    #[tokio::test]
    async fn test_download_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let downloader = HttpDownloader::new(&DownloadConfig::default()).unwrap();
        let mut sink: Vec<u8> = Vec::new();
        let err = downloader
            .get(&format!("http://{}/fw.bin", addr), 1, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Request(_)));
    }

    #[tokio::test]
    async fn test_download_stalled_body_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
                .await;
            // Hold the connection open without sending the rest
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let downloader =
            HttpDownloader::with_timeouts(Duration::from_secs(1), Duration::from_millis(200))
                .unwrap();
        let started = std::time::Instant::now();

        let mut sink: Vec<u8> = Vec::new();
        let err = downloader
            .get(&format!("http://{}/fw.bin", addr), 0, &mut sink)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Request(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
