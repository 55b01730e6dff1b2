// src/server.rs

//! Read-only HTTP server for the feed document.
//!
//! Every request gets the verbatim bytes of the durable feed artifact;
//! there is no routing and no request parsing. The server holds no feed
//! state of its own: it re-reads the file on each request, so it stays
//! decoupled from the producer through the filesystem.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::error::Result;
use crate::shutdown::Shutdown;

const CONTENT_TYPE: &str = "application/rss+xml";

/// Serves the current feed bytes until the shutdown signal is raised.
pub struct FeedServer {
    listener: TcpListener,
    rss_cache: PathBuf,
}

impl FeedServer {
    /// Bind on `0.0.0.0:port`. Port 0 picks an ephemeral port.
    pub async fn bind(port: u16, rss_cache: impl Into<PathBuf>) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        Ok(Self {
            listener,
            rss_cache: rss_cache.into(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and answer requests until `shutdown` is raised.
    ///
    /// New connections stop being accepted as soon as the signal is
    /// observed; responses already in flight are allowed to finish before
    /// this returns.
    pub async fn serve(self, shutdown: Shutdown) -> Result<()> {
        let mut inflight: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.raised() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let rss_cache = self.rss_cache.clone();
                        inflight.spawn(async move {
                            if let Err(err) = handle_request(stream, &rss_cache).await {
                                log::debug!("request from {peer} failed: {err}");
                            }
                        });
                    }
                    Err(err) => log::warn!("failed to accept connection: {err}"),
                },
            }
            // Reap finished handlers so the set stays small.
            while inflight.try_join_next().is_some() {}
        }

        while inflight.join_next().await.is_some() {}
        Ok(())
    }
}

async fn handle_request(mut stream: TcpStream, rss_cache: &Path) -> std::io::Result<()> {
    // The response is the same for every method and path, so the request
    // head is drained without being parsed.
    let mut head = [0u8; 1024];
    let _ = stream.read(&mut head).await?;

    let response = match tokio::fs::read(rss_cache).await {
        Ok(body) => {
            let mut response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {CONTENT_TYPE}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            response.extend_from_slice(&body);
            response
        }
        Err(err) => {
            // First cycle not finished yet, or the cache is unreadable.
            log::error!("could not read feed at {}: {err}", rss_cache.display());
            let body = b"feed not generated yet\n";
            let mut response = format!(
                "HTTP/1.1 500 Internal Server Error\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            response.extend_from_slice(body);
            response
        }
    };

    stream.write_all(&response).await?;
    stream.shutdown().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    async fn start(rss_cache: PathBuf) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
        let server = FeedServer::bind(0, rss_cache).await.unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = Shutdown::new();
        let task = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                server.serve(shutdown).await.unwrap();
            })
        };
        (addr, shutdown, task)
    }

    #[tokio::test]
    async fn serves_feed_bytes_verbatim() {
        let tmp = TempDir::new().unwrap();
        let rss_cache = tmp.path().join("feed.rss");
        tokio::fs::write(&rss_cache, b"<rss version=\"2.0\"></rss>")
            .await
            .unwrap();

        let (addr, shutdown, task) = start(rss_cache).await;

        let response = reqwest::get(format!("http://127.0.0.1:{}/", addr.port()))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["content-type"],
            "application/rss+xml"
        );
        assert_eq!(response.text().await.unwrap(), "<rss version=\"2.0\"></rss>");

        shutdown.raise();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("server should stop promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn any_path_gets_the_same_document() {
        let tmp = TempDir::new().unwrap();
        let rss_cache = tmp.path().join("feed.rss");
        tokio::fs::write(&rss_cache, b"feed-bytes").await.unwrap();

        let (addr, shutdown, _task) = start(rss_cache).await;

        let response = reqwest::get(format!(
            "http://127.0.0.1:{}/some/other/path?x=1",
            addr.port()
        ))
        .await
        .unwrap();
        assert_eq!(response.text().await.unwrap(), "feed-bytes");

        shutdown.raise();
    }

    #[tokio::test]
    async fn missing_artifact_is_a_server_error() {
        let tmp = TempDir::new().unwrap();
        let (addr, shutdown, _task) = start(tmp.path().join("never-written.rss")).await;

        let response = reqwest::get(format!("http://127.0.0.1:{}/", addr.port()))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);

        shutdown.raise();
    }
}
