// src/fetch/http.rs
// =============================================================================
// The default fetcher: a plain HTTP GET with reqwest.
//
// Key functionality:
// - One shared Client for every worker (connection pooling)
// - Timeout, redirect limit and User-Agent taken from EngineConfig
// - Every response body is delivered, whatever the status code; the handler
//   decides what a 404 page means
// - reqwest errors are sorted into FetchError variants so the log line says
//   what actually went wrong
// =============================================================================

use super::{FetchError, Fetcher};
use crate::config::EngineConfig;
use crate::error::EngineError;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a client from the HTTP settings in `config`
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Wraps an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| categorize_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "non-success response");
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout { url: url.to_string() }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        self.get(target).boxed()
    }
}

// Sorts a reqwest error from `send()` into a FetchError
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - Redirect loop / too many redirects
// - Connection refused or DNS resolution failure
// - Anything else (bad URL, TLS, protocol errors)
fn categorize_request_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();

    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_redirect() {
        FetchError::TooManyRedirects { url }
    } else if error.is_connect() {
        FetchError::Connect { url, source: error }
    } else {
        FetchError::Request { url, source: error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    // A client that ignores HTTP_PROXY & co so requests reach 127.0.0.1
    fn local_fetcher() -> HttpFetcher {
        let client = Client::builder()
            .no_proxy()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();
        HttpFetcher::from_client(client)
    }

    // Serves exactly one canned HTTP response and returns the URL to hit
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/page", addr)
    }

    // Accepts one connection and holds it open without ever answering
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        });

        format!("http://{}/slow", addr)
    }

    // Promises 100 bytes, sends 5, then hangs up
    const TRUNCATED: &str =
        "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\nhello";

    #[test]
    fn test_build_from_config() {
        assert!(HttpFetcher::new(&EngineConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await;

        let body = local_fetcher().fetch(&url).await.unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_fetch_delivers_error_page_body() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 7\r\nConnection: close\r\n\r\nmissing",
        )
        .await;

        let body = local_fetcher().fetch(&url).await.unwrap();
        assert_eq!(body, "missing");
    }

    #[tokio::test]
    async fn test_truncated_body_is_body_error() {
        let url = serve_once(TRUNCATED).await;

        let err = local_fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Body { .. }), "got {err:?}");
        assert_eq!(err.url(), url);
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let url = serve_silence().await;
        let client = Client::builder()
            .no_proxy()
            .timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();

        let err = HttpFetcher::from_client(client).fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn test_body_failure_finishes_task_without_handler() {
        use crate::engine::Engine;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let url = serve_once(TRUNCATED).await;
        let engine = Engine::new(EngineConfig::with_workers(1), Arc::new(local_fetcher())).unwrap();
        let handled = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&handled);
        engine
            .submit(url, move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let summary = engine.run().unwrap().await.unwrap();
        assert_eq!(handled.load(Ordering::SeqCst), 0);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Grab a free port, then close it so nothing is listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/", addr);
        let err = local_fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Connect { .. }), "got {err:?}");
        assert_eq!(err.url(), url);
    }
}
