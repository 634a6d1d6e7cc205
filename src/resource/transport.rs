// ABOUTME: Delivery of custom-resource responses to the request's callback URL.
// ABOUTME: HTTP PUT via hyper, plus a recording transport for rehearsals and tests.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::net::TcpStream;

use super::response::CustomResourceResponse;

/// Sends a response to a callback target.
#[async_trait]
pub trait CallbackTransport: Send + Sync {
    async fn deliver(
        &self,
        url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), TransportError>;
}

/// Errors from response delivery.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid callback URL {0}")]
    InvalidUrl(String),

    #[error("unsupported callback scheme in {0} (only http is built in)")]
    UnsupportedScheme(String),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to connect to {0}: {1}")]
    Connect(String, std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("callback rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("callback timed out after {0:?}")]
    Timeout(Duration),
}

/// PUTs the JSON response to a plain-HTTP callback URL.
///
/// The body is sent with an empty `Content-Type`, which presigned callback
/// URLs require because the header is part of the signature.
#[derive(Debug, Clone)]
pub struct HttpCallback {
    timeout: Duration,
}

impl Default for HttpCallback {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpCallback {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn put(&self, url: &str, body: Vec<u8>) -> Result<(), TransportError> {
        let uri: hyper::Uri = url
            .parse()
            .map_err(|_| TransportError::InvalidUrl(url.to_string()))?;

        if uri.scheme_str() != Some("http") {
            return Err(TransportError::UnsupportedScheme(url.to_string()));
        }
        let host = uri
            .host()
            .ok_or_else(|| TransportError::InvalidUrl(url.to_string()))?
            .to_string();
        let port = uri.port_u16().unwrap_or(80);
        let authority = uri
            .authority()
            .map(|a| a.as_str().to_string())
            .unwrap_or_else(|| host.clone());
        let path = uri
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .map_err(|e| TransportError::Connect(authority.clone(), e))?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| TransportError::Http(format!("handshake failed: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("callback connection error: {}", e);
            }
        });

        let req = hyper::Request::builder()
            .method("PUT")
            .uri(&path)
            .header("Host", &authority)
            .header("Content-Type", "")
            .header("Content-Length", body.len())
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| TransportError::Http(format!("failed to build request: {}", e)))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| TransportError::Http(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .into_body()
                .collect()
                .await
                .map(|b| String::from_utf8_lossy(&b.to_bytes()).into_owned())
                .unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl CallbackTransport for HttpCallback {
    async fn deliver(
        &self,
        url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), TransportError> {
        let body = serde_json::to_vec(response)?;
        tokio::time::timeout(self.timeout, self.put(url, body))
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
    }
}

/// Keeps every delivered response in memory instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    delivered: Mutex<Vec<(String, CustomResourceResponse)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses in delivery order.
    pub fn responses(&self) -> Vec<CustomResourceResponse> {
        self.delivered
            .lock()
            .iter()
            .map(|(_, response)| response.clone())
            .collect()
    }

    /// Callback URLs in delivery order.
    pub fn urls(&self) -> Vec<String> {
        self.delivered
            .lock()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

#[async_trait]
impl CallbackTransport for RecordingTransport {
    async fn deliver(
        &self,
        url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), TransportError> {
        self.delivered
            .lock()
            .push((url.to_string(), response.clone()));
        Ok(())
    }
}
