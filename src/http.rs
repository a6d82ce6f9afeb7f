// ABOUTME: Authenticated JSON-over-HTTP requests to the account API.
// ABOUTME: A trait seam plus a hyper HTTP/1 implementation over plain TCP.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Method;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HttpError>;

/// Sends a JSON request with a bearer token and returns the JSON response.
///
/// An empty response body decodes to `Value::Null`.
#[async_trait]
pub trait JsonApi: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> Result<Value>;
}

/// [`JsonApi`] over HTTP/1.1 to `host:port`, one connection per request.
#[derive(Debug, Clone)]
pub struct HttpApi {
    host: String,
    port: u16,
}

impl HttpApi {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[async_trait]
impl JsonApi for HttpApi {
    async fn request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let addr = self.addr();
        tracing::debug!(%method, path, %addr, "HTTP request");

        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| HttpError::Connect {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| HttpError::Request(format!("HTTP handshake failed: {}", e)))?;

        // Drive the connection until the response has been read.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("HTTP connection error: {}", e);
            }
        });

        let payload = match &body {
            Some(value) => Bytes::from(serde_json::to_vec(value)?),
            None => Bytes::new(),
        };

        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(path)
            .header("Host", &self.host)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", token));
        if body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }
        let req = builder
            .body(Full::new(payload))
            .map_err(|e| HttpError::Request(format!("failed to build request: {}", e)))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| HttpError::Request(e.to_string()))?;

        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| HttpError::Request(format!("failed to read response: {}", e)))?
            .to_bytes();

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}
