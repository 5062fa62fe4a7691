//! HTTP seam for the distribution client
//!
//! The client only ever issues GET requests and only cares about the status
//! code and the body, so the seam is that small. [`ReqwestHttp`] is the
//! production implementation; tests script responses per URL.

use std::time::Duration;

use async_trait::async_trait;

use super::error::RemoteError;

/// A GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Request without extra headers
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Builder: add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for `200 OK`
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues GET requests
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send the request and collect the whole body
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError>;
}

/// [`HttpClient`] backed by `reqwest` with rustls
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    /// Build a client with a request timeout and user agent.
    ///
    /// The GitHub API rejects requests without a user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttp {
    async fn get(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
        let mut builder = self.client.get(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
