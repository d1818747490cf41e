use std::future::Future;
use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client};
use tracing::debug;

use crate::{Error, Result, DEFAULT_TIMEOUT_SECS, USER_AGENT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    /// POST with an urlencoded form body.
    PostForm(Vec<(String, String)>),
}

/// One upstream request for one page of one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub method: Method,
}

impl PageRequest {
    pub fn get(url: impl Into<String>) -> Self {
        PageRequest {
            url: url.into(),
            method: Method::Get,
        }
    }

    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        PageRequest {
            url: url.into(),
            method: Method::PostForm(form),
        }
    }
}

/// The untouched response body of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub body: String,
    pub content_type: Option<String>,
}

impl RawPage {
    pub fn new(body: impl Into<String>) -> Self {
        RawPage {
            body: body.into(),
            content_type: None,
        }
    }
}

/// Issues exactly one request per call. Never retries.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, request: &PageRequest) -> impl Future<Output = Result<RawPage>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    // Client uses Arc so we can clone cheaply
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| Error::Transport {
                url: String::new(),
                source,
            })?;
        Ok(HttpFetcher { client })
    }

    pub fn from_client(client: Client) -> Self {
        HttpFetcher { client }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<RawPage> {
        debug!(url = %request.url, "requesting page");
        let transport = |source| Error::Transport {
            url: request.url.clone(),
            source,
        };

        let builder = match &request.method {
            Method::Get => self.client.get(&request.url),
            Method::PostForm(form) => self.client.post(&request.url).form(form),
        };
        let res = builder.send().await.map_err(transport)?;

        let status = res.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = res.text().await.map_err(transport)?;
        Ok(RawPage { body, content_type })
    }
}
