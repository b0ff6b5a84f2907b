use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, USER_AGENT};
use reqwest::{Client, ClientBuilder, Method};
use std::time::Duration;

use crate::error::{Result, SourceError};
use crate::models::ImageRequest;

/// Desktop user agent; the site serves a different layout to mobile browsers.
pub const WEB_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:110.0) Gecko/20100101 Firefox/110.0";

const GA_SEED: &str = "123456789";

#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

impl SourceRequest {
    pub fn get(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers,
        }
    }
}

impl From<ImageRequest> for SourceRequest {
    fn from(image: ImageRequest) -> Self {
        Self::get(image.url, image.headers)
    }
}

#[derive(Debug, Clone)]
pub struct SourceResponse {
    pub status: u16,
    /// Final URL after redirects.
    pub url: String,
    pub body: String,
}

impl SourceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SourceError::Status {
                status: self.status,
                url: self.url,
            })
        }
    }
}

/// Executes requests on behalf of a source. The host may supply its own.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: SourceRequest) -> Result<SourceResponse>;
}

/// Permute the characters of `seed` (Fisher-Yates).
pub fn shuffle<R: Rng + ?Sized>(seed: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = seed.chars().collect();
    chars.shuffle(rng);
    chars.into_iter().collect()
}

/// Synthetic Google Analytics cookie the site expects on every request.
pub fn tracking_cookie<R: Rng + ?Sized>(rng: &mut R, unix_secs: i64) -> String {
    format!("_ga=GA1.2.{}.{}", shuffle(GA_SEED, rng), unix_secs)
}

/// Network-level rewrite applied to every outgoing request: append the tracking
/// cookie to any existing cookies and force the desktop user agent.
pub fn intercept<R: Rng + ?Sized>(
    mut request: SourceRequest,
    rng: &mut R,
    unix_secs: i64,
) -> Result<SourceRequest> {
    let tracking = tracking_cookie(rng, unix_secs);
    // Existing cookie bytes are kept as-is; they need not be valid UTF-8.
    let cookie = match request.headers.get(COOKIE) {
        Some(existing) if !existing.is_empty() => {
            let mut value = existing.as_bytes().to_vec();
            value.extend_from_slice(b"; ");
            value.extend_from_slice(tracking.as_bytes());
            HeaderValue::from_bytes(&value)?
        }
        _ => HeaderValue::from_str(&tracking)?,
    };

    request.headers.insert(COOKIE, cookie);
    request
        .headers
        .insert(USER_AGENT, HeaderValue::from_static(WEB_USER_AGENT));
    Ok(request)
}

/// Configuration for the reqwest-backed executor
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub enable_gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            enable_gzip: true,
        }
    }
}

/// Default executor: a reqwest client with the interceptor applied to every request.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(WEB_USER_AGENT)
            .gzip(config.enable_gzip)
            .brotli(config.enable_gzip)
            .build()?;

        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: SourceRequest) -> Result<SourceResponse> {
        let request = {
            let mut rng = rand::thread_rng();
            intercept(request, &mut rng, Utc::now().timestamp())?
        };

        log::debug!("{} {}", request.method, request.url);

        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .send()
            .await?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await?;

        Ok(SourceResponse { status, url, body })
    }
}
