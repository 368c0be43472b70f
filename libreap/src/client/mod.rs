//! HTTP client for OCI registry communication.
//!
//! A thin reqwest client for the parts of the OCI Distribution Specification
//! v2 API a cleanup run needs: the version check, tag listing, tag -> digest
//! resolution, index inspection and manifest/tag deletion. Bearer-token
//! challenges are answered transparently.

use crate::auth::{AuthChallenge, Credentials};
use crate::config::Network;
use crate::digest::Digest;
use crate::error::{ReapError, Result};
use oci_spec::image::ImageIndex;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, LINK, RETRY_AFTER, WWW_AUTHENTICATE,
};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;


/// Manifest media types accepted when resolving tags. Indexes are included so
/// multi-platform images resolve to their index digest.
const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json";

/// Media types of multi-platform image indexes.
const INDEX_MEDIA_TYPES: [&str; 2] = [
    "application/vnd.oci.image.index.v1+json",
    "application/vnd.docker.distribution.manifest.list.v2+json",
];

fn is_index_media_type(media_type: &str) -> bool {
    INDEX_MEDIA_TYPES.iter().any(|t| media_type.starts_with(t))
}

/// Digest and media type of a manifest, read from a HEAD response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestHead {
    pub digest: Digest,
    pub media_type: Option<String>,
}

impl ManifestHead {
    /// True if the manifest is a multi-platform index.
    pub fn is_index(&self) -> bool {
        self.media_type.as_deref().is_some_and(is_index_media_type)
    }
}

/// Response from the tags list API endpoint.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    /// Repository name
    name: String,
    /// List of tag names; registries send `null` for an empty repository
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Response from a token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

/// Version information returned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryVersion {
    /// The Docker-Distribution-API-Version header value, if present.
    pub api_version: Option<String>,
}

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libreap::client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_timeout(60)
///     .with_insecure(true);
/// assert_eq!(config.timeout_seconds, 60);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
    /// Maximum idle connections per host (default: 10)
    pub max_idle_per_host: usize,
    /// Use `http://` for scheme-less registry URLs (default: false)
    pub insecure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_idle_per_host: 10,
            insecure: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the maximum idle connections per host.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Selects plain HTTP for registry hosts given without a scheme.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Builds the underlying reqwest client.
    pub(crate) fn build_http_client(&self) -> Result<ReqwestClient> {
        ReqwestClient::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .pool_max_idle_per_host(self.max_idle_per_host)
            .user_agent(concat!("reap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ReapError::network_with_source("Failed to create HTTP client", e))
    }
}

impl From<&Network> for ClientConfig {
    fn from(network: &Network) -> Self {
        Self::new()
            .with_timeout(network.timeout)
            .with_max_idle_per_host(network.max_idle_per_host)
    }
}

/// HTTP client for OCI registry operations.
#[derive(Debug)]
pub struct Client {
    /// The underlying HTTP client
    http_client: ReqwestClient,
    /// Base registry URL (e.g., "https://ghcr.io")
    registry_url: String,
    /// Configured credentials
    credentials: Credentials,
    /// Bearer token obtained from a challenge, reused for later requests
    token: Mutex<Option<String>>,
    /// Request timeout, for error messages
    timeout_seconds: u64,
}

impl Client {
    /// Creates a client for `registry_url` with default configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::client::Client;
    ///
    /// let client = Client::new("ghcr.io", None).unwrap();
    /// assert_eq!(client.registry_url(), "https://ghcr.io");
    /// ```
    pub fn new(registry_url: &str, credentials: Option<Credentials>) -> Result<Self> {
        Self::with_config(registry_url, ClientConfig::default(), credentials)
    }

    /// Creates a client with custom configuration.
    pub fn with_config(
        registry_url: &str,
        config: ClientConfig,
        credentials: Option<Credentials>,
    ) -> Result<Self> {
        let normalized_url = Self::normalize_url(registry_url, config.insecure)?;
        let http_client = config.build_http_client()?;

        Ok(Self {
            http_client,
            registry_url: normalized_url,
            credentials: credentials.unwrap_or_default(),
            token: Mutex::new(None),
            timeout_seconds: config.timeout_seconds,
        })
    }

    /// Normalizes a registry URL: adds a scheme when missing and removes
    /// trailing slashes.
    fn normalize_url(url: &str, insecure: bool) -> Result<String> {
        let url = url.trim();

        if url.is_empty() {
            return Err(ReapError::validation("Registry URL cannot be empty"));
        }

        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if insecure {
            format!("http://{}", url)
        } else {
            format!("https://{}", url)
        };

        let url = url.trim_end_matches('/').to_string();

        url::Url::parse(&url).map_err(|e| {
            ReapError::validation_with_source(format!("Invalid registry URL '{}'", url), e)
        })?;

        Ok(url)
    }

    /// Returns the base registry URL.
    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    /// Checks that the registry speaks the Distribution v2 API and that the
    /// credentials are accepted.
    pub async fn check_version(&self) -> Result<RegistryVersion> {
        let url = format!("{}/v2/", self.registry_url);
        let response = self.execute(Method::GET, &url, None).await?;

        let api_version = response
            .headers()
            .get("Docker-Distribution-API-Version")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        check_response_status(response).await?;

        Ok(RegistryVersion { api_version })
    }

    /// Fetches every tag of `repository`, following pagination.
    pub async fn fetch_tags(&self, repository: &str) -> Result<Vec<String>> {
        self.fetch_tags_paginated(repository, None).await
    }

    /// Fetches tags with an optional page size.
    pub async fn fetch_tags_paginated(
        &self,
        repository: &str,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut all_tags = Vec::new();
        let mut url = format!("{}/v2/{}/tags/list", self.registry_url, repository);

        if let Some(n) = limit {
            url.push_str(&format!("?n={}", n));
        }

        loop {
            debug!(%url, "listing tags");
            let response = self.execute(Method::GET, &url, None).await?;

            let next = extract_next_link(response.headers());

            let response = check_response_status(response).await?;

            let tags_response: TagsResponse = response.json().await.map_err(|e| {
                ReapError::validation_with_source("Failed to parse tags response", e)
            })?;

            if tags_response.name != repository {
                return Err(ReapError::validation(format!(
                    "Registry returned tags for '{}' but expected '{}'",
                    tags_response.name, repository
                )));
            }

            all_tags.extend(tags_response.tags.unwrap_or_default());

            match next {
                Some(link) => url = resolve_link(&self.registry_url, &link),
                None => break,
            }
        }

        Ok(all_tags)
    }

    /// Resolves `reference` (a tag) to the digest of the manifest it names.
    pub async fn resolve_digest(&self, repository: &str, reference: &str) -> Result<Digest> {
        Ok(self.head_manifest(repository, reference).await?.digest)
    }

    /// Resolves `reference` to its digest and media type with a HEAD request.
    pub async fn head_manifest(&self, repository: &str, reference: &str) -> Result<ManifestHead> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );

        let response = self
            .execute(Method::HEAD, &url, Some(MANIFEST_ACCEPT))
            .await?;
        let response = check_response_status(response).await?;

        let header = response
            .headers()
            .get("Docker-Content-Digest")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ReapError::validation(format!(
                    "Response for {}:{} missing Docker-Content-Digest header",
                    repository, reference
                ))
            })?;
        let digest = Digest::from_str(header)?;

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(ManifestHead { digest, media_type })
    }

    /// Lists the manifests an image index names.
    ///
    /// Returns an empty list when `reference` is a single-platform manifest.
    pub async fn fetch_index_children(
        &self,
        repository: &str,
        reference: &str,
    ) -> Result<Vec<Digest>> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, reference
        );
        let response = self.execute(Method::GET, &url, Some(MANIFEST_ACCEPT)).await?;
        let response = check_response_status(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| {
            ReapError::network_with_source(format!("Failed to read manifest {}", reference), e)
        })?;

        parse_index_children(content_type.as_deref(), &body)
    }

    /// Deletes the manifest `digest`, and with it every tag pointing at it.
    pub async fn delete_manifest(&self, repository: &str, digest: &Digest) -> Result<()> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.registry_url, repository, digest
        );
        let response = self.execute(Method::DELETE, &url, None).await?;
        check_response_status(response).await?;
        Ok(())
    }

    /// Removes the tag label `tag` without deleting its manifest.
    ///
    /// Only registries implementing Distribution Spec 1.1 tag deletion accept
    /// this request.
    pub async fn delete_tag(&self, repository: &str, tag: &str) -> Result<()> {
        let url = format!("{}/v2/{}/manifests/{}", self.registry_url, repository, tag);
        let response = self.execute(Method::DELETE, &url, None).await?;
        check_response_status(response).await?;
        Ok(())
    }

    /// Sends a request, answering one Bearer challenge if the registry
    /// returns 401.
    async fn execute(&self, method: Method, url: &str, accept: Option<&str>) -> Result<Response> {
        let response = self.send_once(method.clone(), url, accept).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| AuthChallenge::parse(v).ok())
            .filter(AuthChallenge::is_bearer);

        let Some(challenge) = challenge else {
            return Ok(response);
        };

        let token = self.fetch_token(&challenge).await?;
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token);
        }

        self.send_once(method, url, accept).await
    }

    async fn send_once(&self, method: Method, url: &str, accept: Option<&str>) -> Result<Response> {
        let mut request = self.http_client.request(method, url);

        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }

        let cached = self.token.lock().ok().and_then(|slot| slot.clone());
        let auth_header = match cached {
            Some(token) => Some(format!("Bearer {}", token)),
            None => self.credentials.to_header_value(),
        };
        if let Some(auth_header) = auth_header {
            request = request.header(AUTHORIZATION, auth_header);
        }

        request
            .send()
            .await
            .map_err(|e| translate_reqwest_error(e, &self.registry_url, self.timeout_seconds))
    }

    /// Exchanges the configured credentials for a registry token.
    async fn fetch_token(&self, challenge: &AuthChallenge) -> Result<String> {
        let url = challenge.token_url()?;
        debug!(realm = %challenge.realm, scope = ?challenge.scope, "requesting registry token");

        let mut request = self.http_client.get(url);
        if let Some(auth_header) = self.credentials.to_header_value() {
            request = request.header(AUTHORIZATION, auth_header);
        }

        let response = request
            .send()
            .await
            .map_err(|e| translate_reqwest_error(e, &challenge.realm, self.timeout_seconds))?;

        let response = check_response_status(response).await.map_err(|e| match e {
            ReapError::Authentication { message, status_code } => ReapError::authentication(
                format!("Token request rejected: {}", message),
                status_code,
            ),
            other => other,
        })?;

        let body: TokenResponse = response.json().await.map_err(|e| {
            ReapError::validation_with_source("Failed to parse token response", e)
        })?;

        body.token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ReapError::authentication("Token response contained no token", None))
    }
}

/// Parses the child digests of an index body. Plain manifests have none.
///
/// The body's `mediaType` and a top-level `manifests` array identify an
/// index when the Content-Type header is missing or generic.
pub(crate) fn parse_index_children(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Vec<Digest>> {
    let document: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| ReapError::validation_with_source("Manifest is not valid JSON", e))?;

    let body_type = document.get("mediaType").and_then(|v| v.as_str());
    let is_index = content_type.is_some_and(is_index_media_type)
        || body_type.is_some_and(is_index_media_type)
        || (body_type.is_none() && document.get("manifests").is_some_and(|m| m.is_array()));
    if !is_index {
        return Ok(Vec::new());
    }

    let index: ImageIndex = serde_json::from_slice(body)
        .map_err(|e| ReapError::validation_with_source("Failed to parse image index", e))?;
    index
        .manifests()
        .iter()
        .map(|descriptor| Digest::from_str(&descriptor.digest().to_string()))
        .collect()
}

/// Extracts the `rel="next"` target from a Link header.
///
/// The target may be a path (`</v2/app/tags/list?n=2&last=b>`) or an
/// absolute URL (GitHub API).
pub(crate) fn extract_next_link(headers: &HeaderMap) -> Option<String> {
    let link_str = headers.get(LINK)?.to_str().ok()?;

    for link_part in link_str.split(',') {
        let link_part = link_part.trim();

        if (link_part.contains("rel=\"next\"") || link_part.contains("rel='next'"))
            && let Some(start) = link_part.find('<')
            && let Some(end) = link_part.find('>')
            && start < end
        {
            return Some(link_part[start + 1..end].to_string());
        }
    }

    None
}

/// Joins a Link target with `base` unless it is already absolute.
pub(crate) fn resolve_link(base: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("{}{}", base, link)
    }
}

/// Translates a reqwest error into a ReapError.
pub(crate) fn translate_reqwest_error(
    error: reqwest::Error,
    target: &str,
    timeout_seconds: u64,
) -> ReapError {
    if error.is_timeout() {
        ReapError::network_with_source(
            format!(
                "Request to {} timed out after {} seconds",
                target, timeout_seconds
            ),
            error,
        )
    } else if error.is_connect() {
        ReapError::network_with_source(format!("Failed to connect to {}", target), error)
    } else {
        ReapError::network_with_source(
            format!("Network error communicating with {}", target),
            error,
        )
    }
}

/// Checks the HTTP response status and translates errors to ReapError.
pub(crate) async fn check_response_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(unable to read response body)"));

    match status {
        StatusCode::UNAUTHORIZED => Err(ReapError::authentication(
            format!("Authentication required for {}: {}", url, error_body),
            Some(401),
        )),
        StatusCode::FORBIDDEN => Err(ReapError::authentication(
            format!("Access forbidden for {}: {}", url, error_body),
            Some(403),
        )),
        StatusCode::NOT_FOUND => Err(ReapError::not_found("resource", url)),
        StatusCode::TOO_MANY_REQUESTS => Err(ReapError::rate_limit(
            format!("Rate limit exceeded for {}", url),
            retry_after,
        )),
        s if s.is_server_error() => Err(ReapError::server(
            format!("Server error from {}: {}", url, error_body),
            s.as_u16(),
        )),
        _ => Err(ReapError::network(format!(
            "HTTP {} from {}: {}",
            status.as_u16(),
            url,
            error_body
        ))),
    }
}
