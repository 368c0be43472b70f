//! Authentication handling for registry backends.
//!
//! CI runs authenticate with a token (GitHub Packages, GHCR) or with a
//! username/password pair (self-hosted OCI registries). OCI registries may
//! answer `401` with a `WWW-Authenticate` challenge; [`AuthChallenge`] parses
//! it so the client can exchange the configured credentials for a bearer
//! token.

use crate::error::{ReapError, Result};
use url::Url;


/// Environment variable holding an API token.
pub const TOKEN_ENV: &str = "REAP_TOKEN";
/// Fallback token variable set by GitHub Actions.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
/// Environment variable holding a username.
pub const USERNAME_ENV: &str = "REAP_USERNAME";
/// Environment variable holding a password.
pub const PASSWORD_ENV: &str = "REAP_PASSWORD";

/// Credentials for registry authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// No authentication (anonymous access)
    #[default]
    Anonymous,

    /// HTTP Basic authentication with username and password
    Basic {
        /// Username for authentication
        username: String,
        /// Password (or token used as password)
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },
}

impl Credentials {
    /// Creates anonymous credentials.
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    /// Creates Basic authentication credentials.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::auth::Credentials;
    ///
    /// let creds = Credentials::basic("ci-bot", "s3cret");
    /// assert!(creds.to_header_value().unwrap().starts_with("Basic "));
    /// ```
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates Bearer token credentials.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Resolves credentials from environment-style variables.
    ///
    /// A token (`REAP_TOKEN`, then `GITHUB_TOKEN`) is used as a Bearer token,
    /// or as the Basic password when `REAP_USERNAME` is also set. Without a
    /// token, `REAP_USERNAME` + `REAP_PASSWORD` give Basic credentials.
    /// Anything else is anonymous. Empty values count as unset.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::auth::Credentials;
    ///
    /// let creds = Credentials::from_lookup(|key| match key {
    ///     "GITHUB_TOKEN" => Some("ghs_abc".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(creds, Credentials::bearer("ghs_abc"));
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get(TOKEN_ENV).or_else(|| get(GITHUB_TOKEN_ENV));
        let username = get(USERNAME_ENV);

        match (token, username) {
            (Some(token), Some(username)) => Self::basic(username, token),
            (Some(token), None) => Self::bearer(token),
            (None, Some(username)) => match get(PASSWORD_ENV) {
                Some(password) => Self::basic(username, password),
                None => Self::Anonymous,
            },
            (None, None) => Self::Anonymous,
        }
    }

    /// Resolves credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Returns the token usable as a GitHub API bearer token, if any.
    ///
    /// Basic credentials carry the token in the password field.
    pub fn api_token(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Basic { password, .. } => Some(password),
            Self::Bearer { token } => Some(token),
        }
    }

    /// Returns the Authorization header value for these credentials.
    pub fn to_header_value(&self) -> Option<String> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                use base64::{Engine as _, engine::general_purpose};
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials);
                Some(format!("Basic {}", encoded))
            }
            Self::Bearer { token } => Some(format!("Bearer {}", token)),
        }
    }
}

/// Information parsed from a WWW-Authenticate header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// The authentication scheme (e.g., "Bearer")
    pub scheme: String,

    /// The authentication realm (token endpoint for Bearer)
    pub realm: String,

    /// The service identifier
    pub service: Option<String>,

    /// The scope being requested
    pub scope: Option<String>,
}

impl AuthChallenge {
    /// Parses a WWW-Authenticate header value.
    ///
    /// Example header: `Bearer realm="https://ghcr.io/token",service="ghcr.io",scope="repository:acme/app:pull"`
    ///
    /// Quoted values may contain commas (`scope="repository:a:pull,delete"`).
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::auth::AuthChallenge;
    ///
    /// let header = r#"Bearer realm="https://ghcr.io/token",service="ghcr.io""#;
    /// let challenge = AuthChallenge::parse(header).unwrap();
    /// assert_eq!(challenge.scheme, "Bearer");
    /// ```
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();

        let (scheme, params) = header
            .split_once(' ')
            .ok_or_else(|| ReapError::validation("Invalid WWW-Authenticate header format"))?;

        let mut realm = None;
        let mut service = None;
        let mut scope = None;

        for (key, value) in split_params(params) {
            match key.as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        let realm = realm.ok_or_else(|| {
            ReapError::validation("WWW-Authenticate header missing required 'realm' parameter")
        })?;

        Ok(Self {
            scheme: scheme.to_string(),
            realm,
            service,
            scope,
        })
    }

    /// Returns true if this is a Bearer token challenge.
    pub fn is_bearer(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("bearer")
    }

    /// Builds the token endpoint URL with `service` and `scope` query
    /// parameters.
    pub fn token_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.realm).map_err(|e| {
            ReapError::validation_with_source(format!("Invalid token realm '{}'", self.realm), e)
        })?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(service) = &self.service {
                query.append_pair("service", service);
            }
            if let Some(scope) = &self.scope {
                query.append_pair("scope", scope);
            }
        }
        Ok(url)
    }
}

/// Splits `k="v",k2="v,2"` into key/value pairs, honouring quotes.
fn split_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in params.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            ',' if !in_quotes => {
                pairs.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    pairs.push(current);

    pairs
        .into_iter()
        .filter_map(|param| {
            let (key, value) = param.trim().split_once('=')?;
            Some((
                key.trim().to_string(),
                value.trim().trim_matches('"').to_string(),
            ))
        })
        .collect()
}
