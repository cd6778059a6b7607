//! The upstream origin every forwarded request is sent to.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Errors raised while parsing the target origin. All of them are fatal at
/// startup.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("target URL is required")]
    Missing,

    #[error("invalid target URL {input:?}: {source}")]
    Parse {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target URL {0:?} has no host")]
    MissingHost(String),

    #[error("unsupported target scheme {0:?}, only http is supported")]
    UnsupportedScheme(String),
}

/// Immutable parsed target origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    authority: String,
}

impl Target {
    /// Parse a target such as `http://localhost:3000` or
    /// `http://10.0.0.5:8080/api`.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TargetError::Missing);
        }

        let url = Url::parse(input).map_err(|source| TargetError::Parse {
            input: input.to_string(),
            source,
        })?;

        if url.scheme() != "http" {
            return Err(TargetError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TargetError::MissingHost(input.to_string()))?;

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self { url, authority })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// `host[:port]`, used for the outbound URI and the rewritten Host header.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path prefix joined in front of every forwarded path. Empty for a bare
    /// origin.
    pub fn base_path(&self) -> &str {
        match self.url.path() {
            "/" => "",
            path => path,
        }
    }

    /// Query string carried by the target itself, merged into forwarded
    /// queries.
    pub fn query(&self) -> Option<&str> {
        self.url.query().filter(|q| !q.is_empty())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme(), self.authority, self.base_path())?;
        if let Some(query) = self.query() {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}
