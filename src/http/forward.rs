//! Forwarding to the target origin.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the target (base path and query joined)
//! - Rewrite Host to the target authority
//! - Strip hop-by-hop headers in both directions
//! - Append the client address to `X-Forwarded-For`
//! - Stream request and response bodies without buffering

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::{Request, Response, Uri, Version};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::target::Target;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that describe a single connection and must not be relayed.
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("proxy-connection"),
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("cannot build upstream URI: {0}")]
    Uri(#[from] axum::http::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Relays requests to the fixed target.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    target: Arc<Target>,
}

impl Forwarder {
    pub fn new(target: Target) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(CONNECT_TIMEOUT));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            target: Arc::new(target),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Send `request` to the target and return the upstream response with
    /// hop-by-hop headers removed.
    pub async fn forward(
        &self,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Response<Incoming>, ForwardError> {
        let outbound = self.rewrite(request, client_addr)?;
        let mut response = self.client.request(outbound).await?;
        strip_hop_by_hop(response.headers_mut());
        Ok(response)
    }

    /// Turn an inbound request into the request sent upstream.
    pub fn rewrite(
        &self,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<Request<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();

        parts.uri = upstream_uri(&self.target, &parts.uri)?;
        parts.version = Version::HTTP_11;

        strip_hop_by_hop(&mut parts.headers);
        parts
            .headers
            .insert(header::HOST, HeaderValue::from_str(self.target.authority())?);
        if let Some(addr) = client_addr {
            append_forwarded_for(&mut parts.headers, addr)?;
        }

        Ok(Request::from_parts(parts, body))
    }
}

/// Map an inbound URI onto the target: scheme and authority replaced, the
/// target's base path prefixed, both query strings kept.
pub fn upstream_uri(target: &Target, original: &Uri) -> Result<Uri, axum::http::Error> {
    let path = join_paths(target.base_path(), original.path());
    let path_and_query = match (target.query(), original.query()) {
        (Some(t), Some(o)) => format!("{path}?{t}&{o}"),
        (Some(q), None) | (None, Some(q)) => format!("{path}?{q}"),
        (None, None) => path,
    };

    Uri::builder()
        .scheme(target.scheme())
        .authority(target.authority())
        .path_and_query(path_and_query)
        .build()
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    }
}

/// Remove hop-by-hop headers, including any the `Connection` header names.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, addr: SocketAddr) -> Result<(), InvalidHeaderValue> {
    let ip = addr.ip().to_string();
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) if !prior.is_empty() => format!("{prior}, {ip}"),
        _ => ip,
    };
    headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&value)?);
    Ok(())
}
