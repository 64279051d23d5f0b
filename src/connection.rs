use crate::{Config, Error};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const HAL_JSON: &str = "application/hal+json";

/// The response produced by a [`Connection`]. Links never interpret it beyond
/// [`Response::is_success`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,

    pub body: Option<Value>,
}

impl Response {
    pub fn new(status: u16, body: Option<Value>) -> Response {
        Response { status, body }
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// HTTP transport used by links to reach the API.
///
/// Only `run_request` is required; the verb helpers default to it. Implementations may
/// override them, and the link dispatch always calls the most specific one.
#[async_trait]
pub trait Connection: fmt::Debug + Send + Sync {
    async fn run_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, Error>;

    async fn get(&self, path: &str) -> Result<Response, Error> {
        self.run_request(Method::GET, path, None, None).await
    }

    async fn head(&self, path: &str) -> Result<Response, Error> {
        self.run_request(Method::HEAD, path, None, None).await
    }

    async fn delete(&self, path: &str) -> Result<Response, Error> {
        self.run_request(Method::DELETE, path, None, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Response, Error> {
        self.run_request(Method::POST, path, Some(body), None).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Response, Error> {
        self.run_request(Method::PUT, path, Some(body), None).await
    }

    async fn patch(&self, path: &str, body: Value) -> Result<Response, Error> {
        self.run_request(Method::PATCH, path, Some(body), None).await
    }
}

/// A [`Connection`] that talks HTTP through reqwest, resolving paths against a base URL.
#[derive(Debug)]
pub struct HttpConnection {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpConnection {
    pub fn new(config: &Config) -> Result<HttpConnection, Error> {
        let base_url = parse_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static(HAL_JSON));
        headers.insert("Accept", HeaderValue::from_static(HAL_JSON));
        for (name, value) in &config.headers {
            let name = match HeaderName::from_bytes(name.as_bytes()) {
                Ok(n) => n,
                Err(err) => {
                    return Err(Error::ParseError(format!(
                        "Invalid header name \"{}\" ({}).",
                        name, err
                    )))
                }
            };
            let value = match HeaderValue::from_str(value) {
                Ok(v) => v,
                Err(err) => {
                    return Err(Error::ParseError(format!(
                        "Invalid value for header \"{}\" ({}).",
                        name, err
                    )))
                }
            };
            headers.insert(name, value);
        }

        let timeout = match config.timeout_secs {
            Some(t) => Duration::from_secs(t),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let client = match reqwest::ClientBuilder::new()
            .default_headers(headers)
            .https_only(config.https_only)
            .timeout(timeout)
            .build()
        {
            Ok(r) => r,
            Err(err) => {
                return Err(Error::Unspecified(format!(
                    "Could not create reqwest client ({}).",
                    err
                )))
            }
        };

        Ok(HttpConnection { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the base URL; absolute URLs pass through unchanged.
    pub fn resolve(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|err| Error::InvalidUrl(format!("{} against {}: {}", path, self.base_url, err)))
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn run_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, Error> {
        let url = self.resolve(path)?;
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.client.request(method, url);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let res = match request.send().await {
            Ok(r) => r,
            Err(err) => {
                return Err(Error::NetworkError(format!(
                    "Could not send request ({}).",
                    err
                )))
            }
        };

        let status = res.status().as_u16();
        let text = match res.text().await {
            Ok(text) => text,
            Err(err) => {
                return Err(Error::NetworkError(format!(
                    "Could not retrieve body text ({}).",
                    err
                )))
            }
        };
        tracing::debug!(status, bytes = text.len(), "received response");

        let response = Response::new(status, None);
        if text.trim().is_empty() {
            return Ok(response);
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Ok(Response::new(status, Some(body))),
            // Error pages are often not JSON; the status already tells the caller.
            Err(_) if !response.is_success() => Ok(response),
            Err(err) => Err(Error::SerializationError(format!(
                "Could not deserialize response from \"{}\" ({}).",
                text, err
            ))),
        }
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|err| Error::InvalidUrl(format!("{}: {}", url, err)))
}

pub(crate) fn empty_body() -> Value {
    json!({})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(base_url: &str) -> HttpConnection {
        HttpConnection::new(&Config::new(base_url)).expect("valid config")
    }

    #[test]
    fn success_covers_2xx_only() {
        assert!(Response::new(200, None).is_success());
        assert!(Response::new(204, None).is_success());
        assert!(!Response::new(302, None).is_success());
        assert!(!Response::new(404, Some(json!({ "error": "missing" }))).is_success());
    }

    #[test]
    fn resolves_relative_and_absolute_paths() {
        let conn = connection("http://api.example.org/");
        assert_eq!(
            conn.resolve("/orders?id=1").unwrap().as_str(),
            "http://api.example.org/orders?id=1"
        );
        assert_eq!(
            conn.resolve("http://other.example.org/x").unwrap().as_str(),
            "http://other.example.org/x"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = HttpConnection::new(&Config::new("not a url")).unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn rejects_invalid_header() {
        let mut config = Config::new("http://api.example.org/");
        config
            .headers
            .insert("Bad Header".to_string(), "x".to_string());
        let err = HttpConnection::new(&config).unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }
}
