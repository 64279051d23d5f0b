use crate::connection::parse_url;
use crate::{Config, Connection, Error, HttpConnection, Link, Resource};
use serde_json::json;
use std::sync::Arc;
use url::Url;

/// Root of an API: the base URL plus the connection every link reaches it through.
///
/// Links and resources hold an `Arc<EntryPoint>` so they can look up the connection without
/// owning it.
#[derive(Debug)]
pub struct EntryPoint {
    base_url: Url,
    connection: Arc<dyn Connection>,
}

impl EntryPoint {
    pub fn new(base_url: &str) -> Result<Arc<EntryPoint>, Error> {
        EntryPoint::from_config(&Config::new(base_url))
    }

    pub fn from_config(config: &Config) -> Result<Arc<EntryPoint>, Error> {
        let connection = HttpConnection::new(config)?;
        Ok(Arc::new(EntryPoint {
            base_url: connection.base_url().clone(),
            connection: Arc::new(connection),
        }))
    }

    pub fn with_connection(
        base_url: &str,
        connection: Arc<dyn Connection>,
    ) -> Result<Arc<EntryPoint>, Error> {
        Ok(Arc::new(EntryPoint {
            base_url: parse_url(base_url)?,
            connection,
        }))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// A link to the API root.
    pub fn link(self: &Arc<Self>) -> Link {
        Link::new("self", json!({ "href": self.base_url.as_str() }), self.clone())
    }

    /// Fetches the root resource.
    pub async fn fetch(self: &Arc<Self>) -> Result<Resource, Error> {
        self.link().resource().await
    }
}
