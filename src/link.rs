use crate::connection::empty_body;
use crate::node::LIST_CONVERSION;
use crate::{uri_template, Connection, EntryPoint, Error, Navigate, Node, Resource, Response};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Members a link answers itself; anything else is forwarded to its resource.
const MEMBERS: &[&str] = &[
    "_type",
    "_deprecation",
    "_name",
    "_profile",
    "_title",
    "_hreflang",
    "_href",
    "_templated",
    "_variables",
    "_expand",
    "_url",
    "_resource",
    "_connection",
    "_get",
    "_options",
    "_head",
    "_delete",
    "_post",
    "_put",
    "_patch",
    "inspect",
];

/// A HAL link found under relation `key`.
///
/// Links are immutable: binding template variables with [`Link::expand`] builds a new link.
#[derive(Clone)]
pub struct Link {
    key: String,
    attributes: Map<String, Value>,
    bound_variables: Map<String, Value>,
    entry_point: Arc<EntryPoint>,
}

impl Link {
    /// Builds a link from its HAL link object. Non-object `attributes` are treated as an empty
    /// link object.
    pub fn new(key: &str, attributes: Value, entry_point: Arc<EntryPoint>) -> Link {
        Link::with_variables(key, attributes, entry_point, Map::new())
    }

    pub fn with_variables(
        key: &str,
        attributes: Value,
        entry_point: Arc<EntryPoint>,
        bound_variables: Map<String, Value>,
    ) -> Link {
        let attributes = match attributes {
            Value::Object(attributes) => attributes,
            _ => Map::new(),
        };
        Link {
            key: key.to_string(),
            attributes,
            bound_variables,
            entry_point,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn bound_variables(&self) -> &Map<String, Value> {
        &self.bound_variables
    }

    pub fn entry_point(&self) -> &Arc<EntryPoint> {
        &self.entry_point
    }

    pub fn href(&self) -> Option<&str> {
        self.attributes.get("href").and_then(Value::as_str)
    }

    pub fn r#type(&self) -> Option<&Value> {
        self.attributes.get("type")
    }

    pub fn deprecation(&self) -> Option<&Value> {
        self.attributes.get("deprecation")
    }

    pub fn name(&self) -> Option<&Value> {
        self.attributes.get("name")
    }

    pub fn profile(&self) -> Option<&Value> {
        self.attributes.get("profile")
    }

    pub fn title(&self) -> Option<&Value> {
        self.attributes.get("title")
    }

    pub fn hreflang(&self) -> Option<&Value> {
        self.attributes.get("hreflang")
    }

    pub fn is_templated(&self) -> bool {
        uri_template::is_templated(&self.attributes)
    }

    /// Template variables of the href; empty for untemplated links.
    pub fn variables(&self) -> Vec<String> {
        match self.href() {
            Some(href) if self.is_templated() => uri_template::variables(href),
            _ => vec![],
        }
    }

    /// Returns a copy of this link with `variables` bound for expansion.
    pub fn expand(&self, variables: Map<String, Value>) -> Result<Link, Error> {
        if variables.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "no URI template variables given to expand link \"{}\"",
                self.key
            )));
        }
        Ok(Link {
            bound_variables: variables,
            ..self.clone()
        })
    }

    /// The concrete URL of this link. Templated links need all their variables bound.
    pub fn url(&self) -> Result<String, Error> {
        let href = self.href().unwrap_or_default();
        if !self.is_templated() {
            return Ok(href.to_string());
        }

        let variables = self.variables();
        let missing = variables.iter().any(|name| {
            !self
                .bound_variables
                .get(name)
                .map_or(false, uri_template::is_defined)
        });
        if missing {
            return Err(Error::MissingUriTemplateVariables {
                link: self.key.clone(),
                variables,
            });
        }

        Ok(uri_template::expand(href, &self.bound_variables))
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        self.entry_point.connection()
    }

    fn request_url(&self, method: &Method) -> Result<String, Error> {
        let url = self.url()?;
        tracing::debug!(%method, url = %url, key = %self.key, "following link");
        Ok(url)
    }

    pub async fn get(&self) -> Result<Response, Error> {
        let url = self.request_url(&Method::GET)?;
        self.connection().get(&url).await
    }

    pub async fn options(&self) -> Result<Response, Error> {
        let url = self.request_url(&Method::OPTIONS)?;
        self.connection()
            .run_request(Method::OPTIONS, &url, None, None)
            .await
    }

    pub async fn head(&self) -> Result<Response, Error> {
        let url = self.request_url(&Method::HEAD)?;
        self.connection().head(&url).await
    }

    pub async fn delete(&self) -> Result<Response, Error> {
        let url = self.request_url(&Method::DELETE)?;
        self.connection().delete(&url).await
    }

    /// Sends `body`, or an empty object when `None`.
    pub async fn post(&self, body: Option<Value>) -> Result<Response, Error> {
        let url = self.request_url(&Method::POST)?;
        let body = body.unwrap_or_else(empty_body);
        self.connection().post(&url, body).await
    }

    pub async fn put(&self, body: Option<Value>) -> Result<Response, Error> {
        let url = self.request_url(&Method::PUT)?;
        let body = body.unwrap_or_else(empty_body);
        self.connection().put(&url, body).await
    }

    pub async fn patch(&self, body: Option<Value>) -> Result<Response, Error> {
        let url = self.request_url(&Method::PATCH)?;
        let body = body.unwrap_or_else(empty_body);
        self.connection().patch(&url, body).await
    }

    /// Fetches the resource this link points to. A failed response yields a resource without
    /// a body; the response itself is kept on the resource either way.
    pub async fn resource(&self) -> Result<Resource, Error> {
        let response = self.get().await?;
        let success = response.is_success();
        tracing::debug!(key = %self.key, status = response.status, success, "resolved link");

        let body = if success { response.body.clone() } else { None };
        Ok(Resource::new(body, self.entry_point.clone(), Some(response)))
    }

    /// Data the resolved resource holds under this link's own relation, as a collection
    /// resource does for its items. Links are skipped so a `self` link cannot follow itself.
    fn delegate(&self, resource: &Resource) -> Option<Node> {
        resource.embedded().get(&self.key).cloned().or_else(|| {
            resource
                .attributes()
                .get(&self.key)
                .cloned()
                .map(Node::Value)
        })
    }

    async fn own_member(&self, name: &str) -> Result<Option<Node>, Error> {
        let node = match name {
            "_type" | "_deprecation" | "_name" | "_profile" | "_title" | "_hreflang" => {
                let value = self.attributes.get(&name[1..]).cloned();
                Node::Value(value.unwrap_or(Value::Null))
            }
            "_href" => Node::Value(self.href().map_or(Value::Null, Value::from)),
            "_templated" => Node::Value(Value::Bool(self.is_templated())),
            "_variables" => Node::Value(Value::from(self.variables())),
            "_expand" => Node::Link(self.expand(Map::new())?),
            "_url" => Node::Value(Value::String(self.url()?)),
            "_resource" => Node::Resource(self.resource().await?),
            "_connection" => Node::Connection(self.connection().clone()),
            "_get" => Node::Response(self.get().await?),
            "_options" => Node::Response(self.options().await?),
            "_head" => Node::Response(self.head().await?),
            "_delete" => Node::Response(self.delete().await?),
            "_post" => Node::Response(self.post(None).await?),
            "_put" => Node::Response(self.put(None).await?),
            "_patch" => Node::Response(self.patch(None).await?),
            "inspect" => Node::Value(Value::String(format!("{:?}", self))),
            _ => return Ok(None),
        };
        Ok(Some(node))
    }
}

#[async_trait]
impl Navigate for Link {
    async fn try_member(&self, name: &str) -> Result<Option<Node>, Error> {
        if name == LIST_CONVERSION {
            return Ok(None);
        }
        if let Some(node) = self.own_member(name).await? {
            return Ok(Some(node));
        }

        let resource = self.resource().await?;
        if let Some(delegate) = self.delegate(&resource) {
            if delegate.responds_to(name).await? {
                tracing::trace!(key = %self.key, member = name, "forwarding to embedded");
                return delegate.try_member(name).await;
            }
        }
        tracing::trace!(key = %self.key, member = name, "forwarding to resource");
        resource.try_member(name).await
    }

    async fn responds_to(&self, name: &str) -> Result<bool, Error> {
        if name == LIST_CONVERSION {
            return Ok(false);
        }
        if MEMBERS.contains(&name) {
            return Ok(true);
        }

        let resource = self.resource().await?;
        if let Some(delegate) = self.delegate(&resource) {
            if delegate.responds_to(name).await? {
                return Ok(true);
            }
        }
        resource.responds_to(name).await
    }

    fn as_list(&self) -> Option<&[Node]> {
        None
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Link) -> bool {
        self.key == other.key
            && self.attributes == other.attributes
            && self.bound_variables == other.bound_variables
            && Arc::ptr_eq(&self.entry_point, &other.entry_point)
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let attributes = Value::Object(self.attributes.clone());
        let mut link = f.debug_struct("Link");
        link.field("key", &self.key)
            .field("attributes", &format_args!("{}", attributes));
        if !self.bound_variables.is_empty() {
            let variables = Value::Object(self.bound_variables.clone());
            link.field("variables", &format_args!("{}", variables));
        }
        link.finish()
    }
}

/// Writes [`Link::url`], or the raw href while template variables are unbound.
impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.url() {
            Ok(url) => write!(f, "{}", url),
            Err(_) => write!(f, "{}", self.href().unwrap_or_default()),
        }
    }
}
