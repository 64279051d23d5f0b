use crate::node::is_list_member;
use crate::{EntryPoint, Error, Link, Navigate, Node, Response};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const MEMBERS: &[&str] = &["_links", "_embedded", "_attributes", "_response"];

/// A HAL document: its `_links` as [`Link`]s, its `_embedded` documents as nested resources,
/// and every other field as plain attributes.
#[derive(Clone)]
pub struct Resource {
    body: Option<Value>,
    attributes: Map<String, Value>,
    links: BTreeMap<String, Node>,
    embedded: BTreeMap<String, Node>,
    entry_point: Arc<EntryPoint>,
    response: Option<Response>,
}

impl Resource {
    pub fn new(
        body: Option<Value>,
        entry_point: Arc<EntryPoint>,
        response: Option<Response>,
    ) -> Resource {
        let mut attributes = match &body {
            Some(Value::Object(fields)) => fields.clone(),
            _ => Map::new(),
        };

        let links = match attributes.remove("_links") {
            Some(Value::Object(links)) => links
                .into_iter()
                .filter_map(|(key, value)| {
                    let node = match value {
                        Value::Array(items) => Node::List(
                            items
                                .into_iter()
                                .map(|item| Node::Link(Link::new(&key, item, entry_point.clone())))
                                .collect(),
                        ),
                        value @ Value::Object(_) => {
                            Node::Link(Link::new(&key, value, entry_point.clone()))
                        }
                        _ => return None,
                    };
                    Some((key, node))
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        let embedded = match attributes.remove("_embedded") {
            Some(Value::Object(embedded)) => embedded
                .into_iter()
                .map(|(key, value)| {
                    let node = match value {
                        Value::Array(items) => Node::List(
                            items
                                .into_iter()
                                .map(|item| embed(item, &entry_point))
                                .collect(),
                        ),
                        value => embed(value, &entry_point),
                    };
                    (key, node)
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        Resource {
            body,
            attributes,
            links,
            embedded,
            entry_point,
            response,
        }
    }

    /// The document this resource was built from; `None` for failed fetches.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn links(&self) -> &BTreeMap<String, Node> {
        &self.links
    }

    /// The link under relation `key`, unless that relation holds a list of links.
    pub fn link(&self, key: &str) -> Option<&Link> {
        self.links.get(key).and_then(Node::as_link)
    }

    pub fn embedded(&self) -> &BTreeMap<String, Node> {
        &self.embedded
    }

    pub fn entry_point(&self) -> &Arc<EntryPoint> {
        &self.entry_point
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    fn lookup(&self, name: &str) -> Option<Node> {
        let node = match name {
            "_links" => Node::Map(self.links.clone()),
            "_embedded" => Node::Map(self.embedded.clone()),
            "_attributes" => Node::Value(Value::Object(self.attributes.clone())),
            "_response" => match &self.response {
                Some(response) => Node::Response(response.clone()),
                None => Node::Value(Value::Null),
            },
            _ => {
                return self
                    .links
                    .get(name)
                    .or_else(|| self.embedded.get(name))
                    .cloned()
                    .or_else(|| self.attributes.get(name).cloned().map(Node::Value))
                    // A resource that is not a collection answers list members with null.
                    .or_else(|| is_list_member(name).then(|| Node::Value(Value::Null)))
            }
        };
        Some(node)
    }
}

fn embed(value: Value, entry_point: &Arc<EntryPoint>) -> Node {
    match value {
        value @ Value::Object(_) => {
            Node::Resource(Resource::new(Some(value), entry_point.clone(), None))
        }
        other => Node::Value(other),
    }
}

#[async_trait]
impl Navigate for Resource {
    async fn try_member(&self, name: &str) -> Result<Option<Node>, Error> {
        Ok(self.lookup(name))
    }

    async fn responds_to(&self, name: &str) -> Result<bool, Error> {
        Ok(MEMBERS.contains(&name)
            || self.links.contains_key(name)
            || self.embedded.contains_key(name)
            || self.attributes.contains_key(name)
            || is_list_member(name))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let attributes = Value::Object(self.attributes.clone());
        f.debug_struct("Resource")
            .field("attributes", &format_args!("{}", attributes))
            .field("links", &self.links.keys().collect::<Vec<_>>())
            .field("embedded", &self.embedded.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConnection;
    use serde_json::json;

    fn entry_point() -> Arc<EntryPoint> {
        EntryPoint::with_connection("http://api.example.org/", Arc::new(MockConnection::new()))
            .unwrap()
    }

    fn order_list() -> Resource {
        Resource::new(
            Some(json!({
                "total": 2,
                "_links": {
                    "self": { "href": "/orders" },
                    "curies": [{ "name": "ea", "href": "/docs/{rel}", "templated": true }]
                },
                "_embedded": {
                    "orders": [{ "id": 1 }, { "id": 2 }],
                    "owner": { "name": "joe" }
                }
            })),
            entry_point(),
            None,
        )
    }

    #[test]
    fn splits_links_embedded_and_attributes() {
        let resource = order_list();

        assert_eq!(resource.attributes(), &Map::from_iter([("total".to_string(), json!(2))]));
        assert_eq!(resource.link("self").map(Link::key), Some("self"));
        assert!(resource.link("curies").is_none());
        match resource.links().get("curies") {
            Some(Node::List(items)) => assert_eq!(items.len(), 1),
            other => panic!("unexpected curies {:?}", other),
        }
        match resource.embedded().get("orders") {
            Some(Node::List(items)) => assert_eq!(items.len(), 2),
            other => panic!("unexpected orders {:?}", other),
        }
        assert!(resource.embedded().get("owner").and_then(Node::as_resource).is_some());
    }

    #[test]
    fn tolerates_missing_body() {
        let resource = Resource::new(None, entry_point(), Some(Response::new(404, None)));

        assert!(resource.body().is_none());
        assert!(resource.attributes().is_empty());
        assert!(resource.links().is_empty());
        assert!(resource.embedded().is_empty());
    }

    #[tokio::test]
    async fn link_keys_answer_with_links() {
        let node = order_list().member("self").await.unwrap();
        assert_eq!(node.as_link().and_then(Link::href), Some("/orders"));
    }

    #[tokio::test]
    async fn embedded_and_attributes_answer_by_key() {
        let resource = order_list();

        assert_eq!(
            resource.follow(&["orders", "first", "id"]).await.unwrap().as_value(),
            Some(&json!(1))
        );
        assert_eq!(
            resource.follow(&["owner", "name"]).await.unwrap().as_value(),
            Some(&json!("joe"))
        );
        assert_eq!(resource.member("total").await.unwrap().as_value(), Some(&json!(2)));
        assert_eq!(
            resource.follow(&["_embedded", "orders", "last", "id"]).await.unwrap().as_value(),
            Some(&json!(2))
        );
    }

    #[tokio::test]
    async fn unknown_members_are_undefined() {
        let resource = order_list();

        assert!(!resource.responds_to("missing").await.unwrap());
        assert!(resource.try_member("missing").await.unwrap().is_none());
        assert!(matches!(
            resource.member("missing").await,
            Err(Error::UndefinedMember { .. })
        ));
        assert!(resource.responds_to("_links").await.unwrap());
    }

    #[tokio::test]
    async fn list_members_on_a_single_resource_are_null() {
        let resource = order_list();

        for name in ["first", "last", "len", "0"] {
            assert!(resource.responds_to(name).await.unwrap(), "{}", name);
            assert_eq!(
                resource.member(name).await.unwrap().as_value(),
                Some(&Value::Null),
                "{}",
                name
            );
        }
    }

    #[tokio::test]
    async fn keys_shadow_list_members() {
        let resource = Resource::new(Some(json!({ "first": "ada" })), entry_point(), None);
        assert_eq!(
            resource.member("first").await.unwrap().as_value(),
            Some(&json!("ada"))
        );
    }
}
