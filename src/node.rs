//! Name-based navigation over links, resources and their data.
//!
//! Every lookup goes through [`Navigate`]: a link answers its own members and forwards the
//! rest to the resource it points to, a resource answers its links, embedded resources and
//! attributes, and plain data answers its keys. Chaining lookups with [`Navigate::follow`]
//! walks an API by relation names, e.g. `root.follow(&["orders", "first", "id"])`.

use crate::{Connection, Error, Link, Resource, Response};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Member name used by list conversion. Links never answer it.
pub const LIST_CONVERSION: &str = "to_list";

/// Anything a lookup can produce.
#[derive(Debug, Clone)]
pub enum Node {
    Link(Link),
    Resource(Resource),
    List(Vec<Node>),
    Map(BTreeMap<String, Node>),
    Value(Value),
    Response(Response),
    Connection(Arc<dyn Connection>),
}

#[async_trait]
pub trait Navigate: fmt::Debug + Send + Sync {
    /// Looks up `name`, returning `Ok(None)` when nothing answers it.
    async fn try_member(&self, name: &str) -> Result<Option<Node>, Error>;

    /// Whether `name` would be answered by [`Navigate::try_member`].
    async fn responds_to(&self, name: &str) -> Result<bool, Error>;

    /// The list view used by [`flatten`], if any. Never forwarded.
    fn as_list(&self) -> Option<&[Node]> {
        None
    }

    async fn member(&self, name: &str) -> Result<Node, Error> {
        match self.try_member(name).await? {
            Some(node) => Ok(node),
            None => Err(Error::UndefinedMember {
                member: name.to_string(),
                target: format!("{:?}", self),
            }),
        }
    }

    /// Applies [`Navigate::member`] for each name in turn.
    async fn follow(&self, path: &[&str]) -> Result<Node, Error> {
        let (first, rest) = match path.split_first() {
            Some(split) => split,
            None => {
                return Err(Error::InvalidArgument(
                    "cannot follow an empty path".to_string(),
                ))
            }
        };
        let mut node = self.member(first).await?;
        for name in rest {
            node = node.member(name).await?;
        }
        Ok(node)
    }
}

impl Node {
    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Node::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Node::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Node::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            Node::Response(response) => Some(response),
            _ => None,
        }
    }

    fn inner(&self) -> Option<&dyn Navigate> {
        match self {
            Node::Link(link) => Some(link as &dyn Navigate),
            Node::Resource(resource) => Some(resource as &dyn Navigate),
            _ => None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Node {
        Node::Value(value)
    }
}

#[async_trait]
impl Navigate for Node {
    async fn try_member(&self, name: &str) -> Result<Option<Node>, Error> {
        if let Some(inner) = self.inner() {
            return inner.try_member(name).await;
        }
        Ok(match self {
            Node::List(items) => list_member(items, name, |item| item.clone()),
            Node::Map(entries) => entries.get(name).cloned(),
            Node::Value(Value::Object(entries)) => entries.get(name).cloned().map(Node::Value),
            Node::Value(Value::Array(items)) => {
                list_member(items, name, |item| Node::Value(item.clone()))
            }
            Node::Response(response) => match name {
                "status" => Some(Node::Value(Value::from(response.status))),
                "body" => Some(Node::Value(response.body.clone().unwrap_or(Value::Null))),
                "success" => Some(Node::Value(Value::Bool(response.is_success()))),
                _ => None,
            },
            _ => None,
        })
    }

    async fn responds_to(&self, name: &str) -> Result<bool, Error> {
        if let Some(inner) = self.inner() {
            return inner.responds_to(name).await;
        }
        Ok(self.try_member(name).await?.is_some())
    }

    fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            Node::Link(link) => link.as_list(),
            _ => None,
        }
    }
}

/// Whether `name` is one of the positional members lists answer.
pub(crate) fn is_list_member(name: &str) -> bool {
    matches!(name, "first" | "last" | "len") || name.parse::<usize>().is_ok()
}

fn list_member<T>(items: &[T], name: &str, wrap: impl Fn(&T) -> Node) -> Option<Node> {
    match name {
        "first" => Some(items.first().map(&wrap).unwrap_or(Node::Value(Value::Null))),
        "last" => Some(items.last().map(&wrap).unwrap_or(Node::Value(Value::Null))),
        "len" => Some(Node::Value(Value::from(items.len()))),
        index => index
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index))
            .map(wrap),
    }
}

/// Flattens nested lists, consulting [`Navigate::as_list`] on each element.
///
/// Links are kept whole and never resolved.
pub fn flatten(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Some(items) = node.as_list() {
            out.extend(flatten(items.to_vec()));
            continue;
        }
        out.push(node);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn lists_answer_positional_members() {
        let list = Node::List(vec![Node::Value(json!(1)), Node::Value(json!(2))]);

        assert_eq!(list.member("first").await.unwrap().as_value(), Some(&json!(1)));
        assert_eq!(list.member("last").await.unwrap().as_value(), Some(&json!(2)));
        assert_eq!(list.member("1").await.unwrap().as_value(), Some(&json!(2)));
        assert_eq!(list.member("len").await.unwrap().as_value(), Some(&json!(2)));
        assert!(list.try_member("2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_list_first_is_null() {
        let list = Node::List(vec![]);
        assert_eq!(list.member("first").await.unwrap().as_value(), Some(&Value::Null));
    }

    #[tokio::test]
    async fn values_answer_object_keys() {
        let node = Node::Value(json!({ "id": 7, "tags": ["a", "b"] }));

        assert_eq!(node.follow(&["id"]).await.unwrap().as_value(), Some(&json!(7)));
        assert_eq!(
            node.follow(&["tags", "last"]).await.unwrap().as_value(),
            Some(&json!("b"))
        );
        assert!(!node.responds_to("missing").await.unwrap());
    }

    #[tokio::test]
    async fn undefined_member_names_the_member() {
        let err = Node::Value(json!(1)).member("id").await.unwrap_err();
        match err {
            Error::UndefinedMember { member, .. } => assert_eq!(member, "id"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn responses_answer_status_body_and_success() {
        let node = Node::Response(Response::new(201, Some(json!({ "id": 1 }))));

        assert_eq!(node.member("status").await.unwrap().as_value(), Some(&json!(201)));
        assert_eq!(node.member("success").await.unwrap().as_value(), Some(&json!(true)));
        assert_eq!(
            node.follow(&["body", "id"]).await.unwrap().as_value(),
            Some(&json!(1))
        );
    }

    #[tokio::test]
    async fn following_an_empty_path_is_invalid() {
        let err = Node::Value(json!({})).follow(&[]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn flattens_nested_lists() {
        let nodes = vec![Node::List(vec![
            Node::Value(json!(1)),
            Node::List(vec![Node::Value(json!(2))]),
        ])];
        let flat = flatten(nodes);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[1].as_value(), Some(&json!(2)));
    }
}
