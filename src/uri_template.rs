//! URI template parsing and expansion.
//!
//! Covers the operator table of RFC 6570 level 3 (`{var}`, `{+var}`, `{#var}`, `{.var}`,
//! `{/var}`, `{;var}`, `{?var}`, `{&var}`) together with the `:n` prefix and `*` explode
//! modifiers. Unbound variables are dropped from the output; deciding whether that is an
//! error is left to the caller.

use serde_json::{Map, Value};

const RESERVED: &str = ":/?#[]@!$&'()*+,;=";

/// Returns true if the link object carries a truthy `templated` flag.
pub fn is_templated(attributes: &Map<String, Value>) -> bool {
    match attributes.get("templated") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(_) => true,
    }
}

/// Variable names declared by `href`, in template order.
pub fn variables(href: &str) -> Vec<String> {
    UriTemplate::new(href).variables()
}

/// Expands `href` against `bindings`.
pub fn expand(href: &str, bindings: &Map<String, Value>) -> String {
    UriTemplate::new(href).expand(bindings)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UriTemplate {
    href: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
enum Part {
    Literal(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
struct Expression {
    operator: Operator,
    specs: Vec<VarSpec>,
}

#[derive(Debug, Clone, PartialEq)]
struct VarSpec {
    name: String,
    modifier: Modifier,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modifier {
    None,
    Prefix(usize),
    Explode,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Operator {
    first: &'static str,
    separator: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

impl Operator {
    const SIMPLE: Operator = Operator {
        first: "",
        separator: ",",
        named: false,
        if_empty: "",
        allow_reserved: false,
    };

    fn from_char(ch: char) -> Option<Operator> {
        let operator = match ch {
            '+' => Operator {
                allow_reserved: true,
                ..Operator::SIMPLE
            },
            '#' => Operator {
                first: "#",
                allow_reserved: true,
                ..Operator::SIMPLE
            },
            '.' => Operator {
                first: ".",
                separator: ".",
                ..Operator::SIMPLE
            },
            '/' => Operator {
                first: "/",
                separator: "/",
                ..Operator::SIMPLE
            },
            ';' => Operator {
                first: ";",
                separator: ";",
                named: true,
                ..Operator::SIMPLE
            },
            '?' => Operator {
                first: "?",
                separator: "&",
                named: true,
                if_empty: "=",
                allow_reserved: false,
            },
            '&' => Operator {
                first: "&",
                separator: "&",
                named: true,
                if_empty: "=",
                allow_reserved: false,
            },
            _ => return None,
        };
        Some(operator)
    }
}

impl UriTemplate {
    pub fn new(href: &str) -> UriTemplate {
        let mut parts = vec![];
        let mut rest = href;
        while let Some(open) = rest.find('{') {
            // An unterminated expression is kept as literal text.
            let close = match rest[open..].find('}') {
                Some(close) => open + close,
                None => break,
            };
            if open > 0 {
                parts.push(Part::Literal(rest[..open].to_string()));
            }
            parts.push(Part::Expression(Expression::parse(&rest[open + 1..close])));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            parts.push(Part::Literal(rest.to_string()));
        }

        UriTemplate {
            href: href.to_string(),
            parts,
        }
    }

    pub fn href(&self) -> &str {
        &self.href
    }

    /// Declared variable names in template order, without duplicates.
    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = vec![];
        for part in &self.parts {
            if let Part::Expression(expression) = part {
                for spec in &expression.specs {
                    if !names.contains(&spec.name) {
                        names.push(spec.name.clone());
                    }
                }
            }
        }
        names
    }

    pub fn expand(&self, bindings: &Map<String, Value>) -> String {
        let mut out = String::with_capacity(self.href.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expression(expression) => expression.expand(bindings, &mut out),
            }
        }
        out
    }
}

impl Expression {
    fn parse(body: &str) -> Expression {
        let (operator, list) = match body.chars().next().and_then(Operator::from_char) {
            Some(operator) => (operator, &body[1..]),
            None => (Operator::SIMPLE, body),
        };
        let specs = list
            .split(',')
            .map(str::trim)
            .filter(|spec| !spec.is_empty())
            .map(VarSpec::parse)
            .collect();

        Expression { operator, specs }
    }

    fn expand(&self, bindings: &Map<String, Value>, out: &mut String) {
        let mut first = true;
        for spec in &self.specs {
            let value = match bindings.get(&spec.name) {
                Some(value) if is_defined(value) => value,
                _ => continue,
            };
            out.push_str(if first {
                self.operator.first
            } else {
                self.operator.separator
            });
            first = false;
            out.push_str(&self.render(spec, value));
        }
    }

    fn render(&self, spec: &VarSpec, value: &Value) -> String {
        let op = &self.operator;
        match value {
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| encode(&scalar_text(item), op.allow_reserved));
                if spec.modifier == Modifier::Explode {
                    items
                        .map(|item| self.named(&spec.name, item))
                        .collect::<Vec<_>>()
                        .join(op.separator)
                } else {
                    self.named(&spec.name, items.collect::<Vec<_>>().join(","))
                }
            }
            Value::Object(entries) => {
                let pairs = entries.iter().map(|(key, item)| {
                    (
                        encode(key, op.allow_reserved),
                        encode(&scalar_text(item), op.allow_reserved),
                    )
                });
                if spec.modifier == Modifier::Explode {
                    pairs
                        .map(|(key, item)| format!("{}={}", key, item))
                        .collect::<Vec<_>>()
                        .join(op.separator)
                } else {
                    let flat = pairs
                        .flat_map(|(key, item)| vec![key, item])
                        .collect::<Vec<_>>()
                        .join(",");
                    self.named(&spec.name, flat)
                }
            }
            scalar => {
                let mut text = scalar_text(scalar);
                if let Modifier::Prefix(len) = spec.modifier {
                    text = text.chars().take(len).collect();
                }
                self.named(&spec.name, encode(&text, op.allow_reserved))
            }
        }
    }

    fn named(&self, name: &str, encoded: String) -> String {
        if !self.operator.named {
            encoded
        } else if encoded.is_empty() {
            format!("{}{}", name, self.operator.if_empty)
        } else {
            format!("{}={}", name, encoded)
        }
    }
}

impl VarSpec {
    fn parse(spec: &str) -> VarSpec {
        if let Some(name) = spec.strip_suffix('*') {
            return VarSpec {
                name: name.to_string(),
                modifier: Modifier::Explode,
            };
        }
        if let Some((name, len)) = spec.split_once(':') {
            if let Ok(len) = len.parse::<usize>() {
                return VarSpec {
                    name: name.to_string(),
                    modifier: Modifier::Prefix(len),
                };
            }
        }
        VarSpec {
            name: spec.to_string(),
            modifier: Modifier::None,
        }
    }
}

/// Whether expansion renders `value`; `null` and empty lists or maps count as unbound.
pub fn is_defined(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
        _ => true,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn encode(text: &str, allow_reserved: bool) -> String {
    if !allow_reserved {
        return urlencoding::encode(text).into_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        if RESERVED.contains(ch) {
            out.push(ch);
        } else {
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bindings(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn templated_flag_must_be_truthy() {
        assert!(is_templated(&bindings(json!({ "templated": true }))));
        assert!(is_templated(&bindings(json!({ "templated": "yes" }))));
        assert!(!is_templated(&bindings(json!({ "templated": false }))));
        assert!(!is_templated(&bindings(json!({ "templated": null }))));
        assert!(!is_templated(&bindings(json!({}))));
    }

    #[test]
    fn lists_variables_in_order() {
        assert_eq!(variables("/orders{?id,owner}"), vec!["id", "owner"]);
        assert_eq!(variables("/users/{id}/orders{?page,id}"), vec!["id", "page"]);
        assert!(variables("/orders").is_empty());
    }

    #[test]
    fn strips_modifiers_from_variable_names() {
        assert_eq!(variables("{/path*}{?q:3}"), vec!["path", "q"]);
    }

    #[test]
    fn expands_simple_and_query_groups() {
        let vars = bindings(json!({ "id": 1, "owner": "jo e" }));
        assert_eq!(expand("/orders/{id}", &vars), "/orders/1");
        assert_eq!(expand("/orders{?id,owner}", &vars), "/orders?id=1&owner=jo%20e");
        assert_eq!(expand("/orders{?id}{&owner}", &vars), "/orders?id=1&owner=jo%20e");
    }

    #[test]
    fn omits_unbound_variables() {
        let vars = bindings(json!({ "owner": "joe", "page": null }));
        assert_eq!(expand("/orders{?id,owner,page}", &vars), "/orders?owner=joe");
        assert_eq!(expand("/orders{?id}", &Map::new()), "/orders");
        assert_eq!(expand("/orders/{id}", &Map::new()), "/orders/");
    }

    #[test]
    fn expands_other_operators() {
        let vars = bindings(json!({
            "path": "foo/bar",
            "list": ["red", "green"],
            "keys": { "a": "1", "b": "2" },
            "empty": "",
            "word": "hello"
        }));
        assert_eq!(expand("{+path}", &vars), "foo/bar");
        assert_eq!(expand("{path}", &vars), "foo%2Fbar");
        assert_eq!(expand("{#path}", &vars), "#foo/bar");
        assert_eq!(expand("X{.list}", &vars), "X.red,green");
        assert_eq!(expand("{/list*}", &vars), "/red/green");
        assert_eq!(expand("{;empty}", &vars), ";empty");
        assert_eq!(expand("{?empty}", &vars), "?empty=");
        assert_eq!(expand("{?keys*}", &vars), "?a=1&b=2");
        assert_eq!(expand("{?keys}", &vars), "?keys=a,1,b,2");
        assert_eq!(expand("{word:3}", &vars), "hel");
    }

    #[test]
    fn unterminated_expression_is_literal() {
        assert_eq!(expand("/orders{?id", &bindings(json!({ "id": 1 }))), "/orders{?id");
        assert!(variables("/orders{?id").is_empty());
    }
}
