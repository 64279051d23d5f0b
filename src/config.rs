use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings for an [`HttpConnection`](crate::HttpConnection).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub base_url: String,

    /// Request timeout; 60 seconds when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub https_only: bool,

    /// Extra default headers sent with every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Config {
    pub fn new(base_url: &str) -> Config {
        Config {
            base_url: base_url.to_string(),
            timeout_secs: None,
            https_only: false,
            headers: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "baseUrl": "http://api.example.org/" }"#).unwrap();
        assert_eq!(config, Config::new("http://api.example.org/"));
    }

    #[test]
    fn deserializes_all_fields() {
        let config: Config = serde_json::from_str(
            r#"{
                "baseUrl": "https://api.example.org/",
                "timeoutSecs": 5,
                "httpsOnly": true,
                "headers": { "Authorization": "Bearer token" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, Some(5));
        assert!(config.https_only);
        assert_eq!(
            config.headers.get("Authorization").map(String::as_str),
            Some("Bearer token")
        );
    }
}
