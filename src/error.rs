use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Unspecified(String),
    #[error("{0}")]
    ParseError(String),
    #[error("{0}")]
    SerializationError(String),
    #[error("{0}")]
    NetworkError(String),
    #[error("Invalid URL ({0}).")]
    InvalidUrl(String),
    #[error("Invalid argument ({0}).")]
    InvalidArgument(String),
    #[error("Missing URI template variables for link \"{link}\": {variables:?}.")]
    MissingUriTemplateVariables {
        link: String,
        variables: Vec<String>,
    },
    #[error("Undefined member `{member}` for {target}.")]
    UndefinedMember { member: String, target: String },
}
