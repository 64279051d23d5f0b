//! Navigate HAL hypermedia APIs by link relation.
//!
//! An [`EntryPoint`] owns the base URL and the [`Connection`]. Fetching it yields a
//! [`Resource`] whose `_links` are [`Link`]s and whose `_embedded` documents are nested
//! resources. Links resolve URI templates, dispatch HTTP verbs, and forward any member they do
//! not define to the resource they point to, so an API can be walked by names:
//!
//! ```no_run
//! use hal_navigator::{EntryPoint, Navigate};
//!
//! # async fn run() -> Result<(), hal_navigator::Error> {
//! let api = EntryPoint::new("https://api.example.org/")?;
//! let root = api.fetch().await?;
//! let id = root.follow(&["orders", "first", "id"]).await?;
//! # Ok(())
//! # }
//! ```
mod config;
pub use config::Config;
mod connection;
pub use connection::{Connection, HttpConnection, Response};
mod entry_point;
pub use entry_point::EntryPoint;
mod error;
pub use error::Error;
mod link;
pub use link::Link;
pub mod mock;
mod node;
pub use node::{flatten, Navigate, Node, LIST_CONVERSION};
mod resource;
pub use resource::Resource;
pub mod uri_template;
pub use uri_template::UriTemplate;
