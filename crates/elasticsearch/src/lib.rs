//! Elasticsearch scaler.
//!
//! Runs a pre-registered search template and reads an integer out of the
//! response at a configurable path. The value drives the autoscaler:
//! anything above zero means active, and the value itself is published as
//! an average-value metric against `targetValue`.
//!
//! Flow per poll: [`query::build_query`] → [`client::SearchClient`] →
//! [`extract::value_from_search`].

pub mod client;
pub mod extract;
pub mod metadata;
pub mod path;
pub mod query;
pub mod scaler;

pub use client::{HttpSearchClient, SearchClient};
pub use extract::value_from_search;
pub use metadata::ElasticsearchMetadata;
pub use path::{JsonPath, PathError};
pub use query::build_query;
pub use scaler::ElasticsearchScaler;
