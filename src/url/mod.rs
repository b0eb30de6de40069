//! URL handling module for Ripple-Pipeline
//!
//! This module provides URL normalization, host extraction and the link
//! policy that scopes which discovered links the crawler follows.

mod domain;
mod normalize;
mod policy;

pub use domain::extract_host;
pub use normalize::{normalize_parsed, normalize_url};
pub use policy::LinkPolicy;
