#![doc = "transclude-core: server-side include resolution for edge functions."]

//! This crate contains the transclusion engine: directive scanning, logical
//! path handling, the recursive resolver, response composition and the edge
//! event adapter. It has no network dependencies; stores are injected through
//! the [`contract::Fetcher`] trait.
//!
//! # Usage
//! Build an [`edge::EdgeHandler`] from a fetcher and an
//! [`config::EngineConfig`], or drive a [`resolver::Resolver`] directly.

pub mod config;
pub mod contract;
pub mod directive;
pub mod edge;
pub mod error;
pub mod logical_path;
pub mod resolver;
pub mod response;
pub mod spa;
pub mod store;

pub use config::EngineConfig;
pub use contract::{ExtensionPolicy, Fetcher, TranscludePolicy};
pub use error::{FetchError, TranscludeError};
pub use resolver::Resolver;
