//! Remote asset access for the Visual English S3 bucket.
//!
//! Media referenced by teacher resources (images, PDFs, JSON question banks)
//! lives in a public S3 bucket. This crate provides:
//!
//! - a [`Transport`] seam over HTTP, with a [`reqwest`] implementation and an
//!   in-memory mock for tests (`mock` feature),
//! - [`S3Location`] for turning bucket keys into fully-qualified URLs,
//! - [`fetch_with_retry`], a bounded exponential-backoff wrapper around a
//!   single request, and
//! - [`AssetClient`], bundling the three for callers.

mod client;
pub mod error;
mod location;
mod path;
mod retry;
pub mod transport;

pub use crate::client::AssetClient;
pub use crate::location::{DEFAULT_BASE_URL, S3Location};
pub use crate::path::validate as validate_key;
pub use crate::retry::{RetryPolicy, fetch_with_retry};
pub use crate::transport::{Method, Request, Response, Transport};
use std::sync::Arc;

pub type TransportHandle = Arc<dyn Transport + Send + Sync>;
