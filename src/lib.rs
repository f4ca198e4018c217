// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Moto Admin HTTP
//!
//! The HTTP resilience layer of the motorcycle shop admin client. Every
//! call to the backend goes through one [`Dispatcher`], which attaches the
//! bearer credential, retries transient failures with jittered exponential
//! backoff, and turns every failure into a uniform [`ClassifiedError`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use moto_admin_http::{Dispatcher, OutboundRequest, RetryPolicy};
//!
//! #[tokio::main]
//! async fn main() -> moto_admin_http::Result<()> {
//!     let dispatcher = Dispatcher::from_env()?;
//!
//!     let (handle, fut) = dispatcher.dispatch::<serde_json::Value>(
//!         OutboundRequest::get("/products").query("page", "1"),
//!         Some(RetryPolicy::new(5, std::time::Duration::from_millis(500))),
//!     );
//!
//!     // handle.cancel(Some("navigated away")) aborts the call and its backoff
//!     let products = fut.await?;
//!     println!("{products}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Dispatcher                             │
//! │  dispatch(request, policy) → (CancellationHandle, Future<T>)    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────┬───┴─────────┬─────────────┬──────────┐
//! │    Auth    │  Transport  │  Classify   │    Retry    │  Notify  │
//! ├────────────┼─────────────┼─────────────┼─────────────┼──────────┤
//! │ Resolver   │ reqwest     │ Status map  │ Backoff     │ Critical │
//! │ Token file │ Base URL    │ Network     │ Jitter ±20% │ De-dup   │
//! │ Env / mem  │ Timeout     │ Messages    │ Cap 30s     │ Opt-out  │
//! └────────────┴─────────────┴─────────────┴─────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for client setup
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// Credential resolution
pub mod auth;

/// Dispatcher, retry policy and error classification
pub mod http;

/// Caller-side notification policy
pub mod notify;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::ClientConfig;
pub use http::{
    classify, is_critical, should_retry, CancellationHandle, ClassifiedError, DispatchResult,
    Dispatcher, ErrorCode, OutboundRequest, RetryPolicy,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
