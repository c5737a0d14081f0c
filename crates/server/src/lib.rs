//! Server exposing the Sovereign Recovery protocol over HTTP.
//!
//! The unauthenticated surface is deliberately uninformative: opening
//! a recovery request and clicking a cancel link return the same
//! responses whether or not the email or token matched anything.
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod api_docs;
mod config;
mod error;
mod handlers;
mod server;

pub use error::Error;

/// Result type for the server module.
#[doc(hidden)]
pub type Result<T> = std::result::Result<T, error::Error>;

pub use config::*;
pub use server::{router, Server};
