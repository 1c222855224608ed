#![forbid(unsafe_code)]

//! Host-agnostic core of the keypress forwarder.
//!
//! A key-down becomes one GET to `/keypress/<token>` followed by one page
//! reload. This crate owns the decisions (token normalization, request
//! target, reload timing) and leaves the I/O to the host through the
//! [`Transport`] and [`Reloader`] traits. `keypress-web` binds them to
//! `fetch`/`location.reload()`; `keypress-cli` binds them to a blocking HTTP
//! client.

pub mod config;
pub mod error;
pub mod forwarder;
pub mod key;
pub mod request;

pub use config::{DEFAULT_PREFIX, ForwarderConfig, ReloadPolicy};
pub use error::{ForwardError, Result, TransportError};
pub use forwarder::{
    Completion, ForwardStats, Forwarder, KeyDispatch, Reloader, Settlement, Transport,
};
pub use key::{KeyDown, PathStyle, normalize};
pub use request::KeypressRequest;
