#![forbid(unsafe_code)]

//! Native companion for the keypress forwarder.
//!
//! `keypress preview` shows the request target each key produces;
//! `keypress send` replays keys against a running server through the same
//! forwarder the browser uses, with the page reload replaced by a log line.

pub mod cli;
pub mod error;
pub mod http;
pub mod logging;
pub mod replay;

pub use cli::run_from_env;
pub use error::{CliError, Result};
