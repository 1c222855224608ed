#![forbid(unsafe_code)]

//! Key-down input and token normalization.
//!
//! The DOM delivers `KeyboardEvent.key` as a short text token: a printable
//! character (`"a"`, `"A"`, `"?"`) or a named key (`"Backspace"`, `"Enter"`,
//! `"ArrowLeft"`). This module turns that token into the path token sent to
//! the server, according to a [`PathStyle`].

use serde::{Deserialize, Serialize};

use crate::error::{self, ForwardError};

/// DOM name of the backspace key.
pub const BACKSPACE: &str = "Backspace";

/// Token sent in place of [`BACKSPACE`] under [`PathStyle::Plain`].
pub const DELETE_TOKEN: &str = "Delete";

/// One key-down notification as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyDown {
    /// `KeyboardEvent.key`.
    pub key: String,
    /// `KeyboardEvent.repeat`. Informational only; repeats are forwarded.
    pub repeat: bool,
}

impl KeyDown {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            repeat: false,
        }
    }

    #[must_use]
    pub fn repeated(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }
}

/// How a key identifier becomes a request target.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// Upper-case the key and echo it as a query parameter name:
    /// `/keypress/A?key-A=`.
    #[default]
    QueryEcho,
    /// Send the key as-is, except `Backspace` which becomes `Delete`:
    /// `/keypress/a`.
    Plain,
}

impl PathStyle {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::QueryEcho => "query_echo",
            Self::Plain => "plain",
        }
    }

    #[must_use]
    pub const fn has_query(self) -> bool {
        matches!(self, Self::QueryEcho)
    }
}

impl std::str::FromStr for PathStyle {
    type Err = ForwardError;

    fn from_str(s: &str) -> error::Result<Self> {
        match s {
            "query_echo" => Ok(Self::QueryEcho),
            "plain" => Ok(Self::Plain),
            other => Err(ForwardError::invalid(format!("unknown path style: {other}"))),
        }
    }
}

/// Normalize a raw DOM key identifier into the token for `style`.
///
/// Empty identifiers are rejected; everything else is accepted, including
/// modifier names such as `"Shift"`.
pub fn normalize(style: PathStyle, key: &str) -> error::Result<String> {
    if key.is_empty() {
        return Err(ForwardError::EmptyKey);
    }
    Ok(match style {
        PathStyle::QueryEcho => key.to_uppercase(),
        PathStyle::Plain if key == BACKSPACE => DELETE_TOKEN.to_string(),
        PathStyle::Plain => key.to_string(),
    })
}
