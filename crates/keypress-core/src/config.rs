#![forbid(unsafe_code)]

//! Forwarder configuration.
//!
//! The browser host passes the config as a JSON string; every field is
//! optional and unknown fields are rejected.
//!
//! ```json
//! { "prefix": "/keypress", "style": "query_echo", "reload": "immediate" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ForwardError, Result};
use crate::key::PathStyle;

/// Endpoint prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "/keypress";

/// When the page reload happens relative to the keypress request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadPolicy {
    /// Reload right after the request is issued. The reload may win the race
    /// and abort the request before the server saw it.
    #[default]
    Immediate,
    /// Reload once the request settled, whether it succeeded or failed.
    AfterSettle,
}

impl ReloadPolicy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::AfterSettle => "after_settle",
        }
    }
}

impl std::str::FromStr for ReloadPolicy {
    type Err = ForwardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "immediate" => Ok(Self::Immediate),
            "after_settle" => Ok(Self::AfterSettle),
            other => Err(ForwardError::invalid(format!(
                "unknown reload policy: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForwarderConfig {
    /// Path prefix the token is appended to.
    pub prefix: String,
    pub style: PathStyle,
    pub reload: ReloadPolicy,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            style: PathStyle::default(),
            reload: ReloadPolicy::default(),
        }
    }
}

impl ForwarderConfig {
    #[must_use]
    pub fn with_style(mut self, style: PathStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_reload(mut self, reload: ReloadPolicy) -> Self {
        self.reload = reload;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Parse a JSON config and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validated()
    }

    /// Normalize the prefix and reject values that cannot form a path.
    ///
    /// The prefix gains a leading slash and loses trailing slashes; an empty
    /// prefix (or `/`) puts the token directly under the root.
    pub fn validated(mut self) -> Result<Self> {
        if let Some(bad) = self.prefix.chars().find(|c| matches!(c, '?' | '#')) {
            return Err(ForwardError::invalid(format!(
                "prefix must not contain '{bad}': {}",
                self.prefix
            )));
        }
        if self.prefix.chars().any(char::is_whitespace) {
            return Err(ForwardError::invalid(format!(
                "prefix must not contain whitespace: {:?}",
                self.prefix
            )));
        }
        let trimmed = self.prefix.trim_matches('/');
        self.prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        Ok(self)
    }
}
