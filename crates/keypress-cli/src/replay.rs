//! Preview and replay of key sequences through the forwarder.

use keypress_core::{
    ForwardStats, Forwarder, ForwarderConfig, KeyDown, KeypressRequest, Reloader, Settlement,
    Transport,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeyOutcome {
    /// Target computed, nothing sent.
    Previewed,
    Delivered,
    Failed { error: String },
    /// The key never produced a request.
    Rejected { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyReport {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(flatten)]
    pub outcome: KeyOutcome,
}

impl KeyReport {
    #[must_use]
    pub fn line(&self) -> String {
        let target = self.target.as_deref().unwrap_or("-");
        match &self.outcome {
            KeyOutcome::Previewed => format!("GET {target}"),
            KeyOutcome::Delivered => format!("GET {target} delivered"),
            KeyOutcome::Failed { error } => format!("GET {target} failed: {error}"),
            KeyOutcome::Rejected { error } => format!("{:?} rejected: {error}", self.key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub keys: Vec<KeyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ForwardStats>,
}

/// Request targets for `keys`, without touching the network.
#[must_use]
pub fn preview(config: &ForwarderConfig, keys: &[String]) -> ReplaySummary {
    let keys = keys
        .iter()
        .map(|key| match KeypressRequest::build(config, key) {
            Ok(request) => KeyReport {
                key: key.clone(),
                target: Some(request.path),
                outcome: KeyOutcome::Previewed,
            },
            Err(err) => KeyReport {
                key: key.clone(),
                target: None,
                outcome: KeyOutcome::Rejected {
                    error: err.to_string(),
                },
            },
        })
        .collect();
    ReplaySummary { keys, stats: None }
}

/// Feed `keys` to the forwarder one at a time, settling each before the next.
pub fn replay<T, R>(forwarder: &Forwarder<T, R>, keys: &[String]) -> ReplaySummary
where
    T: Transport,
    R: Reloader + 'static,
{
    let keys = keys
        .iter()
        .map(|key| match forwarder.on_key_down(&KeyDown::new(key.as_str())) {
            Ok(dispatch) => {
                let target = dispatch.request.path.clone();
                let outcome = match pollster::block_on(dispatch.settle) {
                    Settlement::Delivered => KeyOutcome::Delivered,
                    Settlement::Failed(err) => KeyOutcome::Failed {
                        error: err.to_string(),
                    },
                };
                KeyReport {
                    key: key.clone(),
                    target: Some(target),
                    outcome,
                }
            }
            Err(err) => KeyReport {
                key: key.clone(),
                target: None,
                outcome: KeyOutcome::Rejected {
                    error: err.to_string(),
                },
            },
        })
        .collect();
    ReplaySummary {
        keys,
        stats: Some(forwarder.stats()),
    }
}
