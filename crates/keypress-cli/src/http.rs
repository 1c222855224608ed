//! Blocking HTTP binding of the forwarder seams.

use std::future::{Ready, ready};
use std::time::Duration;

use keypress_core::{Completion, KeypressRequest, Reloader, Transport, TransportError};
use reqwest::blocking::Client;
use tracing::{debug, info};
use url::Url;

use crate::error::{CliError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Sends keypress GETs to `base`, the way the page would against its origin.
///
/// The request completes inside [`Transport::issue`], so the returned future
/// is already resolved.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CliError::invalid(format!(
                "base URL must be http(s): {base}"
            )));
        }
        if timeout.is_zero() {
            return Err(CliError::invalid("timeout must be positive"));
        }
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base })
    }

    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a request target. Absolute paths replace the base path.
    pub fn url_for(&self, request: &KeypressRequest) -> std::result::Result<Url, url::ParseError> {
        self.base.join(&request.path)
    }

    fn send(&self, request: &KeypressRequest) -> Completion {
        let url = self
            .url_for(request)
            .map_err(|err| TransportError::Rejected(err.to_string()))?;
        debug!(%url, "GET");
        // The body is dropped unread.
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| TransportError::Rejected(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }
}

impl Transport for HttpTransport {
    type Pending = Ready<Completion>;

    fn issue(&self, request: &KeypressRequest) -> Self::Pending {
        ready(self.send(request))
    }
}

/// Stands in for the page reload: there is no page outside the browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggedReload;

impl Reloader for LoggedReload {
    fn reload(&self) {
        info!("reload requested");
    }
}
