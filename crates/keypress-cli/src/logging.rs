//! Log filter for the `keypress` binary.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable. `info` keeps the
/// `reload requested` lines visible.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter from a `RUST_LOG`-style value, falling back to
/// [`DEFAULT_FILTER`].
#[must_use]
pub fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Filter from the process environment.
#[must_use]
pub fn env_filter() -> EnvFilter {
    let value = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(value.as_deref())
}
