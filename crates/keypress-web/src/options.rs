#![forbid(unsafe_code)]

//! Arguments accepted by the JS `install()` entry point.

use keypress_core::{ForwardError, ForwarderConfig};
use tracing::Level;

/// Console verbosity used when the host does not pass one.
pub const DEFAULT_LOG_LEVEL: Level = Level::INFO;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub config: ForwarderConfig,
    pub log_level: Level,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            config: ForwarderConfig::default(),
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

impl InstallOptions {
    /// Parse the optional JSON config and optional log level name.
    ///
    /// Blank strings count as absent so a host can pass `""` for "default".
    pub fn parse(config_json: Option<&str>, log_level: Option<&str>) -> Result<Self, ForwardError> {
        let config = match config_json.map(str::trim).filter(|s| !s.is_empty()) {
            Some(json) => ForwarderConfig::from_json_str(json)?,
            None => ForwarderConfig::default().validated()?,
        };
        let log_level = match log_level.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name
                .parse::<Level>()
                .map_err(|_| ForwardError::invalid(format!("unknown log level: {name}")))?,
            None => DEFAULT_LOG_LEVEL,
        };
        Ok(Self { config, log_level })
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_LOG_LEVEL, InstallOptions};
    use keypress_core::{ForwardError, PathStyle, ReloadPolicy};
    use pretty_assertions::assert_eq;
    use tracing::Level;

    #[test]
    fn absent_and_blank_arguments_use_defaults() {
        assert_eq!(InstallOptions::parse(None, None).unwrap(), InstallOptions::default());
        assert_eq!(
            InstallOptions::parse(Some("  "), Some("")).unwrap(),
            InstallOptions::default()
        );
    }

    #[test]
    fn config_and_level_are_parsed() {
        let options = InstallOptions::parse(
            Some(r#"{"style":"plain","reload":"after_settle","prefix":"/keys/"}"#),
            Some("debug"),
        )
        .unwrap();
        assert_eq!(options.config.style, PathStyle::Plain);
        assert_eq!(options.config.reload, ReloadPolicy::AfterSettle);
        assert_eq!(options.config.prefix, "/keys");
        assert_eq!(options.log_level, Level::DEBUG);
    }

    #[test]
    fn bad_level_is_an_invalid_config() {
        let err = InstallOptions::parse(None, Some("chatty")).unwrap_err();
        assert!(matches!(err, ForwardError::InvalidConfig { .. }));
        assert_eq!(InstallOptions::default().log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn bad_json_is_an_invalid_config() {
        assert!(InstallOptions::parse(Some("{"), None).is_err());
    }
}
