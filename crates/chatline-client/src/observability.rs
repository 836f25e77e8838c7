use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::errors::ChatError;

/// Filter used when neither the caller nor `RUST_LOG` picks one.
pub const DEFAULT_FILTER: &str = "warn,chatline_client=info,chatline=info";

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static INIT: OnceCell<()> = OnceCell::new();

/// Where and how much to log.
///
/// Build one with [`LogSettings::from_env`] and override fields from
/// command-line flags before calling [`init_observability`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub enabled: bool,
    /// A bare level (`debug`) applies to the chatline crates only; anything
    /// else is used as a full `EnvFilter` directive string.
    pub level: Option<String>,
    /// Write JSON lines to this file instead of the console.
    pub json_path: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: None,
            json_path: None,
        }
    }
}

impl LogSettings {
    /// Reads `CHATLINE_OBSERVABILITY_ENABLED`, `CHATLINE_LOG_LEVEL` and
    /// `CHATLINE_JSON_LOG_PATH`. Unset or empty values keep the defaults.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            enabled: var("CHATLINE_OBSERVABILITY_ENABLED").is_none_or(|v| !is_off(&v)),
            level: var("CHATLINE_LOG_LEVEL"),
            json_path: var("CHATLINE_JSON_LOG_PATH").map(PathBuf::from),
        }
    }

    /// Directive string for the filter. An explicit level wins over
    /// `rust_log`, which wins over [`DEFAULT_FILTER`].
    fn directives(&self, rust_log: Option<&str>) -> String {
        match self.level.as_deref().map(str::trim) {
            Some(level) if LEVELS.contains(&level.to_ascii_lowercase().as_str()) => {
                let level = level.to_ascii_lowercase();
                format!("warn,chatline_client={level},chatline={level}")
            }
            Some(directives) => directives.to_string(),
            None => rust_log
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_FILTER)
                .to_string(),
        }
    }

    fn filter(&self, rust_log: Option<&str>) -> Result<EnvFilter, ChatError> {
        let directives = self.directives(rust_log);
        match EnvFilter::try_new(&directives) {
            Ok(filter) => Ok(filter),
            // A bad RUST_LOG is not ours to reject.
            Err(_) if self.level.is_none() => Ok(EnvFilter::new(DEFAULT_FILTER)),
            Err(e) => Err(ChatError::Config(format!(
                "invalid log filter {directives:?}: {e}"
            ))),
        }
    }
}

fn is_off(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | "disabled"
    )
}

fn json_writer(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender, ChatError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| {
        ChatError::Config(format!("cannot create log directory {}: {e}", dir.display()))
    })?;
    let file_name = path
        .file_name()
        .ok_or_else(|| ChatError::Config(format!("log path has no file name: {}", path.display())))?;
    Ok(tracing_appender::rolling::never(dir, file_name))
}

/// Installs the global subscriber once per process.
///
/// Console output goes to stderr so it never interleaves with streamed text
/// on stdout. Later calls are no-ops, whatever their settings.
pub fn init_observability(settings: &LogSettings) -> Result<(), ChatError> {
    INIT.get_or_try_init(|| {
        if !settings.enabled {
            return Ok(());
        }
        let rust_log = std::env::var("RUST_LOG").ok();
        let filter = settings.filter(rust_log.as_deref())?;
        let installed = match &settings.json_path {
            Some(path) => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_writer(json_writer(path)?),
                )
                .try_init(),
            None => tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .try_init(),
        };
        if installed.is_err() {
            tracing::debug!("a global subscriber was already installed");
        }
        Ok(())
    })
    .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_level(level: &str) -> LogSettings {
        LogSettings {
            level: Some(level.into()),
            ..LogSettings::default()
        }
    }

    #[test]
    fn bare_level_is_scoped_to_chatline_crates() {
        assert_eq!(
            with_level("DEBUG").directives(Some("trace")),
            "warn,chatline_client=debug,chatline=debug"
        );
    }

    #[test]
    fn full_directive_is_used_verbatim() {
        assert_eq!(
            with_level("hyper=info,chatline=trace").directives(None),
            "hyper=info,chatline=trace"
        );
    }

    #[test]
    fn rust_log_then_default_apply_without_explicit_level() {
        let settings = LogSettings::default();
        assert_eq!(settings.directives(Some("reqwest=debug")), "reqwest=debug");
        assert_eq!(settings.directives(Some("  ")), DEFAULT_FILTER);
        assert_eq!(settings.directives(None), DEFAULT_FILTER);
    }

    #[test]
    fn invalid_explicit_filter_is_a_config_error() {
        assert!(matches!(
            with_level("chatline=notalevel").filter(None),
            Err(ChatError::Config(_))
        ));
        assert!(LogSettings::default().filter(Some("chatline=notalevel")).is_ok());
    }

    #[test]
    fn off_spellings_disable() {
        assert!(is_off("OFF"));
        assert!(is_off("0"));
        assert!(!is_off("yes"));
    }

    #[test]
    fn disabled_settings_install_nothing() {
        let settings = LogSettings {
            enabled: false,
            ..LogSettings::default()
        };
        assert!(init_observability(&settings).is_ok());
        assert!(init_observability(&LogSettings::default()).is_ok());
    }
}
