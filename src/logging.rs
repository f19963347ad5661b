// src/logging.rs
use tracing::{info, Dispatch};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;
use crate::error::{ErysaResult, ErysaError};

/// Handle for the process-wide log subscriber.
///
/// Logging starts with [`Logging::init`] and ends with [`Logging::shutdown`];
/// nothing is installed implicitly. Output goes to stderr because stdout
/// carries results and the child process protocol.
pub struct Logging {
    dispatch: Dispatch,
}

impl Logging {
    /// Install the subscriber described by the settings. `RUST_LOG` takes precedence.
    pub fn init(settings: &LoggingSettings) -> ErysaResult<Self> {
        let logging = Self::build(settings)?;

        tracing::dispatcher::set_global_default(logging.dispatch.clone())
            .map_err(|e| ErysaError::LoggingError(format!("Failed to install log subscriber: {}", e)))?;

        info!("Logging started at level {}", settings.level);
        Ok(logging)
    }

    /// Build the subscriber without installing it
    pub fn build(settings: &LoggingSettings) -> ErysaResult<Self> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&settings.level)
                .map_err(|e| ErysaError::LoggingError(format!("Invalid log level {}: {}", settings.level, e)))?,
        };

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(settings.ansi)
            .with_writer(std::io::stderr)
            .finish();

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
        })
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Emit the final log line.
    ///
    /// Nothing is flushed or uninstalled: the fmt subscriber writes each line
    /// synchronously, and a global default stays in place for the rest of the
    /// process.
    pub fn shutdown(self) {
        tracing::dispatcher::with_default(&self.dispatch, || {
            info!("Logging stopped");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        let settings = LoggingSettings { level: "not a [valid directive".to_string(), ansi: false };
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(Logging::build(&settings), Err(ErysaError::LoggingError(_))));
        }
    }

    #[test]
    fn test_build_does_not_install() {
        let logging = Logging::build(&LoggingSettings::default()).unwrap();
        tracing::dispatcher::with_default(logging.dispatch(), || {
            info!("scoped log line");
        });
        logging.shutdown();
    }

    #[test]
    fn test_shutdown_keeps_global_subscriber() {
        let logging = Logging::init(&LoggingSettings { level: "off".to_string(), ansi: false }).unwrap();
        logging.shutdown();

        assert!(tracing::dispatcher::has_been_set());
        let again = Logging::init(&LoggingSettings::default());
        assert!(matches!(again, Err(ErysaError::LoggingError(_))));
    }
}
