use tracing_subscriber::EnvFilter;

use crate::config;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `config::default_log_filter()`.
/// Calling this twice is harmless: the second install is ignored.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} core starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing();
        init_tracing();
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(config::default_log_filter()).is_ok());
    }
}
