use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` uses the `env_logger` directive syntax, for example
/// `"debug"` or `"cubes_engine=trace,wgpu_core=warn"`. When it is `None` the
/// `RUST_LOG` variable is consulted, then [`DEFAULT_FILTER`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
    /// Prefix records with the emitting module path.
    pub module_path: bool,
}

/// Filter applied when neither the config nor `RUST_LOG` provides one.
///
/// wgpu's internal crates log every resource creation at info level.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
            module_path: true,
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger.
///
/// Only the first call has an effect; call it at the top of `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let filter = config
            .env_filter
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        builder.parse_filters(&filter);

        builder.write_style(config.write_style);
        builder.format_module_path(config.module_path);

        // `try_init` so a logger installed by a test harness is left alone.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized (filter: {filter})");
    });
}
