use log::LevelFilter;

/// Initialise the global logger.
///
/// `RUST_LOG` is honoured; `verbose` raises the default level to debug.
/// Safe to call more than once (later calls are ignored), which keeps tests
/// that share a process happy.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .filter_module("rumqttc", LevelFilter::Warn)
        .parse_default_env()
        .format_target(false)
        .try_init();
}
