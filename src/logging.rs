use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger. `RUST_LOG` overrides the level chosen here.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // Fails only when a logger is already installed.
    let _ = builder.try_init();
}
