use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// `RUST_LOG` wins over the verbosity flag when set.
pub fn init(verbose: bool) {
    let default = if verbose { "push50=debug" } else { "warn" };
    let env_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let fmt_layer = fmt::layer().with_writer(std::io::stderr).without_time();

    if let Err(err) = registry().with(fmt_layer).with(env_layer).try_init() {
        eprintln!("Logger already init: {err}");
    };
}
