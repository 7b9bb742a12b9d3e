use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const CRATES: [&str; 3] = ["brewmerge", "brewmerge_core", "brewmerge_match"];

/// Installs the stderr subscriber. `RUST_LOG` wins when set; otherwise our
/// crates log at info, or debug with `-v`, and everything else at warn.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let default_directives = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .chain(std::iter::once("warn".to_string()))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = if verbosity > 0 {
        EnvFilter::new(default_directives)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
    };

    let console_layer = fmt::layer()
        .with_target(verbosity > 0)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
