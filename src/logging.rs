use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "interop_bindgen=info,interop_generator=info,interop_registry=info";

/// Filter directives for `-v` repeated `verbosity` times.
pub fn filter_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_FILTER,
        1 => "interop_bindgen=debug,interop_generator=debug,interop_registry=debug",
        _ => "interop_bindgen=trace,interop_generator=trace,interop_registry=trace",
    }
}

/// Initialise the tracing subscriber once per process. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbosity: u8) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity)));

        fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(filter_for(0), DEFAULT_FILTER);
        assert!(filter_for(1).contains("interop_generator=debug"));
        assert_eq!(filter_for(2), filter_for(7));
    }
}
