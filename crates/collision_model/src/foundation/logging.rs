//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Filter applied when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "collision_model=info";

/// Initialize the logging system
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Initialize the logging system with a fallback filter for when
/// `RUST_LOG` is not set
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}
