//! Global logger initialization.
//!
//! The library itself only emits through the `log` facade; installing a
//! backend is the binary's job. `init` is idempotent so tests and embedding
//! applications can call it freely.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger once, honoring `RUST_LOG` with an `info`
/// default filter.
pub fn init() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        log::debug!("logger initialized twice without panicking");
    }
}
