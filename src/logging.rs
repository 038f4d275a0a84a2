//! Logging and tracing infrastructure for the columbo utilities.
//!
//! Diagnostics go through the tracing crate to stderr. Both tools print
//! contract output (banners, the reported buffer size) on stdout, so the
//! subscriber must never write there.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// This should be called once at program startup. Subsequent calls are
/// ignored. The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();

        tracing::debug!("columbo-utils tracing initialized");
    });
}
