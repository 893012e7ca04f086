// Copyright (c) 2023-2026 Quorus Labs (quorus.dev)
// This file is part of the Quorus repository.

// You should have received a copy of the MIT License
// along with the Quorus repository. If not, see <https://mit-license.org/>.

//! Helper functions for logging.
//!
//! The filter comes from `RUST_LOG` as usual; `RUST_LOG_FORMAT` picks the
//! output shape (`json` for log collectors, `compact` for terminals, full
//! formatting otherwise).

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// A `Once` instance to ensure that logging is only initialized once.
static LOGGING_INITIALIZED: Once = Once::new();

/// Set up the tracing subscriber for this process.
///
/// Safe to call from every binary and test entry point; only the first call
/// installs anything.
pub fn setup_logging() {
    LOGGING_INITIALIZED.call_once(|| {
        let fmt = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
        match std::env::var("RUST_LOG_FORMAT").as_deref() {
            Ok("json") => fmt.json().init(),
            Ok("compact") => fmt.compact().init(),
            _ => fmt.init(),
        }
    });
}
