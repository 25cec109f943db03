//! Logging setup for deep-pluck.
//!
//! Loads emit `tracing` events: one `debug!` per association node with the
//! number of parent keys and fetched rows, SQL at `debug!` level from the
//! SQLite driver, and a `warn!` whenever a singular association matched
//! several rows under [`MultipleMatchPolicy::First`](crate::config::MultipleMatchPolicy).
//!
//! # Environment Variables
//!
//! - `PLUCK_DEBUG=true|1|yes` - Enable debug logging
//! - `PLUCK_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `PLUCK_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! # Usage
//!
//! ```rust,no_run
//! use deep_pluck_query::logging;
//!
//! // Initialize logging (call once at startup)
//! logging::init();
//! ```
//!
//! A subscriber is only installed with the `tracing-subscriber` feature.
//! Without it, applications install their own.

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Check if debug logging is enabled via `PLUCK_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var("PLUCK_DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level from `PLUCK_LOG_LEVEL`.
///
/// Defaults to "debug" if `PLUCK_DEBUG` is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    let fallback = if is_debug_enabled() { "debug" } else { "warn" };
    match env::var("PLUCK_LOG_LEVEL") {
        Ok(level) => match level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" => "warn",
            "error" => "error",
            _ => fallback,
        },
        Err(_) => fallback,
    }
}

/// Get the configured log format from `PLUCK_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var("PLUCK_LOG_FORMAT")
        .map(|f| match f.to_lowercase().as_str() {
            "pretty" => "pretty",
            "compact" => "compact",
            _ => "json",
        })
        .unwrap_or("json")
}

/// The filter directive covering every deep-pluck crate at `level`.
pub fn filter_directive(level: &str) -> String {
    format!(
        "deep_pluck={},deep_pluck_query={},deep_pluck_sqlite={}",
        level, level, level
    )
}

/// Initialize the logging system.
///
/// Subsequent calls are no-ops. Nothing is installed unless `PLUCK_DEBUG`
/// or `PLUCK_LOG_LEVEL` is set.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var("PLUCK_LOG_LEVEL").is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(filter_directive(level))
                .unwrap_or_else(|_| EnvFilter::new("warn"));

            match get_log_format() {
                "json" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json())
                        .init();
                }
                "compact" => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().compact())
                        .init();
                }
                _ => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().pretty())
                        .init();
                }
            }

            tracing::info!(
                level = level,
                format = get_log_format(),
                "deep-pluck logging initialized"
            );
        }
    });
}

/// Initialize logging with a specific level.
///
/// # Safety
///
/// This function modifies environment variables, which is unsafe in
/// multi-threaded programs. Call this early in your program before
/// spawning threads.
pub fn init_with_level(level: &str) {
    // SAFETY: only meant for program startup, before threads exist.
    unsafe {
        env::set_var("PLUCK_LOG_LEVEL", level);
    }
    init();
}

/// Initialize debug logging. Equivalent to `PLUCK_DEBUG=true` plus [`init`].
///
/// # Safety
///
/// Same caveat as [`init_with_level`].
pub fn init_debug() {
    // SAFETY: only meant for program startup, before threads exist.
    unsafe {
        env::set_var("PLUCK_DEBUG", "true");
    }
    init();
}

/// Debug logging that only fires when `PLUCK_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! pluck_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            ::tracing::debug!($($arg)*);
        }
    };
}

/// Trace logging that only fires when `PLUCK_DEBUG` is enabled at runtime.
#[macro_export]
macro_rules! pluck_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            ::tracing::trace!($($arg)*);
        }
    };
}
