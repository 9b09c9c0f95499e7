#![deny(missing_docs)]
//! Shared logging utilities for the feed workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a thread-local request id that every macro prefixes onto its message, and a
//! minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the id of the request being rendered.
    static REQUEST_ID: Cell<u64> = const { Cell::new(0) };
}

/// Sets the request id for the current thread.
/// The feed engine calls this once at the start of every render.
pub fn set_request_id(id: u64) {
    REQUEST_ID.with(|v| v.set(id));
}

/// Retrieves the request id for the current thread.
/// Returns 0 if no request is in flight on this thread.
pub fn current_request_id() -> u64 {
    REQUEST_ID.with(|v| v.get())
}

/// Logs a trace-level message tagged with the current request id.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("[req {}] {}", $crate::current_request_id(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message tagged with the current request id.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("[req {}] {}", $crate::current_request_id(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message tagged with the current request id.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("[req {}] {}", $crate::current_request_id(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message tagged with the current request id.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("[req {}] {}", $crate::current_request_id(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message tagged with the current request id.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("[req {}] {}", $crate::current_request_id(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::{current_request_id, set_request_id};

    #[test]
    fn request_id_is_thread_local() {
        set_request_id(7);
        assert_eq!(current_request_id(), 7);
        let other = std::thread::spawn(current_request_id).join().unwrap();
        assert_eq!(other, 0);
    }
}
