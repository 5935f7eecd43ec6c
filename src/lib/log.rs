//! Logging setup. Library code never prints; it only logs through a
//! `slog::Logger` handed to it by the caller, keeping user-facing CLI
//! output separate from build diagnostics.

use slog::{o, Discard, Drain, Logger};

/// A logger that drops everything. Useful as a default when the caller
/// doesn't care about build diagnostics.
pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}

/// A human-readable, asynchronous terminal logger, for CLI use.
pub fn term_logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!())
}
