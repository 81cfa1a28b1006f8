//! logging — `slog` loggers for estimation diagnostics.
//!
//! Library code never writes to stdout/stderr directly; it takes an
//! `slog::Logger` and emits structured records (batch sizes, reconciliation
//! `diff` and iteration counts, dropped units). The default is a discard
//! logger, so nothing is printed unless the caller wires a drain.
//!
//! With the `obs_slog` feature, [`term_logger`] builds the same kind of
//! non-blocking terminal logger the optimizer observers use: a `slog-term`
//! full-format drain behind a `slog-async` worker.
use slog::{o, Discard, Logger};

/// A logger that drops every record.
pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}

/// Non-blocking terminal logger (stderr), tagged with the crate name.
#[cfg(feature = "obs_slog")]
pub fn term_logger() -> Logger {
    use slog::Drain;

    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("crate" => "rust_ecoinference"))
}
