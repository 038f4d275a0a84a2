//! Command-line utilities supporting the columbo trace analysis tool.
//!
//! Two independent tools live in this crate: `make-pipe` manages the named
//! pipes columbo reads simulator event streams from, and `make-symtables`
//! dumps ELF symbol tables into the text files columbo uses for address
//! translation. The operations sit in library modules so they stay
//! unit-testable; the binaries under `src/bin/` are thin argument-and-exit
//! shells around them.

/// Named pipe creation and buffer-size inspection
pub mod fifo;
/// Tracing subscriber setup
pub mod logging;
/// Symbol table extraction through an external dump command
pub mod symtab;
