//! Symbol table extraction for columbo's address translation.
//!
//! Columbo resolves addresses in simulator traces against text symbol
//! tables dumped from the ELF binaries that ran inside the simulation.
//! This module drives an external dump command (objdump by default) once
//! per binary/target pair and writes the captured output to the target
//! file. The batch is fail-fast: the first failing invocation aborts it
//! and later pairs are not attempted.

use std::collections::BTreeMap;
use std::io;
use std::process::{Command, Output};

use thiserror::Error;
use tracing::{debug, info};

/// Errors from symbol table extraction.
#[derive(Debug, Error)]
pub enum SymtabError {
    /// A pair token had no `=` in it.
    #[error("malformed pair '{0}', expected ELF-BINARY=TARGET-FILE")]
    MalformedPair(String),

    /// The dump command could not be started at all.
    #[error("could not start '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The dump command ran but exited non-zero.
    #[error("executing '{command}' yielded an error:\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Writing the captured symbol table to the target file failed.
    #[error("could not write symbol table to {path}")]
    WriteTarget {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Bad command line.
    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, SymtabError>;

/// Parse `KEY=VALUE` tokens into a binary-to-target map.
///
/// Splits on the first `=` only; the key is trimmed, the value kept
/// verbatim so target paths may contain spaces (quoted by the invoking
/// shell) or further `=` signs. A later occurrence of a key overwrites the
/// earlier one. At least one pair is required.
pub fn parse_pairs<I>(tokens: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = String>,
{
    let mut pairs = BTreeMap::new();
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| SymtabError::MalformedPair(token.clone()))?;
        pairs.insert(key.trim().to_string(), value.to_string());
    }
    if pairs.is_empty() {
        return Err(SymtabError::Usage(
            "at least one ELF-BINARY=TARGET-FILE pair is required".into(),
        ));
    }
    Ok(pairs)
}

/// Runs the external symbol-dump command for one binary, capturing stdout
/// and the exit status.
///
/// The production implementation shells out to objdump; tests substitute a
/// scripted fake so the batch semantics can be pinned down without
/// binutils installed.
pub trait SymbolDumper {
    /// Run the dump command for `binary`, blocking until it exits.
    fn dump(&self, binary: &str) -> io::Result<Output>;

    /// The command line `dump` runs, quoted verbatim in error messages.
    fn command_line(&self, binary: &str) -> String;
}

/// Dumps symbol tables with `objdump --syms`.
#[derive(Debug, Clone)]
pub struct Objdump {
    program: String,
}

impl Objdump {
    /// Use an alternative dump binary, e.g. objdump from a cross toolchain.
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Objdump {
    fn default() -> Self {
        Self::new("objdump")
    }
}

impl SymbolDumper for Objdump {
    fn dump(&self, binary: &str) -> io::Result<Output> {
        Command::new(&self.program).arg("--syms").arg(binary).output()
    }

    fn command_line(&self, binary: &str) -> String {
        format!("{} --syms {}", self.program, binary)
    }
}

/// Dump the symbol table of `binary` into the file at `target`.
///
/// Stdout is captured in memory and written only after the command exits
/// successfully, so a failed invocation leaves no target file behind. An
/// existing target file is overwritten.
pub fn create_symtable(dumper: &dyn SymbolDumper, binary: &str, target: &str) -> Result<()> {
    let command = dumper.command_line(binary);
    debug!(%command, "running symbol dump");

    let output = dumper.dump(binary).map_err(|source| SymtabError::Spawn {
        command: command.clone(),
        source,
    })?;
    if !output.status.success() {
        return Err(SymtabError::CommandFailed {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    std::fs::write(target, &output.stdout).map_err(|source| SymtabError::WriteTarget {
        path: target.to_string(),
        source,
    })?;
    info!(binary, target_file = target, "symbol table written");
    Ok(())
}

/// Dump every pair's symbol table, in map iteration order.
///
/// The first error propagates and halts the batch.
pub fn create_symtables(dumper: &dyn SymbolDumper, pairs: &BTreeMap<String, String>) -> Result<()> {
    for (binary, target) in pairs {
        create_symtable(dumper, binary, target)?;
    }
    Ok(())
}
