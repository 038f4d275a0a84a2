//! Named pipe (FIFO) management for columbo event streams.
//!
//! Columbo consumes simulator traces through named pipes that have to
//! exist before a run starts. This module creates those pipes and reports
//! the kernel buffer capacity of existing ones. Batch creation is
//! fail-fast: the first path that cannot be created aborts the batch with
//! an error and later names are not attempted.

use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use nix::fcntl::{fcntl, FcntlArg};
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use thiserror::Error;
use tracing::debug;

/// Errors from pipe creation and inspection.
#[derive(Debug, Error)]
pub enum PipeError {
    /// Creating the FIFO node failed (path exists, missing directory,
    /// permission denied).
    #[error("could not create named pipe {path}")]
    Create {
        path: String,
        #[source]
        source: nix::Error,
    },

    /// One of the two descriptors needed for inspection could not be opened.
    #[error("could not open named pipe {path} to query the underlying size")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The capacity query on an open descriptor failed.
    #[error("could not query the buffer size of named pipe {path}")]
    Capacity {
        path: String,
        #[source]
        source: nix::Error,
    },

    /// Bad command line.
    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, PipeError>;

/// A parsed `make-pipe` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeCommand {
    /// Create one or more pipes, optionally under a base directory.
    Create {
        names: Vec<String>,
        path: Option<String>,
    },
    /// Report the kernel buffer size of an existing pipe.
    Check { name: String },
}

impl PipeCommand {
    /// Parse raw command-line arguments, program name already stripped.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let command = args
            .next()
            .ok_or_else(|| PipeError::Usage("no command was given".into()))?;

        match command.as_str() {
            "create" => {
                let mut names = Vec::new();
                let mut path = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "-p" | "--path" => {
                            path = Some(args.next().ok_or_else(|| {
                                PipeError::Usage(format!("missing value for {arg}"))
                            })?);
                        }
                        other if other.starts_with('-') => {
                            return Err(PipeError::Usage(format!("unknown option '{other}'")));
                        }
                        _ => names.push(arg),
                    }
                }
                if names.is_empty() {
                    return Err(PipeError::Usage(
                        "create expects at least one pipe name".into(),
                    ));
                }
                Ok(PipeCommand::Create { names, path })
            }
            "check" => {
                let name = args.next().ok_or_else(|| {
                    PipeError::Usage("check expects the name of a named pipe".into())
                })?;
                if let Some(extra) = args.next() {
                    return Err(PipeError::Usage(format!(
                        "unexpected trailing argument '{extra}'"
                    )));
                }
                Ok(PipeCommand::Check { name })
            }
            other => Err(PipeError::Usage(format!("unknown command '{other}'"))),
        }
    }
}

/// Create every pipe in `names`, resolved against `base` when one is given.
///
/// Progress lines and the surrounding banners go to stdout, as columbo's
/// run scripts expect. An empty name list is a no-op apart from the
/// banners.
pub fn create_pipes(names: &[String], base: Option<&str>) -> Result<()> {
    println!("Start creation of named pipes");
    for name in names {
        let path = resolve_name(name, base);
        println!("Start Creation of named pipe with name {}", path.display());
        debug!(path = %path.display(), "calling mkfifo");
        mkfifo(&path, pipe_mode()).map_err(|source| PipeError::Create {
            path: path.display().to_string(),
            source,
        })?;
    }
    println!("Named pipes were successfully created");
    Ok(())
}

/// Report the kernel buffer capacity, in bytes, of the pipe at `path`.
///
/// The pipe is opened twice, read-write first and then read-only. A FIFO
/// opened read-only blocks until a writer appears; the read-write
/// descriptor from this same process is that writer, so neither open can
/// block. Both descriptors are dropped before this returns, on success and
/// on error alike.
pub fn buffer_size<P: AsRef<Path>>(path: P) -> Result<i32> {
    let path = path.as_ref();
    let _writer = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| PipeError::Open {
            path: path.display().to_string(),
            source,
        })?;
    let reader = File::open(path).map_err(|source| PipeError::Open {
        path: path.display().to_string(),
        source,
    })?;

    debug!(path = %path.display(), "querying F_GETPIPE_SZ");
    let size =
        fcntl(reader.as_raw_fd(), FcntlArg::F_GETPIPE_SZ).map_err(|source| PipeError::Capacity {
            path: path.display().to_string(),
            source,
        })?;
    Ok(size)
}

// 0666 before the caller's umask, matching mkfifo(3) defaults.
fn pipe_mode() -> Mode {
    Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IWGRP | Mode::S_IROTH | Mode::S_IWOTH
}

/// Join `name` under `base` unless the base directory is absent or empty.
fn resolve_name(name: &str, base: Option<&str>) -> PathBuf {
    match base {
        Some(base) if !base.is_empty() => Path::new(base).join(name),
        _ => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::FileTypeExt;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_requires_command() {
        let err = PipeCommand::parse(args(&[])).unwrap_err();
        assert!(matches!(err, PipeError::Usage(_)));
        assert_eq!(err.to_string(), "no command was given");
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        let err = PipeCommand::parse(args(&["destroy", "p0"])).unwrap_err();
        assert!(matches!(err, PipeError::Usage(_)));
    }

    #[test]
    fn test_parse_create_collects_names() {
        let cmd = PipeCommand::parse(args(&["create", "p0", "p1"])).unwrap();
        assert_eq!(
            cmd,
            PipeCommand::Create {
                names: vec!["p0".to_string(), "p1".to_string()],
                path: None,
            }
        );
    }

    #[test]
    fn test_parse_create_accepts_path_flag() {
        for flag in ["-p", "--path"] {
            let cmd = PipeCommand::parse(args(&["create", "p0", flag, "/tmp/run"])).unwrap();
            assert_eq!(
                cmd,
                PipeCommand::Create {
                    names: vec!["p0".to_string()],
                    path: Some("/tmp/run".to_string()),
                }
            );
        }
    }

    #[test]
    fn test_parse_create_path_flag_before_names() {
        let cmd = PipeCommand::parse(args(&["create", "--path", "/tmp/run", "p0"])).unwrap();
        assert_eq!(
            cmd,
            PipeCommand::Create {
                names: vec!["p0".to_string()],
                path: Some("/tmp/run".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_create_requires_path_value() {
        let err = PipeCommand::parse(args(&["create", "p0", "--path"])).unwrap_err();
        assert!(matches!(err, PipeError::Usage(_)));
    }

    #[test]
    fn test_parse_create_requires_names() {
        let err = PipeCommand::parse(args(&["create"])).unwrap_err();
        assert!(matches!(err, PipeError::Usage(_)));
    }

    #[test]
    fn test_parse_create_rejects_unknown_option() {
        let err = PipeCommand::parse(args(&["create", "p0", "--mode", "0600"])).unwrap_err();
        assert!(matches!(err, PipeError::Usage(_)));
    }

    #[test]
    fn test_parse_check() {
        let cmd = PipeCommand::parse(args(&["check", "/tmp/run/p0"])).unwrap();
        assert_eq!(
            cmd,
            PipeCommand::Check {
                name: "/tmp/run/p0".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_check_requires_name() {
        let err = PipeCommand::parse(args(&["check"])).unwrap_err();
        assert!(matches!(err, PipeError::Usage(_)));
    }

    #[test]
    fn test_parse_check_rejects_trailing_arguments() {
        let err = PipeCommand::parse(args(&["check", "p0", "p1"])).unwrap_err();
        assert!(matches!(err, PipeError::Usage(_)));
    }

    #[test]
    fn test_resolve_name_joins_base() {
        assert_eq!(
            resolve_name("p0", Some("/tmp/run")),
            PathBuf::from("/tmp/run/p0")
        );
    }

    #[test]
    fn test_resolve_name_without_base() {
        assert_eq!(resolve_name("p0", None), PathBuf::from("p0"));
        assert_eq!(resolve_name("p0", Some("")), PathBuf::from("p0"));
    }

    #[test]
    fn test_create_pipes_creates_fifos() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        let names = args(&["p0", "p1"]);

        create_pipes(&names, Some(base)).unwrap();

        for name in &names {
            let meta = std::fs::metadata(dir.path().join(name)).unwrap();
            assert!(meta.file_type().is_fifo());
        }
    }

    #[test]
    fn test_create_pipes_empty_list_is_noop() {
        create_pipes(&[], None).unwrap();
    }

    #[test]
    fn test_create_pipes_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();
        // p1 already exists as a regular file, so its mkfifo must fail.
        std::fs::write(dir.path().join("p1"), b"occupied").unwrap();

        let names = args(&["p0", "p1", "p2"]);
        let err = create_pipes(&names, Some(base)).unwrap_err();

        match err {
            PipeError::Create { path, .. } => {
                assert!(path.ends_with("p1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(dir.path().join("p0").exists());
        assert!(!dir.path().join("p2").exists());
    }

    #[test]
    fn test_create_pipes_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();

        let err = create_pipes(&args(&["p0", "p0"]), Some(base)).unwrap_err();
        assert!(matches!(err, PipeError::Create { .. }));
    }

    #[test]
    fn test_buffer_size_missing_pipe_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = buffer_size(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PipeError::Open { .. }));
    }
}
