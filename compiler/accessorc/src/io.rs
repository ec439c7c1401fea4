//! Asynchronous artifact writes.
//!
//! Emitters run on the caller thread and hand each finished artifact to a
//! bounded queue; a fixed set of workers persists them concurrently. The
//! scope is a join barrier: it returns only once every queued write has
//! completed, reporting the first failure.
//!
//! ```text
//! caller ── write_file ──► [bounded channel] ──► worker × jobs ──► tmp + rename
//!    │                                                               │
//!    └──────────────────────── join ◄────────────────────────────────┘
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use accessors_ir::ArtifactSink;
use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::GenerateConfig;

/// A failed artifact write.
#[derive(Debug, thiserror::Error)]
#[error("cannot write `{}`: {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

struct WriteRequest {
    path: PathBuf,
    bytes: Vec<u8>,
}

/// Handle given to the body of [`with_asynchronous_io`].
pub struct AsyncIo<'a> {
    sender: Sender<WriteRequest>,
    first_error: &'a Mutex<Option<WriteError>>,
}

impl AsyncIo<'_> {
    fn record(&self, error: WriteError) {
        record_first(self.first_error, error);
    }
}

impl ArtifactSink for AsyncIo<'_> {
    fn write_file(&self, path: PathBuf, bytes: Vec<u8>) {
        trace!(path = %path.display(), len = bytes.len(), "queueing write");
        if let Err(channel::SendError(request)) = self.sender.send(WriteRequest { path, bytes }) {
            // Workers hold the receiver until the scope closes, so this only
            // happens if every worker has died.
            self.record(WriteError {
                path: request.path,
                source: io::Error::new(io::ErrorKind::BrokenPipe, "write pool is closed"),
            });
        }
    }
}

/// Run `body` with an [`ArtifactSink`] backed by `config.jobs` writer
/// threads, then wait for every write.
///
/// An error from `body` wins over write failures; otherwise the first
/// failed write is returned. Writes queued before a failure still run.
pub fn with_asynchronous_io<T, E, F>(config: &GenerateConfig, body: F) -> Result<T, E>
where
    F: FnOnce(&AsyncIo<'_>) -> Result<T, E>,
    E: From<WriteError>,
{
    let jobs = config.effective_jobs();
    let (sender, receiver) = channel::bounded::<WriteRequest>(config.effective_queue_capacity());
    let first_error = Mutex::new(None);

    debug!(jobs, capacity = config.effective_queue_capacity(), "starting write pool");

    let result = thread::scope(|scope| {
        for _ in 0..jobs {
            let receiver = receiver.clone();
            let first_error = &first_error;
            scope.spawn(move || {
                for request in receiver {
                    if let Err(source) = write_atomically(&request.path, &request.bytes) {
                        debug!(path = %request.path.display(), %source, "write failed");
                        record_first(
                            first_error,
                            WriteError {
                                path: request.path,
                                source,
                            },
                        );
                    }
                }
            });
        }
        drop(receiver);

        let io = AsyncIo {
            sender,
            first_error: &first_error,
        };
        let result = body(&io);
        // Closing the channel lets the workers drain and exit.
        drop(io);
        result
    });

    let value = result?;
    match first_error.into_inner() {
        Some(error) => Err(error.into()),
        None => Ok(value),
    }
}

fn record_first(slot: &Mutex<Option<WriteError>>, error: WriteError) {
    let mut slot = slot.lock();
    if slot.is_none() {
        *slot = Some(error);
    }
}

/// Replace `path` with `bytes` so that readers see either the old file or
/// the complete new one.
fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    publish_permissions(file.path(), PUBLISHED_FILE_MODE)?;
    file.persist(path)?;
    Ok(())
}

/// Mode of every persisted artifact; temp files start out owner-only.
pub(crate) const PUBLISHED_FILE_MODE: u32 = 0o644;
/// Mode of directories created through `tempfile`.
pub(crate) const PUBLISHED_DIR_MODE: u32 = 0o755;

#[cfg(unix)]
pub(crate) fn publish_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
pub(crate) fn publish_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
