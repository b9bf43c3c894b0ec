//! Physical identity of an output destination.
//!
//! Two handles naming the same file (or the same terminal) must resolve to the
//! same id so their sinks share one lock. On unix this is the `(device, inode)`
//! pair from `fstat`; everywhere else, and whenever `fstat` fails, streams get a
//! fixed id and other handles a fresh one.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationId {
    Inode { dev: u64, ino: u64 },
    Stream(StreamKind),
    /// A handle with no comparable identity.
    Unique(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl DestinationId {
    /// Fresh id never equal to any other.
    #[must_use]
    pub fn unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self::Unique(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub fn of_stream(kind: StreamKind) -> Self {
        #[cfg(unix)]
        {
            use std::os::fd::AsFd;
            let inode = match kind {
                StreamKind::Stdout => unix::inode_of(std::io::stdout().as_fd()),
                StreamKind::Stderr => unix::inode_of(std::io::stderr().as_fd()),
            };
            if let Some(id) = inode {
                return id;
            }
        }
        Self::Stream(kind)
    }

    #[must_use]
    pub fn of_file(file: &std::fs::File) -> Self {
        #[cfg(unix)]
        {
            use std::os::fd::AsFd;
            if let Some(id) = unix::inode_of(file.as_fd()) {
                return id;
            }
        }
        #[cfg(not(unix))]
        let _ = file;
        Self::unique()
    }
}

#[cfg(unix)]
mod unix {
    use super::DestinationId;
    use std::fs::File;
    use std::os::fd::BorrowedFd;
    use std::os::unix::fs::MetadataExt;

    /// `fstat` on a duplicate so the caller's handle is untouched.
    pub(super) fn inode_of(fd: BorrowedFd<'_>) -> Option<DestinationId> {
        let duplicate = File::from(fd.try_clone_to_owned().ok()?);
        let meta = duplicate.metadata().ok()?;
        Some(DestinationId::Inode {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }
}
