//! Caller-held exclusive scope returned by [`Logger::locked_session`].

use super::Logger;
use crate::session::SessionId;
use std::ops::Deref;
use std::thread;

/// A logger whose lines are contiguous until release.
///
/// Dereferences to a [`Logger`], so every logging method is available on
/// it directly. Dropping it releases the session; nested sessions must be
/// released innermost first.
#[must_use = "the session is released as soon as it is dropped"]
#[derive(Debug)]
pub struct Session {
    logger: Logger,
    id: SessionId,
    released: bool,
}

impl Session {
    /// Records this logger family submitted earlier are written first.
    pub(super) fn open(parent: &Logger) -> Self {
        let id = parent.core.coordinator.open(parent.session);
        Self {
            logger: Logger {
                session: Some(id),
                ..parent.clone()
            },
            id,
            released: false,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub const fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Ends the session and lets waiting writers through.
    ///
    /// # Panics
    /// If a session opened inside this one is still open.
    pub fn release(mut self) {
        self.logger.core.coordinator.release(self.id);
        self.released = true;
    }
}

impl Deref for Session {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if thread::panicking() {
            self.logger.core.coordinator.abandon(self.id);
        } else {
            self.logger.core.coordinator.release(self.id);
        }
    }
}
