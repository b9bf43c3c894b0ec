//! Exclusive multi-line scopes.
//!
//! A [`SessionCoordinator`] is shared by a logger and every logger derived
//! from it. Writers pass through its gate: while a session is open, only
//! writes carrying the top session's id get through; everyone else waits
//! until the stack is empty again.
//!
//! Records handed to the pool take a [`Ticket`] when they are submitted, not
//! when a worker reaches the gate. Opening a session records the next ticket
//! number as its cutoff and waits only for the tickets below it and for
//! writers already mid-line. While an open is pending, later tickets and new
//! synchronous writers are held back, so a busy logger cannot starve it.
//! Nothing here depends on the pool being idle: loggers with separate
//! coordinators never wait on each other.

use crate::internal;
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use ulid::Ulid;

/// Identity of one open session; compared by value, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Ulid);

impl SessionId {
    fn new() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default)]
struct GateState {
    stack: Vec<SessionId>,
    writers: usize,
    /// Callers blocked in `open`.
    opening: usize,
    next_ticket: u64,
    /// Submitted records not yet written, by ticket number.
    outstanding: BTreeSet<u64>,
    /// Tickets below this were submitted before the latest pending open.
    cutoff: u64,
}

impl GateState {
    fn admits(&self, holder: Option<SessionId>) -> bool {
        match self.stack.last() {
            None => true,
            Some(top) => holder == Some(*top),
        }
    }

    fn admits_writer(&self, holder: Option<SessionId>) -> bool {
        self.admits(holder) && (self.opening == 0 || !self.stack.is_empty())
    }

    fn admits_ticket(&self, number: u64) -> bool {
        self.stack.is_empty() && (self.opening == 0 || number < self.cutoff)
    }

    fn submitted_before(&self, cutoff: u64) -> bool {
        self.outstanding.first().is_some_and(|first| *first < cutoff)
    }
}

#[derive(Debug, Default)]
pub struct SessionCoordinator {
    state: Mutex<GateState>,
    changed: Condvar,
    /// Serializes ticket assignment with the hand-off to the pool, so every
    /// worker queue holds tickets in increasing order.
    submitting: Mutex<()>,
}

impl SessionCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Coordinator used by loggers that are not given one.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<SessionCoordinator>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Blocks until `holder` may write, then counts it as an in-flight writer
    /// until the returned guard drops.
    pub fn enter(&self, holder: Option<SessionId>) -> WriteGuard<'_> {
        let mut state = self.state.lock();
        while !state.admits_writer(holder) {
            self.changed.wait(&mut state);
        }
        state.writers += 1;
        WriteGuard { coordinator: self }
    }

    /// Issues a ticket and passes it to `hand_off`, which must queue the
    /// record that carries it. Submissions are serialized, so tickets reach
    /// any FIFO queue in issue order.
    pub fn submit(self: &Arc<Self>, hand_off: impl FnOnce(Ticket)) {
        let _order = self.submitting.lock();
        let number = {
            let mut state = self.state.lock();
            let number = state.next_ticket;
            state.next_ticket += 1;
            state.outstanding.insert(number);
            number
        };
        hand_off(Ticket {
            coordinator: Arc::clone(self),
            number,
        });
    }

    /// Gate for a submitted record. Blocks while a session is open, and
    /// while an open is pending unless the ticket predates it.
    pub fn enter_submitted(&self, ticket: &Ticket) -> WriteGuard<'_> {
        let mut state = self.state.lock();
        while !state.admits_ticket(ticket.number) {
            self.changed.wait(&mut state);
        }
        state.writers += 1;
        WriteGuard { coordinator: self }
    }

    /// Pushes a new session once `holder` is admitted, no writer is mid-line
    /// and every record submitted before the call has been written. A holder
    /// opening a session nests inside its own and does not wait for outside
    /// records, which cannot pass while it holds the gate.
    pub fn open(&self, holder: Option<SessionId>) -> SessionId {
        let mut state = self.state.lock();
        let cutoff = state.next_ticket;
        state.cutoff = state.cutoff.max(cutoff);
        state.opening += 1;
        while !state.admits(holder)
            || state.writers > 0
            || (holder.is_none() && state.submitted_before(cutoff))
        {
            self.changed.wait(&mut state);
        }
        state.opening -= 1;
        let id = SessionId::new();
        state.stack.push(id);
        internal::debug(
            "SESSION",
            &format!("opened {id} at depth {}", state.stack.len()),
        );
        drop(state);
        // Held-back writers re-check against the now non-empty stack.
        self.changed.notify_all();
        id
    }

    /// Pops `id`, which must be the innermost open session.
    ///
    /// # Panics
    /// When `id` is not the top of the stack: sessions were released out of
    /// order or twice.
    pub fn release(&self, id: SessionId) {
        let mut state = self.state.lock();
        let top = state.stack.last().copied();
        if top != Some(id) {
            drop(state);
            let top = top.map_or_else(|| "none".to_string(), |top| top.to_string());
            panic!("released session {id} but the innermost open session is {top}");
        }
        state.stack.pop();
        internal::debug("SESSION", &format!("released {id}"));
        drop(state);
        self.changed.notify_all();
    }

    /// Removes `id` wherever it sits. Used when a session is dropped during a
    /// panic, where raising a second panic would abort.
    pub fn abandon(&self, id: SessionId) {
        let mut state = self.state.lock();
        if let Some(position) = state.stack.iter().rposition(|open| *open == id) {
            state.stack.truncate(position);
            internal::warn("SESSION", &format!("abandoned {id} while unwinding"));
        }
        drop(state);
        self.changed.notify_all();
    }

    /// Innermost open session.
    #[must_use]
    pub fn active(&self) -> Option<SessionId> {
        self.state.lock().stack.last().copied()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.state.lock().stack.len()
    }

    /// Records submitted through [`submit`](Self::submit) and not yet written.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.state.lock().outstanding.len()
    }

    /// Blocks until every submitted record has been written.
    pub fn wait_submitted(&self) {
        let mut state = self.state.lock();
        while !state.outstanding.is_empty() {
            self.changed.wait(&mut state);
        }
    }

    /// Like [`wait_submitted`](Self::wait_submitted), giving up after
    /// `timeout`. Returns whether everything was written.
    pub fn wait_submitted_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        while !state.outstanding.is_empty() {
            if self.changed.wait_for(&mut state, timeout).timed_out() {
                return state.outstanding.is_empty();
            }
        }
        true
    }

    fn finish(&self, number: u64) {
        let mut state = self.state.lock();
        state.outstanding.remove(&number);
        drop(state);
        self.changed.notify_all();
    }

    fn leave(&self) {
        let mut state = self.state.lock();
        state.writers = state.writers.saturating_sub(1);
        let drained = state.writers == 0;
        drop(state);
        if drained {
            self.changed.notify_all();
        }
    }
}

/// An admitted writer. Dropping it lets a pending session open.
#[must_use = "the gate is only held while the guard lives"]
pub struct WriteGuard<'a> {
    coordinator: &'a SessionCoordinator,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.leave();
    }
}

/// A submitted record's place in line. Dropping it, written or not, marks
/// the record done.
#[must_use = "the record counts as pending until the ticket drops"]
pub struct Ticket {
    coordinator: Arc<SessionCoordinator>,
    number: u64,
}

impl Ticket {
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.coordinator.finish(self.number);
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ticket").field(&self.number).finish()
    }
}

impl fmt::Debug for WriteGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WriteGuard")
    }
}
