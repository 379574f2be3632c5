//! Session-end subscribers.
//!
//! Listeners run synchronously inside `tick()`, in subscription order, and
//! see the snapshot of the session that just ran out, before the scheduler
//! moves on to the next one.

use super::scheduler::TimerSnapshot;

/// Receives a callback each time a session expires.
pub trait SessionEndListener: Send {
    fn on_session_end(&mut self, ended: &TimerSnapshot);
}

impl<F> SessionEndListener for F
where
    F: FnMut(&TimerSnapshot) + Send,
{
    fn on_session_end(&mut self, ended: &TimerSnapshot) {
        self(ended)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct ListenerSet {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn SessionEndListener>)>,
}

impl ListenerSet {
    pub(crate) fn add(&mut self, listener: Box<dyn SessionEndListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn notify(&mut self, ended: &TimerSnapshot) {
        for (_, listener) in &mut self.entries {
            listener.on_session_end(ended);
        }
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.entries.len())
            .finish()
    }
}
