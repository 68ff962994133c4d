//! Drawing history log: the ordered, bounded record of what a room shows.
//!
//! Order is server arrival order. When the bound is exceeded the oldest
//! entries are evicted first. Eviction leaves redo stacks untouched: they hold
//! events that are not in the log, and undo only ever sees what survived.

use inkroom_shared::StrokeEvent;

use crate::state::Room;

impl Room {
    /// Logs a new event. New work by a user invalidates that user's redo
    /// trail. Returns how many old events were evicted.
    pub fn append(&mut self, event: StrokeEvent) -> usize {
        self.redo_stacks.remove(&event.user_id);
        self.push_bounded(event)
    }

    /// Pushes without touching redo stacks. Used by redo.
    pub(crate) fn push_bounded(&mut self, event: StrokeEvent) -> usize {
        self.history.push_back(event);
        let overflow = self.history.len().saturating_sub(self.history_limit);
        self.history.drain(..overflow);
        overflow
    }

    pub fn snapshot(&self) -> Vec<StrokeEvent> {
        self.history.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.redo_stacks.clear();
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
