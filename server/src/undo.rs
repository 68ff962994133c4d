//! Per-user undo/redo over the shared history log.
//!
//! DESIGN
//! ======
//! Undo retracts the caller's most recent gesture. A gesture is every event
//! by that user carrying the same stroke id, wherever it sits in the log, so
//! segments interleaved with other users' work still come out as one unit.
//! An event without a stroke id is its own gesture.
//!
//! Redo pops the last undone group and appends it at the current end of the
//! log. Restored strokes therefore stack on top of anything drawn in the
//! meantime instead of returning to their old slots.
//!
//! Both operations run under the room's write lock, so a group is always
//! removed or restored whole.

use std::collections::VecDeque;

use inkroom_shared::StrokeEvent;

use crate::state::{Room, StrokeGroup};

impl Room {
    /// Returns the number of events removed, or `None` when the user has
    /// nothing left in the log.
    pub fn undo(&mut self, user_id: &str) -> Option<usize> {
        let index = self
            .history
            .iter()
            .rposition(|event| event.user_id == user_id)?;

        let events = match self.history[index].stroke_id.clone() {
            None => self.history.remove(index).into_iter().collect::<Vec<_>>(),
            Some(stroke_id) => {
                let (removed, kept): (Vec<StrokeEvent>, Vec<StrokeEvent>) =
                    std::mem::take(&mut self.history)
                        .into_iter()
                        .partition(|event| {
                            event.user_id == user_id
                                && event.stroke_id.as_deref() == Some(stroke_id.as_str())
                        });
                self.history = VecDeque::from(kept);
                removed
            }
        };

        let removed = events.len();
        self.redo_stacks
            .entry(user_id.to_string())
            .or_default()
            .push(StrokeGroup { events });
        Some(removed)
    }

    /// Returns the number of events restored, or `None` when the user's redo
    /// stack is empty.
    pub fn redo(&mut self, user_id: &str) -> Option<usize> {
        let stack = self.redo_stacks.get_mut(user_id)?;
        let group = stack.pop()?;
        if stack.is_empty() {
            self.redo_stacks.remove(user_id);
        }

        let restored = group.events.len();
        for event in group.events {
            self.push_bounded(event);
        }
        Some(restored)
    }
}

#[cfg(test)]
#[path = "undo_test.rs"]
mod tests;
