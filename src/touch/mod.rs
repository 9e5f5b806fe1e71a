//! Active touch tracking
//!
//! Touch callbacks arrive on the UI thread while snapshot queries can come
//! from anywhere, so every operation takes the tracker's single lock. The lock
//! is released before any method returns; nothing here calls into another
//! component while holding it.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

use crate::input::{TouchPhase, TouchPoint, Vector2};

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackedTouch {
    position: Vector2,
    phase: TouchPhase,
}

#[derive(Debug, Default)]
pub struct TouchTracker {
    touches: Mutex<BTreeMap<i64, TrackedTouch>>,
}

impl TouchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `id`, replacing any stale entry with the same id
    pub fn begin(&self, id: i64, position: Vector2) {
        self.touches.lock().insert(
            id,
            TrackedTouch {
                position,
                phase: TouchPhase::Began,
            },
        );
    }

    /// Updates a tracked touch; unknown ids are ignored. Returns whether it was tracked.
    pub fn move_to(&self, id: i64, position: Vector2) -> bool {
        let mut touches = self.touches.lock();
        match touches.get_mut(&id) {
            Some(touch) => {
                touch.position = position;
                touch.phase = TouchPhase::Moved;
                true
            }
            None => {
                debug!("Ignoring move for untracked touch {}", id);
                false
            }
        }
    }

    pub fn end(&self, id: i64) {
        self.touches.lock().remove(&id);
    }

    pub fn cancel(&self, id: i64) {
        self.touches.lock().remove(&id);
    }

    /// Drops every touch, for platform-wide gesture cancellation
    pub fn cancel_all(&self) {
        self.touches.lock().clear();
    }

    /// Current touches ordered by id
    pub fn snapshot(&self) -> Vec<TouchPoint> {
        self.touches
            .lock()
            .iter()
            .map(|(id, touch)| TouchPoint {
                id: *id,
                position: touch.position,
                phase: touch.phase,
            })
            .collect()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.touches.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.touches.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_begin_then_end_removes_touch() {
        let tracker = TouchTracker::new();
        tracker.begin(7, Vector2::new(1.0, 2.0));
        assert!(tracker.contains(7));
        tracker.end(7);
        assert!(!tracker.contains(7));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_move_never_resurrects() {
        let tracker = TouchTracker::new();
        assert!(!tracker.move_to(1, Vector2::new(5.0, 5.0)));
        assert!(tracker.is_empty());

        tracker.begin(1, Vector2::new(0.0, 0.0));
        tracker.cancel(1);
        assert!(!tracker.move_to(1, Vector2::new(5.0, 5.0)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_move_updates_phase_and_position() {
        let tracker = TouchTracker::new();
        tracker.begin(2, Vector2::new(0.0, 0.0));
        assert!(tracker.move_to(2, Vector2::new(3.0, 4.0)));
        let touches = tracker.snapshot();
        assert_eq!(touches.len(), 1);
        assert_eq!(touches[0].phase, TouchPhase::Moved);
        assert_eq!(touches[0].position, Vector2::new(3.0, 4.0));
    }

    #[test]
    fn test_snapshot_is_ordered_by_id() {
        let tracker = TouchTracker::new();
        for id in [9, -3, 4] {
            tracker.begin(id, Vector2::ZERO);
        }
        let ids: Vec<i64> = tracker.snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![-3, 4, 9]);
        tracker.cancel_all();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        let tracker = Arc::new(TouchTracker::new());
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        let id = t * 1000 + i;
                        tracker.begin(id, Vector2::ZERO);
                        tracker.move_to(id, Vector2::new(1.0, 1.0));
                        let _ = tracker.snapshot();
                        tracker.end(id);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        assert!(tracker.is_empty());
    }
}
