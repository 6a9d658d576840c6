use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct Slot<T> {
    latest: Option<T>,
    closed: bool,
    dropped: u64,
}

/// Latest-value hand-off between the inbound receiver and the pipeline loop.
///
/// Holds at most one undelivered item. A `push` overwrites whatever is still
/// waiting, so a slow consumer skips frames instead of falling behind.
/// Share it behind an `Arc`.
pub struct FrameSource<T> {
    slot: Mutex<Slot<T>>,
    available: Condvar,
}

impl<T> FrameSource<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                latest: None,
                closed: false,
                dropped: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// Replaces any pending item and wakes the consumer.
    ///
    /// Returns `false` once the source is closed; the item is discarded.
    pub fn push(&self, item: T) -> bool {
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        if slot.latest.replace(item).is_some() {
            slot.dropped += 1;
        }
        drop(slot);
        self.available.notify_one();
        true
    }

    /// Blocks until an item is available and takes it.
    ///
    /// Returns `None` only after [`close`](Self::close) once the last pending
    /// item has been taken.
    pub fn pull(&self) -> Option<T> {
        let slot = self.lock();
        let mut slot = self
            .available
            .wait_while(slot, |s| s.latest.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        slot.latest.take()
    }

    /// Stops accepting items and releases a blocked `pull`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Items overwritten before anyone pulled them.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for FrameSource<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_push_then_pull_returns_item() {
        let source = FrameSource::new();
        assert!(source.push(1));
        assert_eq!(source.pull(), Some(1));
    }

    #[test]
    fn test_second_push_drops_first() {
        let source = FrameSource::new();
        source.push(1);
        source.push(2);
        assert_eq!(source.pull(), Some(2));
        assert_eq!(source.dropped(), 1);
        source.close();
        assert_eq!(source.pull(), None);
    }

    #[test]
    fn test_pull_blocks_until_push() {
        let source = Arc::new(FrameSource::new());
        let producer = source.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            producer.push("frame");
        });
        assert_eq!(source.pull(), Some("frame"));
        handle.join().unwrap();
    }

    #[test]
    fn test_close_releases_blocked_pull() {
        let source: Arc<FrameSource<u8>> = Arc::new(FrameSource::new());
        let closer = source.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            closer.close();
        });
        assert_eq!(source.pull(), None);
        handle.join().unwrap();
    }

    #[test]
    fn test_close_drains_pending_item_first() {
        let source = FrameSource::new();
        source.push(7);
        source.close();
        assert_eq!(source.pull(), Some(7));
        assert_eq!(source.pull(), None);
    }

    #[test]
    fn test_push_after_close_is_rejected() {
        let source = FrameSource::new();
        source.close();
        assert!(source.is_closed());
        assert!(!source.push(1));
        assert_eq!(source.pull(), None);
    }
}
