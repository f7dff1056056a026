//! Single-slot frame hand-off between the capture and analysis threads.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::types::CameraFrame;

#[derive(Default)]
struct Slot {
    frame: Option<CameraFrame>,
    closed: bool,
    dropped: u64,
}

/// A bounded channel of capacity one that keeps only the latest frame.
///
/// Publishing into a full slot evicts (and thereby releases) the older frame
/// instead of blocking the producer.
#[derive(Default)]
pub struct FrameFeed {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl FrameFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offer a frame to the consumer.
    ///
    /// Returns `false` if the feed is closed; the frame is released either way.
    pub fn publish(&self, frame: CameraFrame) -> bool {
        let mut slot = self.lock();
        if slot.closed {
            drop(slot);
            drop(frame);
            return false;
        }
        let evicted = slot.frame.replace(frame);
        if evicted.is_some() {
            slot.dropped += 1;
        }
        drop(slot);
        self.ready.notify_one();
        // Release outside the lock; hooks may call back into the backend.
        drop(evicted);
        true
    }

    /// Block until a frame is available. Returns `None` once the feed is
    /// closed and drained.
    pub fn recv(&self) -> Option<CameraFrame> {
        let mut slot = self.lock();
        loop {
            if let Some(frame) = slot.frame.take() {
                return Some(frame);
            }
            if slot.closed {
                return None;
            }
            slot = self.ready.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`recv`](Self::recv) but gives up after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<CameraFrame> {
        let slot = self.lock();
        let (mut slot, _) = self
            .ready
            .wait_timeout_while(slot, timeout, |s| s.frame.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        slot.frame.take()
    }

    /// Mark the end of the stream. A pending frame is still delivered.
    pub fn finish(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    /// Close the feed, releasing any pending frame and waking the consumer.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        let pending = slot.frame.take();
        drop(slot);
        self.ready.notify_all();
        drop(pending);
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of frames evicted before the consumer picked them up.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn tracked(id: u8, released: &Arc<AtomicUsize>) -> CameraFrame {
        let counter = Arc::clone(released);
        CameraFrame::new(vec![id], 1, 1).on_release(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_latest_frame_wins() {
        let released = Arc::new(AtomicUsize::new(0));
        let feed = FrameFeed::new();

        assert!(feed.publish(tracked(1, &released)));
        assert!(feed.publish(tracked(2, &released)));
        assert!(feed.publish(tracked(3, &released)));

        // Two older frames were evicted and released
        assert_eq!(released.load(Ordering::SeqCst), 2);
        assert_eq!(feed.dropped(), 2);

        let frame = feed.recv().unwrap();
        assert_eq!(frame.data(), &[3]);
        drop(frame);
        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_close_releases_pending_and_ends_stream() {
        let released = Arc::new(AtomicUsize::new(0));
        let feed = FrameFeed::new();
        feed.publish(tracked(1, &released));
        feed.close();

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(feed.recv().is_none());
        assert!(feed.is_closed());

        // Publishing after close releases immediately
        assert!(!feed.publish(tracked(2, &released)));
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_finish_keeps_pending_frame() {
        let released = Arc::new(AtomicUsize::new(0));
        let feed = FrameFeed::new();
        feed.publish(tracked(9, &released));
        feed.finish();

        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(feed.recv().unwrap().data(), &[9]);
        assert!(feed.recv().is_none());
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_recv_timeout_on_empty_feed() {
        let feed = FrameFeed::new();
        assert!(feed.recv_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_recv_wakes_on_publish_from_other_thread() {
        let feed = Arc::new(FrameFeed::new());
        let producer = Arc::clone(&feed);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.publish(CameraFrame::new(vec![7], 1, 1));
        });

        let frame = feed.recv().unwrap();
        assert_eq!(frame.data(), &[7]);
        handle.join().unwrap();
    }

    #[test]
    fn test_recv_wakes_on_close_from_other_thread() {
        let feed = Arc::new(FrameFeed::new());
        let closer = Arc::clone(&feed);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.close();
        });

        assert!(feed.recv().is_none());
        handle.join().unwrap();
    }
}
