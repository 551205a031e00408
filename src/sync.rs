// StepWatch — Task Coordination Primitives
//
// Latest<T>: a single-slot channel where a publish replaces any unread
// value and never blocks the producer. ResetSignal: a one-shot flag the
// control plane raises and the detector consumes with a non-blocking
// probe. Both mirror the depth-1 overwrite queue and binary semaphore
// the pipeline is built around.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Latest — single-slot overwrite channel
// ---------------------------------------------------------------------------
pub struct Latest<T> {
    slot: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Latest<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Store a value, replacing any unread one, and wake a waiting
    /// receiver. Never blocks.
    pub fn publish(&self, value: T) {
        let mut slot = self.slot.lock().unwrap();
        *slot = Some(value);
        self.ready.notify_one();
    }

    /// Take the pending value, waiting up to `timeout` for one to arrive.
    /// `None` on timeout is a normal "nothing new this cycle" outcome.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        let slot = self.slot.lock().unwrap();
        let (mut slot, _) = self
            .ready
            .wait_timeout_while(slot, timeout, |slot| slot.is_none())
            .unwrap();
        slot.take()
    }
}

// ---------------------------------------------------------------------------
// ResetSignal — one-shot asynchronous flag
// ---------------------------------------------------------------------------
pub struct ResetSignal {
    raised: AtomicBool,
}

impl ResetSignal {
    pub fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Raise the signal. Idempotent until consumed.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Consume the signal if raised. Auto-clears, so each raise is seen
    /// at most once.
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn publish_overwrites_unread() {
        let latest = Latest::new();
        latest.publish(1u32);
        latest.publish(2u32);
        assert_eq!(latest.recv_timeout(Duration::from_millis(10)), Some(2));
        // The overwritten value is gone, not queued behind.
        assert_eq!(latest.recv_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn empty_slot_times_out() {
        let latest: Latest<u32> = Latest::new();
        assert_eq!(latest.recv_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn consumer_never_sees_stale() {
        let latest = Latest::new();
        let mut last_seen = 0u32;
        for burst in [&[1u32, 2, 3][..], &[4][..], &[5, 6][..]] {
            for &value in burst {
                latest.publish(value);
            }
            let seen = latest.recv_timeout(Duration::from_millis(10)).unwrap();
            assert!(seen > last_seen);
            assert_eq!(seen, *burst.last().unwrap());
            last_seen = seen;
        }
    }

    #[test]
    fn receiver_wakes_on_publish() {
        let latest = Arc::new(Latest::new());
        let publisher = Arc::clone(&latest);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            publisher.publish(7u32);
        });
        // Well under the timeout, the receive returns as soon as the
        // publish lands.
        assert_eq!(latest.recv_timeout(Duration::from_secs(5)), Some(7));
        handle.join().unwrap();
    }

    #[test]
    fn reset_signal_consumes_once() {
        let reset = ResetSignal::new();
        assert!(!reset.take());
        reset.raise();
        assert!(reset.take());
        assert!(!reset.take());
        // Two raises before a probe still collapse to one consumption.
        reset.raise();
        reset.raise();
        assert!(reset.take());
        assert!(!reset.take());
    }

    #[test]
    fn sample_queue_blocks_instead_of_dropping() {
        let (tx, rx) = mpsc::sync_channel::<u32>(10);

        // Fill the queue to capacity without blocking.
        for n in 0..10 {
            tx.try_send(n).unwrap();
        }
        assert!(tx.try_send(10).is_err());

        // The producer's next blocking send must stall until the
        // consumer drains a slot.
        let delivered = Arc::new(AtomicBool::new(false));
        let delivered_flag = Arc::clone(&delivered);
        let producer = thread::spawn(move || {
            tx.send(10).unwrap();
            delivered_flag.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!delivered.load(Ordering::SeqCst));

        assert_eq!(rx.recv().unwrap(), 0);
        producer.join().unwrap();
        assert!(delivered.load(Ordering::SeqCst));

        // Nothing was dropped and order is strict FIFO.
        for expected in 1..=10 {
            assert_eq!(rx.recv().unwrap(), expected);
        }
    }
}
