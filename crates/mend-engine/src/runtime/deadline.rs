//! Cancellable wall-clock deadline for one test-case invocation.
//!
//! A watchdog thread waits on a disarm channel with a timeout; if the
//! timeout wins, it raises the shared interrupt flag and the interpreter
//! converts the in-flight call into a timeout error at its next statement.
//! Disarming (explicitly or on drop) wakes the watchdog so no state leaks
//! into the following test case.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};

pub struct Deadline {
    flag: Arc<AtomicBool>,
    disarm_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl Deadline {
    /// Arm a deadline that fires after `timeout`.
    pub fn arm(timeout: Duration) -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        let (disarm_tx, disarm_rx) = bounded::<()>(1);
        let watchdog_flag = Arc::clone(&flag);
        let handle = std::thread::spawn(move || {
            if disarm_rx.recv_timeout(timeout).is_err() {
                watchdog_flag.store(true, Ordering::SeqCst);
            }
        });
        Self {
            flag,
            disarm_tx,
            handle: Some(handle),
        }
    }

    /// The interrupt flag the interpreter polls.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn expired(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Cancel the deadline and reap the watchdog.
    pub fn disarm(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // The channel is buffered, so this cannot block even if the
        // watchdog already fired.
        let _ = self.disarm_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_the_timeout() {
        let deadline = Deadline::arm(Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(60));
        assert!(deadline.expired());
    }

    #[test]
    fn disarm_prevents_firing() {
        let deadline = Deadline::arm(Duration::from_millis(200));
        let flag = deadline.flag();
        deadline.disarm();
        std::thread::sleep(Duration::from_millis(250));
        assert!(!flag.load(Ordering::SeqCst));
    }
}
